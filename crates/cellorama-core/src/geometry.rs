#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All values are in points. Extents produced by layout are never negative:
//! anything that would come out below zero (or non-finite) is clamped to zero
//! by [`clamp_extent`].

use serde::{Deserialize, Serialize};

/// Clamp a computed extent to a finite, non-negative value.
#[inline]
#[must_use]
pub fn clamp_extent(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// The empty size.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Same size with both extents passed through [`clamp_extent`].
    #[inline]
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(clamp_extent(self.width), clamp_extent(self.height))
    }

    /// Check if either extent is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Edge insets (padding) around content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Insets {
    /// No insets.
    pub const ZERO: Self = Self::uniform(0.0);

    #[inline]
    pub const fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// The same inset on every edge.
    #[inline]
    pub const fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Left + right.
    #[inline]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Top + bottom.
    #[inline]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// An axis-aligned rectangle. Origin at top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Zero-sized rectangle at the origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Translate by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink by the given insets. Extents clamp at zero.
    #[must_use]
    pub fn inner(&self, insets: Insets) -> Rect {
        Rect::new(
            self.x + insets.left,
            self.y + insets.top,
            clamp_extent(self.width - insets.horizontal()),
            clamp_extent(self.height - insets.vertical()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_extent_rejects_negative_and_nan() {
        assert_eq!(clamp_extent(-3.0), 0.0);
        assert_eq!(clamp_extent(f32::NAN), 0.0);
        assert_eq!(clamp_extent(f32::NEG_INFINITY), 0.0);
        assert_eq!(clamp_extent(12.5), 12.5);
    }

    #[test]
    fn inner_clamps_when_insets_exceed_bounds() {
        let r = Rect::new(0.0, 0.0, 10.0, 4.0).inner(Insets::uniform(8.0));
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 0.0);
        assert_eq!(r.x, 8.0);
    }

    #[test]
    fn offset_preserves_size() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0).offset(10.0, 20.0);
        assert_eq!(r, Rect::new(11.0, 22.0, 3.0, 4.0));
        assert_eq!(r.right(), 14.0);
        assert_eq!(r.bottom(), 26.0);
    }

    #[test]
    fn insets_sum_per_axis() {
        let insets = Insets::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(insets.horizontal(), 6.0);
        assert_eq!(insets.vertical(), 4.0);
    }
}
