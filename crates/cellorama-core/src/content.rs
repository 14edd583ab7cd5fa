#![forbid(unsafe_code)]

//! Display content for leaves.
//!
//! Glyph and color selection is a collaborator of the tree, not part of it:
//! anything that creates leaves asks a [`ContentSource`]. [`SeededContent`]
//! is the default source, deterministic for a given seed.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Glyphs handed out by [`SeededContent`].
pub const GLYPHS: &[&str] = &[
    "👊", "🤲", "🙌", "👏", "🤝", "👍", "👎", "✊", "🤛", "🤞", "✌️", "🤟", "👌", "🤏", "☝️",
    "🖖", "🤙",
];

/// Fill color of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    Blue,
    Black,
    Red,
    Green,
    Yellow,
    Brown,
    Cyan,
    DarkGray,
    Gray,
    LightGray,
    Magenta,
    Orange,
    Purple,
    White,
}

impl Color {
    /// Every palette entry.
    pub const ALL: [Color; 14] = [
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Brown,
        Color::Cyan,
        Color::DarkGray,
        Color::Gray,
        Color::LightGray,
        Color::Magenta,
        Color::Orange,
        Color::Purple,
        Color::White,
    ];

    /// 0xRRGGBB value.
    #[must_use]
    pub const fn rgb(self) -> u32 {
        match self {
            Color::Blue => 0x0000FF,
            Color::Black => 0x000000,
            Color::Red => 0xFF0000,
            Color::Green => 0x00FF00,
            Color::Yellow => 0xFFFF00,
            Color::Brown => 0x996633,
            Color::Cyan => 0x00FFFF,
            Color::DarkGray => 0x555555,
            Color::Gray => 0x808080,
            Color::LightGray => 0xAAAAAA,
            Color::Magenta => 0xFF00FF,
            Color::Orange => 0xFF8000,
            Color::Purple => 0x800080,
            Color::White => 0xFFFFFF,
        }
    }
}

/// Supplies payloads for newly created leaves.
pub trait ContentSource {
    /// A short display string.
    fn glyph(&mut self) -> String;

    /// A fill color.
    fn color(&mut self) -> Color;
}

/// Random glyphs and colors from a seeded small RNG.
#[derive(Debug, Clone)]
pub struct SeededContent {
    rng: SmallRng,
}

impl SeededContent {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl ContentSource for SeededContent {
    fn glyph(&mut self) -> String {
        GLYPHS.choose(&mut self.rng).copied().unwrap_or("?").to_owned()
    }

    fn color(&mut self) -> Color {
        Color::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Color::Gray)
    }
}

/// Content that never varies. Handy when output must be stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedContent {
    pub glyph: String,
    pub color: Color,
}

impl Default for FixedContent {
    fn default() -> Self {
        Self {
            glyph: "👍".to_owned(),
            color: Color::Blue,
        }
    }
}

impl ContentSource for FixedContent {
    fn glyph(&mut self) -> String {
        self.glyph.clone()
    }

    fn color(&mut self) -> Color {
        self.color
    }
}
