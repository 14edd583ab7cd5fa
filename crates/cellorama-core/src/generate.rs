#![forbid(unsafe_code)]

//! Builders for fresh leaves and sections.
//!
//! [`Fill`] describes what padding looks like when a mutation has to create
//! new nodes: how many leaves a new section holds, which size class those
//! leaves get, and how a new section arranges them.

use rand::Rng;

use crate::content::ContentSource;
use crate::item::{Arrangement, Container, Element, Item, SizeClass};

/// Arrangement policy for newly created sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStyle {
    /// Every new section uses the same arrangement.
    Fixed(Arrangement),
    /// Each new section rolls a random arrangement. Grids get `columns`.
    Mixed { columns: u16 },
}

impl SectionStyle {
    /// Arrangement for the next new section.
    pub fn arrangement<R: Rng>(&self, rng: &mut R) -> Arrangement {
        match *self {
            SectionStyle::Fixed(arrangement) => arrangement,
            SectionStyle::Mixed { columns } => Arrangement::random(rng, columns),
        }
    }
}

/// Parameters for nodes created during a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Leaves per new (or resized) section.
    pub items: usize,
    /// Size class of new leaves.
    pub size: SizeClass,
    /// Arrangement of new sections.
    pub style: SectionStyle,
    /// Whether randomization re-rolls section arrangements.
    pub transitions: bool,
}

impl Default for Fill {
    fn default() -> Self {
        Self {
            items: 20,
            size: SizeClass::Small,
            style: SectionStyle::Fixed(Arrangement::Zone),
            transitions: false,
        }
    }
}

/// `count` fresh leaves of the given size class.
pub fn elements(count: usize, size: SizeClass, content: &mut dyn ContentSource) -> Vec<Item> {
    (0..count)
        .map(|_| Element::new(content.glyph(), size, content.color()).into())
        .collect()
}

/// `count` fresh sections, each holding `fill.items` leaves.
pub fn sections<R: Rng>(
    count: usize,
    fill: &Fill,
    content: &mut dyn ContentSource,
    rng: &mut R,
) -> Vec<Item> {
    (0..count)
        .map(|_| {
            Container::new(elements(fill.items, fill.size, content))
                .with_arrangement(fill.style.arrangement(rng))
                .into()
        })
        .collect()
}

/// A root holding `count` sections.
pub fn root<R: Rng>(
    count: usize,
    fill: &Fill,
    content: &mut dyn ContentSource,
    rng: &mut R,
) -> Container {
    Container::new(sections(count, fill, content, rng)).root()
}
