#![forbid(unsafe_code)]

//! Core: the item tree, identities and structural mutations.
//!
//! # Role in Cellorama
//! `cellorama-core` owns the data model. It knows nothing about measuring or
//! presenting; it only describes *what* is on screen and *what changed*.
//!
//! # Primary responsibilities
//! - **Item tree**: [`Item`], [`Element`], [`Container`] and [`Arrangement`].
//! - **Identity**: process-unique [`ItemId`]s that survive edits.
//! - **Mutations**: count, size-class, column, segment and random churn edits,
//!   each reporting an [`Invalidation`].
//! - **Generation**: seeded builders for leaves and sections.
//!
//! # How it fits in the system
//! `cellorama-layout` measures a [`Container`] and caches sizes by
//! [`ItemId`]; `cellorama-runtime` owns the tree and routes every
//! [`Invalidation`] to the layout cache before asking for a new pass.

pub mod content;
pub mod generate;
pub mod geometry;
pub mod id;
pub mod invalidation;
pub mod item;
pub mod mutate;

pub use content::{Color, ContentSource, FixedContent, SeededContent};
pub use generate::{Fill, SectionStyle};
pub use geometry::{Insets, Rect, Size, clamp_extent};
pub use id::ItemId;
pub use invalidation::Invalidation;
pub use item::{Arrangement, Container, Element, Item, ItemKind, SizeClass};
pub use mutate::RandomizeKind;
