#![forbid(unsafe_code)]

//! Layout: arrangement policies, the size cache and the sizing engine.
//!
//! # Role in Cellorama
//! `cellorama-layout` turns an item tree from `cellorama-core` into sizes
//! and absolute frames. It owns no tree; callers pass one in per pass.
//!
//! # Primary responsibilities
//! - **Policy**: pure per-arrangement placement ([`policy`]).
//! - **SizeCache**: identity-keyed memo of measured sizes and carousel
//!   height hints ([`cache`]).
//! - **SizingEngine**: bottom-up measurement and top-down placement
//!   ([`engine`]).
//! - **Snapshot**: identity diffs between rendered states ([`snapshot`]).
//! - **RenderSurface**: the seam to whatever draws ([`surface`]).

pub mod cache;
pub mod context;
pub mod engine;
pub mod policy;
pub mod snapshot;
pub mod surface;

pub use cache::{SizeCache, SizeCacheStats};
pub use context::{Family, LayoutConfig, LayoutContext};
pub use engine::{LayoutNode, PassStats, SizingEngine};
pub use policy::{ChildFrame, Constraints, LayoutPlan, Proposal, ScrollAxis};
pub use snapshot::{Edit, SectionSnapshot, Snapshot};
pub use surface::{ChildScreen, IntrinsicSurface, RenderSurface};
