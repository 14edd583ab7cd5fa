#![forbid(unsafe_code)]

//! Runtime: options, the host screen and the animation timer.
//!
//! # Role in Cellorama
//! `cellorama-runtime` owns a tree from `cellorama-core` and drives
//! `cellorama-layout` over it. It turns option changes and timer ticks into
//! mutations, routes their invalidations to the size cache and keeps the
//! rendering surface in step.
//!
//! # Primary responsibilities
//! - **Options**: per-style settings with TOML/JSON loading ([`options`]).
//! - **HostScreen**: apply layout, apply snapshot, react to option updates
//!   ([`screen`]).
//! - **Subscriptions**: background timers that only send messages
//!   ([`subscription`]).

pub mod error;
pub mod options;
pub mod screen;
pub mod subscription;

pub use error::{CelloramaError, Result};
pub use options::{OptionChange, OptionKind, Options, Settings, TabStyle};
pub use screen::{DEFAULT_WIDTH, HostScreen, ScreenMsg, family_for};
pub use subscription::{Every, StopSignal, Subscription, SubscriptionHandle};
