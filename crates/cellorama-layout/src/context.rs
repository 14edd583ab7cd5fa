#![forbid(unsafe_code)]

//! Layout configuration and the context threaded through every pass.
//!
//! A [`LayoutContext`] owns the [`SizeCache`] and the active
//! [`LayoutConfig`]. There is no global state: independent contexts can
//! lay out independent trees side by side.
//!
//! # Force-Full Fallback
//!
//! With [`LayoutConfig::force_full`] set, every cache lookup is skipped and
//! each pass recomputes the whole tree. [`LayoutContext::from_env`] turns it
//! on when `CELLORAMA_FULL_LAYOUT` is `1`, `true` or `yes`.

use std::fmt;

use cellorama_core::invalidation::Invalidation;
use serde::{Deserialize, Serialize};

use crate::cache::SizeCache;

/// Environment variable that forces full recomputation.
pub const FULL_LAYOUT_ENV: &str = "CELLORAMA_FULL_LAYOUT";

/// Height reserved above each section in the compositional family.
pub const DEFAULT_HEADER_HEIGHT: f32 = 44.0;

/// Vertical offset between stacked cards.
pub const DEFAULT_STACK_OFFSET: f32 = 24.0;

/// Card height as a fraction of card width.
pub const DEFAULT_STACK_ASPECT: f32 = 0.6;

/// Layout family. Switching families invalidates every cached size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    /// Containers nest to any depth; every level is measured.
    #[default]
    Flow,
    /// The root holds sections and sections hold leaves. Sections carry a
    /// header; anything nested deeper is skipped.
    Compositional,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Flow => "flow",
            Family::Compositional => "compositional",
        })
    }
}

/// Parameters that affect every layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub family: Family,
    /// Section header height (compositional family only).
    pub header_height: f32,
    pub stack_offset: f32,
    pub stack_aspect: f32,
    /// Bypass the cache entirely.
    pub force_full: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            family: Family::Flow,
            header_height: DEFAULT_HEADER_HEIGHT,
            stack_offset: DEFAULT_STACK_OFFSET,
            stack_aspect: DEFAULT_STACK_ASPECT,
            force_full: false,
        }
    }
}

impl LayoutConfig {
    /// Config for `family` with default parameters.
    #[must_use]
    pub fn for_family(family: Family) -> Self {
        Self {
            family,
            ..Self::default()
        }
    }

    /// Header height applied to sections, zero outside the compositional
    /// family.
    #[inline]
    #[must_use]
    pub fn section_header(&self) -> f32 {
        match self.family {
            Family::Flow => 0.0,
            Family::Compositional => self.header_height,
        }
    }
}

fn env_forces_full() -> bool {
    std::env::var(FULL_LAYOUT_ENV)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Cache plus configuration for one tree.
#[derive(Debug, Default, Clone)]
pub struct LayoutContext {
    cache: SizeCache,
    config: LayoutConfig,
}

impl LayoutContext {
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            cache: SizeCache::new(),
            config,
        }
    }

    /// Like [`new`](Self::new), honoring `CELLORAMA_FULL_LAYOUT`.
    #[must_use]
    pub fn from_env(mut config: LayoutConfig) -> Self {
        config.force_full |= env_forces_full();
        Self::new(config)
    }

    #[inline]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[inline]
    pub fn cache(&self) -> &SizeCache {
        &self.cache
    }

    #[inline]
    pub fn cache_mut(&mut self) -> &mut SizeCache {
        &mut self.cache
    }

    /// Switch layout family. A change clears the cache.
    ///
    /// Returns whether the family changed.
    pub fn set_family(&mut self, family: Family) -> bool {
        if self.config.family == family {
            return false;
        }
        tracing::info!(from = %self.config.family, to = %family, "layout family switched");
        self.config.family = family;
        self.cache.clear();
        true
    }

    pub fn set_force_full(&mut self, force: bool) {
        self.config.force_full = force;
    }

    /// Route a mutation's invalidation to the cache.
    pub fn apply(&mut self, invalidation: &Invalidation) -> usize {
        if invalidation.is_empty() {
            return 0;
        }
        self.cache.apply(invalidation)
    }
}
