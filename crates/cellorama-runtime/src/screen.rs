#![forbid(unsafe_code)]

//! The host screen: owner of the item tree, its layout context and the
//! rendering surface.
//!
//! # Responsibilities
//!
//! - [`HostScreen::apply_layout`] sizes and places the whole tree and
//!   presents it.
//! - [`HostScreen::apply_snapshot`] diffs the tree against what the surface
//!   last received and hands it the edits as one batch.
//! - [`HostScreen::option_updated`] reconfigures the tree after an option
//!   change and re-triggers the affected passes.
//!
//! # Threading
//!
//! Everything here runs on the owner thread. The animation timer only sends
//! [`ScreenMsg::Tick`] into the screen's inbox; [`HostScreen::pump`] drains
//! the inbox and mutates. Any other thread can post messages through
//! [`HostScreen::sender`].

use std::sync::mpsc;
use std::time::Duration;

use cellorama_core::content::{ContentSource, SeededContent};
use cellorama_core::generate::{self, Fill};
use cellorama_core::id::ItemId;
use cellorama_core::invalidation::Invalidation;
use cellorama_core::item::Container;
use cellorama_core::mutate::RandomizeKind;
use cellorama_layout::{
    Family, LayoutConfig, LayoutContext, LayoutNode, PassStats, RenderSurface, SizingEngine,
    Snapshot,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::options::{OptionChange, OptionKind, Options, TabStyle};
use crate::subscription::{Every, SubscriptionHandle};

/// Default screen width in points.
pub const DEFAULT_WIDTH: f32 = 390.0;

/// Messages the owner thread acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenMsg {
    /// Apply one round of random churn.
    Tick,
    /// Change one option.
    Option(OptionChange),
    /// New screen width.
    Resize(f32),
    /// Select a segment of a tab container.
    SelectSegment(ItemId, usize),
}

/// Layout family for the `legacy` option.
#[inline]
#[must_use]
pub fn family_for(legacy: bool) -> Family {
    if legacy {
        Family::Flow
    } else {
        Family::Compositional
    }
}

/// One demo tab: a tree, its cache and the surface it draws into.
pub struct HostScreen<S: RenderSurface> {
    style: TabStyle,
    options: Options,
    root: Container,
    ctx: LayoutContext,
    engine: SizingEngine,
    surface: S,
    width: f32,
    rng: SmallRng,
    content: Box<dyn ContentSource>,
    shown: Snapshot,
    next_kind: RandomizeKind,
    ticker: Option<SubscriptionHandle>,
    sender: mpsc::Sender<ScreenMsg>,
    inbox: mpsc::Receiver<ScreenMsg>,
    last_layout: Option<LayoutNode>,
}

impl<S: RenderSurface> HostScreen<S> {
    /// Build the tree for `style` from `options` and show it.
    ///
    /// `seed` drives both content and structural randomness. If `options`
    /// asks for animation the timer starts right away.
    pub fn new(surface: S, style: TabStyle, options: Options, seed: u64) -> Self {
        Self::with_content(surface, style, options, seed, Box::new(SeededContent::new(seed)))
    }

    /// Like [`new`](Self::new) with a custom content source.
    pub fn with_content(
        surface: S,
        style: TabStyle,
        options: Options,
        seed: u64,
        mut content: Box<dyn ContentSource>,
    ) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let root = generate::root(
            options.sections,
            &options.fill(style),
            content.as_mut(),
            &mut rng,
        );
        let ctx = LayoutContext::from_env(LayoutConfig::for_family(family_for(options.legacy)));
        let (sender, inbox) = mpsc::channel();
        let mut screen = Self {
            style,
            options,
            root,
            ctx,
            engine: SizingEngine::new(),
            surface,
            width: DEFAULT_WIDTH,
            rng,
            content,
            shown: Snapshot::default(),
            next_kind: RandomizeKind::default(),
            ticker: None,
            sender,
            inbox,
            last_layout: None,
        };
        tracing::info!(
            %style,
            sections = options.sections,
            items = options.items,
            family = %screen.ctx.config().family,
            "host screen created"
        );
        screen.apply_snapshot();
        screen.apply_layout();
        screen.sync_ticker();
        screen
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn style(&self) -> TabStyle {
        self.style
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[inline]
    pub fn root(&self) -> &Container {
        &self.root
    }

    #[inline]
    pub fn context(&self) -> &LayoutContext {
        &self.ctx
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Stats of the most recent layout pass.
    #[inline]
    pub fn stats(&self) -> PassStats {
        self.engine.stats()
    }

    /// The most recent frame tree.
    pub fn last_layout(&self) -> Option<&LayoutNode> {
        self.last_layout.as_ref()
    }

    /// Identities the surface has been told about.
    pub fn shown(&self) -> &Snapshot {
        &self.shown
    }

    /// Kind the next tick applies.
    #[inline]
    pub fn next_kind(&self) -> RandomizeKind {
        self.next_kind
    }

    /// Whether the animation timer is running.
    #[inline]
    pub fn is_animating(&self) -> bool {
        self.ticker.as_ref().is_some_and(SubscriptionHandle::is_running)
    }

    /// A handle other threads can post messages through.
    pub fn sender(&self) -> mpsc::Sender<ScreenMsg> {
        self.sender.clone()
    }

    fn fill(&self) -> Fill {
        self.options.fill(self.style)
    }

    // ========================================================================
    // Host contract
    // ========================================================================

    /// Size and place the whole tree and present it.
    pub fn apply_layout(&mut self) -> &LayoutNode {
        self.engine.reset_stats();
        let node = self
            .engine
            .layout(&mut self.ctx, &mut self.surface, &self.root, self.width);
        self.last_layout.insert(node)
    }

    /// Diff the tree against what the surface shows and send the edits.
    ///
    /// Returns the number of edits. An empty diff sends nothing.
    pub fn apply_snapshot(&mut self) -> usize {
        let next = Snapshot::capture(&self.root);
        let edits = Snapshot::diff(&self.shown, &next);
        if !edits.is_empty() {
            self.surface.apply_batch(&edits);
        }
        tracing::debug!(
            edits = edits.len(),
            sections = next.sections.len(),
            items = next.item_count(),
            "snapshot applied"
        );
        self.shown = next;
        edits.len()
    }

    /// React to a change of `kind`, already stored in the options.
    pub fn option_updated(&mut self, kind: OptionKind) {
        tracing::info!(style = %self.style, option = %kind, "option updated");
        let fill = self.fill();
        match kind {
            OptionKind::Animate => self.sync_ticker(),
            OptionKind::Legacy => {
                self.ctx.set_family(family_for(self.options.legacy));
                self.apply_layout();
            }
            OptionKind::Sections => {
                let inv = self.root.set_item_count(
                    self.options.sections,
                    &fill,
                    self.content.as_mut(),
                    &mut self.rng,
                );
                self.commit(&inv);
            }
            OptionKind::Items => {
                let inv = self.root.set_items_per_section(
                    self.options.items,
                    &fill,
                    self.content.as_mut(),
                    &mut self.rng,
                );
                self.commit(&inv);
            }
            OptionKind::Size => {
                let inv = self.root.set_size(self.options.size);
                self.commit(&inv);
            }
            OptionKind::Columns => {
                let inv = self.root.set_column_count(self.options.columns);
                self.ctx.apply(&inv);
                self.apply_layout();
            }
            // Only affects later ticks.
            OptionKind::Transitions => {}
        }
    }

    /// Store `change` and react to it. Returns whether anything changed.
    pub fn set_option(&mut self, change: OptionChange) -> bool {
        if !self.options.apply(change) {
            return false;
        }
        self.option_updated(change.kind());
        true
    }

    /// Apply one round of random churn and show it.
    ///
    /// Returns the kind that was applied.
    pub fn tick(&mut self) -> RandomizeKind {
        let kind = self.next_kind;
        let fill = self.fill();
        let inv = self
            .root
            .randomize(kind, &fill, self.content.as_mut(), &mut self.rng);
        self.commit(&inv);
        self.next_kind = kind.next();
        kind
    }

    /// Change the screen width and lay out again.
    ///
    /// Cached sizes carry the width they were measured at, so nothing needs
    /// invalidating.
    pub fn resize(&mut self, width: f32) {
        let width = width.max(0.0);
        if width == self.width {
            return;
        }
        tracing::debug!(from = self.width, to = width, "resized");
        self.width = width;
        self.apply_layout();
    }

    /// Show segment `segment` of the tab container `id`.
    ///
    /// Returns `false` when `id` is not a tab or the segment is already
    /// shown.
    pub fn select_segment(&mut self, id: ItemId, segment: usize) -> bool {
        let inv = self.root.set_segment(id, segment);
        if inv.is_empty() {
            return false;
        }
        self.ctx.apply(&inv);
        self.apply_layout();
        true
    }

    /// Act on one message.
    pub fn update(&mut self, msg: ScreenMsg) {
        match msg {
            ScreenMsg::Tick => {
                self.tick();
            }
            ScreenMsg::Option(change) => {
                self.set_option(change);
            }
            ScreenMsg::Resize(width) => self.resize(width),
            ScreenMsg::SelectSegment(id, segment) => {
                self.select_segment(id, segment);
            }
        }
    }

    /// Drain the inbox without blocking. Returns the number of messages
    /// handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.inbox.try_recv() {
            self.update(msg);
            handled += 1;
        }
        handled
    }

    /// Wait up to `timeout` for one message, handle it, then drain the rest.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.inbox.recv_timeout(timeout) {
            Ok(msg) => {
                self.update(msg);
                1 + self.pump()
            }
            Err(_) => 0,
        }
    }

    /// Stop the animation timer, if any. Idempotent.
    pub fn stop_animation(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    fn commit(&mut self, inv: &Invalidation) {
        self.ctx.apply(inv);
        self.apply_snapshot();
        self.apply_layout();
    }

    fn sync_ticker(&mut self) {
        match (self.options.animate, self.ticker.is_some()) {
            (true, false) => {
                let interval = Duration::from_millis(self.options.tick_interval_ms.max(1));
                let every = Every::new(interval, || ScreenMsg::Tick);
                self.ticker = Some(SubscriptionHandle::start(every, self.sender.clone()));
                tracing::info!(interval_ms = interval.as_millis() as u64, "animation started");
            }
            (false, true) => {
                self.stop_animation();
                tracing::info!("animation stopped");
            }
            _ => {}
        }
    }
}

impl<S: RenderSurface> Drop for HostScreen<S> {
    fn drop(&mut self) {
        self.stop_animation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellorama_core::item::{Arrangement, Item, SizeClass};
    use cellorama_layout::{Edit, IntrinsicSurface};

    fn options(sections: usize, items: usize) -> Options {
        Options {
            sections,
            items,
            ..Options::default()
        }
    }

    fn screen(style: TabStyle, options: Options) -> HostScreen<IntrinsicSurface> {
        HostScreen::new(IntrinsicSurface::new(), style, options, 11)
    }

    #[test]
    fn new_screen_is_presented_and_mirrored() {
        let screen = screen(TabStyle::Zone, options(3, 4));
        assert_eq!(screen.root().len(), 3);
        assert_eq!(screen.surface().batches(), 1);
        assert_eq!(screen.surface().mirror(), screen.shown());
        assert_eq!(screen.shown().item_count(), 12);
        let presented = screen.surface().presented().unwrap();
        assert_eq!(presented.id, screen.root().id());
        assert_eq!(presented.frame.width, DEFAULT_WIDTH);
    }

    #[test]
    fn legacy_selects_family() {
        assert_eq!(family_for(true), Family::Flow);
        assert_eq!(family_for(false), Family::Compositional);

        let mut screen = screen(TabStyle::Zone, options(2, 2));
        assert_eq!(screen.context().config().family, Family::Compositional);
        let header_height = screen.last_layout().unwrap().frame.height;
        assert!(screen.set_option(OptionChange::Legacy(true)));
        assert_eq!(screen.context().config().family, Family::Flow);
        assert!(screen.last_layout().unwrap().frame.height < header_height);
    }

    #[test]
    fn sections_option_pads_and_truncates() {
        let mut screen = screen(TabStyle::Grid, options(2, 3));
        assert!(screen.set_option(OptionChange::Sections(5)));
        assert_eq!(screen.root().len(), 5);
        assert_eq!(screen.surface().mirror(), screen.shown());
        assert!(screen.set_option(OptionChange::Sections(1)));
        assert_eq!(screen.root().len(), 1);
        assert_eq!(screen.surface().mirror().sections.len(), 1);
    }

    #[test]
    fn items_option_resizes_every_section() {
        let mut screen = screen(TabStyle::Zone, options(3, 2));
        assert!(screen.set_option(OptionChange::Items(6)));
        for section in screen.root().items() {
            assert_eq!(section.as_container().unwrap().len(), 6);
        }
        assert_eq!(screen.shown().item_count(), 18);
    }

    #[test]
    fn size_option_keeps_snapshot_identity() {
        let mut screen = screen(TabStyle::Zone, options(2, 3));
        let before = screen.shown().clone();
        let batches = screen.surface().batches();
        assert!(screen.set_option(OptionChange::Size(SizeClass::Large)));
        assert_eq!(screen.shown(), &before);
        assert_eq!(screen.surface().batches(), batches);
        let leaf = screen.last_layout().unwrap().children[0].children[0].frame;
        assert_eq!(leaf.height, 100.0);
    }

    #[test]
    fn columns_option_relayouts_grids() {
        let mut screen = screen(TabStyle::Grid, options(1, 4));
        let one = screen.last_layout().unwrap().children[0].children[0].frame.width;
        assert!(screen.set_option(OptionChange::Columns(2)));
        let Item::Container(section) = &screen.root().items()[0] else {
            panic!("section expected");
        };
        assert_eq!(section.arrangement(), Arrangement::grid(2));
        let two = screen.last_layout().unwrap().children[0].children[0].frame.width;
        assert!(two < one);
    }

    #[test]
    fn unchanged_option_is_ignored() {
        let mut screen = screen(TabStyle::Zone, options(2, 2));
        let batches = screen.surface().batches();
        assert!(!screen.set_option(OptionChange::Sections(2)));
        assert_eq!(screen.surface().batches(), batches);
    }

    #[test]
    fn tick_cycles_kinds_and_keeps_mirror_in_step() {
        let mut screen = screen(TabStyle::Mixed, options(4, 5));
        for expected in RandomizeKind::ALL.into_iter().chain(RandomizeKind::ALL) {
            assert_eq!(screen.tick(), expected);
            assert_eq!(screen.surface().mirror(), screen.shown());
        }
    }

    #[test]
    fn select_segment_only_touches_tabs() {
        let mut screen = screen(TabStyle::Tab, options(1, 6));
        let tab = screen.root().items()[0].id();
        assert!(!screen.select_segment(screen.root().id(), 1));
        assert!(screen.select_segment(tab, 1));
        assert!(!screen.select_segment(tab, 1));

        let section = &screen.last_layout().unwrap().children[0];
        let shown = section.children.iter().filter(|c| !c.hidden).count();
        assert_eq!(shown, 2);
    }

    #[test]
    fn resize_relayouts_at_new_width() {
        let mut screen = screen(TabStyle::Zone, options(2, 3));
        let before = screen.last_layout().unwrap().clone();
        screen.resize(600.0);
        assert_eq!(screen.last_layout().unwrap().frame.width, 600.0);
        assert!(!screen.stats().is_pure_hit());
        screen.resize(DEFAULT_WIDTH);
        assert_eq!(screen.last_layout().unwrap(), &before);
    }

    #[test]
    fn pump_drains_posted_messages() {
        let mut screen = screen(TabStyle::Zone, options(2, 2));
        let sender = screen.sender();
        sender.send(ScreenMsg::Option(OptionChange::Sections(4))).unwrap();
        sender.send(ScreenMsg::Resize(500.0)).unwrap();
        assert_eq!(screen.pump(), 2);
        assert_eq!(screen.root().len(), 4);
        assert_eq!(screen.width(), 500.0);
        assert_eq!(screen.pump(), 0);
    }

    #[test]
    fn empty_diff_sends_no_batch() {
        let mut screen = screen(TabStyle::Zone, options(2, 2));
        let batches = screen.surface().batches();
        assert_eq!(screen.apply_snapshot(), 0);
        assert_eq!(screen.surface().batches(), batches);
    }

    #[test]
    fn batch_edits_reach_the_surface() {
        let mut screen = screen(TabStyle::Zone, options(1, 1));
        screen.set_option(OptionChange::Sections(2));
        let mirror = screen.surface().mirror();
        assert_eq!(mirror.sections.len(), 2);
        let edits = Snapshot::diff(&Snapshot::default(), mirror);
        assert!(edits.iter().any(|e| matches!(e, Edit::InsertSection { .. })));
    }
}
