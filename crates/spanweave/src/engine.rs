//! The engine: scheduling, per-root pass orchestration and streaming state.
//!
//! An [`Engine`] owns no tree. The host keeps its [`Tree`], pushes
//! notifications through [`Engine::notify`] or [`Engine::on_event`], and
//! calls [`Engine::tick`] once per frame. Each tick runs at most one
//! scheduled pass over the requested roots.
use rustc_hash::FxHashMap;

use crate::{
    annotator,
    error::EngineError,
    hook::PresentationHook,
    options::{EngineOptions, RenderMode},
    passes::{self, PASS_ORDER},
    scheduler::{Notification, Reason, ScanPlan, ScanScheduler},
    signature::SignatureCache,
    stream::{Fingerprint, Patch, StreamFrame, reconcile},
    tree::{NodeId, Pass, Tree},
    typewriter::{self, TypewriterTiming},
};

/// Host lifecycle events, mapped onto scheduler notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The host edited content under `roots`.
    ContentChanged {
        /// Roots whose content changed.
        roots: Vec<NodeId>,
    },
    /// Streamed content arrived in `root`.
    TokenReceived {
        /// Root being streamed into.
        root: NodeId,
    },
    /// Generation into `root` began.
    GenerationStarted {
        /// Root that becomes the streaming root.
        root: NodeId,
    },
    /// Generation was interrupted.
    GenerationStopped,
    /// Generation finished normally.
    GenerationEnded,
}

/// Changes to a streaming root's frame produced by one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    /// Edits turning the previous frame into the current one.
    pub patches: Vec<Patch>,
    /// Counted units in the current frame.
    pub emitted: usize,
    /// Units flagged new in the current frame.
    pub new_units: usize,
}

/// Outcome of processing one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootReport {
    /// The processed root.
    pub root: NodeId,
    /// Passes that did work; the rest were skipped by signature.
    pub ran: Vec<Pass>,
    /// Passes whose markers were removed because they went inactive.
    pub cleared: Vec<Pass>,
    /// Tree mutations made while processing this root.
    pub mutations: u64,
    /// Units this root plays: the stream frame's count while streaming,
    /// otherwise the typewriter total. Callers chain animations across
    /// roots with it.
    pub emitted_units: usize,
    /// Typewriter timings, when the typewriter pass ran.
    pub timings: Vec<TypewriterTiming>,
    /// Frame changes, when this is the buffered streaming root and its
    /// content moved on.
    pub stream: Option<StreamUpdate>,
    /// The root is streaming live and was left alone.
    pub deferred: bool,
}

impl RootReport {
    fn new(root: NodeId) -> Self {
        Self {
            root,
            ran: Vec::new(),
            cleared: Vec::new(),
            mutations: 0,
            emitted_units: 0,
            timings: Vec::new(),
            stream: None,
            deferred: false,
        }
    }
}

/// Outcome of one [`Engine::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The plan that ran, or `None` when no tick was requested.
    pub plan: Option<ScanPlan>,
    /// One report per root the plan reached, in tree order.
    pub roots: Vec<RootReport>,
}

/// Drives every pass over the roots of a [`Tree`].
///
/// The engine never owns the tree. The host hands it in on every
/// [`tick`](Engine::tick) and reports its edits through
/// [`on_event`](Engine::on_event) or [`notify`](Engine::notify).
pub struct Engine {
    options: EngineOptions,
    cache: SignatureCache,
    scheduler: ScanScheduler,
    streaming: Option<NodeId>,
    streams: FxHashMap<NodeId, StreamFrame>,
    timings: FxHashMap<NodeId, Vec<TypewriterTiming>>,
    hooks: Vec<Box<dyn PresentationHook>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("cache", &self.cache)
            .field("scheduler", &self.scheduler)
            .field("streaming", &self.streaming)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine. A first full scan is already requested.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        let mut scheduler = ScanScheduler::new();
        scheduler.notify(Notification::full(Reason::ConfigChanged));
        Self {
            options: options.normalized(),
            cache: SignatureCache::new(),
            scheduler,
            streaming: None,
            streams: FxHashMap::default(),
            timings: FxHashMap::default(),
            hooks: Vec::new(),
        }
    }

    /// Current, normalised options.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Replace the configuration. A changed configuration notifies hooks
    /// and requests a full rescan.
    pub fn set_options(&mut self, options: EngineOptions) {
        let options = options.normalized();
        if options == self.options {
            return;
        }
        self.options = options;
        if self.options.stream.render_mode == RenderMode::Live {
            self.streams.clear();
        }
        for hook in &mut self.hooks {
            if let Err(err) = hook.options_changed(&self.options) {
                tracing::warn!(error = %err, "engine.hook.failed");
            }
        }
        self.notify(Notification::full(Reason::ConfigChanged));
    }

    /// Register a hook called after options change and after each root.
    pub fn add_hook(&mut self, hook: impl PresentationHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Push a change batch into the scheduler.
    pub fn notify(&mut self, notification: Notification) {
        self.scheduler.notify(notification);
    }

    /// Translate a host lifecycle event into a notification.
    pub fn on_event(&mut self, event: LifecycleEvent) {
        let notification = match event {
            LifecycleEvent::ContentChanged { roots } => {
                Notification::roots(Reason::ContentChanged, roots)
            }
            LifecycleEvent::TokenReceived { root } => {
                self.begin_streaming(root);
                Notification::roots(Reason::TokenReceived, [root])
            }
            LifecycleEvent::GenerationStarted { root } => {
                self.begin_streaming(root);
                Notification::roots(Reason::GenerationStarted, [])
            }
            LifecycleEvent::GenerationStopped => {
                self.end_streaming();
                Notification::full(Reason::GenerationStopped)
            }
            LifecycleEvent::GenerationEnded => {
                self.end_streaming();
                Notification::full(Reason::GenerationEnded)
            }
        };
        self.notify(notification);
    }

    fn begin_streaming(&mut self, root: NodeId) {
        if let Some(previous) = self.streaming.replace(root) {
            if previous != root {
                self.streams.remove(&previous);
            }
        }
    }

    fn end_streaming(&mut self) {
        if let Some(root) = self.streaming.take() {
            self.streams.remove(&root);
            tracing::debug!(root = %root, "engine.stream.released");
        }
    }

    /// The root generation is currently streaming into.
    #[must_use]
    pub fn streaming_root(&self) -> Option<NodeId> {
        self.streaming
    }

    /// The current frame of a buffered streaming root.
    #[must_use]
    pub fn stream_frame(&self, root: NodeId) -> Option<&StreamFrame> {
        self.streams.get(&root)
    }

    /// Typewriter timings from the last time the pass ran on `root`.
    #[must_use]
    pub fn timings(&self, root: NodeId) -> &[TypewriterTiming] {
        self.timings.get(&root).map_or(&[], Vec::as_slice)
    }

    /// Whether the next [`Engine::tick`] has work.
    #[must_use]
    pub fn frame_requested(&self) -> bool {
        self.scheduler.frame_requested()
    }

    /// Run the scheduled pass, if any.
    ///
    /// Tree errors on one root are logged and do not stop the others. Roots
    /// the engine mutated are replayed as one follow-up request.
    pub fn tick(&mut self, tree: &mut Tree) -> TickReport {
        let Some(plan) = self.scheduler.begin_pass() else {
            return TickReport::default();
        };
        let mut roots = match &plan {
            ScanPlan::Full => {
                self.evict_missing(tree);
                tree.roots().to_vec()
            }
            ScanPlan::Roots(roots) => roots.clone(),
        };
        if let Some(root) = self.streaming {
            if self.options.stream.render_mode == RenderMode::Buffered && !roots.contains(&root) {
                roots.push(root);
            }
        }
        tracing::debug!(?plan, roots = roots.len(), "engine.tick");

        let mut reports = Vec::with_capacity(roots.len());
        for root in roots {
            if !tree.is_root(root) {
                tracing::trace!(root = %root, "engine.root.gone");
                continue;
            }
            match self.process_root(tree, root) {
                Ok(report) => {
                    if report.mutations > 0 {
                        self.scheduler
                            .notify(Notification::roots(Reason::EngineWrite, [root]));
                    }
                    for hook in &mut self.hooks {
                        if let Err(err) = hook.root_processed(tree, &report) {
                            tracing::warn!(root = %root, error = %err, "engine.hook.failed");
                        }
                    }
                    reports.push(report);
                }
                Err(err) => tracing::error!(root = %root, error = %err, "engine.root.failed"),
            }
        }
        self.settle(tree);
        TickReport {
            plan: Some(plan),
            roots: reports,
        }
    }

    /// Close the current pass and replay the engine's own writes as one
    /// follow-up request. [`Engine::tick`] calls this itself.
    pub fn settle(&mut self, tree: &Tree) {
        self.scheduler.end_pass(|root| tree.is_root(root));
    }

    /// Run every pass on `root` right away, outside the scheduler.
    ///
    /// Each pass is skipped when its signature is unchanged. When one pass
    /// has to run, every pass after it runs too, and those that rebuild are
    /// cleared first (last pass first) so they start from plain fragments.
    ///
    /// # Errors
    ///
    /// Fails when `root` is not a root of `tree`, or on a tree error.
    pub fn process_root(&mut self, tree: &mut Tree, root: NodeId) -> Result<RootReport, EngineError> {
        if !tree.is_root(root) {
            return Err(EngineError::UnknownRoot(root));
        }
        let before = tree.mutation_count();
        let mut report = RootReport::new(root);
        let streaming = self.streaming == Some(root);
        if streaming && self.options.stream.render_mode == RenderMode::Live {
            report.deferred = true;
            return Ok(report);
        }

        let order: Vec<Pass> = PASS_ORDER
            .into_iter()
            .filter(|&p| !(streaming && p == Pass::Typewriter))
            .collect();
        for &pass in order.iter().rev() {
            if passes::is_active(pass, &self.options) {
                continue;
            }
            let known = self.cache.forget(root, pass).is_some();
            if known || tree.marker_count(root, pass) > 0 {
                if annotator::clear(tree, root, pass)? > 0 {
                    report.cleared.push(pass);
                }
                if pass == Pass::Typewriter {
                    self.timings.remove(&root);
                }
            }
        }

        let active: Vec<Pass> = order
            .into_iter()
            .filter(|&p| passes::is_active(p, &self.options))
            .collect();
        let text = tree.text_content(root);
        let first_stale = active.iter().position(|&pass| {
            let sig = passes::signature(tree, root, pass, &self.options, &text);
            !self.cache.is_fresh(root, pass, &sig)
        });
        if let Some(first) = first_stale {
            let rerun = &active[first..];
            for &pass in rerun.iter().rev() {
                if passes::rebuilds(pass) {
                    annotator::clear(tree, root, pass)?;
                }
            }
            for &pass in rerun {
                self.run_pass(tree, root, pass, &mut report)?;
                let sig = passes::signature(tree, root, pass, &self.options, &text);
                self.cache.store(root, pass, sig);
                report.ran.push(pass);
            }
        }

        report.emitted_units = self.timings(root).iter().map(|t| t.units).sum();
        if streaming {
            report.stream = self.sync_stream(tree, root);
            report.emitted_units = self.streams.get(&root).map_or(0, |f| f.emitted);
        }
        report.mutations = tree.mutation_count() - before;
        tracing::debug!(
            root = %root,
            ran = ?report.ran,
            cleared = ?report.cleared,
            mutations = report.mutations,
            "engine.root"
        );
        Ok(report)
    }

    fn run_pass(
        &mut self,
        tree: &mut Tree,
        root: NodeId,
        pass: Pass,
        report: &mut RootReport,
    ) -> Result<(), EngineError> {
        match pass {
            Pass::Quote => {
                let wrapped = passes::run_quotes(tree, root, &self.options)?;
                tracing::trace!(root = %root, wrapped, "engine.pass.quote");
            }
            Pass::Typewriter => {
                let timings = typewriter::run(
                    tree,
                    root,
                    self.options.segmentation,
                    self.options.typewriter.step_ms,
                    self.timings(root),
                )?;
                report.timings.clone_from(&timings);
                self.timings.insert(root, timings);
            }
            Pass::Delimiter => {
                let applied = passes::run_delimiter(tree, root, &self.options)?;
                tracing::trace!(root = %root, wrapped = applied.wrapped, marked = applied.marked, "engine.pass.delimiter");
            }
            Pass::Locale => {
                let applied = passes::run_locale(tree, root, &self.options)?;
                tracing::trace!(root = %root, wrapped = applied.wrapped, marked = applied.marked, "engine.pass.locale");
            }
        }
        Ok(())
    }

    fn sync_stream(&mut self, tree: &Tree, root: NodeId) -> Option<StreamUpdate> {
        let granularity = self.options.stream.effect.granularity();
        let previous = self.streams.get(&root);
        let fingerprint = Fingerprint::of(tree, root);
        let unchanged = previous.is_some_and(|p| {
            granularity.is_some() && p.granularity == granularity && p.fingerprint == fingerprint
        });
        if unchanged {
            return None;
        }
        let base = previous
            .filter(|p| p.granularity == granularity)
            .map_or(0, |p| p.emitted);
        let mut frame = StreamFrame::build(
            tree,
            root,
            granularity,
            base,
            self.options.segmentation,
            &self.options.limits,
            self.options.stream.speed_ms,
        );
        frame.cursor = self.options.cursor_active();
        let patches = reconcile(previous.map_or(&[], |p| p.nodes.as_slice()), &frame.nodes);
        let update = StreamUpdate {
            patches,
            emitted: frame.emitted,
            new_units: frame.new_units().count(),
        };
        tracing::debug!(
            root = %root,
            base,
            emitted = update.emitted,
            patches = update.patches.len(),
            "engine.stream.frame"
        );
        self.streams.insert(root, frame);
        Some(update)
    }

    /// Remove every engine marker under `root` and forget its state.
    ///
    /// # Errors
    ///
    /// Fails when `root` is not a root of `tree`.
    pub fn clear_root(&mut self, tree: &mut Tree, root: NodeId) -> Result<usize, EngineError> {
        if !tree.is_root(root) {
            return Err(EngineError::UnknownRoot(root));
        }
        let mut cleared = 0;
        for pass in PASS_ORDER.into_iter().rev() {
            cleared += annotator::clear(tree, root, pass)?;
            self.cache.forget(root, pass);
        }
        self.timings.remove(&root);
        self.streams.remove(&root);
        Ok(cleared)
    }

    /// Drop all state held for `root`. Call when the host destroys it.
    pub fn teardown(&mut self, root: NodeId) {
        self.cache.evict_root(root);
        self.streams.remove(&root);
        self.timings.remove(&root);
        self.scheduler.forget(root);
        if self.streaming == Some(root) {
            self.streaming = None;
        }
        tracing::debug!(root = %root, "engine.teardown");
    }

    fn evict_missing(&mut self, tree: &Tree) {
        let gone: Vec<NodeId> = self
            .timings
            .keys()
            .chain(self.streams.keys())
            .copied()
            .chain(self.cache.roots())
            .filter(|&r| !tree.is_root(r))
            .collect();
        for root in gone {
            self.teardown(root);
        }
    }
}
