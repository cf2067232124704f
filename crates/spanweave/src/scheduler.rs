//! Coalesces change notifications into at most one pass per tick.
//!
//! Requests are merged, never queued: a full rescan absorbs any targeted
//! request, and targeted requests union their roots. While a pass runs,
//! notifications caused by the engine's own writes are parked and replayed
//! as one follow-up request once the pass settles.
use std::collections::BTreeSet;

use crate::tree::NodeId;

/// Why a notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// The host edited content under the target roots.
    ContentChanged,
    /// A streamed token landed in the target roots.
    TokenReceived,
    /// Generation into the target roots began.
    GenerationStarted,
    /// Generation was interrupted.
    GenerationStopped,
    /// Generation finished normally.
    GenerationEnded,
    /// Engine options changed.
    ConfigChanged,
    /// The engine's own pass mutated the target roots.
    EngineWrite,
}

/// Which roots a notification concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every root in the tree.
    Full,
    /// Only these roots. An empty list still schedules a tick.
    Roots(Vec<NodeId>),
}

/// A change report handed to [`ScanScheduler::notify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Why it was raised.
    pub reason: Reason,
    /// Roots it concerns.
    pub target: Target,
}

impl Notification {
    /// Notification for every root.
    #[must_use]
    pub fn full(reason: Reason) -> Self {
        Self {
            reason,
            target: Target::Full,
        }
    }

    /// Notification for `roots` only.
    #[must_use]
    pub fn roots(reason: Reason, roots: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            reason,
            target: Target::Roots(roots.into_iter().collect()),
        }
    }
}

/// Work selected for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPlan {
    /// Rescan every root.
    Full,
    /// Rescan only these roots, in ascending order.
    Roots(Vec<NodeId>),
}

/// Merges notifications and decides what the next tick scans.
#[derive(Debug, Default)]
pub struct ScanScheduler {
    full_requested: bool,
    pending: BTreeSet<NodeId>,
    frame_requested: bool,
    in_pass: bool,
    suppressed: BTreeSet<NodeId>,
}

impl ScanScheduler {
    /// Idle scheduler with nothing requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a notification.
    pub fn notify(&mut self, notification: Notification) {
        let Notification { reason, target } = notification;
        if self.in_pass && reason == Reason::EngineWrite {
            if let Target::Roots(roots) = target {
                self.suppressed.extend(roots);
            } else {
                self.full_requested = true;
                self.frame_requested = true;
            }
            return;
        }
        tracing::trace!(?reason, full = matches!(target, Target::Full), "scheduler.notify");
        self.request(target);
    }

    fn request(&mut self, target: Target) {
        match target {
            Target::Full => self.full_requested = true,
            Target::Roots(roots) => self.pending.extend(roots),
        }
        self.frame_requested = true;
    }

    /// Whether a tick has work to do.
    #[must_use]
    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// Whether a pass is running.
    #[must_use]
    pub fn in_pass(&self) -> bool {
        self.in_pass
    }

    /// Take the merged request and enter the pass. `None` when no tick was
    /// requested.
    pub fn begin_pass(&mut self) -> Option<ScanPlan> {
        if !self.frame_requested || self.in_pass {
            return None;
        }
        self.frame_requested = false;
        self.in_pass = true;
        if core::mem::take(&mut self.full_requested) {
            self.pending.clear();
            return Some(ScanPlan::Full);
        }
        Some(ScanPlan::Roots(
            core::mem::take(&mut self.pending).into_iter().collect(),
        ))
    }

    /// Leave the pass and replay parked engine writes as one request:
    /// targeted at the roots that are still live, or a full rescan when
    /// none are.
    pub fn end_pass(&mut self, mut is_live: impl FnMut(NodeId) -> bool) {
        self.in_pass = false;
        if self.suppressed.is_empty() {
            return;
        }
        let live: Vec<NodeId> = core::mem::take(&mut self.suppressed)
            .into_iter()
            .filter(|&r| is_live(r))
            .collect();
        tracing::trace!(replayed = live.len(), "scheduler.settle");
        if live.is_empty() {
            self.request(Target::Full);
        } else {
            self.request(Target::Roots(live));
        }
    }

    /// Drop any pending work for `root`.
    pub fn forget(&mut self, root: NodeId) {
        self.pending.remove(&root);
        self.suppressed.remove(&root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    fn roots(n: usize) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let ids = (0..n).map(|_| tree.create_root()).collect();
        (tree, ids)
    }

    #[test]
    fn notifications_coalesce_into_one_pass() {
        let (_, r) = roots(3);
        let mut s = ScanScheduler::new();
        assert_eq!(s.begin_pass(), None);
        s.notify(Notification::roots(Reason::ContentChanged, [r[1]]));
        s.notify(Notification::roots(Reason::TokenReceived, [r[0], r[1]]));
        assert!(s.frame_requested());
        assert_eq!(s.begin_pass(), Some(ScanPlan::Roots(vec![r[0], r[1]])));
        s.end_pass(|_| true);
        assert_eq!(s.begin_pass(), None);
    }

    #[test]
    fn full_absorbs_targeted() {
        let (_, r) = roots(2);
        let mut s = ScanScheduler::new();
        s.notify(Notification::roots(Reason::ContentChanged, [r[0]]));
        s.notify(Notification::full(Reason::GenerationEnded));
        s.notify(Notification::roots(Reason::ContentChanged, [r[1]]));
        assert_eq!(s.begin_pass(), Some(ScanPlan::Full));
        s.end_pass(|_| true);
        assert_eq!(s.begin_pass(), None);
    }

    #[test]
    fn empty_target_still_schedules_a_tick() {
        let mut s = ScanScheduler::new();
        s.notify(Notification::roots(Reason::GenerationStarted, []));
        assert_eq!(s.begin_pass(), Some(ScanPlan::Roots(vec![])));
    }

    #[test]
    fn engine_writes_are_replayed_after_the_pass() {
        let (_, r) = roots(2);
        let mut s = ScanScheduler::new();
        s.notify(Notification::full(Reason::ConfigChanged));
        assert_eq!(s.begin_pass(), Some(ScanPlan::Full));
        s.notify(Notification::roots(Reason::EngineWrite, [r[0], r[1]]));
        s.notify(Notification::roots(Reason::EngineWrite, [r[0]]));
        assert!(!s.frame_requested());

        s.end_pass(|id| id == r[1]);
        assert_eq!(s.begin_pass(), Some(ScanPlan::Roots(vec![r[1]])));
    }

    #[test]
    fn dead_suppressed_roots_fall_back_to_full() {
        let (_, r) = roots(1);
        let mut s = ScanScheduler::new();
        s.notify(Notification::roots(Reason::ContentChanged, [r[0]]));
        s.begin_pass();
        s.notify(Notification::roots(Reason::EngineWrite, [r[0]]));
        s.end_pass(|_| false);
        assert_eq!(s.begin_pass(), Some(ScanPlan::Full));
    }

    #[test]
    fn host_notifications_during_a_pass_are_not_suppressed() {
        let (_, r) = roots(1);
        let mut s = ScanScheduler::new();
        s.notify(Notification::full(Reason::ConfigChanged));
        s.begin_pass();
        s.notify(Notification::roots(Reason::TokenReceived, [r[0]]));
        assert!(s.frame_requested());
        s.end_pass(|_| true);
        assert_eq!(s.begin_pass(), Some(ScanPlan::Roots(vec![r[0]])));
    }
}
