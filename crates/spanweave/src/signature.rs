//! Per-root memo of the last state each pass produced.
use core::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

use crate::tree::{NodeId, Pass};

/// Cheap fingerprint of a root as one pass sees it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Hash of the configuration the pass ran with.
    pub config: u64,
    /// Length of the root's text, in chars.
    pub text_len: usize,
    /// Capped occurrence counts of the tokens the pass reacts to.
    pub tokens: Vec<usize>,
    /// Markers of this pass present under the root.
    pub markers: usize,
}

/// Fingerprint a pass configuration.
#[must_use]
pub fn config_hash(value: &impl Hash) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Signatures keyed by root and pass.
#[derive(Debug, Default)]
pub struct SignatureCache {
    entries: FxHashMap<(NodeId, Pass), Signature>,
}

impl SignatureCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signature stored for `root` and `pass`.
    #[must_use]
    pub fn get(&self, root: NodeId, pass: Pass) -> Option<&Signature> {
        self.entries.get(&(root, pass))
    }

    /// Whether `sig` matches what was stored after the last run.
    #[must_use]
    pub fn is_fresh(&self, root: NodeId, pass: Pass, sig: &Signature) -> bool {
        self.get(root, pass) == Some(sig)
    }

    /// Remember `sig` as the state `pass` left `root` in.
    pub fn store(&mut self, root: NodeId, pass: Pass, sig: Signature) {
        self.entries.insert((root, pass), sig);
    }

    /// Drop one signature so the pass reruns, returning it.
    pub fn forget(&mut self, root: NodeId, pass: Pass) -> Option<Signature> {
        self.entries.remove(&(root, pass))
    }

    /// Drop every signature held for `root`.
    pub fn evict_root(&mut self, root: NodeId) {
        self.entries.retain(|&(r, _), _| r != root);
    }

    /// Roots with at least one stored signature. May repeat a root.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().map(|&(root, _)| root)
    }

    /// Number of stored signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    #[test]
    fn freshness_and_eviction() {
        let mut tree = Tree::new();
        let a = tree.create_root();
        let b = tree.create_root();
        let sig = Signature {
            config: config_hash(&("<<", ">>")),
            text_len: 5,
            tokens: vec![1, 1],
            markers: 1,
        };
        let mut cache = SignatureCache::new();
        assert!(!cache.is_fresh(a, Pass::Delimiter, &sig));
        cache.store(a, Pass::Delimiter, sig.clone());
        cache.store(a, Pass::Locale, Signature::default());
        cache.store(b, Pass::Delimiter, sig.clone());
        assert!(cache.is_fresh(a, Pass::Delimiter, &sig));
        assert!(!cache.is_fresh(a, Pass::Quote, &sig));

        let changed = Signature {
            text_len: 6,
            ..sig.clone()
        };
        assert!(!cache.is_fresh(a, Pass::Delimiter, &changed));

        cache.evict_root(a);
        assert_eq!(cache.len(), 1);
        assert!(cache.is_fresh(b, Pass::Delimiter, &sig));
        cache.evict_root(b);
        assert!(cache.is_empty());
    }

    #[test]
    fn config_hash_tracks_values() {
        assert_eq!(config_hash(&("a", 1)), config_hash(&("a", 1)));
        assert_ne!(config_hash(&("a", 1)), config_hash(&("a", 2)));
    }
}
