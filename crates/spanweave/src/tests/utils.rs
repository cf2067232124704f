use crate::{
    options::{EngineOptions, LocaleFontRule},
    tree::{NodeId, Role, Tree},
};

/// Text pieces the generated documents are made of. Chosen so that every
/// pass has something to find and every exclusion rule gets hit.
const PIECES: [&str; 14] = [
    "<<", ">>", "\"", "“", "”", "'", "「", "」", "ab", "中文", " ", "\n", "é", "42",
];

pub fn quickcheck_tests() -> u64 {
    #[cfg(not(any(miri, feature = "test-fast")))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(any(miri, feature = "test-fast"))]
    let tests = 10;
    tests
}

/// Concatenate pieces picked by `picks`.
pub fn text_from(picks: &[u8]) -> String {
    picks
        .iter()
        .map(|&p| PIECES[usize::from(p) % PIECES.len()])
        .collect()
}

/// Build a one-root document from `picks`.
///
/// Every fifth pick starts a new fragment, either directly under the root or
/// inside a fresh child element whose role is picked too.
pub fn document(picks: &[u8]) -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.create_root();
    for chunk in picks.chunks(5) {
        let parent = match chunk[0] % 6 {
            1 => tree.append_element(root, Role::Typewriter),
            2 => tree.append_element(root, Role::Verbatim),
            3 => tree.append_element(root, Role::Quote),
            _ => Ok(root),
        }
        .unwrap();
        tree.append_text(parent, &text_from(chunk)).unwrap();
    }
    (tree, root)
}

/// Fragment texts in document order.
pub fn fragments(tree: &Tree, root: NodeId) -> Vec<String> {
    tree.descendants(root)
        .filter_map(|n| tree.text(n).map(str::to_owned))
        .collect()
}

/// Every pass switched on.
pub fn all_passes() -> EngineOptions {
    let mut options = EngineOptions::default();
    options.dialogue.font = "Lora".into();
    options.custom.font = "Fira Code".into();
    options.custom.open = "<<".into();
    options.custom.close = ">>".into();
    options.locale.enabled = true;
    options.locale.rules = vec![
        LocaleFontRule::new("latin", "Inter"),
        LocaleFontRule::new("cjk", "Noto Sans SC"),
        LocaleFontRule::new("digits", "JetBrains Mono"),
    ];
    options
}
