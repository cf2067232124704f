#![allow(missing_docs)]
#![allow(dead_code)]

use spanweave::{EngineOptions, LocaleFontRule, NodeId, Role, Tree};

/// Render `node` as bracketed markup: every element that carries markers,
/// or has a host role worth seeing, becomes `[label+tags:children]`.
pub fn render(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    render_into(tree, node, &mut out);
    out
}

fn render_into(tree: &Tree, node: NodeId, out: &mut String) {
    if let Some(text) = tree.text(node) {
        out.push_str(text);
        return;
    }
    let el = tree.element(node).expect("node is an element");
    let role = match el.role {
        Role::Verbatim => Some("verbatim"),
        Role::Quote => Some("quote"),
        Role::Typewriter => Some("typewriter"),
        Role::Container | Role::Unit | Role::Wrapper => None,
    };
    let parts: Vec<&str> = role
        .into_iter()
        .chain(el.markers().iter().map(|m| m.tag.as_str()))
        .collect();
    if !parts.is_empty() {
        out.push('[');
        out.push_str(&parts.join("+"));
        out.push(':');
    }
    for &child in tree.children(node) {
        render_into(tree, child, out);
    }
    if !parts.is_empty() {
        out.push(']');
    }
}

/// Fragment texts under `root`, in document order.
pub fn fragments(tree: &Tree, root: NodeId) -> Vec<String> {
    tree.descendants(root)
        .filter_map(|n| tree.text(n).map(str::to_owned))
        .collect()
}

pub fn custom(open: &str, close: &str) -> EngineOptions {
    let mut options = EngineOptions::default();
    options.custom.font = "Fira Code".into();
    options.custom.open = open.into();
    options.custom.close = close.into();
    options
}

pub fn with_locale(mut options: EngineOptions, keys: &[&str]) -> EngineOptions {
    options.locale.enabled = true;
    options.locale.rules = keys
        .iter()
        .map(|key| LocaleFontRule::new(*key, format!("{key} font")))
        .collect();
    options
}

pub fn with_dialogue(mut options: EngineOptions) -> EngineOptions {
    options.dialogue.font = "Lora".into();
    options
}
