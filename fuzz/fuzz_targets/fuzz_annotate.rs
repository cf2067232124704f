#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spanweave::{Engine, EngineOptions, LocaleFontRule, NodeId, Role, Segmentation, Tree};

#[derive(Debug, Arbitrary)]
enum Parent {
    Root,
    Typewriter,
    Verbatim,
    Quote,
}

#[derive(Debug, Arbitrary)]
struct Piece {
    parent: Parent,
    text: String,
}

#[derive(Debug, Arbitrary)]
struct Input {
    pieces: Vec<Piece>,
    open: String,
    close: String,
    dialogue: bool,
    locale: bool,
    typewriter: bool,
    code_points: bool,
}

impl Input {
    fn options(&self) -> EngineOptions {
        let mut options = EngineOptions::default();
        if self.dialogue {
            options.dialogue.font = "Lora".into();
        }
        options.custom.font = "Fira Code".into();
        options.custom.open.clone_from(&self.open);
        options.custom.close.clone_from(&self.close);
        options.locale.enabled = self.locale;
        options.locale.rules = vec![
            LocaleFontRule::new("latin", "Inter"),
            LocaleFontRule::new("cjk", "Noto Sans SC"),
            LocaleFontRule::new("digits", "JetBrains Mono"),
        ];
        options.typewriter.enabled = self.typewriter;
        if self.code_points {
            options.segmentation = Segmentation::CodePoints;
        }
        options
    }

    fn document(&self) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.create_root();
        for piece in &self.pieces {
            let parent = match piece.parent {
                Parent::Root => root,
                Parent::Typewriter => tree.append_element(root, Role::Typewriter).unwrap(),
                Parent::Verbatim => tree.append_element(root, Role::Verbatim).unwrap(),
                Parent::Quote => tree.append_element(root, Role::Quote).unwrap(),
            };
            tree.append_text(parent, &piece.text).unwrap();
        }
        (tree, root)
    }
}

fn fragments(tree: &Tree, root: NodeId) -> Vec<String> {
    tree.descendants(root)
        .filter_map(|n| tree.text(n).map(str::to_owned))
        .collect()
}

fn annotate(input: &Input) {
    let (mut tree, root) = input.document();
    let before = fragments(&tree, root);
    let text = tree.text_content(root);

    let mut engine = Engine::new(input.options());
    engine.process_root(&mut tree, root).unwrap();
    assert_eq!(tree.text_content(root), text);

    let again = engine.process_root(&mut tree, root).unwrap();
    assert_eq!(again.mutations, 0, "second pass mutated the tree");

    engine.clear_root(&mut tree, root).unwrap();
    assert_eq!(tree.total_marker_count(root), 0);
    assert_eq!(fragments(&tree, root), before);
}

fuzz_target!(|input: Input| annotate(&input));
