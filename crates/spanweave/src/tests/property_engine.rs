use quickcheck::QuickCheck;

use crate::{
    Engine, LifecycleEvent,
    options::{RenderMode, StreamEffect},
    tests::utils::{all_passes, document, fragments, quickcheck_tests},
};

/// Property: once a root is processed, processing it again changes nothing
/// and the text is the host's text.
#[test]
fn processing_is_idempotent_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(picks: Vec<u8>) -> bool {
        let (mut tree, root) = document(&picks);
        let text = tree.text_content(root);
        let mut engine = Engine::new(all_passes());
        engine.process_root(&mut tree, root).unwrap();
        let again = engine.process_root(&mut tree, root).unwrap();
        again.mutations == 0 && again.ran.is_empty() && tree.text_content(root) == text
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: clearing a processed root gives back the host's fragments,
/// one for one.
#[test]
fn clear_restores_fragments_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(picks: Vec<u8>) -> bool {
        let (mut tree, root) = document(&picks);
        let before = fragments(&tree, root);
        let mut engine = Engine::new(all_passes());
        engine.process_root(&mut tree, root).unwrap();
        engine.clear_root(&mut tree, root).unwrap();
        tree.total_marker_count(root) == 0 && fragments(&tree, root) == before
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: a buffered stream frame mirrors the root's text exactly.
#[test]
fn stream_frame_mirrors_text_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(picks: Vec<u8>, words: bool) -> bool {
        let (mut tree, root) = document(&picks);
        let mut options = all_passes();
        options.stream.render_mode = RenderMode::Buffered;
        options.stream.effect = if words {
            StreamEffect::Blur
        } else {
            StreamEffect::Typewriter
        };
        let mut engine = Engine::new(options);
        engine.on_event(LifecycleEvent::TokenReceived { root });
        engine.tick(&mut tree);
        engine
            .stream_frame(root)
            .is_some_and(|frame| frame.text() == tree.text_content(root))
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>, bool) -> bool);
}
