#![expect(missing_docs)]

mod common;

use common::custom;
use spanweave::{
    Engine, EngineOptions, LifecycleEvent, Patch, RenderMode, ScanPlan, StreamEffect,
    StreamFrame, StreamNode, Tree, apply_patches,
};

fn buffered(effect: StreamEffect) -> EngineOptions {
    let mut options = custom("<<", ">>");
    options.stream.render_mode = RenderMode::Buffered;
    options.stream.effect = effect;
    options
}

#[cfg(feature = "clusters")]
fn new_texts(frame: &StreamFrame) -> Vec<&str> {
    frame.new_units().map(|u| u.text.as_str()).collect()
}

/// One line per node: kind, text, then tags.
fn describe(frame: &StreamFrame) -> String {
    frame
        .nodes
        .iter()
        .map(|node| match node {
            StreamNode::Unit(unit) => format!(
                "unit {:?} #{} new={} +{} {}ms {:?}",
                unit.text, unit.ordinal, unit.is_new, unit.stagger, unit.delay_ms, unit.tags
            ),
            StreamNode::Space { text, tags } => format!("space {text:?} {tags:?}"),
            StreamNode::Static { text, tags } => format!("static {text:?} {tags:?}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(feature = "clusters")]
#[test]
fn appended_words_are_the_only_new_units() {
    let mut tree = Tree::new();
    let root = tree.create_root();
    let fragment = tree.append_text(root, "one two three four five").unwrap();
    let mut engine = Engine::new(buffered(StreamEffect::Blur));

    engine.on_event(LifecycleEvent::TokenReceived { root });
    let first = engine.tick(&mut tree);
    let update = first.roots[0].stream.as_ref().unwrap();
    assert_eq!((update.emitted, update.new_units), (5, 5));

    tree.push_text(fragment, " six seven").unwrap();
    engine.on_event(LifecycleEvent::TokenReceived { root });
    let second = engine.tick(&mut tree);
    let report = &second.roots[0];
    let update = report.stream.as_ref().unwrap();
    assert_eq!((update.emitted, update.new_units), (7, 2));
    assert_eq!(report.emitted_units, 7);

    let frame = engine.stream_frame(root).unwrap();
    assert_eq!(new_texts(frame), vec!["six", "seven"]);
    assert_eq!(frame.text(), "one two three four five six seven");
}

#[test]
fn patches_replay_onto_the_previous_frame() {
    let mut tree = Tree::new();
    let root = tree.create_root();
    let fragment = tree.append_text(root, "ab").unwrap();
    let mut engine = Engine::new(buffered(StreamEffect::Typewriter));
    engine.on_event(LifecycleEvent::GenerationStarted { root });
    engine.on_event(LifecycleEvent::TokenReceived { root });
    engine.tick(&mut tree);
    let mut mirror = engine.stream_frame(root).unwrap().nodes.clone();

    tree.push_text(fragment, "c").unwrap();
    engine.on_event(LifecycleEvent::TokenReceived { root });
    let report = engine.tick(&mut tree);
    let patches = &report.roots[0].stream.as_ref().unwrap().patches;
    apply_patches(&mut mirror, patches);

    let frame = engine.stream_frame(root).unwrap();
    assert_eq!(mirror, frame.nodes);
    assert!(matches!(patches.last(), Some(Patch::Insert { index: 2, .. })));
    assert!(frame.cursor);
    insta::assert_snapshot!(describe(frame), @r#"
    unit "a" #0 new=false +0 0ms []
    unit "b" #1 new=false +0 0ms []
    unit "c" #2 new=true +0 0ms []
    "#);
}

#[test]
fn unchanged_content_skips_the_frame() {
    let mut tree = Tree::new();
    let root = tree.create_root();
    tree.append_text(root, "ab").unwrap();
    let mut engine = Engine::new(buffered(StreamEffect::Typewriter));
    engine.on_event(LifecycleEvent::TokenReceived { root });
    engine.tick(&mut tree);

    engine.on_event(LifecycleEvent::TokenReceived { root });
    let report = engine.tick(&mut tree);
    assert_eq!(report.roots[0].stream, None);
    assert_eq!(report.roots[0].emitted_units, 2);
}

#[test]
fn delimited_units_carry_their_tags() {
    let mut tree = Tree::new();
    let root = tree.create_root();
    tree.append_text(root, "a <<b>>").unwrap();
    let mut engine = Engine::new(buffered(StreamEffect::Typewriter));
    engine.on_event(LifecycleEvent::TokenReceived { root });
    engine.tick(&mut tree);

    let frame = engine.stream_frame(root).unwrap();
    insta::assert_snapshot!(describe(frame), @r#"
    unit "a" #0 new=true +0 0ms []
    space " " []
    unit "<" #1 new=true +1 20ms ["custom"]
    unit "<" #2 new=true +2 40ms ["custom"]
    unit "b" #3 new=true +3 60ms ["custom"]
    unit ">" #4 new=true +4 80ms ["custom"]
    unit ">" #5 new=true +5 100ms ["custom"]
    "#);
}

#[test]
fn no_effect_mirrors_fragments_statically() {
    let mut tree = Tree::new();
    let root = tree.create_root();
    tree.append_text(root, "a <<b>>").unwrap();
    let mut engine = Engine::new(buffered(StreamEffect::None));
    engine.on_event(LifecycleEvent::TokenReceived { root });
    engine.tick(&mut tree);

    let frame = engine.stream_frame(root).unwrap();
    assert_eq!(frame.emitted, 0);
    assert!(!frame.cursor);
    insta::assert_snapshot!(describe(frame), @r#"
    static "a " []
    static "<<b>>" ["custom"]
    "#);
}

#[test]
fn live_mode_leaves_the_streaming_root_alone() {
    let mut tree = Tree::new();
    let root = tree.create_root();
    let other = tree.create_root();
    tree.append_text(root, "<<a>>").unwrap();
    tree.append_text(other, "<<b>>").unwrap();
    let mut engine = Engine::new(custom("<<", ">>"));

    engine.on_event(LifecycleEvent::GenerationStarted { root });
    let report = engine.tick(&mut tree);
    assert_eq!(report.plan, Some(ScanPlan::Full));
    assert!(report.roots[0].deferred);
    assert!(!report.roots[1].deferred);
    assert_eq!(tree.total_marker_count(root), 0);
    assert_eq!(tree.total_marker_count(other), 1);
    assert!(engine.stream_frame(root).is_none());

    engine.on_event(LifecycleEvent::GenerationStopped);
    let report = engine.tick(&mut tree);
    assert_eq!(report.plan, Some(ScanPlan::Full));
    assert_eq!(tree.total_marker_count(root), 1);
}

#[test]
fn ending_generation_drops_the_frame() {
    let mut tree = Tree::new();
    let root = tree.create_root();
    tree.append_text(root, "ab").unwrap();
    let mut engine = Engine::new(buffered(StreamEffect::Glow));
    engine.on_event(LifecycleEvent::TokenReceived { root });
    engine.tick(&mut tree);
    assert!(engine.stream_frame(root).is_some());

    engine.on_event(LifecycleEvent::GenerationEnded);
    assert_eq!(engine.streaming_root(), None);
    assert!(engine.stream_frame(root).is_none());
}
