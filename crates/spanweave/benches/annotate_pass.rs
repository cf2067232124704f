//! Benchmark – full annotation of one root, cold and settled
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spanweave::{Engine, EngineOptions, LocaleFontRule, Role, Tree};

const PARAGRAPH: &str = "She said “wait <<here>>”, then left. 他说「好的」 and 42 more… ";

fn options() -> EngineOptions {
    let mut options = EngineOptions::default();
    options.dialogue.font = "Lora".into();
    options.custom.font = "Fira Code".into();
    options.custom.open = "<<".into();
    options.custom.close = ">>".into();
    options.locale.enabled = true;
    options.locale.rules = vec![
        LocaleFontRule::new("latin", "Inter"),
        LocaleFontRule::new("cjk", "Noto Sans SC"),
    ];
    options
}

/// One root holding `paragraphs` fragments, every fourth inside a typewriter
/// container.
fn document(paragraphs: usize) -> (Tree, spanweave::NodeId) {
    let mut tree = Tree::new();
    let root = tree.create_root();
    for i in 0..paragraphs {
        let parent = if i % 4 == 3 {
            tree.append_element(root, Role::Typewriter).unwrap()
        } else {
            root
        };
        tree.append_text(parent, PARAGRAPH).unwrap();
    }
    (tree, root)
}

fn bench_annotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotate_pass");

    for &paragraphs in &[10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("cold", paragraphs), &paragraphs, |b, &n| {
            b.iter_batched(
                || document(n),
                |(mut tree, root)| {
                    let mut engine = Engine::new(options());
                    let report = engine.process_root(&mut tree, root).unwrap();
                    black_box(report.mutations);
                },
                criterion::BatchSize::LargeInput,
            );
        });

        let (mut tree, root) = document(paragraphs);
        let mut engine = Engine::new(options());
        engine.process_root(&mut tree, root).unwrap();
        group.bench_with_input(BenchmarkId::new("settled", paragraphs), &paragraphs, |b, _| {
            b.iter(|| {
                let report = engine.process_root(black_box(&mut tree), root).unwrap();
                black_box(report.mutations);
            });
        });
    }
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(3))
            .measurement_time(Duration::from_secs(10));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_annotate }
criterion_main!(benches);
