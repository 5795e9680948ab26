//! Chain composition benchmarks: one full backdrop frame, and a settling scroll.
//! Run: cargo bench

use chainterm::chain::{compute_lighting, ChainView, Compositor, LayerRegistry};
use chainterm::progress::ProgressOptions;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_compose(c: &mut Criterion) {
    let compositor = Compositor::new(LayerRegistry::default());

    let mut group = c.benchmark_group("chain_frame");
    for progress in [0.0_f32, 0.5, 1.0] {
        group.bench_function(format!("compose_{progress}"), |b| {
            b.iter(|| black_box(compositor.compose(black_box(progress))));
        });
    }
    group.bench_function("lighting_full_turn", |b| {
        b.iter(|| {
            for angle in 0..360 {
                black_box(compute_lighting(black_box(angle as f32)));
            }
        });
    });
    group.finish();
}

fn bench_scroll_settle(c: &mut Criterion) {
    c.bench_function("chain_view_settle_120_frames", |b| {
        b.iter(|| {
            let mut view = ChainView::new(LayerRegistry::default(), ProgressOptions::chain_backdrop());
            view.on_scroll(0.8, 0.0);
            for frame in 0..120 {
                black_box(view.on_frame(frame as f64 * 1000.0 / 60.0));
            }
        });
    });
}

criterion_group!(benches, bench_compose, bench_scroll_settle);
criterion_main!(benches);
