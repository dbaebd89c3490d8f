use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use curvex_core::{DashedDriver, StimulusDriver, TrialSpec, Visibility};
use curvex_render::{Scene, SkiaRenderer};
use curvex_timing::HighPrecisionTimer;

fn harness() -> (SkiaRenderer, Scene, Vec<u8>, HighPrecisionTimer) {
    let width = 1280u32;
    let height = 720u32;
    let r = SkiaRenderer::new(width, height, None).unwrap();

    let scene = Scene::new();
    let spec = TrialSpec {
        is_dashed: true,
        arrow_point_index: 300,
        ..TrialSpec::default()
    };
    let mut dashed = scene.dashed();
    dashed.reset_to(&spec);
    dashed.show();
    dashed.start_motion();
    let mut arrow = scene.arrow();
    arrow.reset_to(&spec);
    arrow.show();

    let fb = vec![0u8; (width * height * 4) as usize];
    (r, scene, fb, HighPrecisionTimer::new())
}

pub fn bench_dashed_frame(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_frame");
    g.sample_size(40);

    g.bench_function("dashed_with_arrow", |b| {
        b.iter_batched(
            harness,
            |(mut r, scene, mut fb, mut t)| {
                scene.state_mut().advance(1.0 / 90.0);
                let stats = r.render_frame(&scene.state(), &mut fb, &mut t);
                black_box(stats.is_ok());
            },
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_dashed_frame);
criterion_main!(benches);
