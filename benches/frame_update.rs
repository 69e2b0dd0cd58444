//! Benchmarks for per-frame CPU work and shader generation.
//!
//! Run with: `cargo bench`

use chaos_tree::config::{OrnamentFieldConfig, SceneConfig, ShapeKind};
use chaos_tree::field::{point_field_shader, FieldEffects};
use chaos_tree::ornament::{Instanced, OrnamentField};
use chaos_tree::progress::Mode;
use chaos_tree::scene::Scene;
use chaos_tree::theme::Theme;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const DT: f32 = 1.0 / 60.0;

fn bench_ornament_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("ornament_update");
    let tree = SceneConfig::for_theme(Theme::Classic).tree;

    for count in [100, 1_000, 10_000] {
        let config = OrnamentFieldConfig::new("balls", ShapeKind::Sphere, count)
            .with_scale_range(0.2, 0.35)
            .with_emissive(1.5);
        let mut field = OrnamentField::build(&config, &tree, 1);
        let mut time = 0.0;
        group.bench_with_input(BenchmarkId::new("formed", count), &count, |b, _| {
            b.iter(|| {
                time += DT;
                field.update(black_box(Mode::Formed), DT, time);
                black_box(field.transforms().len())
            })
        });
    }

    group.finish();
}

fn bench_scene_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_update");

    for theme in Theme::ALL {
        let mut scene = Scene::with_seed(SceneConfig::for_theme(theme), 7);
        scene.set_mode(Mode::Formed);
        let mut time = 0.0;
        group.bench_function(theme.name(), |b| {
            b.iter(|| {
                time += DT;
                scene.update(DT, time);
                black_box(scene.instanced().count())
            })
        });
    }

    group.finish();
}

fn bench_scene_build(c: &mut Criterion) {
    c.bench_function("scene_build_classic", |b| {
        b.iter(|| Scene::with_seed(black_box(SceneConfig::for_theme(Theme::Classic)), 3))
    });
}

fn bench_shader_gen(c: &mut Criterion) {
    use chaos_tree::config::PointFieldKind;

    let mut group = c.benchmark_group("point_field_shader");
    for kind in [PointFieldKind::Foliage, PointFieldKind::Lights] {
        let fx = FieldEffects::for_kind(kind);
        group.bench_function(format!("{:?}", kind), |b| {
            b.iter(|| black_box(point_field_shader(&fx)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_ornament_update,
    bench_scene_update,
    bench_scene_build,
    bench_shader_gen,
);
criterion_main!(benches);
