//! End-to-end tests driving whole populations through mode changes.

use chaos_tree::config::{OrnamentFieldConfig, PhotoConfig, SceneConfig, ShapeKind, TreeConfig};
use chaos_tree::feature::{PhotoGallery, PhotoRef};
use chaos_tree::ornament::{transition_pulse, Instanced, OrnamentField};
use chaos_tree::progress::{Mode, Progress};
use chaos_tree::scene::Scene;
use chaos_tree::theme::Theme;
use glam::Vec3;

const DT: f32 = 1.0 / 60.0;

fn small_config(theme: Theme) -> SceneConfig {
    let mut config = SceneConfig::for_theme(theme);
    for field in &mut config.point_fields {
        field.count = field.count.min(300);
    }
    for field in &mut config.ornaments {
        field.count = field.count.min(40);
    }
    config
}

fn run_scene(scene: &mut Scene, seconds: f32) {
    let mut t = scene.elapsed();
    for _ in 0..(seconds / DT).round() as usize {
        t += DT;
        scene.update(DT, t);
    }
}

fn photo_gallery() -> PhotoGallery {
    let theme = SceneConfig::for_theme(Theme::Classic);
    PhotoGallery::new(&theme.photos, &theme.tree, 42)
}

fn refs(names: &[&str]) -> Vec<PhotoRef> {
    names.iter().map(|n| PhotoRef::from(*n)).collect()
}

// ============================================================================
// Scenario A: damped progress reaches the formed state
// ============================================================================

#[test]
fn test_progress_formed_within_five_seconds() {
    let mut progress = Progress::new(1.2);
    assert_eq!(progress.raw(), 0.0);
    for _ in 0..300 {
        progress = progress.advance(Mode::Formed, DT);
    }
    assert!(progress.raw() > 0.99, "progress was {}", progress.raw());
    assert!(progress.raw() <= 1.0);
}

// ============================================================================
// Scenario B: bell scales stay inside their range
// ============================================================================

#[test]
fn test_bell_scales_stay_in_range() {
    let config = OrnamentFieldConfig::new("bell", ShapeKind::Cone, 60).with_scale_range(0.25, 0.4);
    let tree = SceneConfig::for_theme(Theme::Classic).tree;
    let mut field = OrnamentField::build(&config, &tree, 2024);
    assert_eq!(field.len(), 60);

    let check = |field: &OrnamentField| {
        let pulse = transition_pulse(field.progress().raw());
        for (i, t) in field.transforms().iter().enumerate() {
            let base = field.base_scale(i).unwrap();
            assert!((0.25..=0.4).contains(&base), "base scale {}", base);
            let unpulsed = t.scale.x / pulse;
            assert!(
                (0.25 - 1e-5..=0.4 + 1e-5).contains(&unpulsed),
                "rendered scale {}",
                unpulsed
            );
        }
    };

    let mut time = 0.0;
    for (mode, frames) in [(Mode::Formed, 240), (Mode::Chaos, 90), (Mode::Formed, 400)] {
        for _ in 0..frames {
            time += DT;
            field.update(mode, DT, time);
            check(&field);
        }
    }
}

// ============================================================================
// Scenario C: removing a photo re-slots only the cards behind it
// ============================================================================

#[test]
fn test_remove_middle_photo_retargets_only_followers() {
    let mut gallery = photo_gallery();
    gallery.sync(&refs(&["a", "b", "c"]));
    let a_target = gallery.card(&"a".into()).unwrap().target();

    let change = gallery.remove_at(1);

    assert_eq!(gallery.references(), refs(&["a", "c"]));
    assert_eq!(change.removed, refs(&["b"]));
    assert!(change.added.is_empty());
    assert_eq!(change.retargeted, refs(&["c"]));

    let a = gallery.card(&"a".into()).unwrap();
    let c = gallery.card(&"c".into()).unwrap();
    assert_eq!(a.index(), 0);
    assert_eq!(a.target(), a_target);
    assert_eq!(c.index(), 1);
}

// ============================================================================
// Stability and continuity
// ============================================================================

#[test]
fn test_removal_never_moves_other_chaos_homes() {
    let mut gallery = photo_gallery();
    gallery.sync(&refs(&["p0", "p1", "p2", "p3", "p4", "p5"]));
    let before: Vec<(PhotoRef, Vec3)> = gallery
        .cards()
        .iter()
        .map(|c| (c.reference().clone(), c.chaos()))
        .collect();

    gallery.remove_at(3);
    gallery.remove_at(0);

    for card in gallery.cards() {
        let (_, chaos) = before
            .iter()
            .find(|(r, _)| r == card.reference())
            .unwrap();
        assert_eq!(card.chaos(), *chaos);
    }
}

#[test]
fn test_reslot_does_not_teleport() {
    let mut gallery = photo_gallery();
    gallery.sync(&refs(&["a", "b", "c", "d"]));
    // Halfway through assembling.
    for _ in 0..40 {
        gallery.update(Mode::Formed, DT);
    }
    let before: Vec<Vec3> = gallery.cards()[1..].iter().map(|c| c.position()).collect();

    gallery.remove_at(0);
    let after: Vec<Vec3> = gallery.cards().iter().map(|c| c.position()).collect();
    for (b, a) in before.iter().zip(&after) {
        assert!((*b - *a).length() < 1e-5, "card jumped from {} to {}", b, a);
    }

    gallery.update(Mode::Formed, DT);
    for (card, prev) in gallery.cards().iter().zip(&after) {
        let step = (card.position() - *prev).length();
        let slot_shift = (card.target() - *prev).length();
        assert!(step < 0.2 * slot_shift.max(1.0), "step {} too large", step);
    }
}

// ============================================================================
// Whole scene
// ============================================================================

#[test]
fn test_scene_endpoints() {
    let mut scene = Scene::with_seed(small_config(Theme::Snowy), 5);
    run_scene(&mut scene, 1.0);
    for field in scene.point_fields() {
        for (i, v) in field.vertices().iter().enumerate() {
            let p = field.interpolated_position(i).unwrap();
            assert!((p - v.chaos_pos).length() < 1e-4);
        }
    }

    scene.set_mode(Mode::Formed);
    run_scene(&mut scene, 40.0);
    for field in scene.point_fields() {
        assert!(field.progress().raw() > 0.999);
        for (i, v) in field.vertices().iter().enumerate() {
            let p = field.interpolated_position(i).unwrap();
            assert!((p - v.target_pos).length() < 1e-2);
        }
    }
    for family in scene.instanced() {
        assert!(family.is_empty() || family.progress().raw() > 0.999);
    }
}

#[test]
fn test_setting_mode_twice_changes_nothing() {
    let mut once = Scene::with_seed(small_config(Theme::Classic), 11);
    let mut twice = Scene::with_seed(small_config(Theme::Classic), 11);

    assert!(once.set_mode(Mode::Formed));
    assert!(twice.set_mode(Mode::Formed));
    assert!(!twice.set_mode(Mode::Formed));

    for step in 0..90 {
        let t = (step + 1) as f32 * DT;
        once.update(DT, t);
        twice.update(DT, t);
        if step == 30 {
            twice.set_mode(Mode::Formed);
        }
    }

    for (a, b) in once.instanced().zip(twice.instanced()) {
        assert_eq!(a.progress(), b.progress());
        assert_eq!(a.transforms(), b.transforms());
    }
    for (a, b) in once.point_fields().iter().zip(twice.point_fields()) {
        assert_eq!(a.progress(), b.progress());
    }
}

#[test]
fn test_same_seed_same_scene() {
    let a = Scene::with_seed(small_config(Theme::Icy), 77);
    let b = Scene::with_seed(small_config(Theme::Icy), 77);
    for (fa, fb) in a.point_fields().iter().zip(b.point_fields()) {
        assert_eq!(fa.vertices(), fb.vertices());
    }
    for (fa, fb) in a.instanced().zip(b.instanced()) {
        assert_eq!(fa.transforms(), fb.transforms());
    }
}

#[test]
fn test_empty_ornament_field_is_skipped() {
    let mut config = small_config(Theme::Classic);
    config
        .ornaments
        .push(OrnamentFieldConfig::new("nothing", ShapeKind::Box, 0));
    let mut scene = Scene::with_seed(config, 3);
    scene.set_mode(Mode::Formed);
    run_scene(&mut scene, 1.0);
    let empty = scene
        .instanced()
        .find(|f| f.label() == "nothing")
        .unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.progress().raw(), 0.0);
}

#[test]
fn test_gallery_independent_of_theme_tree() {
    let tree = TreeConfig {
        cone: chaos_tree::distribution::ConeShape::new(3.0, 8.0, 0.0),
        chaos_radius: 10.0,
    };
    let config = PhotoConfig {
        card_size: 1.0,
        margin: 0.5,
        frame_color: chaos_tree::config::Color::rgb8(255, 255, 255),
        damping: 2.0,
    };
    let mut gallery = PhotoGallery::new(&config, &tree, 1);
    gallery.sync(&refs(&["x", "y"]));
    for card in gallery.cards() {
        assert!(card.chaos().length() <= 10.0 + 1e-4);
        assert!(card.target().y >= 0.0 && card.target().y <= 8.0);
    }
}
