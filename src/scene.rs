//! Scene composer.
//!
//! Builds every population from a [`SceneConfig`] and forwards the shared
//! mode value to each of them once per frame. Components never look the mode
//! up themselves and never touch each other's state, so update order does
//! not matter.
//!
//! # Example
//!
//! ```ignore
//! use chaos_tree::prelude::*;
//!
//! let mut scene = Scene::new(SceneConfig::for_theme(Theme::Snowy));
//! scene.gallery_mut().add(PhotoRef::from("family.jpg"));
//! scene.set_mode(Mode::Formed);
//!
//! // every frame
//! let (elapsed, dt) = clock.tick();
//! scene.update(dt, elapsed);
//! ```

use crate::config::SceneConfig;
use crate::feature::{PhotoGallery, Star};
use crate::field::PointField;
use crate::ornament::{Instanced, LeafField, OrnamentField, RibbonField, TrunkField};
use crate::progress::{Mode, ModeSignal};
use crate::spawn::entropy_seed;
use crate::theme::Theme;
use glam::Vec3;

/// Distinct seed for population `salt` of a scene.
fn sub_seed(base: u64, salt: u64) -> u64 {
    base ^ salt.wrapping_add(1).wrapping_mul(0xD1B5_4A32_D192_ED03)
}

const SALT_TRUNK: u64 = 100;
const SALT_LEAVES: u64 = 101;
const SALT_RIBBON: u64 = 102;
const SALT_STAR: u64 = 103;
const SALT_PHOTOS: u64 = 104;
const SALT_POINTS: u64 = 200;
const SALT_ORNAMENTS: u64 = 300;

/// Every animated population plus the mode they follow.
pub struct Scene {
    config: SceneConfig,
    seed: u64,
    signal: ModeSignal,
    point_fields: Vec<PointField>,
    ornaments: Vec<OrnamentField>,
    trunk: TrunkField,
    leaves: LeafField,
    ribbon: RibbonField,
    star: Star,
    gallery: PhotoGallery,
    elapsed: f32,
}

impl Scene {
    /// Build a scene with fresh randomness.
    pub fn new(config: SceneConfig) -> Self {
        Self::with_seed(config, entropy_seed())
    }

    /// Build a scene from a fixed seed.
    pub fn with_seed(config: SceneConfig, seed: u64) -> Self {
        let gallery = PhotoGallery::new(&config.photos, &config.tree, sub_seed(seed, SALT_PHOTOS));
        let mut scene = Self {
            point_fields: Vec::new(),
            ornaments: Vec::new(),
            trunk: TrunkField::build(&config.trunk, &config.tree, sub_seed(seed, SALT_TRUNK)),
            leaves: LeafField::build(&config.leaves, &config.tree, sub_seed(seed, SALT_LEAVES)),
            ribbon: RibbonField::build(&config.ribbon, &config.tree, sub_seed(seed, SALT_RIBBON)),
            star: Star::build(&config.star, &config.tree, sub_seed(seed, SALT_STAR)),
            gallery,
            signal: ModeSignal::new(Mode::Chaos),
            elapsed: 0.0,
            seed,
            config,
        };
        scene.build_fields();
        scene.log_counts();
        scene
    }

    fn build_fields(&mut self) {
        let tree = &self.config.tree;
        self.point_fields = self
            .config
            .point_fields
            .iter()
            .enumerate()
            .map(|(i, c)| PointField::build(c, tree, sub_seed(self.seed, SALT_POINTS + i as u64)))
            .collect();
        self.ornaments = self
            .config
            .ornaments
            .iter()
            .enumerate()
            .map(|(i, c)| {
                OrnamentField::build(c, tree, sub_seed(self.seed, SALT_ORNAMENTS + i as u64))
            })
            .collect();
    }

    fn log_counts(&self) {
        let points: usize = self.point_fields.iter().map(PointField::len).sum();
        let instances: usize = self.instanced().map(|f| f.len()).sum();
        tracing::info!(
            theme = self.config.theme.name(),
            point_fields = self.point_fields.len(),
            points,
            instanced_families = self.instanced().count(),
            instances,
            photos = self.gallery.len(),
            "scene built"
        );
        for field in &self.ornaments {
            tracing::debug!(field = field.label(), count = field.len(), "ornament field");
        }
    }

    /// Switch to another theme's tables.
    ///
    /// Every population is rebuilt; the mode and the photo gallery carry over,
    /// with each card gliding to its slot on the new tree.
    pub fn set_theme(&mut self, theme: Theme) {
        if theme == self.config.theme {
            return;
        }
        let config = SceneConfig::for_theme(theme);
        let tree = &config.tree;
        self.seed = entropy_seed();
        self.trunk = TrunkField::build(&config.trunk, tree, sub_seed(self.seed, SALT_TRUNK));
        self.leaves = LeafField::build(&config.leaves, tree, sub_seed(self.seed, SALT_LEAVES));
        self.ribbon = RibbonField::build(&config.ribbon, tree, sub_seed(self.seed, SALT_RIBBON));
        self.star = Star::build(&config.star, tree, sub_seed(self.seed, SALT_STAR));
        self.gallery.retheme(&config.photos, tree);
        self.config = config;
        self.build_fields();
        tracing::info!(theme = theme.name(), "theme switched");
        self.log_counts();
    }

    #[inline]
    pub fn theme(&self) -> Theme {
        self.config.theme
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.signal.get()
    }

    /// Set the mode. Setting the current mode again changes nothing.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        self.signal.set(mode)
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.signal.toggle()
    }

    /// Seconds of animated time seen by the last update.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance every population by `dt` seconds; `elapsed` drives the
    /// time-based decoration.
    pub fn update(&mut self, dt: f32, elapsed: f32) {
        let mode = self.signal.get();
        self.elapsed = elapsed;
        for field in &mut self.point_fields {
            field.update(mode, dt);
        }
        for family in self.instanced_mut() {
            family.update(mode, dt, elapsed);
        }
        self.gallery.update(mode, dt);
    }

    pub fn point_fields(&self) -> &[PointField] {
        &self.point_fields
    }

    pub fn ornaments(&self) -> &[OrnamentField] {
        &self.ornaments
    }

    pub fn trunk(&self) -> &TrunkField {
        &self.trunk
    }

    pub fn leaves(&self) -> &LeafField {
        &self.leaves
    }

    pub fn ribbon(&self) -> &RibbonField {
        &self.ribbon
    }

    pub fn star(&self) -> &Star {
        &self.star
    }

    pub fn gallery(&self) -> &PhotoGallery {
        &self.gallery
    }

    pub fn gallery_mut(&mut self) -> &mut PhotoGallery {
        &mut self.gallery
    }

    /// Every instanced family, in a stable draw order.
    pub fn instanced(&self) -> impl Iterator<Item = &dyn Instanced> {
        let fixed: [&dyn Instanced; 4] = [&self.trunk, &self.leaves, &self.ribbon, &self.star];
        fixed
            .into_iter()
            .chain(self.ornaments.iter().map(|o| o as &dyn Instanced))
    }

    fn instanced_mut(&mut self) -> impl Iterator<Item = &mut dyn Instanced> {
        let fixed: [&mut dyn Instanced; 4] = [
            &mut self.trunk,
            &mut self.leaves,
            &mut self.ribbon,
            &mut self.star,
        ];
        fixed
            .into_iter()
            .chain(self.ornaments.iter_mut().map(|o| o as &mut dyn Instanced))
    }

    /// Clear color in linear RGB.
    pub fn background(&self) -> Vec3 {
        self.config.background.linear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::PhotoRef;

    fn small_scene(theme: Theme) -> Scene {
        let mut config = SceneConfig::for_theme(theme);
        for field in &mut config.point_fields {
            field.count = field.count.min(200);
        }
        Scene::with_seed(config, 99)
    }

    #[test]
    fn test_scene_starts_chaotic() {
        let scene = small_scene(Theme::Classic);
        assert_eq!(scene.mode(), Mode::Chaos);
        assert!(scene.instanced().all(|f| f.progress().raw() == 0.0));
    }

    #[test]
    fn test_update_reaches_every_population() {
        let mut scene = small_scene(Theme::Snowy);
        scene.set_mode(Mode::Formed);
        scene.update(0.5, 0.5);
        assert!(scene.point_fields().iter().all(|f| f.progress().raw() > 0.0));
        assert!(scene
            .instanced()
            .filter(|f| !f.is_empty())
            .all(|f| f.progress().raw() > 0.0));
    }

    #[test]
    fn test_draw_order_is_stable() {
        let scene = small_scene(Theme::Icy);
        let a: Vec<String> = scene.instanced().map(|f| f.label().to_string()).collect();
        let b: Vec<String> = scene.instanced().map(|f| f.label().to_string()).collect();
        assert_eq!(a, b);
        assert_eq!(&a[..4], ["trunk", "leaves", "ribbon", "star"]);
    }

    #[test]
    fn test_theme_switch_keeps_mode_and_photos() {
        let mut scene = small_scene(Theme::Classic);
        scene.set_mode(Mode::Formed);
        scene.gallery_mut().add("a.png".into());
        scene.set_theme(Theme::Snowy);
        assert_eq!(scene.theme(), Theme::Snowy);
        assert_eq!(scene.mode(), Mode::Formed);
        assert_eq!(scene.gallery().len(), 1);
        assert!(scene
            .point_fields()
            .iter()
            .any(|f| f.kind() == crate::config::PointFieldKind::Snow));
    }

    #[test]
    fn test_theme_switch_moves_photos_onto_new_tree() {
        let mut config = SceneConfig::for_theme(Theme::Classic);
        config.point_fields.clear();
        config.tree.cone = crate::distribution::ConeShape::new(3.0, 40.0, 0.0);
        config.tree.chaos_radius = 5.0;
        let mut scene = Scene::with_seed(config, 8);
        scene
            .gallery_mut()
            .sync(&[PhotoRef::from("a.png"), PhotoRef::from("b.png")]);
        scene.set_mode(Mode::Formed);
        for step in 1..=30 {
            scene.update(1.0 / 60.0, step as f32 / 60.0);
        }
        let before: Vec<(Vec3, Vec3)> = scene
            .gallery()
            .cards()
            .iter()
            .map(|c| (c.chaos(), c.position()))
            .collect();

        scene.set_theme(Theme::Snowy);
        let snowy = SceneConfig::for_theme(Theme::Snowy);
        let apex = snowy.tree.cone.apex_y();
        assert_eq!(scene.gallery().card_size(), snowy.photos.card_size);
        for (card, (chaos, position)) in scene.gallery().cards().iter().zip(&before) {
            assert!(card.target().y <= apex, "card hangs above the tree: {}", card.target().y);
            assert_eq!(card.chaos(), *chaos);
            assert_eq!(card.position(), *position);
        }

        for step in 31..=1800 {
            scene.update(1.0 / 60.0, step as f32 / 60.0);
        }
        for card in scene.gallery().cards() {
            assert!((card.position() - card.target()).length() < 1e-2);
        }
    }

    #[test]
    fn test_seeds_differ_per_population() {
        assert_ne!(sub_seed(1, SALT_TRUNK), sub_seed(1, SALT_LEAVES));
        assert_ne!(sub_seed(1, SALT_POINTS), sub_seed(2, SALT_POINTS));
    }
}
