//! Photo cards hung on the tree.
//!
//! The gallery is keyed by photo reference, not by position. When a photo is
//! removed, every other card keeps its chaos home and its animation state;
//! only cards whose slot (index or total) changed get a new target. Each card
//! steers a damped display target toward its slot target, so a reshuffle
//! reads as a glide rather than a jump.

use crate::config::{PhotoConfig, TreeConfig};
use crate::distribution::{spiral_slot_position, ConeShape};
use crate::mesh::Mesh;
use crate::ornament::{outward_rotation, sway, tumble};
use crate::progress::{damp_vec3, Mode, Progress};
use crate::record::EntityRecord;
use crate::spawn::SpawnContext;
use glam::{Mat4, Quat, Vec3};
use std::fmt;

/// Rate (1/s) at which a card's display target follows a new slot.
pub const RESLOT_DAMPING: f32 = 2.5;
/// Height of a card relative to its width.
const CARD_ASPECT: f32 = 1.2;

/// Identity of one photo: whatever the host uses to find the image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PhotoRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PhotoRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tumble and sway constants drawn when a card is created.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CardMotion {
    axis: Vec3,
    phase: f32,
    speed: f32,
}

/// One card and its animation record.
#[derive(Debug, Clone)]
pub struct PhotoCard {
    reference: PhotoRef,
    record: EntityRecord<CardMotion>,
    index: usize,
    total: usize,
    display_target: Vec3,
    progress: Progress,
}

impl PhotoCard {
    #[inline]
    pub fn reference(&self) -> &PhotoRef {
        &self.reference
    }

    /// Chaos home, fixed for the card's lifetime.
    #[inline]
    pub fn chaos(&self) -> Vec3 {
        self.record.chaos()
    }

    /// Slot index in the current gallery order.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Slot target for the current (index, total).
    #[inline]
    pub fn target(&self) -> Vec3 {
        self.record.target()
    }

    /// Where the card is currently steering toward.
    #[inline]
    pub fn display_target(&self) -> Vec3 {
        self.display_target
    }

    #[inline]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Rendered position.
    pub fn position(&self) -> Vec3 {
        self.chaos().lerp(self.display_target, self.progress.eased())
    }

    /// Rendered orientation at `time`.
    pub fn rotation(&self, time: f32) -> Quat {
        let CardMotion { axis, phase, speed } = self.record.params;
        let chaos_rot = tumble(axis, speed * 0.5, phase, time);
        let formed_rot = outward_rotation(self.display_target) * sway(phase, speed, time);
        chaos_rot.slerp(formed_rot, self.progress.eased())
    }

    /// Model matrix shared by every part of the card.
    pub fn model_matrix(&self, card_size: f32, time: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(card_size),
            self.rotation(time),
            self.position(),
        )
    }

    fn advance(&mut self, mode: Mode, dt: f32) {
        self.progress = self.progress.advance(mode, dt);
        self.display_target = damp_vec3(self.display_target, self.target(), RESLOT_DAMPING, dt);
    }

    /// Point the card at a new slot; returns whether the target moved.
    fn reslot(&mut self, index: usize, total: usize, slots: ConeShape) -> bool {
        let target = spiral_slot_position(index, total, slots);
        let is_new = self.total == 0;
        let moved = !is_new && target != self.target();
        if is_new {
            self.display_target = target;
        }
        self.index = index;
        self.total = total;
        self.record.retarget(target);
        moved
    }
}

/// One piece of a card. All parts share the card's model matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPart {
    /// White backing plane.
    Backing,
    /// Image-mapped plane, slightly in front of the backing.
    Inset,
    /// Small hanging ring above the card.
    Ring,
}

impl CardPart {
    pub const ALL: [CardPart; 3] = [CardPart::Backing, CardPart::Inset, CardPart::Ring];

    pub fn label(self) -> &'static str {
        match self {
            CardPart::Backing => "Photo Backing",
            CardPart::Inset => "Photo Inset",
            CardPart::Ring => "Photo Ring",
        }
    }

    /// Part geometry in card space (unit card width).
    pub fn mesh(self) -> Mesh {
        let height = CARD_ASPECT;
        match self {
            CardPart::Backing => Mesh::quad(1.0, height),
            CardPart::Inset => Mesh::quad(0.86, 0.86).translated(Vec3::new(0.0, height * 0.08, 0.01)),
            CardPart::Ring => {
                Mesh::ring(0.05, 0.08, 24).translated(Vec3::new(0.0, height * 0.5 + 0.1, 0.0))
            }
        }
    }
}

/// What a [`PhotoGallery::sync`] changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryChange {
    pub added: Vec<PhotoRef>,
    pub removed: Vec<PhotoRef>,
    /// Surviving cards whose slot target moved.
    pub retargeted: Vec<PhotoRef>,
}

impl GalleryChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.retargeted.is_empty()
    }
}

/// Ordered set of photo cards keyed by reference.
#[derive(Debug, Clone)]
pub struct PhotoGallery {
    cards: Vec<PhotoCard>,
    slots: ConeShape,
    chaos_radius: f32,
    damping: f32,
    card_size: f32,
    seed: u64,
    /// Cards ever created; gives each new card its own random stream.
    spawned: usize,
}

impl PhotoGallery {
    pub fn new(config: &PhotoConfig, tree: &TreeConfig, seed: u64) -> Self {
        Self {
            cards: Vec::new(),
            slots: tree.cone.inflated(config.margin),
            chaos_radius: tree.chaos_radius,
            damping: config.damping,
            card_size: config.card_size,
            seed,
            spawned: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[inline]
    pub fn card_size(&self) -> f32 {
        self.card_size
    }

    pub fn cards(&self) -> &[PhotoCard] {
        &self.cards
    }

    pub fn card(&self, reference: &PhotoRef) -> Option<&PhotoCard> {
        self.cards.iter().find(|c| &c.reference == reference)
    }

    pub fn references(&self) -> Vec<PhotoRef> {
        self.cards.iter().map(|c| c.reference.clone()).collect()
    }

    /// Make the gallery match `references`, in that order.
    ///
    /// Existing cards keep their chaos home and progress. Duplicate
    /// references after the first are ignored.
    pub fn sync(&mut self, references: &[PhotoRef]) -> GalleryChange {
        let mut change = GalleryChange::default();
        let mut previous = std::mem::take(&mut self.cards);

        let mut next: Vec<PhotoCard> = Vec::with_capacity(references.len());
        for reference in references {
            if next.iter().any(|c| &c.reference == reference) {
                continue;
            }
            match previous.iter().position(|c| &c.reference == reference) {
                Some(pos) => next.push(previous.swap_remove(pos)),
                None => {
                    next.push(self.spawn_card(reference.clone()));
                    change.added.push(reference.clone());
                }
            }
        }
        change.removed = previous.into_iter().map(|c| c.reference).collect();

        let total = next.len();
        for (index, card) in next.iter_mut().enumerate() {
            if card.total != 0 && card.index == index && card.total == total {
                continue;
            }
            if card.reslot(index, total, self.slots) {
                change.retargeted.push(card.reference.clone());
            }
        }
        self.cards = next;

        if !change.is_empty() {
            tracing::debug!(
                cards = total,
                added = change.added.len(),
                removed = change.removed.len(),
                retargeted = change.retargeted.len(),
                "photo gallery re-slotted"
            );
        }
        change
    }

    /// Append a photo. No-op if it is already present.
    pub fn add(&mut self, reference: PhotoRef) -> GalleryChange {
        let mut refs = self.references();
        refs.push(reference);
        self.sync(&refs)
    }

    /// Remove a photo by reference.
    pub fn remove(&mut self, reference: &PhotoRef) -> GalleryChange {
        let refs: Vec<PhotoRef> = self
            .cards
            .iter()
            .filter(|c| &c.reference != reference)
            .map(|c| c.reference.clone())
            .collect();
        self.sync(&refs)
    }

    /// Remove the photo at `index`, if any.
    pub fn remove_at(&mut self, index: usize) -> GalleryChange {
        match self.cards.get(index).map(|c| c.reference.clone()) {
            Some(reference) => self.remove(&reference),
            None => GalleryChange::default(),
        }
    }

    /// Move every card onto a new tree.
    ///
    /// Chaos homes, progress values and display targets are kept, so cards
    /// glide from where they are to their slot on the new cone. Cards
    /// created afterwards scatter into the new chaos radius.
    pub fn retheme(&mut self, config: &PhotoConfig, tree: &TreeConfig) -> GalleryChange {
        self.slots = tree.cone.inflated(config.margin);
        self.chaos_radius = tree.chaos_radius;
        self.damping = config.damping;
        self.card_size = config.card_size;

        let mut change = GalleryChange::default();
        let total = self.cards.len();
        for card in &mut self.cards {
            card.progress = card.progress.with_damping(config.damping);
            let index = card.index;
            if card.reslot(index, total, self.slots) {
                change.retargeted.push(card.reference.clone());
            }
        }
        tracing::debug!(
            cards = total,
            retargeted = change.retargeted.len(),
            "photo gallery moved to new tree"
        );
        change
    }

    pub fn update(&mut self, mode: Mode, dt: f32) {
        for card in &mut self.cards {
            card.advance(mode, dt);
        }
    }

    fn spawn_card(&mut self, reference: PhotoRef) -> PhotoCard {
        let mut ctx = SpawnContext::new(self.spawned, self.spawned + 1, self.seed);
        self.spawned += 1;
        let chaos = ctx.chaos_point(self.chaos_radius);
        let motion = CardMotion {
            axis: ctx.random_axis(),
            phase: ctx.random_phase(),
            speed: ctx.random_range(0.6, 1.2),
        };
        PhotoCard {
            reference,
            record: EntityRecord::new(chaos, chaos, motion),
            index: 0,
            total: 0,
            display_target: chaos,
            progress: Progress::new(self.damping),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::theme::Theme;

    fn gallery() -> PhotoGallery {
        let scene = SceneConfig::for_theme(Theme::Classic);
        PhotoGallery::new(&scene.photos, &scene.tree, 2024)
    }

    fn refs(names: &[&str]) -> Vec<PhotoRef> {
        names.iter().map(|&n| PhotoRef::from(n)).collect()
    }

    #[test]
    fn test_sync_adds_in_order() {
        let mut g = gallery();
        let change = g.sync(&refs(&["a", "b", "c"]));
        assert_eq!(change.added, refs(&["a", "b", "c"]));
        assert_eq!(g.references(), refs(&["a", "b", "c"]));
        for (i, card) in g.cards().iter().enumerate() {
            assert_eq!(card.index(), i);
            assert_eq!(card.display_target(), card.target());
        }
    }

    #[test]
    fn test_sync_same_refs_is_noop() {
        let mut g = gallery();
        g.sync(&refs(&["a", "b"]));
        assert!(g.sync(&refs(&["a", "b"])).is_empty());
    }

    #[test]
    fn test_duplicates_ignored() {
        let mut g = gallery();
        g.sync(&refs(&["a", "a", "b"]));
        assert_eq!(g.len(), 2);
        assert!(g.add(PhotoRef::from("b")).is_empty());
    }

    #[test]
    fn test_remove_keeps_others_chaos() {
        let mut g = gallery();
        g.sync(&refs(&["a", "b", "c", "d"]));
        let before: Vec<Vec3> = g.cards().iter().map(|c| c.chaos()).collect();
        let change = g.remove(&PhotoRef::from("b"));
        assert_eq!(change.removed, refs(&["b"]));
        assert_eq!(g.card(&PhotoRef::from("a")).map(|c| c.chaos()), Some(before[0]));
        assert_eq!(g.card(&PhotoRef::from("c")).map(|c| c.chaos()), Some(before[2]));
        assert_eq!(g.card(&PhotoRef::from("d")).map(|c| c.chaos()), Some(before[3]));
    }

    #[test]
    fn test_reslot_glides() {
        let mut g = gallery();
        g.sync(&refs(&["a", "b", "c"]));
        for _ in 0..600 {
            g.update(Mode::Formed, 1.0 / 60.0);
        }
        let c = PhotoRef::from("c");
        let before = g.card(&c).map(|c| c.position()).unwrap();
        g.remove_at(1);
        let card = g.card(&c).unwrap();
        assert_eq!(card.position(), before);
        assert_ne!(card.target(), card.display_target());

        for _ in 0..1200 {
            g.update(Mode::Formed, 1.0 / 60.0);
        }
        let card = g.card(&c).unwrap();
        assert!((card.display_target() - card.target()).length() < 1e-3);
    }

    #[test]
    fn test_progress_survives_removal() {
        let mut g = gallery();
        g.sync(&refs(&["a", "b"]));
        for _ in 0..30 {
            g.update(Mode::Formed, 1.0 / 60.0);
        }
        let p = g.card(&PhotoRef::from("b")).map(|c| c.progress()).unwrap();
        g.remove(&PhotoRef::from("a"));
        assert_eq!(g.card(&PhotoRef::from("b")).map(|c| c.progress()), Some(p));
    }

    #[test]
    fn test_new_cards_get_fresh_chaos() {
        let mut g = gallery();
        g.sync(&refs(&["a"]));
        g.remove(&PhotoRef::from("a"));
        g.sync(&refs(&["a"]));
        let mut h = gallery();
        h.sync(&refs(&["a"]));
        assert_ne!(g.cards()[0].chaos(), h.cards()[0].chaos());
    }

    #[test]
    fn test_retheme_retargets_and_keeps_motion() {
        let mut g = gallery();
        g.sync(&refs(&["a", "b", "c"]));
        for _ in 0..45 {
            g.update(Mode::Formed, 1.0 / 60.0);
        }
        let before: Vec<(Vec3, Vec3, f32)> = g
            .cards()
            .iter()
            .map(|c| (c.chaos(), c.display_target(), c.progress().raw()))
            .collect();

        let tree = TreeConfig {
            cone: ConeShape::new(2.0, 5.0, 1.0),
            chaos_radius: 4.0,
        };
        let config = PhotoConfig {
            card_size: 0.5,
            margin: 0.2,
            damping: 3.0,
            ..SceneConfig::for_theme(Theme::Classic).photos
        };
        let change = g.retheme(&config, &tree);

        assert_eq!(change.retargeted, refs(&["a", "b", "c"]));
        assert!(change.added.is_empty() && change.removed.is_empty());
        assert_eq!(g.card_size(), 0.5);
        let slots = tree.cone.inflated(config.margin);
        for (i, card) in g.cards().iter().enumerate() {
            let (chaos, display, raw) = before[i];
            assert_eq!(card.chaos(), chaos);
            assert_eq!(card.display_target(), display);
            assert_eq!(card.progress().raw(), raw);
            assert_eq!(card.progress().damping(), 3.0);
            assert_eq!(card.target(), spiral_slot_position(i, 3, slots));
            assert!(card.target().y >= 1.0 && card.target().y <= 6.0);
        }

        g.add(PhotoRef::from("d"));
        let d = g.card(&PhotoRef::from("d")).unwrap();
        assert!(d.chaos().length() <= 4.0 + 1e-4);
    }

    #[test]
    fn test_remove_at_out_of_range() {
        let mut g = gallery();
        assert!(g.remove_at(3).is_empty());
    }

    #[test]
    fn test_card_parts() {
        let inset = CardPart::Inset.mesh();
        assert!(inset.vertices.iter().all(|v| v.position[2] > 0.0));
        let ring = CardPart::Ring.mesh();
        assert!(ring.vertices.iter().all(|v| v.position[1] > CARD_ASPECT * 0.5));
    }
}
