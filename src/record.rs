//! Per-entity animation records and populations.
//!
//! A record pairs an entity's chaos home (fixed for its lifetime) with its
//! formed target (recomputable from its slot) and a bundle of randomized
//! constants drawn once at creation.

use crate::spawn::SpawnContext;
use glam::Vec3;

/// Randomized constants for one member of a population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceDescriptor {
    /// Phase offset in radians for oscillations.
    pub phase: f32,
    /// Spin / sway rate multiplier.
    pub speed: f32,
    /// Linear RGB color.
    pub color: Vec3,
    /// Uniform base scale.
    pub scale: f32,
    /// Unit tumble axis.
    pub axis: Vec3,
}

impl Default for InstanceDescriptor {
    fn default() -> Self {
        Self {
            phase: 0.0,
            speed: 1.0,
            color: Vec3::ONE,
            scale: 1.0,
            axis: Vec3::Y,
        }
    }
}

/// Animation record for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord<P = InstanceDescriptor> {
    chaos: Vec3,
    target: Vec3,
    /// Fixed per-instance parameters.
    pub params: P,
}

impl<P> EntityRecord<P> {
    pub fn new(chaos: Vec3, target: Vec3, params: P) -> Self {
        Self {
            chaos,
            target,
            params,
        }
    }

    /// Chaos home. Never changes after creation.
    #[inline]
    pub fn chaos(&self) -> Vec3 {
        self.chaos
    }

    /// Current formed target.
    #[inline]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Replace the formed target (slot reassignment).
    pub fn retarget(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Position at an eased progress value.
    #[inline]
    pub fn position_at(&self, eased: f32) -> Vec3 {
        self.chaos.lerp(self.target, eased)
    }
}

/// Ordered population of records; slot = index in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Population<P = InstanceDescriptor> {
    records: Vec<EntityRecord<P>>,
}

impl<P> Default for Population<P> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<P> Population<P> {
    /// Build `count` records. `build` is called once per slot with a fresh
    /// [`SpawnContext`] and returns `(chaos, target, params)`.
    pub fn spawn<F>(count: usize, seed: u64, mut build: F) -> Self
    where
        F: FnMut(&mut SpawnContext) -> (Vec3, Vec3, P),
    {
        let records = (0..count)
            .map(|i| {
                let mut ctx = SpawnContext::new(i, count, seed);
                let (chaos, target, params) = build(&mut ctx);
                EntityRecord::new(chaos, target, params)
            })
            .collect();
        Self { records }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord<P>> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&EntityRecord<P>> {
        self.records.get(index)
    }
}
