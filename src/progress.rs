//! Chaos/formed mode and the damped progress controller.
//!
//! The scene has one [`Mode`] value, written by the UI and read by every
//! animated component once per frame. Each component turns it into a scalar
//! progress in [0, 1] that chases 0 (chaos) or 1 (formed) with exponential
//! damping, then shapes it with [`ease_out_cubic`] before interpolating.
//!
//! ```ignore
//! let mut progress = Progress::new(1.2);
//! progress = progress.advance(Mode::Formed, time.delta());
//! let t = progress.eased();
//! let position = chaos.lerp(target, t);
//! ```

use serde::{Deserialize, Serialize};

/// Values within this distance of 0 or 1 count as settled.
pub const SETTLED_EPSILON: f32 = 1e-4;

/// The two endpoint configurations of the assembly animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Fully scattered.
    #[default]
    Chaos,
    /// Fully assembled.
    Formed,
}

impl Mode {
    /// Progress value this mode attracts toward.
    #[inline]
    pub fn target(self) -> f32 {
        match self {
            Mode::Chaos => 0.0,
            Mode::Formed => 1.0,
        }
    }

    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Mode::Chaos => Mode::Formed,
            Mode::Formed => Mode::Chaos,
        }
    }
}

/// Single-writer mode value shared by the whole scene.
///
/// Setting the mode it already holds is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeSignal {
    mode: Mode,
    changes: u64,
}

impl ModeSignal {
    pub fn new(mode: Mode) -> Self {
        Self { mode, changes: 0 }
    }

    /// Current mode.
    #[inline]
    pub fn get(&self) -> Mode {
        self.mode
    }

    /// Set the mode. Returns `true` if it changed.
    pub fn set(&mut self, mode: Mode) -> bool {
        if self.mode == mode {
            return false;
        }
        tracing::debug!(from = ?self.mode, to = ?mode, "mode changed");
        self.mode = mode;
        self.changes += 1;
        true
    }

    /// Flip between chaos and formed.
    pub fn toggle(&mut self) -> Mode {
        self.set(self.mode.toggled());
        self.mode
    }

    /// Number of effective changes so far.
    pub fn changes(&self) -> u64 {
        self.changes
    }
}

/// Ease-out cubic: `1 - (1 - t)^3`. Monotonic, decelerates into 1.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Frame-rate independent exponential approach of `current` toward `target`.
///
/// `lambda` is the damping rate in 1/s. The remaining distance shrinks by
/// `exp(-lambda * dt)` per step, so two steps of `dt` land exactly where
/// one step of `2 * dt` does.
#[inline]
pub fn damp(current: f32, target: f32, lambda: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    current + (target - current) * (1.0 - (-lambda * dt).exp())
}

/// Vector form of [`damp`].
#[inline]
pub fn damp_vec3(current: glam::Vec3, target: glam::Vec3, lambda: f32, dt: f32) -> glam::Vec3 {
    if dt <= 0.0 {
        return current;
    }
    current.lerp(target, 1.0 - (-lambda * dt).exp())
}

/// Per-component progress state.
///
/// A plain value: [`Progress::advance`] returns the next state instead of
/// mutating in place, so the update can be tested with synthetic time steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    value: f32,
    damping: f32,
}

impl Progress {
    /// Start fully chaotic with the given damping rate.
    pub fn new(damping: f32) -> Self {
        Self {
            value: 0.0,
            damping: damping.max(0.0),
        }
    }

    /// Start at a specific raw value.
    pub fn starting_at(value: f32, damping: f32) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            damping: damping.max(0.0),
        }
    }

    /// Advance by `dt` seconds toward the mode's target.
    #[must_use]
    pub fn advance(self, mode: Mode, dt: f32) -> Self {
        Self {
            value: damp(self.value, mode.target(), self.damping, dt).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Raw damped value in [0, 1].
    #[inline]
    pub fn raw(&self) -> f32 {
        self.value
    }

    /// Eased value used for spatial interpolation.
    #[inline]
    pub fn eased(&self) -> f32 {
        ease_out_cubic(self.value)
    }

    /// Damping rate in 1/s.
    #[inline]
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Same value, new damping rate.
    #[must_use]
    pub fn with_damping(self, damping: f32) -> Self {
        Self {
            damping: damping.max(0.0),
            ..self
        }
    }

    /// Whether the value has settled at an endpoint.
    pub fn is_settled(&self) -> bool {
        self.value < SETTLED_EPSILON || self.value > 1.0 - SETTLED_EPSILON
    }
}

/// 0 below `threshold`, rising linearly to 1 at progress 1.
///
/// Used to fade idle motion in once a component is nearly formed, so it
/// starts without a jump.
#[inline]
pub fn ramp_above(value: f32, threshold: f32) -> f32 {
    if value <= threshold || threshold >= 1.0 {
        return 0.0;
    }
    ((value - threshold) / (1.0 - threshold)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mut p: Progress, mode: Mode, seconds: f32, dt: f32) -> Progress {
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            p = p.advance(mode, dt);
        }
        p
    }

    #[test]
    fn test_ease_endpoints_and_monotonic() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        let mut last = 0.0;
        for i in 1..=100 {
            let v = ease_out_cubic(i as f32 / 100.0);
            assert!(v >= last);
            last = v;
        }
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_formed_after_five_seconds() {
        let p = run(Progress::new(1.2), Mode::Formed, 5.0, 1.0 / 60.0);
        assert!(p.raw() > 0.99, "raw = {}", p.raw());
    }

    #[test]
    fn test_frame_rate_independent() {
        let fast = run(Progress::new(2.0), Mode::Formed, 1.0, 1.0 / 144.0);
        let slow = run(Progress::new(2.0), Mode::Formed, 1.0, 1.0 / 30.0);
        assert!((fast.raw() - slow.raw()).abs() < 1e-4);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let p = Progress::starting_at(0.4, 3.0);
        assert_eq!(p.advance(Mode::Formed, 0.0), p);
    }

    #[test]
    fn test_never_overshoots() {
        let p = run(Progress::new(50.0), Mode::Formed, 10.0, 0.5);
        assert!(p.raw() <= 1.0);
        let p = run(p, Mode::Chaos, 10.0, 0.5);
        assert!(p.raw() >= 0.0);
        assert!(p.is_settled());
    }

    #[test]
    fn test_with_damping_keeps_value() {
        let p = Progress::starting_at(0.3, 1.0).with_damping(4.0);
        assert_eq!(p.raw(), 0.3);
        assert_eq!(p.damping(), 4.0);
        assert_eq!(p.with_damping(-1.0).damping(), 0.0);
    }

    #[test]
    fn test_mode_signal_idempotent() {
        let mut signal = ModeSignal::new(Mode::Chaos);
        assert!(signal.set(Mode::Formed));
        assert!(!signal.set(Mode::Formed));
        assert_eq!(signal.changes(), 1);
        assert_eq!(signal.toggle(), Mode::Chaos);
        assert_eq!(signal.changes(), 2);
    }

    #[test]
    fn test_rapid_toggle_is_continuous() {
        let mut p = Progress::new(3.0);
        let mut last = p.raw();
        for frame in 0..600 {
            let mode = if (frame / 7) % 2 == 0 { Mode::Formed } else { Mode::Chaos };
            p = p.advance(mode, 1.0 / 60.0);
            assert!((p.raw() - last).abs() < 0.06);
            last = p.raw();
        }
    }

    #[test]
    fn test_ramp_above() {
        assert_eq!(ramp_above(0.5, 0.8), 0.0);
        assert_eq!(ramp_above(0.8, 0.8), 0.0);
        assert!((ramp_above(0.9, 0.8) - 0.5).abs() < 1e-5);
        assert_eq!(ramp_above(1.0, 0.8), 1.0);
    }
}
