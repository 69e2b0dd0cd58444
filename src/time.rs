//! Frame clock driving the animation.
//!
//! The animation is stepped once per rendered frame with the real frame
//! delta. Deltas are clamped so a stalled frame (window drag, debugger,
//! minimized surface) cannot snap every progress value to its endpoint in a
//! single step.
//!
//! # Example
//!
//! ```ignore
//! use chaos_tree::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In the redraw handler:
//! let (elapsed, dt) = clock.tick();
//! scene.update(dt, elapsed);
//! ```

use std::time::{Duration, Instant};

/// Largest delta handed to the animation in one frame, in seconds.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Elapsed/delta bookkeeping for the render loop.
#[derive(Debug)]
pub struct FrameClock {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Sum of all deltas handed out so far.
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Fixed delta for deterministic stepping (optional).
    fixed_delta: Option<f32>,
    max_delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            max_delta: MAX_FRAME_DELTA,
        }
    }

    /// Measure the wall-clock delta since the previous tick and step by it.
    ///
    /// Returns `(elapsed, delta)`.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.advance(raw)
    }

    /// Step by an externally measured delta.
    ///
    /// Negative and non-finite deltas count as zero; large ones are clamped.
    pub fn advance(&mut self, raw_delta: f32) -> (f32, f32) {
        self.frame_count += 1;

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, 0.0);
        }

        let raw = if raw_delta.is_finite() { raw_delta.max(0.0) } else { 0.0 };
        self.delta_secs = self.fixed_delta.unwrap_or(raw).min(self.max_delta);
        self.elapsed_secs += self.delta_secs;

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total animated time in seconds. Does not advance while paused.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Delta handed out by the last tick.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        tracing::debug!(paused = self.paused, "frame clock pause toggled");
    }

    /// Use a constant delta regardless of wall time. `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    /// Override the per-frame delta clamp.
    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = max_delta.max(0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_tick_measures_time() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.tick();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_stalled_frame_is_clamped() {
        let mut clock = FrameClock::new();
        let (_, dt) = clock.advance(3.0);
        assert_eq!(dt, MAX_FRAME_DELTA);
    }

    #[test]
    fn test_bad_deltas_are_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(-1.0).1, 0.0);
        assert_eq!(clock.advance(f32::NAN).1, 0.0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut clock = FrameClock::new();
        clock.advance(0.016);
        clock.toggle_pause();

        let before = clock.elapsed();
        let (elapsed, delta) = clock.advance(0.016);
        assert_eq!(elapsed, before);
        assert_eq!(delta, 0.0);

        clock.toggle_pause();
        assert!(clock.advance(0.016).0 > before);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(30));
        clock.tick();

        assert!((clock.delta() - 1.0 / 60.0).abs() < 0.0001);
    }
}
