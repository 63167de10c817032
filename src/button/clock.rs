// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Looping animation clock.
//!
//! Every sample is computed from the fixed cycle origin, never from the
//! previous sample, so frame cadence has no effect on the values.

use std::time::{Duration, Instant};

/// Default length of one sweep/fill cycle.
pub const DEFAULT_CYCLE: Duration = Duration::from_millis(3000);

/// Values for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Position inside the cycle, in `[0, 1)`
    pub progress: f32,
    /// Progress arc extent, in `[0, 360)`
    pub sweep_angle_degrees: f32,
    /// Right edge of the busy fill, in `[0, extent)`
    pub fill_offset_pixels: f32,
}

#[derive(Debug, Clone)]
pub struct AnimationClock {
    cycle: Duration,
    extent: f32,
    origin: Option<Instant>,
}

impl AnimationClock {
    /// Create a stopped clock. A zero cycle is bumped to one millisecond.
    pub fn new(cycle: Duration) -> Self {
        Self {
            cycle: cycle.max(Duration::from_millis(1)),
            extent: 0.0,
            origin: None,
        }
    }

    pub fn cycle(&self) -> Duration {
        self.cycle
    }

    pub fn is_running(&self) -> bool {
        self.origin.is_some()
    }

    /// Set the fill range (button width). Negative widths clamp to zero.
    pub fn set_extent(&mut self, extent: f32) {
        self.extent = extent.max(0.0);
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Restart the cycle with `origin` as its zero point.
    pub fn start_at(&mut self, origin: Instant) {
        self.origin = Some(origin);
    }

    pub fn stop(&mut self) {
        self.origin = None;
    }

    /// Frame values at `now`, or `None` while stopped.
    pub fn sample(&self, now: Instant) -> Option<AnimationFrame> {
        let origin = self.origin?;
        let elapsed = now.saturating_duration_since(origin);
        let cycle_nanos = self.cycle.as_nanos();
        let phase_nanos = elapsed.as_nanos() % cycle_nanos;
        // The last nanoseconds of a cycle would round up to 1.0 in f32.
        let progress = ((phase_nanos as f64 / cycle_nanos as f64) as f32).min(1.0 - f32::EPSILON);

        Some(AnimationFrame {
            progress,
            sweep_angle_degrees: progress * 360.0,
            fill_offset_pixels: progress * self.extent,
        })
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_clock(extent: f32) -> (AnimationClock, Instant) {
        let origin = Instant::now();
        let mut clock = AnimationClock::default();
        clock.set_extent(extent);
        clock.start_at(origin);
        (clock, origin)
    }

    #[test]
    fn test_stopped_clock_yields_nothing() {
        let mut clock = AnimationClock::default();
        assert!(clock.sample(Instant::now()).is_none());
        clock.start();
        clock.stop();
        clock.stop();
        assert!(!clock.is_running());
        assert!(clock.sample(Instant::now()).is_none());
    }

    #[test]
    fn test_cycle_origin_is_zero() {
        let (clock, origin) = running_clock(300.0);
        let frame = clock.sample(origin).unwrap();
        assert_eq!(frame.sweep_angle_degrees, 0.0);
        assert_eq!(frame.fill_offset_pixels, 0.0);
    }

    #[test]
    fn test_half_cycle_values() {
        let (clock, origin) = running_clock(300.0);
        let frame = clock.sample(origin + Duration::from_millis(1500)).unwrap();
        assert!((frame.sweep_angle_degrees - 180.0).abs() < 1e-3);
        assert!((frame.fill_offset_pixels - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_periodicity() {
        let (clock, origin) = running_clock(420.0);
        for ms in [0u64, 17, 733, 1499, 2999] {
            let t = origin + Duration::from_millis(ms);
            assert_eq!(clock.sample(t), clock.sample(t + clock.cycle()));
            assert_eq!(clock.sample(t), clock.sample(t + clock.cycle() * 5));
        }
    }

    #[test]
    fn test_monotonic_within_cycle_and_wraps() {
        let (clock, origin) = running_clock(100.0);
        let mut previous = -1.0f32;
        for ms in (0..3000).step_by(7) {
            let frame = clock.sample(origin + Duration::from_millis(ms)).unwrap();
            assert!(frame.sweep_angle_degrees >= previous);
            assert!(frame.sweep_angle_degrees < 360.0);
            assert!(frame.fill_offset_pixels < 100.0);
            previous = frame.sweep_angle_degrees;
        }
        let wrapped = clock.sample(origin + Duration::from_millis(3000)).unwrap();
        assert_eq!(wrapped.sweep_angle_degrees, 0.0);
    }

    #[test]
    fn test_restart_resets_origin() {
        let (mut clock, origin) = running_clock(100.0);
        let later = origin + Duration::from_millis(1000);
        clock.start_at(later);
        assert_eq!(clock.sample(later).unwrap().progress, 0.0);
    }

    #[test]
    fn test_samples_before_origin_clamp() {
        let origin = Instant::now() + Duration::from_secs(1);
        let mut clock = AnimationClock::default();
        clock.start_at(origin);
        assert_eq!(clock.sample(Instant::now()).unwrap().progress, 0.0);
    }

    #[test]
    fn test_zero_cycle_is_bumped() {
        let clock = AnimationClock::new(Duration::ZERO);
        assert_eq!(clock.cycle(), Duration::from_millis(1));
    }
}
