//! Signal-level statistics for live capture
//!
//! Tracks a peak-meter value with instant attack and fast release, plus
//! monotonic high-water marks of the loudest samples seen. Updates happen on
//! the capture callback thread; snapshots may be read from any other thread.

use std::sync::atomic::{AtomicU32, Ordering};

/// Release factor applied to the meter before each frame (fast fade, not
/// immediate)
const RELEASE_FACTOR: f32 = 0.3;

/// Snapshot of the capture amplitude statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureStats {
    /// Decayed peak-meter value, suitable for a live level display
    pub current_amplitude: f32,
    /// Largest sample magnitude seen since construction
    pub max_amplitude: f32,
    /// Largest magnitude among negative samples seen since construction.
    /// Never negative despite the name.
    pub min_amplitude: f32,
}

/// Lock-free amplitude tracker shared between the capture thread and readers
///
/// Values are f32 bit patterns stored in `AtomicU32`. The capture callback is
/// the only writer; any thread may take a snapshot. Stats are zeroed only at
/// construction, never by a capture stop/start cycle.
#[derive(Debug)]
pub struct LevelMeter {
    current: AtomicU32,
    max: AtomicU32,
    min: AtomicU32,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self {
            current: AtomicU32::new(0.0f32.to_bits()),
            max: AtomicU32::new(0.0f32.to_bits()),
            min: AtomicU32::new(0.0f32.to_bits()),
        }
    }

    /// Fold one frame of samples into the statistics.
    ///
    /// The meter first releases by [`RELEASE_FACTOR`], then snaps up to the
    /// frame's peak magnitude if that exceeds the released value (instant
    /// attack). The high-water marks only ever increase.
    pub fn update(&self, samples: &[f32]) {
        let released = f32::from_bits(self.current.load(Ordering::Acquire)) * RELEASE_FACTOR;

        if samples.is_empty() {
            self.current.store(released.to_bits(), Ordering::Release);
            return;
        }

        let mut peak = 0.0f32;
        let mut lowest = 0.0f32;
        for &s in samples {
            let magnitude = s.abs();
            if magnitude > peak {
                peak = magnitude;
            }
            if s < lowest {
                lowest = s;
            }
        }

        let level = if peak > released { peak } else { released };
        self.current.store(level.to_bits(), Ordering::Release);

        let prev_max = f32::from_bits(self.max.load(Ordering::Acquire));
        if peak > prev_max {
            self.max.store(peak.to_bits(), Ordering::Release);
        }

        let prev_min = f32::from_bits(self.min.load(Ordering::Acquire));
        if -lowest > prev_min {
            self.min.store((-lowest).to_bits(), Ordering::Release);
        }
    }

    /// Read a consistent snapshot of the statistics
    pub fn snapshot(&self) -> CaptureStats {
        CaptureStats {
            current_amplitude: f32::from_bits(self.current.load(Ordering::Acquire)),
            max_amplitude: f32::from_bits(self.max.load(Ordering::Acquire)),
            min_amplitude: f32::from_bits(self.min.load(Ordering::Acquire)),
        }
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_overrides_released_level() {
        let meter = LevelMeter::new();

        meter.update(&[0.5, -0.1]);
        assert_eq!(meter.snapshot().current_amplitude, 0.5);

        // 0.8 > 0.5 * 0.3, so the meter snaps up to 0.8
        meter.update(&[0.2, 0.8, -0.3]);
        let stats = meter.snapshot();
        assert_eq!(stats.current_amplitude, 0.8);
        assert!(stats.max_amplitude >= 0.8);
    }

    #[test]
    fn test_release_when_frame_is_quiet() {
        let meter = LevelMeter::new();

        meter.update(&[0.8]);
        assert_eq!(meter.snapshot().current_amplitude, 0.8);

        // 0.1 < 0.8 * 0.3 = 0.24, so the released value wins
        meter.update(&[0.1, -0.05]);
        let current = meter.snapshot().current_amplitude;
        assert!((current - 0.24).abs() < 1e-6, "expected 0.24, got {}", current);
    }

    #[test]
    fn test_empty_frame_only_releases() {
        let meter = LevelMeter::new();

        meter.update(&[1.0]);
        meter.update(&[]);

        let stats = meter.snapshot();
        assert!((stats.current_amplitude - 0.3).abs() < 1e-6);
        assert_eq!(stats.max_amplitude, 1.0);
    }

    #[test]
    fn test_high_water_marks_are_monotonic() {
        let meter = LevelMeter::new();

        meter.update(&[0.6, -0.7]);
        meter.update(&[0.1, -0.2]);

        let stats = meter.snapshot();
        assert_eq!(stats.max_amplitude, 0.7);
        assert_eq!(stats.min_amplitude, 0.7);

        meter.update(&[0.9, -0.4]);
        let stats = meter.snapshot();
        assert_eq!(stats.max_amplitude, 0.9);
        assert_eq!(stats.min_amplitude, 0.7);
    }

    #[test]
    fn test_min_amplitude_never_negative() {
        let meter = LevelMeter::new();

        meter.update(&[0.5, 0.2]);
        assert_eq!(meter.snapshot().min_amplitude, 0.0);

        meter.update(&[-0.3]);
        assert_eq!(meter.snapshot().min_amplitude, 0.3);
    }

    #[test]
    fn test_current_never_exceeds_max() {
        let meter = LevelMeter::new();

        for frame in [&[0.4f32, -0.9][..], &[0.05][..], &[0.7, 0.2][..]] {
            meter.update(frame);
            let stats = meter.snapshot();
            assert!(stats.max_amplitude >= stats.current_amplitude);
        }
    }
}
