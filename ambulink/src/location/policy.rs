//! Sampling policy and the filter that enforces it.

use std::time::Duration;

use tokio::time::Instant;

use super::fix::LocationFix;

/// Default interval between emitted fixes.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(2000);

/// Interval of the displacement-filtered preset.
const FILTERED_SAMPLE_INTERVAL: Duration = Duration::from_millis(5000);

/// Minimum displacement of the displacement-filtered preset, in meters.
const FILTERED_MIN_DISPLACEMENT_M: f64 = 5.0;

/// How often fixes are emitted and how far the device must move between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPolicy {
    /// Minimum time between two emitted fixes.
    pub interval: Duration,
    /// Minimum distance between two emitted fixes, if any.
    pub min_displacement_m: Option<f64>,
}

impl SamplingPolicy {
    pub fn new(interval: Duration, min_displacement_m: Option<f64>) -> Self {
        Self {
            interval,
            min_displacement_m,
        }
    }

    /// 2 s interval, high accuracy, no displacement filter.
    pub fn realtime() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL, None)
    }

    /// 5 s interval with a 5 m displacement filter.
    pub fn displacement_filtered() -> Self {
        Self::new(FILTERED_SAMPLE_INTERVAL, Some(FILTERED_MIN_DISPLACEMENT_M))
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::realtime()
    }
}

/// Stateful gate applying a [`SamplingPolicy`] to a stream of raw fixes.
///
/// The first fix always passes. Later fixes pass once `interval` has elapsed
/// since the last accepted one and, when a displacement filter is set, the
/// device has moved further than that.
#[derive(Debug)]
pub struct SampleFilter {
    policy: SamplingPolicy,
    last: Option<(Instant, LocationFix)>,
}

impl SampleFilter {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self { policy, last: None }
    }

    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// Decide whether `fix`, observed at `now`, should be emitted.
    pub fn accept(&mut self, fix: &LocationFix, now: Instant) -> bool {
        if let Some((at, previous)) = &self.last {
            if now.saturating_duration_since(*at) < self.policy.interval {
                return false;
            }
            if let Some(min) = self.policy.min_displacement_m {
                if previous.distance_to(fix) <= min {
                    return false;
                }
            }
        }
        self.last = Some((now, *fix));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let realtime = SamplingPolicy::default();
        assert_eq!(realtime.interval, Duration::from_secs(2));
        assert_eq!(realtime.min_displacement_m, None);

        let filtered = SamplingPolicy::displacement_filtered();
        assert_eq!(filtered.interval, Duration::from_secs(5));
        assert_eq!(filtered.min_displacement_m, Some(5.0));
    }

    #[test]
    fn test_first_fix_always_passes() {
        let mut filter = SampleFilter::new(SamplingPolicy::displacement_filtered());
        assert!(filter.accept(&LocationFix::new(28.6, 77.2), Instant::now()));
    }

    #[test]
    fn test_interval_throttles() {
        let mut filter = SampleFilter::new(SamplingPolicy::realtime());
        let start = Instant::now();
        let fix = LocationFix::new(28.6, 77.2);

        assert!(filter.accept(&fix, start));
        assert!(!filter.accept(&fix, start + Duration::from_millis(1999)));
        assert!(filter.accept(&fix, start + Duration::from_millis(2000)));
    }

    #[test]
    fn test_displacement_filter() {
        let mut filter = SampleFilter::new(SamplingPolicy::displacement_filtered());
        let start = Instant::now();
        let later = start + Duration::from_secs(6);

        assert!(filter.accept(&LocationFix::new(28.6139, 77.2090), start));
        // ~1 m north, interval satisfied but not far enough
        assert!(!filter.accept(&LocationFix::new(28.61391, 77.2090), later));
        // ~11 m north
        assert!(filter.accept(&LocationFix::new(28.6140, 77.2090), later));
    }

    #[test]
    fn test_displacement_must_exceed_threshold() {
        let mut filter = SampleFilter::new(SamplingPolicy::new(Duration::ZERO, Some(0.0)));
        let start = Instant::now();
        let fix = LocationFix::new(28.6139, 77.2090);

        assert!(filter.accept(&fix, start));
        assert!(!filter.accept(&fix, start + Duration::from_secs(1)));
        assert!(filter.accept(&LocationFix::new(28.6140, 77.2090), start + Duration::from_secs(2)));
    }

    #[test]
    fn test_rejected_fix_does_not_reset_clock() {
        let mut filter = SampleFilter::new(SamplingPolicy::realtime());
        let start = Instant::now();
        let fix = LocationFix::new(0.0, 0.0);

        assert!(filter.accept(&fix, start));
        assert!(!filter.accept(&fix, start + Duration::from_millis(1500)));
        assert!(filter.accept(&fix, start + Duration::from_millis(2100)));
    }
}
