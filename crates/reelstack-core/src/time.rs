//! Media time representation.
//!
//! Segment durations and timeline offsets are rational seconds so that the
//! offset law (clip i starts at the exact sum of prior durations) holds
//! without floating-point drift, no matter how many clips are merged.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// A point in time or a duration, as rational seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MediaTime {
    value: Rational64,
}

impl MediaTime {
    /// Zero time.
    pub const ZERO: Self = Self {
        value: Rational64::new_raw(0, 1),
    };

    /// `numerator / denominator` seconds.
    #[inline]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            value: Rational64::new(numerator, denominator),
        }
    }

    /// Whole seconds.
    #[inline]
    pub fn from_seconds(seconds: i64) -> Self {
        Self::new(seconds, 1)
    }

    /// A counted value against a timescale, e.g. `900` at timescale `600`
    /// is 1.5 seconds. This is how container metadata reports durations.
    #[inline]
    pub fn from_value_timescale(value: i64, timescale: i64) -> Self {
        Self::new(value, timescale)
    }

    /// Approximate a float second count. Rounded to microsecond precision,
    /// which is what ffprobe reports.
    pub fn from_seconds_f64(seconds: f64) -> Self {
        const TIMESCALE: i64 = 1_000_000;
        Self::new((seconds * TIMESCALE as f64).round() as i64, TIMESCALE)
    }

    /// Convert to seconds as f64.
    #[inline]
    pub fn as_seconds_f64(self) -> f64 {
        *self.value.numer() as f64 / *self.value.denom() as f64
    }

    /// Number of whole frames this time spans at the given rate.
    #[inline]
    pub fn to_frames(self, rate: FrameRate) -> i64 {
        let frames = self.value * Rational64::new(rate.numerator as i64, rate.denominator as i64);
        frames.to_integer()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        *self.value.numer() == 0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        *self.value.numer() > 0
    }
}

impl Default for MediaTime {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for MediaTime {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            value: self.value + rhs.value,
        }
    }
}

impl Sub for MediaTime {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            value: self.value - rhs.value,
        }
    }
}

impl Sum for MediaTime {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_seconds_f64())
    }
}

/// Frame rate as a rational number (e.g. 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame.
    #[inline]
    pub fn frame_duration(self) -> MediaTime {
        MediaTime::new(self.denominator as i64, self.numerator as i64)
    }

    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// A half-open time range: start inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: MediaTime,
    pub duration: MediaTime,
}

impl TimeRange {
    /// Empty range at zero.
    pub const EMPTY: Self = Self {
        start: MediaTime::ZERO,
        duration: MediaTime::ZERO,
    };

    #[inline]
    pub fn new(start: MediaTime, duration: MediaTime) -> Self {
        Self { start, duration }
    }

    #[inline]
    pub fn from_start_end(start: MediaTime, end: MediaTime) -> Self {
        Self {
            start,
            duration: end - start,
        }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(self) -> MediaTime {
        self.start + self.duration
    }

    #[inline]
    pub fn contains(self, time: MediaTime) -> bool {
        time >= self.start && time < self.end()
    }

    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::EMPTY
    }
}
