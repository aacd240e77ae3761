use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

pub const USECS_PER_SEC: i64 = 1_000_000;

/// A signed duration (or instant difference) with microsecond resolution.
///
/// The microsecond field is always normalised to `[0, 1_000_000)`; negative
/// values borrow into the seconds field, so `-0.5s` is `{ sec: -1, usec:
/// 500_000 }`. The derived lexicographic ordering is therefore correct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Timeval {
    pub sec: i64,
    pub usec: i64,
}

impl Timeval {
    pub const ZERO: Timeval = Timeval { sec: 0, usec: 0 };

    /// Build a normalised value from possibly out-of-range parts.
    pub fn new(sec: i64, usec: i64) -> Self {
        Timeval {
            sec: sec + usec.div_euclid(USECS_PER_SEC),
            usec: usec.rem_euclid(USECS_PER_SEC),
        }
    }

    /// Build from the unsigned fields of an on-disk record header.
    pub fn from_header(sec: u32, usec: u32) -> Self {
        Self::new(sec as i64, usec as i64)
    }

    pub fn from_secs(sec: i64) -> Self {
        Timeval { sec, usec: 0 }
    }

    pub fn is_negative(&self) -> bool {
        self.sec < 0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.usec as f64 / USECS_PER_SEC as f64
    }

    /// The inverse of [`as_secs_f64`](Self::as_secs_f64), rounded to the
    /// nearest microsecond. This is the only place floating point enters
    /// the time accounting.
    pub fn from_secs_f64(secs: f64) -> Self {
        let whole = secs.floor();
        let frac = ((secs - whole) * USECS_PER_SEC as f64).round() as i64;
        Self::new(whole as i64, frac)
    }

    /// Scale down by a real factor (playback speed division).
    pub fn div_f64(&self, divisor: f64) -> Self {
        Self::from_secs_f64(self.as_secs_f64() / divisor)
    }

    /// Convert to a `Duration`, clamping negative values to zero.
    pub fn to_duration(&self) -> Duration {
        if self.is_negative() {
            Duration::ZERO
        } else {
            Duration::new(self.sec as u64, (self.usec * 1_000) as u32)
        }
    }

    pub fn from_duration(d: Duration) -> Self {
        Self::new(d.as_secs() as i64, d.subsec_micros() as i64)
    }
}

impl Add for Timeval {
    type Output = Timeval;

    fn add(self, rhs: Timeval) -> Timeval {
        Timeval::new(self.sec + rhs.sec, self.usec + rhs.usec)
    }
}

impl Sub for Timeval {
    type Output = Timeval;

    fn sub(self, rhs: Timeval) -> Timeval {
        Timeval::new(self.sec - rhs.sec, self.usec - rhs.usec)
    }
}

impl fmt::Display for Timeval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            let total = self.sec * USECS_PER_SEC + self.usec;
            write!(f, "-{}.{:06}", -total / USECS_PER_SEC, -total % USECS_PER_SEC)
        } else {
            write!(f, "{}.{:06}", self.sec, self.usec)
        }
    }
}
