//! Fixed-point presentation timestamps.
//!
//! All range and chapter arithmetic happens on [`Timestamp`], an integer count
//! of hundred-thousandths of a second. Values are parsed once from the frame
//! log's `hh:mm:ss.ffffff` strings and never pass through floating point.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::Error;

/// Sub-second resolution of a [`Timestamp`].
pub const UNITS_PER_SECOND: u64 = 100_000;

const UNITS_PER_MILLI: u64 = UNITS_PER_SECOND / 1_000;
const FRACTION_DIGITS: usize = 5;

/// A point in time (or a span) measured in 1/100000 s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * UNITS_PER_MILLI)
    }

    pub const fn units(self) -> u64 {
        self.0
    }

    /// Whole milliseconds, truncating any finer remainder.
    pub const fn as_millis(self) -> u64 {
        self.0 / UNITS_PER_MILLI
    }

    pub fn saturating_sub(self, rhs: Timestamp) -> Timestamp {
        Timestamp(self.0.saturating_sub(rhs.0))
    }

    /// Absolute difference between two timestamps.
    pub fn abs_diff(self, rhs: Timestamp) -> Timestamp {
        Timestamp(self.0.abs_diff(rhs.0))
    }

    /// The display form with `:` replaced, safe for use in file names.
    pub fn to_filename_component(self) -> String {
        self.to_string().replace(':', "-")
    }
}

impl Add for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Timestamp) -> Timestamp {
        Timestamp(self.0 + rhs.0)
    }
}

impl Sub for Timestamp {
    type Output = Timestamp;

    /// Saturates at zero; callers only subtract an earlier point from a later one.
    fn sub(self, rhs: Timestamp) -> Timestamp {
        self.saturating_sub(rhs)
    }
}

impl fmt::Display for Timestamp {
    /// `hh:mm:ss.mmm` for whole milliseconds, `hh:mm:ss.fffff` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0 / UNITS_PER_SECOND;
        let frac = self.0 % UNITS_PER_SECOND;
        let (h, m, s) = (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60);

        if frac % UNITS_PER_MILLI == 0 {
            write!(f, "{h:02}:{m:02}:{s:02}.{:03}", frac / UNITS_PER_MILLI)
        } else {
            write!(f, "{h:02}:{m:02}:{s:02}.{frac:05}")
        }
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    /// Accepts `hh:mm:ss[.f…]` or plain seconds `ss[.f…]`.
    ///
    /// Fraction digits beyond the fifth are truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Error::malformed(format!("invalid timestamp: {s:?}"));

        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let parts: Vec<&str> = whole.split(':').collect();
        let fields = parts
            .iter()
            .map(|p| {
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    p.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<u64>>>()
            .ok_or_else(invalid)?;

        let secs = match fields.as_slice() {
            [s] => *s,
            [h, m, s] if *m < 60 && *s < 60 => h
                .checked_mul(3600)
                .and_then(|v| v.checked_add(m * 60 + s))
                .ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };

        let mut frac_units = 0u64;
        for (i, digit) in fraction.bytes().take(FRACTION_DIGITS).enumerate() {
            frac_units += u64::from(digit - b'0') * 10u64.pow((FRACTION_DIGITS - 1 - i) as u32);
        }

        secs.checked_mul(UNITS_PER_SECOND)
            .and_then(|units| units.checked_add(frac_units))
            .map(Timestamp)
            .ok_or_else(invalid)
    }
}
