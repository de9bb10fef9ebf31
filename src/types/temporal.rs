//! # Temporal Types
//!
//! Calendar and clock values stored in fixed-region slots, the timestamp
//! validator used by `TIMESTAMP` coercion, and the wall-clock source that
//! stamps finished records.
//!
//! All components are stored little-endian and tightly packed; the struct
//! field order below matches the on-disk order.

use std::time::{SystemTime, UNIX_EPOCH};

use eyre::{bail, Result};

/// Largest timestamp (seconds since the Unix epoch) accepted by
/// [`to_timestamp`]. Chosen so the value survives nanosecond conversion in a
/// signed 64-bit integer.
pub const MAX_TIMESTAMP: i64 = i64::MAX / 1_000_000_000;

/// Calendar date: `i16 year`, `i8 month`, `i8 day` (4 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Date {
    pub year: i16,
    pub month: i8,
    pub day: i8,
}

impl Date {
    pub fn new(year: i16, month: i8, day: i8) -> Self {
        Self { year, month, day }
    }
}

/// Wall time: `i8 hour/minute/sec`, `i32 microsec` (7 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Time {
    pub hour: i8,
    pub minute: i8,
    pub sec: i8,
    pub microsec: i32,
}

impl Time {
    pub fn new(hour: i8, minute: i8, sec: i8, microsec: i32) -> Self {
        Self {
            hour,
            minute,
            sec,
            microsec,
        }
    }
}

/// Date plus time of day (11 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTime {
    pub year: i16,
    pub month: i8,
    pub day: i8,
    pub hour: i8,
    pub minute: i8,
    pub sec: i8,
    pub microsec: i32,
}

/// Elapsed time: `i64 seconds`, `i32 microseconds`, `i32 months` (16 bytes).
///
/// Months are kept separate because a month has no fixed second count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Duration {
    pub seconds: i64,
    pub microseconds: i32,
    pub months: i32,
}

impl Duration {
    pub fn new(seconds: i64, microseconds: i32, months: i32) -> Self {
        Self {
            seconds,
            microseconds,
            months,
        }
    }
}

/// Validates an integer as a timestamp in seconds since the Unix epoch.
pub fn to_timestamp(secs: i64) -> Result<i64> {
    if !(0..=MAX_TIMESTAMP).contains(&secs) {
        bail!(
            "timestamp {} outside the supported range 0..={}",
            secs,
            MAX_TIMESTAMP
        );
    }
    Ok(secs)
}

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
