//! Wall-clock source for request timestamps and nonces.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::Result;
use crate::error::Error;

/// Source of the current time.
///
/// Signing reads the clock twice per request: milliseconds for `timestamp`
/// and microseconds for the nonce. Non-decreasing readings are assumed, not
/// enforced.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct System;

impl Clock for System {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Clone, Copy, Debug)]
pub struct Fixed(DateTime<Utc>);

impl Fixed {
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Builds a clock pinned to `micros` since the unix epoch.
    pub fn from_micros(micros: i64) -> Result<Self> {
        DateTime::from_timestamp_micros(micros)
            .map(Self)
            .ok_or_else(|| Error::configuration(format!("timestamp out of range: {micros}us")))
    }
}

impl Clock for Fixed {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// One-time value bound into the signed payload, in wall-clock microseconds.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Nonce(u64);

impl Nonce {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Current time of `clock` truncated to whole microseconds.
    pub fn from_clock<C: Clock + ?Sized>(clock: &C) -> Result<Self> {
        let micros = clock.now().timestamp_micros();
        u64::try_from(micros)
            .map(Self)
            .map_err(|_e| Error::validation(format!("clock reads before unix epoch: {micros}us")))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Nonce {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Current time of `clock` in unix milliseconds, as sent in `timestamp`.
pub fn timestamp_millis<C: Clock + ?Sized>(clock: &C) -> Result<u64> {
    let millis = clock.now().timestamp_millis();
    u64::try_from(millis)
        .map_err(|_e| Error::validation(format!("clock reads before unix epoch: {millis}ms")))
}
