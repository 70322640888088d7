// crates/mockgate-core/src/core/delay.rs
// ============================================================================
// Module: Mockgate Delays
// Description: Time-unit based delays attached to actions and responses.
// Purpose: Describe how long dispatch work waits before it runs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Delay`] is a `(time unit, amount)` pair. Amounts are unsigned, so the
//! non-negative invariant holds by construction; absence of a delay is modelled
//! as `Option<Delay>::None` by the owning types.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Units
// ============================================================================

/// Unit applied to a delay amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    /// Nanoseconds.
    Nanoseconds,
    /// Microseconds.
    Microseconds,
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl TimeUnit {
    /// Converts `amount` of this unit into a [`Duration`], saturating on overflow.
    #[must_use]
    pub const fn to_duration(self, amount: u64) -> Duration {
        match self {
            Self::Nanoseconds => Duration::from_nanos(amount),
            Self::Microseconds => Duration::from_micros(amount),
            Self::Milliseconds => Duration::from_millis(amount),
            Self::Seconds => Duration::from_secs(amount),
            Self::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            Self::Hours => Duration::from_secs(amount.saturating_mul(3_600)),
            Self::Days => Duration::from_secs(amount.saturating_mul(86_400)),
        }
    }
}

// ============================================================================
// SECTION: Delay
// ============================================================================

/// Delay applied before an action or response is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delay {
    /// Unit of `value`.
    pub time_unit: TimeUnit,
    /// Amount of `time_unit` to wait.
    pub value: u64,
}

impl Delay {
    /// Creates a delay.
    #[must_use]
    pub const fn new(time_unit: TimeUnit, value: u64) -> Self {
        Self {
            time_unit,
            value,
        }
    }

    /// Creates a millisecond delay.
    #[must_use]
    pub const fn millis(value: u64) -> Self {
        Self::new(TimeUnit::Milliseconds, value)
    }

    /// Creates a second delay.
    #[must_use]
    pub const fn seconds(value: u64) -> Self {
        Self::new(TimeUnit::Seconds, value)
    }

    /// Returns the delay as a [`Duration`].
    #[must_use]
    pub const fn to_duration(self) -> Duration {
        self.time_unit.to_duration(self.value)
    }

    /// Returns true when the delay waits for no time at all.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.value == 0
    }
}
