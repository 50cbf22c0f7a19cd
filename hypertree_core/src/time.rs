// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic time and render budgets.
//!
//! [`HostTime`] is a point on a monotonic clock expressed in nanoseconds since
//! an arbitrary epoch. [`Duration`] is a span in the same units and doubles as
//! the time budget handed to renderers; [`Duration::MAX`] means "unbounded".
//!
//! The rendering collaborator supplies time through the [`Clock`] trait so
//! tests can drive budgets deterministically. [`MonotonicClock`] is the
//! `std::time::Instant`-backed implementation.

use core::fmt;
use core::ops::{Add, Sub};
use std::time::Instant;

/// A point in time in nanoseconds on a monotonic clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Returns `true` once more than `budget` has elapsed since `start`.
    #[inline]
    #[must_use]
    pub const fn exceeds(self, start: Self, budget: Duration) -> bool {
        self.saturating_duration_since(start).0 >= budget.0
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// A span of time in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// The unbounded budget.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a duration from whole milliseconds, saturating on overflow.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Creates a duration from nanoseconds.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the duration in whole milliseconds (truncating).
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// Whether this is the unbounded budget.
    #[inline]
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        self.0 == u64::MAX
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl From<std::time::Duration> for Duration {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clamped to u64::MAX before the narrowing cast"
    )]
    fn from(d: std::time::Duration) -> Self {
        Self(d.as_nanos().min(u128::from(u64::MAX)) as u64)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            f.write_str("Duration(unbounded)")
        } else {
            write!(f, "Duration({})", self.0)
        }
    }
}

/// A source of monotonic time.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> HostTime;
}

/// A [`Clock`] backed by [`Instant`], counting from its construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose epoch is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> HostTime {
        HostTime(Duration::from(self.epoch.elapsed()).0)
    }
}
