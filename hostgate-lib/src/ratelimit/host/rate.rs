use governor::Quota;
use serde::{Deserialize, Serialize, Serializer};
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use crate::ratelimit::RateError;

/// Steady-state request rate for a host, in permits per second.
///
/// A `Rate` is validated once on construction: it is finite, strictly
/// positive and convertible into a non-zero interval between permits.
/// Fractional rates are allowed, `0.2` issues one permit every five seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    permits_per_second: f64,
    quota: Quota,
}

impl Rate {
    /// Create a rate of `permits_per_second`
    ///
    /// # Errors
    ///
    /// Returns [`RateError::NotPositive`] for zero, negative or non-finite
    /// values and [`RateError::OutOfRange`] when the resulting interval is not
    /// representable.
    pub fn per_second(permits_per_second: f64) -> Result<Self, RateError> {
        if !permits_per_second.is_finite() || permits_per_second <= 0.0 {
            return Err(RateError::NotPositive(permits_per_second));
        }
        let interval = Duration::try_from_secs_f64(1.0 / permits_per_second)
            .map_err(|_| RateError::OutOfRange(permits_per_second))?;
        // Limiters track time as u64 nanoseconds
        if interval.as_nanos() > u128::from(u64::MAX) {
            return Err(RateError::OutOfRange(permits_per_second));
        }
        let quota = Quota::with_period(interval)
            .ok_or(RateError::OutOfRange(permits_per_second))?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            permits_per_second,
            quota,
        })
    }

    /// Permits issued per second once the limiter is warm
    #[must_use]
    pub const fn permits_per_second(self) -> f64 {
        self.permits_per_second
    }

    /// Time between two permits at the steady-state rate
    #[must_use]
    pub fn interval(self) -> Duration {
        self.quota.replenish_interval()
    }

    /// The governor quota backing a steady limiter: one permit per interval,
    /// no bursts.
    pub(crate) const fn quota(self) -> Quota {
        self.quota
    }
}

impl FromStr for Rate {
    type Err = RateError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let value = input
            .trim()
            .parse::<f64>()
            .map_err(|_| RateError::Parse(input.to_string()))?;
        Self::per_second(value)
    }
}

impl TryFrom<f64> for Rate {
    type Error = RateError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::per_second(value)
    }
}

impl Serialize for Rate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.permits_per_second.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::per_second(value).map_err(serde::de::Error::custom)
    }
}
