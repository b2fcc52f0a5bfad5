use governor::DefaultDirectRateLimiter;
use std::time::{Duration, Instant};

use super::rate::Rate;
use super::warmup::WarmupLimiter;

/// The rate limiter guarding a single host.
///
/// A limiter either issues permits at a steady rate from the start, or ramps
/// up to that rate over a warm-up window. Limiters are immutable once built;
/// changing a host's rate means registering a new limiter for it.
#[derive(Debug)]
pub struct HostLimiter {
    rate: Rate,
    warmup: Option<Duration>,
    bucket: Bucket,
}

#[derive(Debug)]
enum Bucket {
    /// Token bucket using governor, no bursts
    Steady(DefaultDirectRateLimiter),
    WarmingUp(WarmupLimiter),
}

impl HostLimiter {
    /// Create a limiter issuing permits at `rate` right away
    #[must_use]
    pub fn steady(rate: Rate) -> Self {
        Self {
            rate,
            warmup: None,
            bucket: Bucket::Steady(DefaultDirectRateLimiter::direct(rate.quota())),
        }
    }

    /// Create a limiter that ramps up to `rate` over `warmup`.
    ///
    /// A zero `warmup` yields a steady limiter.
    #[must_use]
    pub fn warming_up(rate: Rate, warmup: Duration) -> Self {
        if warmup.is_zero() {
            return Self::steady(rate);
        }
        Self {
            rate,
            warmup: Some(warmup),
            bucket: Bucket::WarmingUp(WarmupLimiter::new(rate, warmup)),
        }
    }

    /// The steady-state rate of this limiter
    #[must_use]
    pub const fn rate(&self) -> Rate {
        self.rate
    }

    /// The warm-up window, if this limiter ramps up
    #[must_use]
    pub const fn warmup(&self) -> Option<Duration> {
        self.warmup
    }

    /// Wait until the limiter admits one request.
    ///
    /// Returns how long the caller had to wait. Dropping the returned future
    /// gives up waiting; a permit the limiter already handed out is not
    /// refunded.
    pub async fn acquire(&self) -> Duration {
        match &self.bucket {
            Bucket::Steady(limiter) => {
                let start = Instant::now();
                limiter.until_ready().await;
                start.elapsed()
            }
            Bucket::WarmingUp(limiter) => limiter.acquire().await,
        }
    }
}
