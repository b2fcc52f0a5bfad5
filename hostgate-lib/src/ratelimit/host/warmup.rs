use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::rate::Rate;

/// How much slower than the stable interval a completely cold limiter issues
/// permits.
const COLD_FACTOR: f64 = 3.0;

/// Token bucket whose issue rate ramps up linearly after a period of
/// inactivity.
///
/// A fresh (or idle) limiter starts with a full bucket of "cold" permits.
/// Spending a cold permit costs more time than spending a warm one: the cost
/// falls linearly from `COLD_FACTOR` times the stable interval down to the
/// stable interval while the bucket drains to half of the warm-up window.
/// Draining the whole cold part of the bucket takes exactly `warmup`. Unused
/// time refills the bucket again, so a host that has not seen traffic for a
/// while is approached carefully again.
///
/// Each reservation pays for the previous one: a caller waits until the
/// moment the previous permit has been paid off, then pushes that moment
/// further into the future by the cost of its own permit. Only this
/// bookkeeping happens under the lock, the actual wait does not.
#[derive(Debug)]
pub(crate) struct WarmupLimiter {
    /// Seconds between permits once warm
    stable_interval: f64,
    /// Permits stored beyond this level are cold
    threshold_permits: f64,
    /// Capacity of the bucket
    max_permits: f64,
    /// Extra cost per stored permit above the threshold
    slope: f64,
    /// Seconds of idleness that refill one stored permit
    cool_down_interval: f64,
    state: Mutex<WarmupState>,
}

#[derive(Debug)]
struct WarmupState {
    stored_permits: f64,
    next_free: Instant,
}

impl WarmupLimiter {
    /// Create a limiter ramping up to `rate` over `warmup`.
    ///
    /// `warmup` must not be zero; zero warm-ups use a steady limiter instead.
    pub(crate) fn new(rate: Rate, warmup: Duration) -> Self {
        let stable_interval = rate.interval().as_secs_f64();
        let warmup = warmup.as_secs_f64();
        let cold_interval = stable_interval * COLD_FACTOR;

        let threshold_permits = 0.5 * warmup / stable_interval;
        let max_permits = threshold_permits + 2.0 * warmup / (stable_interval + cold_interval);
        let slope = (cold_interval - stable_interval) / (max_permits - threshold_permits);

        Self {
            stable_interval,
            threshold_permits,
            max_permits,
            slope,
            cool_down_interval: warmup / max_permits,
            state: Mutex::new(WarmupState {
                stored_permits: max_permits,
                next_free: Instant::now(),
            }),
        }
    }

    /// Wait until one permit is available and return how long that took
    pub(crate) async fn acquire(&self) -> Duration {
        let now = Instant::now();
        let wait = self.reserve(now).saturating_duration_since(now);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        wait
    }

    /// Reserve one permit and return the instant it may be used.
    fn reserve(&self, now: Instant) -> Instant {
        // The state is plain numbers, a panic elsewhere cannot leave it torn.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if now > state.next_free {
            let idle = now.duration_since(state.next_free).as_secs_f64();
            state.stored_permits =
                (state.stored_permits + idle / self.cool_down_interval).min(self.max_permits);
            state.next_free = now;
        }

        let ready_at = state.next_free;
        let stored_to_spend = state.stored_permits.min(1.0);
        let fresh_permits = 1.0 - stored_to_spend;
        let cost = self.stored_permits_to_wait_time(state.stored_permits, stored_to_spend)
            + fresh_permits * self.stable_interval;

        log::trace!(
            "Warm-up limiter reserving permit: {:.2} stored, next permit costs {:.3}s",
            state.stored_permits,
            cost
        );

        state.next_free += Duration::from_secs_f64(cost);
        state.stored_permits -= stored_to_spend;
        ready_at
    }

    /// Time it takes to spend `permits_to_take` out of `stored_permits`,
    /// integrating the linear cost function above the threshold.
    fn stored_permits_to_wait_time(&self, stored_permits: f64, mut permits_to_take: f64) -> f64 {
        let above_threshold = stored_permits - self.threshold_permits;
        let mut seconds = 0.0;

        if above_threshold > 0.0 {
            let above_to_take = above_threshold.min(permits_to_take);
            let length = self.permits_to_time(above_threshold)
                + self.permits_to_time(above_threshold - above_to_take);
            seconds = above_to_take * length / 2.0;
            permits_to_take -= above_to_take;
        }

        seconds + self.stable_interval * permits_to_take
    }

    fn permits_to_time(&self, permits: f64) -> f64 {
        self.stable_interval + permits * self.slope
    }
}
