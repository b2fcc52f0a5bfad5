use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::ratelimit::{HostKey, HostLimiter, Rate};

/// Registry of per-host rate limiters.
///
/// The registry maps host names to their [`HostLimiter`]. Limits can be
/// registered at any time, also while requests are in flight.
///
/// # Concurrency
///
/// - Backed by a [`DashMap`], so registration and lookup need no external
///   locking
/// - Limiters are fully built before they are published, a lookup never
///   observes a half-constructed limiter
/// - [`HostRegistry::lookup`] hands out an [`Arc`], so nobody holds a map
///   guard while waiting for a permit
/// - Re-registering a host replaces its limiter. Callers already holding the
///   old limiter finish with it; subsequent lookups see the new one
#[derive(Debug, Default)]
pub struct HostRegistry {
    limiters: DashMap<HostKey, Arc<HostLimiter>>,
}

impl HostRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a steady `rate` for `host`, replacing any previous limit
    ///
    /// # Examples
    ///
    /// ```
    /// use hostgate_lib::{HostRegistry, Rate};
    ///
    /// let registry = HostRegistry::new();
    /// registry.register("example.com", Rate::per_second(2.0).unwrap());
    /// assert!(registry.contains("EXAMPLE.com"));
    /// ```
    pub fn register(&self, host: impl Into<HostKey>, rate: Rate) {
        self.insert(host.into(), HostLimiter::steady(rate));
    }

    /// Register a `rate` for `host` that is reached gradually over `warmup`,
    /// replacing any previous limit
    pub fn register_with_warmup(&self, host: impl Into<HostKey>, rate: Rate, warmup: Duration) {
        self.insert(host.into(), HostLimiter::warming_up(rate, warmup));
    }

    fn insert(&self, host: HostKey, limiter: HostLimiter) {
        let rate = limiter.rate().permits_per_second();
        let warmup = limiter.warmup();
        let previous = self.limiters.insert(host.clone(), Arc::new(limiter));

        match (previous, warmup) {
            (Some(_), _) => {
                log::debug!("Replaced rate limit for host {host}: {rate} requests per second");
            }
            (None, Some(warmup)) => log::debug!(
                "Registered rate limit for host {host}: {rate} requests per second after a warm-up of {}ms",
                warmup.as_millis()
            ),
            (None, None) => {
                log::debug!("Registered rate limit for host {host}: {rate} requests per second");
            }
        }
    }

    /// Get the current limiter for `host`, if one is registered.
    ///
    /// This never blocks on other hosts' waits.
    #[must_use]
    pub fn lookup(&self, host: &HostKey) -> Option<Arc<HostLimiter>> {
        self.limiters.get(host).map(|entry| Arc::clone(entry.value()))
    }

    /// Check whether a limit is registered for `host`
    #[must_use]
    pub fn contains(&self, host: impl Into<HostKey>) -> bool {
        self.limiters.contains_key(&host.into())
    }

    /// Number of hosts with a registered limit
    #[must_use]
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Check whether no limit has been registered yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    /// Snapshot of all registered hosts, sorted by name
    #[must_use]
    pub fn hosts(&self) -> Vec<HostKey> {
        let mut hosts: Vec<_> = self
            .limiters
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        hosts.sort();
        hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rate(permits: f64) -> Rate {
        Rate::per_second(permits).unwrap()
    }

    #[test]
    fn test_registry_creation() {
        let registry = HostRegistry::new();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.lookup(&HostKey::from("example.com")).is_none());
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = HostRegistry::new();
        registry.register("Example.com", rate(2.0));

        let limiter = registry.lookup(&HostKey::from("example.COM")).unwrap();
        assert_eq!(limiter.rate(), rate(2.0));
        assert_eq!(limiter.warmup(), None);
        assert!(registry.lookup(&HostKey::from("www.example.com")).is_none());
    }

    #[test]
    fn test_register_with_warmup() {
        let registry = HostRegistry::new();
        registry.register_with_warmup("example.com", rate(5.0), Duration::from_secs(10));

        let limiter = registry.lookup(&HostKey::from("example.com")).unwrap();
        assert_eq!(limiter.warmup(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_reregistration_replaces_limiter() {
        let registry = HostRegistry::new();
        registry.register("example.com", rate(1.0));
        let old = registry.lookup(&HostKey::from("example.com")).unwrap();

        registry.register("EXAMPLE.COM", rate(10.0));
        let new = registry.lookup(&HostKey::from("example.com")).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(new.rate(), rate(10.0));
        // Holders of the old limiter keep a working instance
        assert_eq!(old.rate(), rate(1.0));
    }

    #[test]
    fn test_lookup_returns_shared_instance() {
        let registry = HostRegistry::new();
        registry.register("example.com", rate(1.0));

        let first = registry.lookup(&HostKey::from("example.com")).unwrap();
        let second = registry.lookup(&HostKey::from("example.com")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_hosts_snapshot() {
        let registry = HostRegistry::new();
        registry.register("b.example", rate(1.0));
        registry.register("A.example", rate(1.0));

        assert_eq!(
            registry.hosts(),
            vec![HostKey::from("a.example"), HostKey::from("b.example")]
        );
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let registry = Arc::new(HostRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for round in 0..100 {
                        let host = format!("host-{}.example", (i + round) % 4);
                        registry.register(host.as_str(), rate(f64::from(round + 1)));
                        assert!(registry.lookup(&HostKey::from(host)).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 4);
    }
}
