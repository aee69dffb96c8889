//! Stealth scheduling: probe order and timing randomization
//!
//! The policy only ever permutes host and port lists and inserts delays. It
//! never adds or removes entries, so the discovered port sets do not depend
//! on whether it is enabled.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stealth configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPolicy {
    /// Shuffle hosts once per run and ports once per host
    pub randomize: bool,
    /// Upper bound of the random pause before each host, zero disables it
    pub max_delay: Duration,
}

impl Default for StealthPolicy {
    fn default() -> Self {
        Self {
            randomize: true,
            max_delay: Duration::ZERO,
        }
    }
}

impl StealthPolicy {
    pub fn new(randomize: bool, max_delay: Duration) -> Self {
        Self {
            randomize,
            max_delay,
        }
    }

    /// Sequential order, no delays
    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO)
    }

    pub fn from_config(config: &crate::ScanConfig) -> Self {
        Self::new(config.randomize, config.max_delay())
    }

    /// Shuffle the host list in place when randomization is enabled
    pub fn order_hosts<T>(&self, hosts: &mut [T]) {
        if self.randomize {
            hosts.shuffle(&mut rand::thread_rng());
        }
    }

    /// Per-host port order; the input slice is left untouched
    pub fn order_ports(&self, ports: &[u16]) -> Vec<u16> {
        let mut ordered = ports.to_vec();
        if self.randomize {
            ordered.shuffle(&mut rand::thread_rng());
        }
        ordered
    }

    /// Uniform delay in `[0, max_delay)`, zero when disabled
    pub fn host_delay(&self) -> Duration {
        if !self.randomize || self.max_delay.is_zero() {
            return Duration::ZERO;
        }

        let bound = u64::try_from(self.max_delay.as_nanos()).unwrap_or(u64::MAX);
        Duration::from_nanos(rand::thread_rng().gen_range(0..bound))
    }

    /// Sleep for `host_delay()` if there is one
    pub async fn pause_before_host(&self) {
        let delay = self.host_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_port_order_is_a_permutation() {
        let policy = StealthPolicy::default();
        let ports: Vec<u16> = (1..=500).collect();
        let mut shuffled = policy.order_ports(&ports);
        assert_eq!(shuffled.len(), ports.len());
        shuffled.sort_unstable();
        assert_eq!(shuffled, ports);
    }

    #[test]
    fn test_disabled_policy_keeps_order() {
        let policy = StealthPolicy::disabled();
        let ports = vec![443, 22, 80];
        assert_eq!(policy.order_ports(&ports), ports);

        let mut hosts = vec!["a", "b", "c"];
        policy.order_hosts(&mut hosts);
        assert_eq!(hosts, vec!["a", "b", "c"]);
        assert_eq!(policy.host_delay(), Duration::ZERO);
    }

    #[test]
    fn test_hosts_shuffle_keeps_members() {
        let policy = StealthPolicy::default();
        let mut hosts: Vec<u32> = (0..100).collect();
        policy.order_hosts(&mut hosts);
        let set: HashSet<u32> = hosts.into_iter().collect();
        assert_eq!(set.len(), 100);
    }

    #[test]
    fn test_delay_is_below_bound() {
        let policy = StealthPolicy::new(true, Duration::from_millis(50));
        for _ in 0..200 {
            assert!(policy.host_delay() < Duration::from_millis(50));
        }
    }

    #[test]
    fn test_zero_bound_means_no_delay() {
        let policy = StealthPolicy::new(true, Duration::ZERO);
        assert_eq!(policy.host_delay(), Duration::ZERO);
    }
}
