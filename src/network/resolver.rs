//! Reverse DNS resolution for host display names

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use log::debug;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::sync::Mutex;

/// Maps an address to a host name
#[async_trait]
pub trait HostnameResolver: Send + Sync {
    /// PTR name for `ip`, `None` when there is none or the lookup timed out
    async fn reverse_lookup(&self, ip: Ipv4Addr) -> Option<String>;
}

/// hickory-based resolver bounded by its own timeout
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsResolver {
    /// Use the system resolver configuration, or hickory's defaults when it cannot be read
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = hickory_resolver::system_conf::read_system_conf()
            .unwrap_or_else(|e| {
                debug!("system resolver config unavailable ({}), using defaults", e);
                (ResolverConfig::default(), ResolverOpts::default())
            });
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }
}

#[async_trait]
impl HostnameResolver for DnsResolver {
    async fn reverse_lookup(&self, ip: Ipv4Addr) -> Option<String> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.reverse_lookup(IpAddr::V4(ip)));

        match lookup.await {
            Ok(Ok(names)) => names
                .iter()
                .next()
                .map(|name| name.to_string().trim_end_matches('.').to_string())
                .filter(|name| !name.is_empty()),
            Ok(Err(e)) => {
                debug!("reverse lookup for {} failed: {}", ip, e);
                None
            }
            Err(_) => {
                debug!("reverse lookup for {} timed out", ip);
                None
            }
        }
    }
}

/// Per-engine hostname cache, shared by concurrent host tasks.
///
/// Failed lookups are cached too, so each address is resolved at most once
/// per engine.
#[derive(Default)]
pub struct HostnameCache {
    entries: Mutex<HashMap<Ipv4Addr, Option<String>>>,
}

impl HostnameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached name for `ip`, resolving through `resolver` on a miss
    pub async fn resolve(&self, resolver: &dyn HostnameResolver, ip: Ipv4Addr) -> Option<String> {
        if let Some(cached) = self.entries.lock().await.get(&ip) {
            return cached.clone();
        }

        // Not held across the lookup; a racing task resolving the same ip just writes the same value
        let name = resolver.reverse_lookup(ip).await;
        self.entries.lock().await.insert(ip, name.clone());
        name
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// Result key for a host: `<ip>` or `<ip>-<hostname>`
pub fn host_key(ip: Ipv4Addr, hostname: Option<&str>) -> String {
    match hostname {
        Some(name) => format!("{}-{}", ip, name),
        None => ip.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HostnameResolver for CountingResolver {
        async fn reverse_lookup(&self, ip: Ipv4Addr) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ip.is_loopback() {
                Some("localhost".to_string())
            } else {
                None
            }
        }
    }

    #[test]
    fn test_host_key_format() {
        let ip = Ipv4Addr::new(10, 0, 0, 5);
        assert_eq!(host_key(ip, None), "10.0.0.5");
        assert_eq!(host_key(ip, Some("fileserver.lan")), "10.0.0.5-fileserver.lan");
    }

    #[tokio::test]
    async fn test_cache_hits_and_negative_entries() {
        let resolver = CountingResolver {
            calls: AtomicUsize::new(0),
        };
        let cache = HostnameCache::new();

        assert_eq!(
            cache.resolve(&resolver, Ipv4Addr::LOCALHOST).await.as_deref(),
            Some("localhost")
        );
        assert_eq!(
            cache.resolve(&resolver, Ipv4Addr::LOCALHOST).await.as_deref(),
            Some("localhost")
        );
        assert_eq!(cache.resolve(&resolver, Ipv4Addr::new(192, 0, 2, 1)).await, None);
        assert_eq!(cache.resolve(&resolver, Ipv4Addr::new(192, 0, 2, 1)).await, None);

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_cache_is_shared_across_tasks() {
        let resolver = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(HostnameCache::new());

        let mut handles = Vec::new();
        for last in 1..=20u8 {
            let resolver = resolver.clone();
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .resolve(resolver.as_ref(), Ipv4Addr::new(198, 51, 100, last))
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), None);
        }

        assert_eq!(cache.len().await, 20);
    }
}
