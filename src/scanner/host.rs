//! Per-host scanning: probe every port of one host under a bounded worker pool

use super::HostResult;
use crate::intelligence::shares::ShareEnumerator;
use crate::network::resolver::{host_key, HostnameCache, HostnameResolver};
use crate::network::{PortProber, ProbeResult, StealthPolicy};
use crate::{Result, ScanError};
use log::{debug, info};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Scans a single host. Shared by all host tasks of an engine.
pub struct HostScanner {
    prober: Arc<dyn PortProber>,
    /// `None` disables hostname resolution
    resolver: Option<Arc<dyn HostnameResolver>>,
    cache: Arc<HostnameCache>,
    /// `None` disables share enumeration
    share_enumerator: Option<Arc<dyn ShareEnumerator>>,
    stealth: StealthPolicy,
    max_threads: usize,
    cancel: CancellationToken,
}

impl HostScanner {
    pub fn new(prober: Arc<dyn PortProber>, max_threads: usize) -> Self {
        Self {
            prober,
            resolver: None,
            cache: Arc::new(HostnameCache::new()),
            share_enumerator: None,
            stealth: StealthPolicy::disabled(),
            max_threads: max_threads.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_resolver(
        mut self,
        resolver: Option<Arc<dyn HostnameResolver>>,
        cache: Arc<HostnameCache>,
    ) -> Self {
        self.resolver = resolver;
        self.cache = cache;
        self
    }

    pub fn with_share_enumerator(mut self, enumerator: Option<Arc<dyn ShareEnumerator>>) -> Self {
        self.share_enumerator = enumerator;
        self
    }

    pub fn with_stealth(mut self, stealth: StealthPolicy) -> Self {
        self.stealth = stealth;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Probe `ports` on `ip`.
    ///
    /// Returns `Ok(None)` when no port is open or the scan of this host was
    /// interrupted. A panicking probe task fails the whole host.
    pub async fn scan_host(&self, ip: Ipv4Addr, ports: &[u16]) -> Result<Option<HostResult>> {
        if ports.is_empty() || self.cancel.is_cancelled() {
            return Ok(None);
        }

        let hostname = match &self.resolver {
            Some(resolver) => self.cache.resolve(resolver.as_ref(), ip).await,
            None => None,
        };
        let key: Arc<str> = Arc::from(host_key(ip, hostname.as_deref()));

        self.stealth.pause_before_host().await;
        let ordered = self.stealth.order_ports(ports);

        let workers = self.max_threads.min(ordered.len());
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut interrupted = false;

        debug!(
            "{}: probing {} ports with {} workers, {:?} timeout",
            key,
            ordered.len(),
            workers,
            self.prober.timeout()
        );

        for port in ordered {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    interrupted = true;
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        interrupted = true;
                        break;
                    }
                },
            };

            let prober = Arc::clone(&self.prober);
            let key = Arc::clone(&key);
            tasks.spawn(async move {
                let result = prober.probe(ip, port).await;
                if result.is_open() {
                    info!("{}:{} - OPEN", key, port);
                }
                drop(permit);
                result
            });
        }

        let mut probes: Vec<ProbeResult> = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => probes.push(result),
                Err(e) => {
                    tasks.abort_all();
                    return Err(ScanError::TaskError(format!("probe task for {} failed: {}", key, e)));
                }
            }
        }

        if interrupted {
            debug!("{}: interrupted, discarding {} partial probes", key, probes.len());
            return Ok(None);
        }

        let Some(host) = HostResult::from_probes(ip, hostname, probes) else {
            return Ok(None);
        };

        let host = match &self.share_enumerator {
            Some(enumerator) if !host.file_service_ports().is_empty() => {
                info!("{}: file service ports open, enumerating shares", key);
                let shares = enumerator.enumerate_shares(ip).await;
                if !shares.is_empty() {
                    info!("{}: found shares {}", key, shares.join(", "));
                }
                host.with_shares(shares)
            }
            _ => host,
        };

        Ok(Some(host))
    }
}
