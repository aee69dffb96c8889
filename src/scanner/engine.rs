//! Discovery orchestrator: expands targets and fans host scans out over a worker pool

use super::host::HostScanner;
use super::ScanResult;
use crate::config::ScanConfig;
use crate::intelligence::shares::{CommandShareEnumerator, ShareEnumerator};
use crate::network::resolver::{DnsResolver, HostnameCache, HostnameResolver};
use crate::network::target::expand_target;
use crate::network::{PortProber, StealthPolicy, TcpConnectProber};
use crate::{Result, ScanError};
use futures::future::join_all;
use log::{debug, info, warn};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

/// Concurrent discovery engine.
///
/// Hosts of a target are scanned in parallel, targets one after another.
/// Each host lands in the aggregate as a whole once all its probes are done.
pub struct DiscoveryEngine {
    config: ScanConfig,
    prober: Arc<dyn PortProber>,
    resolver: Option<Arc<dyn HostnameResolver>>,
    share_enumerator: Option<Arc<dyn ShareEnumerator>>,
    cache: Arc<HostnameCache>,
    cancel: CancellationToken,
}

impl DiscoveryEngine {
    /// Engine with TCP connect probing, system DNS and command-based share listing
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;

        let prober: Arc<dyn PortProber> = Arc::new(TcpConnectProber::new(config.timeout_duration()));
        let resolver: Option<Arc<dyn HostnameResolver>> = if config.resolve_hostnames {
            Some(Arc::new(DnsResolver::new(config.dns_timeout())))
        } else {
            None
        };
        let share_enumerator: Option<Arc<dyn ShareEnumerator>> = if config.enumerate_shares {
            Some(Arc::new(CommandShareEnumerator::new(config.share_timeout())))
        } else {
            None
        };

        Ok(Self {
            config,
            prober,
            resolver,
            share_enumerator,
            cache: Arc::new(HostnameCache::new()),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_prober(mut self, prober: Arc<dyn PortProber>) -> Self {
        self.prober = prober;
        self
    }

    /// Replace the resolver; ignored when hostname resolution is disabled
    pub fn with_resolver(mut self, resolver: Arc<dyn HostnameResolver>) -> Self {
        if self.config.resolve_hostnames {
            self.resolver = Some(resolver);
        }
        self
    }

    /// Replace the share enumerator; ignored when share enumeration is disabled
    pub fn with_share_enumerator(mut self, enumerator: Arc<dyn ShareEnumerator>) -> Self {
        if self.config.enumerate_shares {
            self.share_enumerator = Some(enumerator);
        }
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop dispatching new work. Hosts already finished stay in the result.
    ///
    /// Cancellation is permanent: every later scan on this engine returns
    /// an empty, cancelled result. Build a new engine to scan again.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Scan the configured targets and ports
    pub async fn scan(&self) -> Result<ScanResult> {
        self.scan_network(&self.config.targets, &self.config.ports).await
    }

    /// Scan every host of every target on `ports`.
    ///
    /// Unparseable targets are logged and skipped. When two targets yield the
    /// same host key the later one wins.
    pub async fn scan_network(&self, targets: &[String], ports: &[u16]) -> Result<ScanResult> {
        if ports.is_empty() {
            return Err(ScanError::ConfigError("No ports specified".to_string()));
        }

        let start_time = Instant::now();
        let ports: Arc<[u16]> = Arc::from(ports);
        let stealth = StealthPolicy::from_config(&self.config);
        let scanner = Arc::new(self.host_scanner(stealth));
        let aggregate = Arc::new(Mutex::new(ScanResult::new(ports.len())));

        for target in targets {
            if self.cancel.is_cancelled() {
                break;
            }

            let expanded = match expand_target(target, self.config.max_hosts_per_target) {
                Ok(expanded) => expanded,
                Err(e) => {
                    warn!("Skipping target {}: {}", target, e);
                    aggregate.lock().await.skipped_targets.push(target.clone());
                    continue;
                }
            };

            if expanded.is_truncated() {
                warn!(
                    "{}: network too large ({} hosts). Limiting to first {} hosts.",
                    expanded.original,
                    expanded.total_hosts,
                    expanded.hosts.len()
                );
            }

            let mut hosts = expanded.hosts;
            stealth.order_hosts(&mut hosts);

            aggregate.lock().await.targets.push(target.clone());

            info!(
                "Starting scan of {} hosts with {} ports each...",
                hosts.len(),
                ports.len()
            );
            self.scan_hosts(&scanner, hosts, &ports, &aggregate).await;
        }

        let mut result = std::mem::take(&mut *aggregate.lock().await);
        result.cancelled = self.cancel.is_cancelled();
        result.set_duration(start_time.elapsed());

        info!(
            "Scan completed in {:.2} seconds: {} hosts with open ports",
            result.duration.as_secs_f64(),
            result.host_count()
        );

        Ok(result)
    }

    fn host_scanner(&self, stealth: StealthPolicy) -> HostScanner {
        HostScanner::new(Arc::clone(&self.prober), self.config.max_threads)
            .with_resolver(self.resolver.clone(), Arc::clone(&self.cache))
            .with_share_enumerator(self.share_enumerator.clone())
            .with_stealth(stealth)
            .with_cancellation(self.cancel.clone())
    }

    /// Run one target's hosts under `min(max_host_workers, hosts)` workers
    async fn scan_hosts(
        &self,
        scanner: &Arc<HostScanner>,
        hosts: Vec<Ipv4Addr>,
        ports: &Arc<[u16]>,
        aggregate: &Arc<Mutex<ScanResult>>,
    ) {
        if hosts.is_empty() {
            return;
        }

        let workers = self.config.max_host_workers.max(1).min(hosts.len());
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut dispatched = Vec::with_capacity(hosts.len());
        let mut handles = Vec::with_capacity(hosts.len());

        for ip in hosts {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("cancelled, not dispatching remaining hosts");
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let scanner = Arc::clone(scanner);
            let ports = Arc::clone(ports);
            let collector = Arc::clone(aggregate);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match scanner.scan_host(ip, &ports).await {
                    Ok(Some(host)) => collector.lock().await.insert_host(host),
                    Ok(None) => {}
                    Err(e) => warn!("Host {} generated an error: {}", ip, e),
                }
            });
            dispatched.push(ip);
            handles.push(handle);
        }

        aggregate.lock().await.hosts_scanned += handles.len();

        for (ip, joined) in dispatched.into_iter().zip(join_all(handles).await) {
            if let Err(e) = joined {
                warn!("Host {} generated an error: {}", ip, e);
            }
        }
    }
}
