//! Scanner module: per-host scanning, the discovery orchestrator and their results

pub mod engine;
pub mod host;

use crate::intelligence::os_fingerprinting::{classify, OsFingerprint};
use crate::network::ProbeResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::Duration;

pub use engine::DiscoveryEngine;
pub use host::HostScanner;

/// Everything found on one host with at least one open port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResult {
    /// `<ip>` or `<ip>-<hostname>`
    pub host_key: String,
    pub ip: Ipv4Addr,
    pub hostname: Option<String>,
    /// Strictly ascending
    pub open_ports: Vec<u16>,
    /// Connect time in seconds per open port
    pub port_timings: BTreeMap<u16, f64>,
    /// Mean of `port_timings`, 0 when there are none
    pub avg_response_time: f64,
    /// `None` when share enumeration did not run for this host
    pub shares: Option<Vec<String>>,
    pub os: OsFingerprint,
}

impl HostResult {
    /// Build a result from a host's probes. Returns `None` when nothing is open.
    pub fn from_probes<I>(ip: Ipv4Addr, hostname: Option<String>, probes: I) -> Option<Self>
    where
        I: IntoIterator<Item = ProbeResult>,
    {
        let port_timings: BTreeMap<u16, f64> = probes
            .into_iter()
            .filter(|probe| probe.is_open())
            .map(|probe| (probe.port, probe.elapsed_secs().unwrap_or(0.0)))
            .collect();

        if port_timings.is_empty() {
            return None;
        }

        let open_ports: Vec<u16> = port_timings.keys().copied().collect();
        let avg_response_time = port_timings.values().sum::<f64>() / port_timings.len() as f64;
        let host_key = crate::network::resolver::host_key(ip, hostname.as_deref());
        let os = classify(&open_ports);

        Some(Self {
            host_key,
            ip,
            hostname,
            open_ports,
            port_timings,
            avg_response_time,
            shares: None,
            os,
        })
    }

    pub fn with_shares(mut self, shares: Vec<String>) -> Self {
        self.shares = Some(shares);
        self
    }

    /// Open ports among 139, 445 and 2049
    pub fn file_service_ports(&self) -> Vec<u16> {
        self.open_ports
            .iter()
            .copied()
            .filter(|port| crate::top_ports::is_file_service_port(*port))
            .collect()
    }
}

/// Aggregate of one `scan_network` run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Host results keyed by host key
    pub hosts: BTreeMap<String, HostResult>,
    /// Non-empty share lists keyed by host key
    pub shares: BTreeMap<String, Vec<String>>,
    /// Targets that were expanded and dispatched
    pub targets: Vec<String>,
    /// Targets rejected during parsing
    pub skipped_targets: Vec<String>,
    /// Host scans actually spawned across all targets
    pub hosts_scanned: usize,
    pub ports_scanned: usize,
    pub duration: Duration,
    /// The run was stopped before every host was dispatched
    pub cancelled: bool,
}

impl ScanResult {
    pub fn new(ports_scanned: usize) -> Self {
        Self {
            ports_scanned,
            ..Default::default()
        }
    }

    /// Publish a host. A host key seen before is replaced, shares included.
    pub fn insert_host(&mut self, host: HostResult) {
        match host.shares.as_ref().filter(|shares| !shares.is_empty()) {
            Some(shares) => {
                self.shares.insert(host.host_key.clone(), shares.clone());
            }
            None => {
                self.shares.remove(&host.host_key);
            }
        }
        self.hosts.insert(host.host_key.clone(), host);
    }

    /// Open ports per host key, the shape reporting consumes
    pub fn open_port_map(&self) -> BTreeMap<String, Vec<u16>> {
        self.hosts
            .iter()
            .map(|(key, host)| (key.clone(), host.open_ports.clone()))
            .collect()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn total_open_ports(&self) -> usize {
        self.hosts.values().map(|host| host.open_ports.len()).sum()
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }
}
