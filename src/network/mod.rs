//! Network module: probing, target expansion, name resolution and stealth policy

pub mod resolver;
pub mod socket;
pub mod stealth;
pub mod target;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use resolver::{DnsResolver, HostnameCache, HostnameResolver};
pub use socket::{PortProber, TcpConnectProber};
pub use stealth::StealthPolicy;
pub use target::{expand_target, ExpandedTarget};

/// Port state as observed by a connect probe.
///
/// Refused, timed out and unreachable are deliberately not told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    Open,
    Closed,
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
        }
    }
}

/// Outcome of one probe against a single host:port pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub port: u16,
    pub state: PortState,
    /// Connect time, only measured for open ports
    pub elapsed: Option<Duration>,
}

impl ProbeResult {
    pub fn open(port: u16, elapsed: Duration) -> Self {
        Self {
            port,
            state: PortState::Open,
            elapsed: Some(elapsed),
        }
    }

    pub fn closed(port: u16) -> Self {
        Self {
            port,
            state: PortState::Closed,
            elapsed: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }

    /// Elapsed time in seconds, if measured
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.elapsed.map(|d| d.as_secs_f64())
    }
}
