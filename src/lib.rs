//! netvector - concurrent network discovery
//!
//! TCP connect probing across CIDR blocks, port-signature OS guessing and
//! SMB share enumeration, with randomized probe ordering.

pub mod config;
pub mod error;
pub mod intelligence;
pub mod network;
pub mod output;
pub mod scanner;
pub mod top_ports;

// Re-export commonly used types
pub use config::ScanConfig;
pub use error::ScanError;
pub use intelligence::{classify, Confidence, OsFamily, OsFingerprint};
pub use network::{expand_target, PortProber, StealthPolicy, TcpConnectProber};
pub use scanner::{DiscoveryEngine, HostResult, HostScanner, ScanResult};
pub use top_ports::{get_top_ports, DEFAULT_PORTS};

pub type Result<T> = std::result::Result<T, ScanError>;
