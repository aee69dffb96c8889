//! Host intelligence derived from a scan: OS guesses, shares and port context

pub mod os_fingerprinting;
pub mod port_info;
pub mod shares;

pub use os_fingerprinting::{classify, Confidence, OsFamily, OsFingerprint, ScoreBreakdown};
pub use port_info::{describe, security_level, service_name, PortInfo, SecurityLevel};
pub use shares::{CommandShareEnumerator, ShareEnumerator, SharePlatform};
