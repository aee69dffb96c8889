//! Failure isolation: bad targets, failing hosts and broken configuration

use async_trait::async_trait;
use netvector::network::{PortProber, ProbeResult};
use netvector::{DiscoveryEngine, ScanConfig, ScanError};
use std::io::Write;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

/// Panics on every probe of one host, port 22 open everywhere else
struct FaultyHost(Ipv4Addr);

#[async_trait]
impl PortProber for FaultyHost {
    async fn probe(&self, ip: Ipv4Addr, port: u16) -> ProbeResult {
        if ip == self.0 {
            panic!("driver fault on {}", ip);
        }
        if port == 22 {
            ProbeResult::open(port, Duration::from_millis(1))
        } else {
            ProbeResult::closed(port)
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(10)
    }
}

fn config(target: &str) -> ScanConfig {
    ScanConfig::new(target)
        .with_ports(vec![22, 80])
        .with_hostname_resolution(false)
        .with_share_enumeration(false)
}

#[tokio::test]
async fn test_failing_host_does_not_abort_scan() {
    let engine = DiscoveryEngine::new(config("10.50.0.0/29"))
        .unwrap()
        .with_prober(Arc::new(FaultyHost(Ipv4Addr::new(10, 50, 0, 3))));

    let result = engine.scan().await.unwrap();

    assert_eq!(result.host_count(), 5);
    assert!(!result.hosts.contains_key("10.50.0.3"));
    assert!(result.hosts.contains_key("10.50.0.4"));
}

#[tokio::test]
async fn test_only_invalid_targets() {
    let engine = DiscoveryEngine::new(config("127.0.0.1")).unwrap();
    let targets = vec!["300.300.300.300/24".to_string(), "nope".to_string()];

    let result = engine.scan_network(&targets, &[22]).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.skipped_targets.len(), 2);
}

#[test]
fn test_invalid_configs_rejected() {
    let cases = [
        config("10.0.0.1").with_ports(Vec::new()),
        config("10.0.0.1").with_ports(vec![0, 22]),
        config("10.0.0.1").with_threads(0),
        config("10.0.0.1").with_timeout(0),
        config("").with_targets(Vec::new()),
    ];

    for case in cases {
        assert!(matches!(
            DiscoveryEngine::new(case),
            Err(ScanError::ConfigError(_))
        ));
    }
}

#[test]
fn test_malformed_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timeout_ms = \"fast\"").unwrap();

    let err = ScanConfig::from_toml_file(file.path()).unwrap_err();
    assert!(matches!(err, ScanError::ConfigError(_)));
}

#[test]
fn test_partial_config_file_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "targets = [\"10.0.0.0/24\"]\nrandomize = false\nmax_delay_ms = 250").unwrap();

    let config = ScanConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.targets, vec!["10.0.0.0/24"]);
    assert!(!config.randomize);
    assert_eq!(config.max_delay(), Duration::from_millis(250));
    assert_eq!(config.timeout_ms, 500);
    assert!(config.validate().is_ok());
}
