//! Configuration module for the netvector engine

use crate::top_ports::DEFAULT_PORTS;
use crate::ScanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for discovery runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// CIDR blocks or single IPv4 addresses to scan
    pub targets: Vec<String>,

    /// Ports probed on every host
    pub ports: Vec<u16>,

    /// Connect timeout for each probe in milliseconds
    pub timeout_ms: u64,

    /// Upper bound of concurrent port probes per host
    pub max_threads: usize,

    /// Upper bound of hosts scanned concurrently
    pub max_host_workers: usize,

    /// CIDR expansion cap per target
    pub max_hosts_per_target: usize,

    /// Reverse-resolve host names and key results as `<ip>-<hostname>`
    pub resolve_hostnames: bool,

    /// Reverse DNS timeout in milliseconds
    pub dns_timeout_ms: u64,

    /// List shares on hosts exposing 139, 445 or 2049
    pub enumerate_shares: bool,

    /// Share listing command timeout in milliseconds
    pub share_timeout_ms: u64,

    /// Shuffle host and port order
    pub randomize: bool,

    /// Upper bound of the random delay slept before each host, 0 disables it
    pub max_delay_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            targets: vec!["127.0.0.1".to_string()],
            ports: DEFAULT_PORTS.to_vec(),
            timeout_ms: 500,
            max_threads: 1000,
            max_host_workers: 50,
            max_hosts_per_target: 255,
            resolve_hostnames: true,
            dns_timeout_ms: 2000,
            enumerate_shares: true,
            share_timeout_ms: 10_000,
            randomize: true,
            max_delay_ms: 0,
        }
    }
}

impl ScanConfig {
    /// Create a new configuration for a single target
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            targets: vec![target.into()],
            ..Default::default()
        }
    }

    /// Replace the targets with a comma-separated list such as `10.0.0.0/24,10.0.1.5`
    pub fn with_target_list(mut self, targets: &str) -> Self {
        self.targets = split_targets(targets);
        self
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    /// Set the ports to scan
    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    /// Set the per-probe timeout in milliseconds
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the per-host port worker bound
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Set how many hosts are scanned at once
    pub fn with_host_workers(mut self, workers: usize) -> Self {
        self.max_host_workers = workers;
        self
    }

    pub fn with_hostname_resolution(mut self, enabled: bool) -> Self {
        self.resolve_hostnames = enabled;
        self
    }

    pub fn with_share_enumeration(mut self, enabled: bool) -> Self {
        self.enumerate_shares = enabled;
        self
    }

    pub fn with_randomization(mut self, enabled: bool) -> Self {
        self.randomize = enabled;
        self
    }

    /// Set the stealth delay upper bound in milliseconds
    pub fn with_max_delay(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    pub fn share_timeout(&self) -> Duration {
        Duration::from_millis(self.share_timeout_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: ScanConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from `~/.netvector.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let Some(home_dir) = dirs::home_dir() else {
            return Self::default();
        };

        let config_path = home_dir.join(".netvector.toml");
        if config_path.exists() {
            match Self::from_toml_file(&config_path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.targets.iter().all(|t| t.trim().is_empty()) {
            return Err(ScanError::ConfigError("Target cannot be empty".to_string()));
        }

        if self.ports.is_empty() {
            return Err(ScanError::ConfigError("No ports specified".to_string()));
        }

        if self.ports.contains(&0) {
            return Err(ScanError::ConfigError("Port 0 cannot be scanned".to_string()));
        }

        if self.max_threads == 0 || self.max_host_workers == 0 {
            return Err(ScanError::ConfigError(
                "Worker counts must be greater than 0".to_string(),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(ScanError::ConfigError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_hosts_per_target == 0 {
            return Err(ScanError::ConfigError(
                "Host cap must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Split a comma-separated target string, dropping empty entries
pub fn split_targets(targets: &str) -> Vec<String> {
    targets
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_mirror_cli() {
        let config = ScanConfig::default();
        assert_eq!(config.timeout_duration(), Duration::from_millis(500));
        assert_eq!(config.max_threads, 1000);
        assert_eq!(config.max_host_workers, 50);
        assert_eq!(config.max_hosts_per_target, 255);
        assert_eq!(config.ports.len(), DEFAULT_PORTS.len());
        assert!(config.resolve_hostnames);
        assert!(config.enumerate_shares);
        assert!(config.randomize);
        assert_eq!(config.max_delay(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_list_splitting() {
        let config = ScanConfig::default().with_target_list(" 10.0.0.0/30, ,192.168.1.7 ");
        assert_eq!(config.targets, vec!["10.0.0.0/30", "192.168.1.7"]);
    }

    #[test]
    fn test_validation_failures() {
        assert!(ScanConfig::default().with_ports(vec![]).validate().is_err());
        assert!(ScanConfig::default().with_ports(vec![0, 80]).validate().is_err());
        assert!(ScanConfig::default().with_threads(0).validate().is_err());
        assert!(ScanConfig::default().with_host_workers(0).validate().is_err());
        assert!(ScanConfig::default().with_timeout(0).validate().is_err());
        assert!(ScanConfig::default().with_targets(vec![String::new()]).validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "targets = [\"10.1.0.0/24\"]\nports = [22, 445]\nrandomize = false").unwrap();

        let config = ScanConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.targets, vec!["10.1.0.0/24"]);
        assert_eq!(config.ports, vec![22, 445]);
        assert!(!config.randomize);
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.share_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ports = \"all of them\"").unwrap();
        assert!(matches!(
            ScanConfig::from_toml_file(file.path()),
            Err(ScanError::ConfigError(_))
        ));
    }
}
