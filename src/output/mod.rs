//! Output formatting and management

use crate::config::ScanConfig;
use crate::intelligence::port_info::{security_level, service_name, SecurityLevel};
use crate::scanner::{HostResult, ScanResult};
use crate::ScanError;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Stdout when `None`
    pub file: Option<PathBuf>,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
            colored: true,
        }
    }
}

/// Run metadata carried in JSON reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanInfo {
    pub targets: Vec<String>,
    pub total_hosts: usize,
    pub ports_scanned: usize,
    pub hostname_resolution: bool,
    pub share_enumeration: bool,
    pub duration_secs: f64,
}

/// JSON report layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub scan_results: BTreeMap<String, Vec<u16>>,
    pub share_results: BTreeMap<String, Vec<String>>,
    pub hosts: BTreeMap<String, HostResult>,
    pub timestamp: DateTime<Utc>,
    pub scan_info: ScanInfo,
}

impl JsonReport {
    pub fn new(results: &ScanResult, config: &ScanConfig) -> Self {
        Self {
            scan_results: results.open_port_map(),
            share_results: results.shares.clone(),
            hosts: results.hosts.clone(),
            timestamp: Utc::now(),
            scan_info: ScanInfo {
                targets: results.targets.clone(),
                total_hosts: results.host_count(),
                ports_scanned: results.ports_scanned,
                hostname_resolution: config.resolve_hostnames,
                share_enumeration: config.enumerate_shares,
                duration_secs: results.duration.as_secs_f64(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    host: &'a str,
    ip: String,
    hostname: &'a str,
    port: u16,
    service: &'static str,
    security: String,
    response_time_ms: String,
    os: &'static str,
    confidence: String,
}

/// Main output manager
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render and write scan results to the configured destination
    pub fn write_results(&self, results: &ScanResult, scan_config: &ScanConfig) -> crate::Result<()> {
        let output = self.render(results, scan_config)?;

        match &self.config.file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(output.as_bytes())?;
                log::info!("Results written to {}", path.display());
            }
            None => {
                print!("{}", output);
            }
        }

        Ok(())
    }

    pub fn render(&self, results: &ScanResult, scan_config: &ScanConfig) -> crate::Result<String> {
        match self.config.format {
            OutputFormat::Text => Ok(self.format_text(results)),
            OutputFormat::Json => format_json(results, scan_config),
            OutputFormat::Csv => format_csv(results),
        }
    }

    /// Format results as text
    fn format_text(&self, results: &ScanResult) -> String {
        let mut output = String::new();
        output.push('\n');

        if results.is_empty() {
            output.push_str("No open ports found on any hosts.\n");
            return output;
        }

        for host in results.hosts.values() {
            let heading = format!(
                "{}  [{}, {} confidence]",
                host.host_key, host.os.os, host.os.confidence
            );
            output.push_str(&self.paint(&heading, Paint::Heading));
            output.push('\n');

            for port in &host.open_ports {
                let elapsed_ms = host.port_timings.get(port).copied().unwrap_or(0.0) * 1000.0;
                let level = security_level(*port);
                let line = format!(
                    "  {:>5}/tcp  {:<15} {:<13} ({:.1}ms)",
                    port,
                    service_name(*port),
                    level.to_string(),
                    elapsed_ms
                );
                output.push_str(&self.paint(&line, Paint::Security(level)));
                output.push('\n');
            }

            if let Some(shares) = host.shares.as_ref().filter(|shares| !shares.is_empty()) {
                output.push_str(&format!("  Shares: {}\n", shares.join(", ")));
            }
            output.push('\n');
        }

        let summary = format!(
            "{} hosts with {} open ports in {:.2} seconds",
            results.host_count(),
            results.total_open_ports(),
            results.duration.as_secs_f64()
        );
        output.push_str(&self.paint(&summary, Paint::Summary));
        output.push('\n');
        output
    }

    fn paint(&self, text: &str, paint: Paint) -> String {
        if !self.config.colored {
            return text.to_string();
        }

        match paint {
            Paint::Heading => text.bold().cyan().to_string(),
            Paint::Summary => text.bold().to_string(),
            Paint::Security(SecurityLevel::High) => text.red().to_string(),
            Paint::Security(SecurityLevel::Medium) => text.yellow().to_string(),
            Paint::Security(SecurityLevel::Low) | Paint::Security(SecurityLevel::Secure) => {
                text.green().to_string()
            }
            Paint::Security(SecurityLevel::Unknown) => text.white().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Paint {
    Heading,
    Summary,
    Security(SecurityLevel),
}

/// Format results as JSON
fn format_json(results: &ScanResult, scan_config: &ScanConfig) -> crate::Result<String> {
    let report = JsonReport::new(results, scan_config);
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Format results as CSV, one row per open port
fn format_csv(results: &ScanResult) -> crate::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([
        "host",
        "ip",
        "hostname",
        "port",
        "service",
        "security",
        "response_time_ms",
        "os",
        "confidence",
    ])?;

    for host in results.hosts.values() {
        for port in &host.open_ports {
            let elapsed_ms = host.port_timings.get(port).copied().unwrap_or(0.0) * 1000.0;
            writer.serialize(CsvRow {
                host: &host.host_key,
                ip: host.ip.to_string(),
                hostname: host.hostname.as_deref().unwrap_or(""),
                port: *port,
                service: service_name(*port),
                security: security_level(*port).to_string(),
                response_time_ms: format!("{:.1}", elapsed_ms),
                os: host.os.os.name(),
                confidence: host.os.confidence.to_string(),
            })?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ScanError::OutputError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ScanError::OutputError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ProbeResult;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn sample() -> ScanResult {
        let mut result = ScanResult::new(3);
        result.targets.push("192.168.1.0/24".to_string());
        let host = HostResult::from_probes(
            Ipv4Addr::new(192, 168, 1, 10),
            Some("files.lan".to_string()),
            vec![
                ProbeResult::open(445, Duration::from_millis(4)),
                ProbeResult::open(139, Duration::from_millis(2)),
                ProbeResult::closed(22),
            ],
        )
        .unwrap()
        .with_shares(vec!["public".to_string()]);
        result.insert_host(host);
        result
    }

    fn manager(format: OutputFormat) -> OutputManager {
        OutputManager::new(OutputConfig {
            format,
            file: None,
            colored: false,
        })
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_lists_hosts_and_shares() {
        let text = manager(OutputFormat::Text)
            .render(&sample(), &ScanConfig::default())
            .unwrap();
        assert!(text.contains("192.168.1.10-files.lan"));
        assert!(text.contains("139/tcp"));
        assert!(text.contains("Shares: public"));
        assert!(text.contains("1 hosts with 2 open ports"));
    }

    #[test]
    fn test_text_without_results() {
        let text = manager(OutputFormat::Text)
            .render(&ScanResult::new(10), &ScanConfig::default())
            .unwrap();
        assert!(text.contains("No open ports found on any hosts."));
    }

    #[test]
    fn test_json_shape() {
        let config = ScanConfig::default().with_share_enumeration(false);
        let json = manager(OutputFormat::Json).render(&sample(), &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(
            value["scan_results"]["192.168.1.10-files.lan"],
            serde_json::json!([139, 445])
        );
        assert_eq!(
            value["share_results"]["192.168.1.10-files.lan"],
            serde_json::json!(["public"])
        );
        assert_eq!(value["scan_info"]["total_hosts"], 1);
        assert_eq!(value["scan_info"]["ports_scanned"], 3);
        assert_eq!(value["scan_info"]["share_enumeration"], false);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_csv_rows() {
        let csv = manager(OutputFormat::Csv)
            .render(&sample(), &ScanConfig::default())
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "host,ip,hostname,port,service,security,response_time_ms,os,confidence"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("192.168.1.10-files.lan,192.168.1.10,files.lan,139,"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let manager = OutputManager::new(OutputConfig {
            format: OutputFormat::Json,
            file: Some(path.clone()),
            colored: false,
        });

        manager.write_results(&sample(), &ScanConfig::default()).unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        let report: JsonReport = serde_json::from_str(&written).unwrap();
        assert_eq!(report.hosts.len(), 1);
    }
}
