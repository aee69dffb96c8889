//! Port-signature OS fingerprinting
//!
//! Classification is a pure function of the open-port set. Four weighted
//! signature tables feed four running scores; combination bonuses reward
//! complete port subsets; bias tables let shared services (databases, web)
//! nudge the Windows/Linux balance without deciding it on their own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Operating system category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OsFamily {
    Windows,
    #[serde(rename = "Linux/Unix")]
    LinuxUnix,
    #[serde(rename = "macOS")]
    MacOs,
    #[serde(rename = "Embedded/IoT")]
    Embedded,
    Unknown,
}

impl OsFamily {
    /// Tie-break order at equal maximum score, strongest first
    pub const PRECEDENCE: [OsFamily; 4] = [
        OsFamily::Windows,
        OsFamily::LinuxUnix,
        OsFamily::MacOs,
        OsFamily::Embedded,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OsFamily::Windows => "Windows",
            OsFamily::LinuxUnix => "Linux/Unix",
            OsFamily::MacOs => "macOS",
            OsFamily::Embedded => "Embedded/IoT",
            OsFamily::Unknown => "Unknown",
        }
    }

    fn thresholds(&self) -> Thresholds {
        match self {
            OsFamily::Windows => Thresholds { medium: 4, high: 8 },
            OsFamily::LinuxUnix => Thresholds { medium: 3, high: 7 },
            OsFamily::MacOs => Thresholds { medium: 3, high: 6 },
            OsFamily::Embedded => Thresholds { medium: 2, high: 5 },
            OsFamily::Unknown => Thresholds {
                medium: u32::MAX,
                high: u32::MAX,
            },
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "Low"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::High => write!(f, "High"),
        }
    }
}

/// Scores must strictly exceed a bound to reach its level
#[derive(Debug, Clone, Copy)]
struct Thresholds {
    medium: u32,
    high: u32,
}

/// Final per-category scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub windows: u32,
    pub linux: u32,
    pub macos: u32,
    pub embedded: u32,
}

impl ScoreBreakdown {
    pub fn get(&self, family: OsFamily) -> u32 {
        match family {
            OsFamily::Windows => self.windows,
            OsFamily::LinuxUnix => self.linux,
            OsFamily::MacOs => self.macos,
            OsFamily::Embedded => self.embedded,
            OsFamily::Unknown => 0,
        }
    }

    fn add(&mut self, family: OsFamily, weight: u32) {
        match family {
            OsFamily::Windows => self.windows += weight,
            OsFamily::LinuxUnix => self.linux += weight,
            OsFamily::MacOs => self.macos += weight,
            OsFamily::Embedded => self.embedded += weight,
            OsFamily::Unknown => {}
        }
    }

    pub fn max(&self) -> u32 {
        OsFamily::PRECEDENCE
            .iter()
            .map(|family| self.get(*family))
            .max()
            .unwrap_or(0)
    }
}

/// OS guess for one host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OsFingerprint {
    pub os: OsFamily,
    pub confidence: Confidence,
    pub scores: ScoreBreakdown,
    /// Matched signature entries, in table order
    pub signals: Vec<String>,
}

impl OsFingerprint {
    fn unknown(scores: ScoreBreakdown, signals: Vec<String>) -> Self {
        Self {
            os: OsFamily::Unknown,
            confidence: Confidence::Low,
            scores,
            signals,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PortWeight {
    port: u16,
    weight: u32,
    label: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct ComboBonus {
    ports: &'static [u16],
    weight: u32,
    label: &'static str,
}

const fn pw(port: u16, weight: u32, label: &'static str) -> PortWeight {
    PortWeight {
        port,
        weight,
        label,
    }
}

const WINDOWS_PORTS: &[PortWeight] = &[
    pw(135, 3, "MS-RPC endpoint mapper"),
    pw(139, 3, "NetBIOS session"),
    pw(445, 3, "SMB"),
    pw(3389, 4, "RDP"),
    pw(5985, 3, "WinRM"),
    pw(5986, 3, "WinRM HTTPS"),
    pw(593, 2, "RPC over HTTP"),
    pw(88, 2, "Kerberos"),
    pw(389, 1, "LDAP"),
    pw(636, 1, "LDAPS"),
    pw(3268, 3, "AD global catalog"),
    pw(3269, 3, "AD global catalog SSL"),
    pw(5357, 2, "WSDAPI"),
    pw(47001, 2, "WinRM listener"),
    pw(49152, 1, "dynamic RPC"),
    pw(49153, 1, "dynamic RPC"),
    pw(49154, 1, "dynamic RPC"),
];

const LINUX_PORTS: &[PortWeight] = &[
    pw(22, 2, "SSH"),
    pw(111, 3, "rpcbind"),
    pw(2049, 3, "NFS"),
    pw(6000, 2, "X11"),
    pw(873, 2, "rsync"),
    pw(10000, 2, "Webmin"),
    pw(9090, 1, "Cockpit"),
    pw(199, 2, "SMUX"),
    pw(110, 1, "POP3"),
    pw(25, 1, "SMTP"),
    pw(631, 1, "CUPS"),
];

const MACOS_PORTS: &[PortWeight] = &[
    pw(548, 4, "AFP"),
    pw(631, 2, "IPP printer sharing"),
    pw(3283, 3, "Apple Remote Desktop"),
    pw(5900, 2, "Screen Sharing"),
    pw(62078, 4, "lockdownd sync"),
    pw(3689, 2, "DAAP"),
    pw(7000, 1, "AirPlay"),
    pw(22, 1, "Remote Login"),
];

const EMBEDDED_PORTS: &[PortWeight] = &[
    pw(23, 3, "Telnet"),
    pw(2323, 3, "Telnet alternate"),
    pw(554, 3, "RTSP"),
    pw(1900, 2, "UPnP"),
    pw(7547, 3, "TR-069"),
    pw(8291, 4, "MikroTik Winbox"),
    pw(9100, 3, "JetDirect"),
    pw(515, 2, "LPD"),
    pw(37777, 4, "Dahua DVR"),
    pw(34567, 4, "DVR control"),
    pw(1883, 2, "MQTT"),
];

const WINDOWS_BIAS: &[PortWeight] = &[
    pw(1433, 1, "MSSQL"),
    pw(1434, 1, "MSSQL browser"),
    pw(8530, 1, "WSUS"),
];

const LINUX_BIAS: &[PortWeight] = &[
    pw(3306, 1, "MySQL"),
    pw(5432, 1, "PostgreSQL"),
    pw(6379, 1, "Redis"),
    pw(27017, 1, "MongoDB"),
    pw(9200, 1, "Elasticsearch"),
    pw(80, 1, "HTTP"),
    pw(443, 1, "HTTPS"),
    pw(8080, 1, "HTTP alternate"),
];

const WINDOWS_COMBOS: &[ComboBonus] = &[
    ComboBonus {
        ports: &[135, 139, 445],
        weight: 5,
        label: "classic SMB stack",
    },
    ComboBonus {
        ports: &[53, 88, 389, 636],
        weight: 4,
        label: "domain controller",
    },
    ComboBonus {
        ports: &[80, 443, 3389],
        weight: 2,
        label: "server with RDP",
    },
];

const LINUX_COMBOS: &[ComboBonus] = &[
    ComboBonus {
        ports: &[22, 111, 2049],
        weight: 5,
        label: "NFS server",
    },
    ComboBonus {
        ports: &[22, 25, 53, 80],
        weight: 2,
        label: "mail/DNS server",
    },
    ComboBonus {
        ports: &[22, 80, 443],
        weight: 1,
        label: "web server",
    },
];

const MACOS_COMBOS: &[ComboBonus] = &[
    ComboBonus {
        ports: &[548, 631],
        weight: 4,
        label: "file and printer sharing",
    },
    ComboBonus {
        ports: &[3283, 5900],
        weight: 3,
        label: "remote management",
    },
    ComboBonus {
        ports: &[22, 548, 631],
        weight: 2,
        label: "macOS server",
    },
];

const EMBEDDED_COMBOS: &[ComboBonus] = &[
    ComboBonus {
        ports: &[80, 554],
        weight: 3,
        label: "IP camera",
    },
    ComboBonus {
        ports: &[515, 9100],
        weight: 2,
        label: "network printer",
    },
    ComboBonus {
        ports: &[23, 80],
        weight: 2,
        label: "telnet-managed device",
    },
];

/// (family, per-port table, bias table, combination table), in precedence order
const SIGNATURES: [(OsFamily, &[PortWeight], &[PortWeight], &[ComboBonus]); 4] = [
    (OsFamily::Windows, WINDOWS_PORTS, WINDOWS_BIAS, WINDOWS_COMBOS),
    (OsFamily::LinuxUnix, LINUX_PORTS, LINUX_BIAS, LINUX_COMBOS),
    (OsFamily::MacOs, MACOS_PORTS, &[], MACOS_COMBOS),
    (OsFamily::Embedded, EMBEDDED_PORTS, &[], EMBEDDED_COMBOS),
];

/// Classify a host from its open ports. Duplicates in the input are ignored.
pub fn classify(open_ports: &[u16]) -> OsFingerprint {
    let open: BTreeSet<u16> = open_ports.iter().copied().collect();
    let mut scores = ScoreBreakdown::default();
    let mut signals = Vec::new();

    for (family, ports, bias, combos) in SIGNATURES {
        for entry in ports.iter().chain(bias.iter()) {
            if open.contains(&entry.port) {
                scores.add(family, entry.weight);
                signals.push(format!("{} {}/{} +{}", family, entry.port, entry.label, entry.weight));
            }
        }

        for combo in combos {
            if combo.ports.iter().all(|port| open.contains(port)) {
                scores.add(family, combo.weight);
                signals.push(format!("{} {} +{}", family, combo.label, combo.weight));
            }
        }
    }

    let max = scores.max();
    if max == 0 {
        return OsFingerprint::unknown(scores, signals);
    }

    // Evenly split evidence says nothing
    if OsFamily::PRECEDENCE.iter().all(|family| scores.get(*family) == max) {
        return OsFingerprint::unknown(scores, signals);
    }

    let os = OsFamily::PRECEDENCE
        .into_iter()
        .find(|family| scores.get(*family) == max)
        .unwrap_or(OsFamily::Unknown);

    let thresholds = os.thresholds();
    let confidence = if max > thresholds.high {
        Confidence::High
    } else if max > thresholds.medium {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    OsFingerprint {
        os,
        confidence,
        scores,
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_windows_smb_stack_is_high() {
        let fp = classify(&[135, 139, 445]);
        assert_eq!(fp.os, OsFamily::Windows);
        assert_eq!(fp.confidence, Confidence::High);
        assert_eq!(fp.scores.windows, 14);
        assert!(fp.signals.iter().any(|s| s.contains("classic SMB stack")));
    }

    #[test]
    fn test_nfs_server_is_linux_high() {
        let fp = classify(&[22, 111, 2049]);
        assert_eq!(fp.os, OsFamily::LinuxUnix);
        assert_eq!(fp.confidence, Confidence::High);
        assert_eq!(fp.os.to_string(), "Linux/Unix");
    }

    #[test]
    fn test_no_ports_is_unknown_low() {
        let fp = classify(&[]);
        assert_eq!(fp.os, OsFamily::Unknown);
        assert_eq!(fp.confidence, Confidence::Low);
        assert_eq!(fp.scores, ScoreBreakdown::default());
        assert!(fp.signals.is_empty());
    }

    #[test]
    fn test_unsignatured_ports_are_unknown() {
        let fp = classify(&[4444, 31337]);
        assert_eq!(fp.os, OsFamily::Unknown);
        assert_eq!(fp.confidence, Confidence::Low);
    }

    #[test]
    fn test_macos_file_sharing() {
        let fp = classify(&[548, 631]);
        assert_eq!(fp.os, OsFamily::MacOs);
        // 4 + 2 + combination 4
        assert_eq!(fp.scores.macos, 10);
        assert_eq!(fp.confidence, Confidence::High);
    }

    #[test]
    fn test_embedded_camera() {
        let fp = classify(&[80, 554]);
        assert_eq!(fp.os, OsFamily::Embedded);
        assert_eq!(fp.confidence, Confidence::High);
    }

    #[test]
    fn test_lone_ssh_is_low_linux() {
        let fp = classify(&[22]);
        assert_eq!(fp.os, OsFamily::LinuxUnix);
        assert_eq!(fp.confidence, Confidence::Low);
        assert_eq!(fp.scores.macos, 1);
    }

    #[test]
    fn test_medium_confidence_band() {
        // 22 + 80 + 443 + web server bonus = 2 + 1 + 1 + 1
        let fp = classify(&[22, 80, 443]);
        assert_eq!(fp.os, OsFamily::LinuxUnix);
        assert_eq!(fp.scores.linux, 5);
        assert_eq!(fp.confidence, Confidence::Medium);
    }

    #[test]
    fn test_bias_alone_does_not_flip_rdp_host() {
        let fp = classify(&[80, 443, 3306, 3389]);
        assert_eq!(fp.os, OsFamily::Windows);
        assert_eq!(fp.scores.linux, 3);
    }

    #[test]
    fn test_tie_prefers_windows_over_linux() {
        // Windows: 1433 bias 1; Linux: 3306 bias 1
        let fp = classify(&[1433, 3306]);
        assert_eq!(fp.scores.windows, fp.scores.linux);
        assert_eq!(fp.os, OsFamily::Windows);
    }

    #[test]
    fn test_tie_prefers_linux_over_macos() {
        // Linux: 631 (1) + 25 (1) = 2; macOS: 631 (2)
        let fp = classify(&[25, 631]);
        assert_eq!(fp.scores.linux, 2);
        assert_eq!(fp.scores.macos, 2);
        assert_eq!(fp.os, OsFamily::LinuxUnix);
    }

    #[test]
    fn test_all_equal_scores_are_unknown() {
        // one weight-2 port per category
        let fp = classify(&[593, 6000, 3689, 1900]);
        assert_eq!(fp.scores.windows, 2);
        assert_eq!(fp.scores.linux, 2);
        assert_eq!(fp.scores.macos, 2);
        assert_eq!(fp.scores.embedded, 2);
        assert_eq!(fp.os, OsFamily::Unknown);
        assert_eq!(fp.confidence, Confidence::Low);
    }

    #[test]
    fn test_duplicates_and_order_do_not_matter() {
        assert_eq!(classify(&[445, 139, 135, 445]), classify(&[135, 139, 445]));
    }

    #[test]
    fn test_signature_tables_have_unique_ports() {
        for (family, ports, bias, combos) in SIGNATURES {
            let mut seen = HashSet::new();
            for entry in ports.iter().chain(bias.iter()) {
                assert!(seen.insert(entry.port), "{} lists {} twice", family, entry.port);
            }
            for combo in combos {
                let unique: HashSet<_> = combo.ports.iter().collect();
                assert_eq!(unique.len(), combo.ports.len());
            }
        }
    }

    #[test]
    fn test_serialized_names() {
        let fp = classify(&[22, 111, 2049]);
        let json = serde_json::to_value(&fp).unwrap();
        assert_eq!(json["os"], "Linux/Unix");
        assert_eq!(json["confidence"], "High");
    }
}
