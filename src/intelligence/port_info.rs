//! Port metadata: descriptions, security notes and short service labels
//!
//! Read-only lookup used after a scan to put discovered ports in context.
//! It plays no part in deciding what is open.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Human-readable context for one port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub description: String,
    pub details: String,
    pub security: String,
    pub link: String,
}

impl PortInfo {
    /// Record returned for ports missing from the table
    pub fn unknown(port: u16) -> Self {
        Self {
            description: format!("Port {}", port),
            details: "Unknown service or application-specific port.".to_string(),
            security: "UNKNOWN RISK - Investigate further".to_string(),
            link: IANA_LIST.to_string(),
        }
    }
}

/// Coarse risk rating parsed from the security note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    High,
    Medium,
    Low,
    Secure,
    Unknown,
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityLevel::High => write!(f, "HIGH RISK"),
            SecurityLevel::Medium => write!(f, "MEDIUM RISK"),
            SecurityLevel::Low => write!(f, "LOW RISK"),
            SecurityLevel::Secure => write!(f, "SECURE"),
            SecurityLevel::Unknown => write!(f, "UNKNOWN RISK"),
        }
    }
}

const IANA_LIST: &str = "https://en.wikipedia.org/wiki/List_of_TCP_and_UDP_port_numbers";

/// (port, description, details, security, link)
const PORT_TABLE: &[(u16, &str, &str, &str, &str)] = &[
    (20, "FTP Data Transfer", "File Transfer Protocol data channel for active mode transfers.", "HIGH RISK - Unencrypted file transfer", "https://en.wikipedia.org/wiki/File_Transfer_Protocol"),
    (21, "FTP Control - File Transfer Protocol control channel", "Used for uploading/downloading files. Often a security risk if unencrypted.", "HIGH RISK - Unencrypted, credentials sent in plaintext", "https://en.wikipedia.org/wiki/File_Transfer_Protocol"),
    (22, "SSH - Secure Shell remote access", "Encrypted remote terminal access and secure file transfer (SFTP/SCP).", "SECURE - Encrypted communication", "https://www.openssh.com/"),
    (23, "Telnet - Unencrypted remote terminal", "Legacy remote terminal protocol. Sends passwords in plaintext.", "HIGH RISK - Unencrypted, avoid using", "https://en.wikipedia.org/wiki/Telnet"),
    (25, "SMTP - Simple Mail Transfer Protocol", "Email server communication for sending emails between servers.", "MEDIUM - Can be secured with TLS", "https://tools.ietf.org/html/rfc5321"),
    (53, "DNS - Domain Name System", "Translates domain names to IP addresses. Critical internet infrastructure.", "LOW RISK - Standard service, can be secured with DoT/DoH", "https://www.cloudflare.com/learning/dns/what-is-dns/"),
    (69, "TFTP - Trivial File Transfer Protocol", "Simple file transfer protocol without authentication. Often insecure.", "HIGH RISK - No authentication, plaintext transfer", "https://tools.ietf.org/html/rfc1350"),
    (80, "HTTP - HyperText Transfer Protocol", "Web server communication. Unencrypted web traffic.", "MEDIUM RISK - Unencrypted, use HTTPS instead", "https://developer.mozilla.org/en-US/docs/Web/HTTP"),
    (88, "Kerberos Authentication", "Network authentication protocol using tickets and encryption.", "SECURE - Strong authentication protocol", "https://web.mit.edu/kerberos/"),
    (110, "POP3 - Post Office Protocol v3", "Email retrieval protocol. Downloads emails to client device.", "MEDIUM RISK - Can be secured with SSL/TLS", "https://tools.ietf.org/html/rfc1939"),
    (111, "RPC Portmapper - Remote Procedure Call", "Maps RPC program numbers to network ports. Used by NFS and other services.", "HIGH RISK - Can expose other services", "https://en.wikipedia.org/wiki/Open_Network_Computing_Remote_Procedure_Call"),
    (123, "NTP - Network Time Protocol", "Synchronizes computer clocks across networks.", "LOW RISK - Time synchronization service", "https://www.ntp.org/"),
    (135, "Microsoft RPC Endpoint Mapper", "Windows RPC service that maps RPC endpoints. Critical Windows service.", "HIGH RISK - Common attack target, restrict access", "https://docs.microsoft.com/en-us/windows/win32/rpc/rpc-start-page"),
    (137, "NetBIOS Name Service", "Windows NetBIOS name resolution service. Legacy networking.", "HIGH RISK - Legacy protocol, information disclosure", "https://en.wikipedia.org/wiki/NetBIOS"),
    (138, "NetBIOS Datagram Service", "Windows NetBIOS datagram distribution service.", "HIGH RISK - Legacy protocol, security issues", "https://en.wikipedia.org/wiki/NetBIOS"),
    (139, "NetBIOS Session Service - Windows networking", "Legacy Windows file sharing protocol. Part of SMB over NetBIOS.", "HIGH RISK - Legacy protocol, disable if possible", "https://en.wikipedia.org/wiki/NetBIOS"),
    (143, "IMAP - Internet Message Access Protocol", "Email access protocol that keeps emails on server. More advanced than POP3.", "MEDIUM RISK - Should use SSL/TLS (port 993)", "https://tools.ietf.org/html/rfc3501"),
    (161, "SNMP - Simple Network Management Protocol", "Network device monitoring and management.", "HIGH RISK - Often misconfigured, use SNMPv3", "https://www.paessler.com/snmp"),
    (389, "LDAP - Lightweight Directory Access Protocol", "Directory service protocol for accessing user/computer information.", "MEDIUM RISK - Should use LDAPS (port 636)", "https://ldap.com/"),
    (443, "HTTPS - HTTP over SSL/TLS", "Secure web server communication with encrypted traffic.", "SECURE - Encrypted web traffic", "https://developer.mozilla.org/en-US/docs/Glossary/HTTPS"),
    (445, "Microsoft-DS - SMB file sharing", "Modern Windows file sharing protocol. Replaced NetBIOS SMB.", "HIGH RISK - Common ransomware target, secure properly", "https://docs.microsoft.com/en-us/windows-server/storage/file-server/file-server-smb-overview"),
    (465, "SMTP over SSL - Secure email submission", "Encrypted email submission protocol. More secure than plain SMTP.", "SECURE - Encrypted email transmission", "https://tools.ietf.org/html/rfc8314"),
    (514, "Syslog", "System logging protocol for network devices.", "MEDIUM RISK - Log aggregation, plaintext", "https://tools.ietf.org/html/rfc3164"),
    (515, "Line Printer Daemon (LPD) - Print spooler", "Network printing protocol for Unix/Linux systems and network printers.", "MEDIUM RISK - Network printing service", "https://tools.ietf.org/html/rfc1179"),
    (548, "AFP - Apple Filing Protocol", "Apple file sharing protocol for macOS systems and network storage.", "MEDIUM RISK - Apple file sharing, encrypt if possible", "https://en.wikipedia.org/wiki/Apple_Filing_Protocol"),
    (554, "RTSP - Real Time Streaming Protocol", "Network control protocol for streaming servers.", "MEDIUM RISK - Streaming media control", "https://tools.ietf.org/html/rfc2326"),
    (587, "SMTP Submission - Email submission with STARTTLS", "Modern email submission port that supports encryption via STARTTLS.", "SECURE - Can be encrypted", "https://tools.ietf.org/html/rfc6409"),
    (631, "IPP - Internet Printing Protocol", "Network printing protocol used by CUPS and modern printers.", "LOW RISK - Printing service", "https://tools.ietf.org/html/rfc8011"),
    (636, "LDAPS - LDAP over SSL/TLS", "Secure LDAP directory service with encrypted communication.", "SECURE - Encrypted directory access", "https://ldap.com/ldap-over-ssl-tls-and-starttls/"),
    (873, "rsync - Remote synchronization", "File synchronization protocol for efficient data transfer and backup.", "MEDIUM RISK - File transfer service, secure with SSH tunnel", "https://rsync.samba.org/"),
    (993, "IMAPS - IMAP over SSL/TLS", "Secure IMAP email access with encrypted communication.", "SECURE - Encrypted email access", "https://tools.ietf.org/html/rfc8314"),
    (995, "POP3S - POP3 over SSL/TLS", "Secure POP3 email retrieval with encrypted communication.", "SECURE - Encrypted email retrieval", "https://tools.ietf.org/html/rfc8314"),
    (1433, "Microsoft SQL Server - Database server", "Microsoft SQL Server database engine. Contains sensitive business data.", "HIGH RISK - Database contains sensitive data", "https://docs.microsoft.com/en-us/sql/sql-server/"),
    (1434, "SQL Server Browser", "SQL Server Browser service for instance discovery.", "MEDIUM RISK - Database discovery service", "https://www.microsoft.com/sql-server/"),
    (1521, "Oracle Database - TNS Listener", "Oracle database listener service. Handles database connections.", "HIGH RISK - Database access, secure properly", "https://docs.oracle.com/en/database/"),
    (1723, "PPTP - Point-to-Point Tunneling Protocol", "Legacy VPN protocol with known security vulnerabilities.", "HIGH RISK - Deprecated, use modern VPN protocols", "https://en.wikipedia.org/wiki/Point-to-Point_Tunneling_Protocol"),
    (1883, "MQTT - Message Queuing Telemetry Transport", "Lightweight messaging protocol for IoT devices.", "MEDIUM RISK - IoT messaging protocol", "https://mqtt.org/"),
    (1900, "UPnP - Universal Plug and Play", "Automatic device discovery and configuration. Often insecure.", "HIGH RISK - Can expose internal services", "https://en.wikipedia.org/wiki/Universal_Plug_and_Play"),
    (2049, "NFS - Network File System", "Unix/Linux network file sharing protocol.", "MEDIUM RISK - Secure with proper authentication", "https://en.wikipedia.org/wiki/Network_File_System"),
    (3268, "Microsoft Global Catalog LDAP", "Microsoft Active Directory Global Catalog LDAP.", "MEDIUM RISK - Directory service", "https://docs.microsoft.com/en-us/windows-server/identity/ad-ds/"),
    (3269, "Microsoft Global Catalog LDAP SSL", "Microsoft Active Directory Global Catalog LDAP over SSL.", "SECURE - Encrypted directory service", "https://docs.microsoft.com/en-us/windows-server/identity/ad-ds/"),
    (3306, "MySQL Database Server", "Popular open-source database management system.", "HIGH RISK - Database contains sensitive data", "https://dev.mysql.com/doc/"),
    (3389, "Microsoft RDP - Remote Desktop Protocol", "Windows remote desktop access. Frequently targeted by attackers.", "HIGH RISK - Common attack target, secure with NLA", "https://docs.microsoft.com/en-us/troubleshoot/windows-server/remote/understanding-remote-desktop-protocol"),
    (5432, "PostgreSQL Database Server", "Advanced open-source relational database management system.", "HIGH RISK - Database contains sensitive data", "https://www.postgresql.org/docs/"),
    (5900, "VNC - Virtual Network Computing", "Remote desktop protocol. Often poorly secured by default.", "HIGH RISK - Often weak passwords, encrypt traffic", "https://en.wikipedia.org/wiki/Virtual_Network_Computing"),
    (5985, "WinRM HTTP", "Windows Remote Management over HTTP.", "MEDIUM RISK - Windows remote management", "https://docs.microsoft.com/en-us/windows/win32/winrm/"),
    (5986, "WinRM HTTPS", "Windows Remote Management over HTTPS.", "SECURE - Encrypted Windows remote management", "https://docs.microsoft.com/en-us/windows/win32/winrm/"),
    (6379, "Redis - In-memory data structure store", "Fast in-memory database, cache, and message broker.", "HIGH RISK - Often exposed without authentication", "https://redis.io/documentation"),
    (8080, "HTTP Alternate - Web cache/proxy server", "Alternative HTTP port often used by web applications and proxies.", "MEDIUM RISK - Unencrypted web traffic", "https://developer.mozilla.org/en-US/docs/Web/HTTP"),
    (8443, "HTTPS Alternate - Secure web server alternate", "Alternative HTTPS port used by web applications and admin interfaces.", "SECURE - Encrypted web traffic", "https://developer.mozilla.org/en-US/docs/Glossary/HTTPS"),
    (9100, "PDL - Printer Data Language", "Direct network printing protocol used by HP and other printers.", "LOW RISK - Network printing service", "https://en.wikipedia.org/wiki/Printer_Job_Language"),
    (9200, "Elasticsearch - Search engine", "Elasticsearch distributed search and analytics engine.", "HIGH RISK - Search engine, often misconfigured", "https://www.elastic.co/elasticsearch/"),
    (27017, "MongoDB Database", "MongoDB NoSQL database server default port.", "HIGH RISK - Database, often misconfigured without auth", "https://docs.mongodb.com/"),
];

static PORT_DESCRIPTIONS: Lazy<HashMap<u16, PortInfo>> = Lazy::new(|| {
    PORT_TABLE
        .iter()
        .map(|&(port, description, details, security, link)| {
            (
                port,
                PortInfo {
                    description: description.to_string(),
                    details: details.to_string(),
                    security: security.to_string(),
                    link: link.to_string(),
                },
            )
        })
        .collect()
});

/// Metadata for a port, or the unknown-port default
pub fn describe(port: u16) -> PortInfo {
    PORT_DESCRIPTIONS
        .get(&port)
        .cloned()
        .unwrap_or_else(|| PortInfo::unknown(port))
}

/// Risk rating of a port
pub fn security_level(port: u16) -> SecurityLevel {
    let Some(info) = PORT_DESCRIPTIONS.get(&port) else {
        return SecurityLevel::Unknown;
    };

    let security = info.security.as_str();
    if security.contains("HIGH RISK") {
        SecurityLevel::High
    } else if security.contains("MEDIUM RISK") {
        SecurityLevel::Medium
    } else if security.contains("LOW RISK") {
        SecurityLevel::Low
    } else if security.contains("SECURE") {
        SecurityLevel::Secure
    } else {
        SecurityLevel::Unknown
    }
}

/// Short service label used in reports
pub fn service_name(port: u16) -> &'static str {
    match port {
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 | 587 => "SMTP",
        53 => "DNS",
        80 => "HTTP",
        110 => "POP3",
        111 => "RPC",
        135 => "RPC",
        139 => "NetBIOS",
        143 => "IMAP",
        389 => "LDAP",
        443 => "HTTPS",
        445 => "SMB",
        548 => "AFP",
        636 => "LDAPS",
        993 => "IMAPS",
        995 => "POP3S",
        1433 => "MSSQL",
        1521 => "Oracle",
        2049 => "NFS",
        3268 => "AD-GC",
        3269 => "AD-GC-SSL",
        3306 => "MySQL",
        3389 => "RDP",
        5432 => "PostgreSQL",
        5900 => "VNC",
        5985 => "WinRM",
        5986 => "WinRM-S",
        6379 => "Redis",
        8080 | 8888 => "HTTP-Alt",
        8443 => "HTTPS-Alt",
        _ => "Unknown",
    }
}

/// Services that deserve attention whenever they are exposed
pub fn is_risky(port: u16) -> bool {
    matches!(
        port,
        21 | 23 | 111 | 135 | 139 | 445 | 1433 | 1521 | 2049 | 3306 | 3389 | 5432 | 5900 | 5985 | 5986 | 6379
    )
}

/// Ports whose description or details mention `term`, case-insensitively, ascending
pub fn search(term: &str) -> Vec<(u16, PortInfo)> {
    let needle = term.to_lowercase();
    let mut matches: Vec<(u16, PortInfo)> = PORT_DESCRIPTIONS
        .iter()
        .filter(|(_, info)| {
            info.description.to_lowercase().contains(&needle)
                || info.details.to_lowercase().contains(&needle)
        })
        .map(|(port, info)| (*port, info.clone()))
        .collect();
    matches.sort_by_key(|(port, _)| *port);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_port() {
        let info = describe(22);
        assert!(info.description.starts_with("SSH"));
        assert_eq!(security_level(22), SecurityLevel::Secure);
        assert_eq!(security_level(23), SecurityLevel::High);
    }

    #[test]
    fn test_unknown_port_default() {
        let info = describe(40001);
        assert_eq!(info.description, "Port 40001");
        assert_eq!(info.security, "UNKNOWN RISK - Investigate further");
        assert_eq!(info.link, IANA_LIST);
        assert_eq!(security_level(40001), SecurityLevel::Unknown);
    }

    #[test]
    fn test_canonical_entries_for_repeated_ports() {
        let https = describe(443);
        assert_eq!(https.description, "HTTPS - HTTP over SSL/TLS");
        assert_eq!(https.security, "SECURE - Encrypted web traffic");
        assert_eq!(security_level(443), SecurityLevel::Secure);
        assert_eq!(describe(514).description, "Syslog");
        assert!(describe(8080).description.starts_with("HTTP Alternate"));

        for &(port, description, details, security, _) in PORT_TABLE {
            for text in [description, details, security] {
                assert!(!text.contains("duplicate"), "port {} has a placeholder entry", port);
            }
        }
    }

    #[test]
    fn test_table_has_unique_ports() {
        assert_eq!(PORT_DESCRIPTIONS.len(), PORT_TABLE.len());
    }

    #[test]
    fn test_service_labels() {
        assert_eq!(service_name(445), "SMB");
        assert_eq!(service_name(8080), "HTTP-Alt");
        assert_eq!(service_name(31337), "Unknown");
    }

    #[test]
    fn test_risky_ports() {
        assert!(is_risky(445));
        assert!(is_risky(3389));
        assert!(!is_risky(443));
    }

    #[test]
    fn test_search_is_case_insensitive_and_sorted() {
        let results = search("smb");
        assert!(!results.is_empty());
        assert!(results.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(results.iter().any(|(port, _)| *port == 445));
    }
}
