//! SMB share enumeration through the platform's listing command
//!
//! Windows uses `net view \\<ip> /all`, everything else `smbclient -L <ip> -N`.
//! Every failure (timeout, missing binary, non-zero exit, unexpected output)
//! yields an empty list.

use async_trait::async_trait;
use log::debug;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Lists the visible shares of a host
#[async_trait]
pub trait ShareEnumerator: Send + Sync {
    async fn enumerate_shares(&self, ip: Ipv4Addr) -> Vec<String>;
}

/// Which listing command to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharePlatform {
    /// `net view \\<ip> /all`
    WindowsNetView,
    /// `smbclient -L <ip> -N`
    SmbClient,
}

impl SharePlatform {
    /// Platform of the running binary
    pub fn current() -> Self {
        if cfg!(windows) {
            SharePlatform::WindowsNetView
        } else {
            SharePlatform::SmbClient
        }
    }

    fn command(&self, ip: Ipv4Addr) -> Command {
        match self {
            SharePlatform::WindowsNetView => {
                let mut cmd = Command::new("net");
                cmd.arg("view").arg(format!("\\\\{}", ip)).arg("/all");
                cmd
            }
            SharePlatform::SmbClient => {
                let mut cmd = Command::new("smbclient");
                cmd.arg("-L").arg(ip.to_string()).arg("-N");
                cmd
            }
        }
    }

    /// Extract share names from the command's stdout
    pub fn parse(&self, stdout: &str) -> Vec<String> {
        match self {
            SharePlatform::WindowsNetView => parse_net_view(stdout),
            SharePlatform::SmbClient => parse_smbclient(stdout),
        }
    }
}

/// Share enumerator backed by an external command
#[derive(Debug, Clone)]
pub struct CommandShareEnumerator {
    platform: SharePlatform,
    timeout: Duration,
}

impl CommandShareEnumerator {
    /// Enumerator for the running platform
    pub fn new(timeout: Duration) -> Self {
        Self::with_platform(SharePlatform::current(), timeout)
    }

    pub fn with_platform(platform: SharePlatform, timeout: Duration) -> Self {
        Self { platform, timeout }
    }

    pub fn platform(&self) -> SharePlatform {
        self.platform
    }
}

impl Default for CommandShareEnumerator {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl ShareEnumerator for CommandShareEnumerator {
    async fn enumerate_shares(&self, ip: Ipv4Addr) -> Vec<String> {
        let mut command = self.platform.command(ip);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("share listing for {} could not run: {}", ip, e);
                return Vec::new();
            }
            Err(_) => {
                debug!("share listing for {} timed out after {:?}", ip, self.timeout);
                return Vec::new();
            }
        };

        if !output.status.success() {
            debug!("share listing for {} exited with {}", ip, output.status);
            return Vec::new();
        }

        self.platform.parse(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Administrative and hidden shares are not reported
fn is_hidden_share(name: &str) -> bool {
    name.ends_with('$')
}

/// Parse `net view \\host /all` output
pub fn parse_net_view(stdout: &str) -> Vec<String> {
    let mut shares = Vec::new();

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with("The command completed")
            || trimmed.starts_with("Share name")
            || trimmed.contains("\\\\")
        {
            continue;
        }

        let Some(name) = trimmed.split_whitespace().next() else {
            continue;
        };
        if name.starts_with('-') || name == "The" || name == "Share" || is_hidden_share(name) {
            continue;
        }

        shares.push(name.to_string());
    }

    shares
}

/// Parse `smbclient -L host -N` output.
///
/// Shares are the tab-indented rows after the `Sharename` header, up to the
/// first non-indented line.
pub fn parse_smbclient(stdout: &str) -> Vec<String> {
    let mut shares = Vec::new();
    let mut in_share_list = false;

    for line in stdout.lines() {
        if !in_share_list {
            in_share_list = line.contains("Sharename");
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with('\t') {
            break;
        }

        if let Some(name) = line.split_whitespace().next() {
            if !name.starts_with('-') && !is_hidden_share(name) {
                shares.push(name.to_string());
            }
        }
    }

    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMBCLIENT_OUTPUT: &str = "\n\tSharename       Type      Comment\n\t---------       ----      -------\n\tpublic          Disk      Public files\n\tprint$          Disk      Printer Drivers\n\tbackups         Disk      \n\tIPC$            IPC       IPC Service (Samba 4.15)\nSMB1 disabled -- no workgroup available\n\tignored         Disk\n";

    const NET_VIEW_OUTPUT: &str = "Shared resources at \\\\10.0.0.5\r\n\r\n\r\n\r\nShare name  Type  Used as  Comment\r\n\r\n-------------------------------------------------------------------------------\r\nADMIN$      Disk           Remote Admin\r\nC$          Disk           Default share\r\nIPC$        IPC            Remote IPC\r\nProjects    Disk\r\nUsers       Disk\r\nThe command completed successfully.\r\n\r\n";

    #[test]
    fn test_parse_smbclient_listing() {
        assert_eq!(parse_smbclient(SMBCLIENT_OUTPUT), vec!["public", "backups"]);
    }

    #[test]
    fn test_parse_smbclient_without_header() {
        assert!(parse_smbclient("session setup failed: NT_STATUS_ACCESS_DENIED\n").is_empty());
        assert!(parse_smbclient("").is_empty());
    }

    #[test]
    fn test_parse_net_view_listing() {
        assert_eq!(parse_net_view(NET_VIEW_OUTPUT), vec!["Projects", "Users"]);
    }

    #[test]
    fn test_platform_dispatch() {
        assert_eq!(
            SharePlatform::SmbClient.parse(SMBCLIENT_OUTPUT),
            parse_smbclient(SMBCLIENT_OUTPUT)
        );
        assert_eq!(
            SharePlatform::WindowsNetView.parse(NET_VIEW_OUTPUT),
            parse_net_view(NET_VIEW_OUTPUT)
        );
    }

    #[test]
    fn test_platform_selection() {
        let enumerator = CommandShareEnumerator::default();
        if cfg!(windows) {
            assert_eq!(enumerator.platform(), SharePlatform::WindowsNetView);
        } else {
            assert_eq!(enumerator.platform(), SharePlatform::SmbClient);
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_empty_list() {
        // Missing binary, refused connection and timeout all end up here
        let enumerator = CommandShareEnumerator::new(Duration::from_secs(3));
        let shares = enumerator.enumerate_shares(Ipv4Addr::new(192, 0, 2, 1)).await;
        assert!(shares.is_empty());
    }
}
