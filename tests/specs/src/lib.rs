// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary tests (§8 scenarios S1-S6).
//!
//! Spawns the real `nodeserver` binary as a subprocess against a
//! generated JSON config and exercises it over raw Telnet sockets.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// Resolve the path to the compiled `nodeserver` binary.
pub fn nodeserver_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs -> tests -> workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("nodeserver")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Builds a minimal Telnet-only server config (no SSH host key required)
/// for one running instance.
pub struct ConfigBuilder {
    dir: tempfile::TempDir,
    telnet_port: u16,
    max_connections_per_ip: u32,
    max_failed_logins: u32,
    lockout_minutes: u64,
}

impl ConfigBuilder {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
            telnet_port: free_port()?,
            max_connections_per_ip: 0,
            max_failed_logins: 0,
            lockout_minutes: 15,
        })
    }

    pub fn max_connections_per_ip(mut self, n: u32) -> Self {
        self.max_connections_per_ip = n;
        self
    }

    pub fn max_failed_logins(mut self, n: u32) -> Self {
        self.max_failed_logins = n;
        self
    }

    pub fn lockout_minutes(mut self, minutes: u64) -> Self {
        self.lockout_minutes = minutes;
        self
    }

    pub fn blocklist_path(&self) -> PathBuf {
        self.dir.path().join("blocklist.txt")
    }

    pub fn allowlist_path(&self) -> PathBuf {
        self.dir.path().join("allowlist.txt")
    }

    pub fn telnet_port(&self) -> u16 {
        self.telnet_port
    }

    /// Write the config file (and empty list files, if missing) and
    /// spawn the server.
    pub fn spawn(self) -> anyhow::Result<NodeServerProcess> {
        let blocklist = self.blocklist_path();
        let allowlist = self.allowlist_path();
        if !blocklist.exists() {
            std::fs::write(&blocklist, "")?;
        }
        if !allowlist.exists() {
            std::fs::write(&allowlist, "")?;
        }

        let config_path = self.dir.path().join("server.json");
        let config = serde_json::json!({
            "sshEnabled": false,
            "telnetEnabled": true,
            "telnetHost": "127.0.0.1",
            "telnetPort": self.telnet_port,
            "maxNodes": 0,
            "maxConnectionsPerIP": self.max_connections_per_ip,
            "maxFailedLogins": self.max_failed_logins,
            "lockoutMinutes": self.lockout_minutes,
            "ipBlocklistPath": blocklist,
            "ipAllowlistPath": allowlist,
            "nodeRecordPath": self.dir.path().join("callers.log"),
        });
        std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

        let binary = nodeserver_binary();
        anyhow::ensure!(binary.exists(), "nodeserver binary not found at {}", binary.display());

        let child = Command::new(&binary)
            .args(["--config", &config_path.to_string_lossy(), "--log-level", "warn", "--log-format", "text"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(NodeServerProcess { child, telnet_port: self.telnet_port, _dir: self.dir })
    }
}

/// A running `nodeserver` process that is killed on drop.
pub struct NodeServerProcess {
    child: Child,
    telnet_port: u16,
    _dir: tempfile::TempDir,
}

impl NodeServerProcess {
    pub fn telnet_port(&self) -> u16 {
        self.telnet_port
    }

    /// Poll until the Telnet port accepts a connection, or the timeout
    /// elapses.
    pub async fn wait_telnet_ready(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("nodeserver telnet port never became ready within {timeout:?}");
            }
            if TcpStream::connect(("127.0.0.1", self.telnet_port)).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for NodeServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Connect to the server's Telnet port and read whatever it sends within
/// `timeout` (the initial negotiation offer, or an admission-rejection
/// line). Returns the bytes read, or an empty vec on timeout/EOF.
pub async fn telnet_connect_and_read(port: u16, timeout: Duration) -> anyhow::Result<(TcpStream, Vec<u8>)> {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await?;
    let mut buf = vec![0u8; 512];
    let n = match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
        Ok(Ok(n)) => n,
        _ => 0,
    };
    buf.truncate(n);
    Ok((stream, buf))
}

/// Connect and read, then drop the connection immediately — used where
/// only admission behavior (not negotiation content) matters.
pub async fn telnet_probe(port: u16, timeout: Duration) -> anyhow::Result<Vec<u8>> {
    let (_stream, bytes) = telnet_connect_and_read(port, timeout).await?;
    Ok(bytes)
}

pub async fn append_line(path: &Path, line: &str) -> anyhow::Result<()> {
    use tokio::io::AsyncWriteExt as _;
    let mut file = tokio::fs::OpenOptions::new().append(true).open(path).await?;
    file.write_all(format!("{line}\n").as_bytes()).await?;
    Ok(())
}
