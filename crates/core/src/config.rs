// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Output encoding forced (or not) for every session on this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputModeFlag {
    #[default]
    Auto,
    Utf8,
    Cp437,
}

impl std::str::FromStr for OutputModeFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "utf8" => Ok(Self::Utf8),
            "cp437" => Ok(Self::Cp437),
            other => Err(format!("invalid --output-mode value: {other}")),
        }
    }
}

impl fmt::Display for OutputModeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Utf8 => "utf8",
            Self::Cp437 => "cp437",
        };
        f.write_str(s)
    }
}

/// Process-wide CLI configuration.
#[derive(Debug, Parser)]
#[command(name = "nodeserver", version, about = "Multi-user bulletin-board session core.")]
pub struct Cli {
    /// Force the output encoding for every session, or let each session
    /// auto-detect (default).
    #[arg(long, env = "BBS_OUTPUT_MODE", default_value = "auto")]
    pub output_mode: OutputModeFlag,

    /// Path to the JSON server configuration file.
    #[arg(long, env = "BBS_CONFIG", default_value = "configs/server.json")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "BBS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (json or text).
    #[arg(long, env = "BBS_LOG_FORMAT", default_value = "json")]
    pub log_format: String,
}

impl Cli {
    /// Validate CLI-level configuration. `clap` already rejects an
    /// unparseable `--output-mode` at parse time; this is a hook for
    /// additional future flags.
    pub fn validate(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Server configuration loaded from the JSON config file (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub ssh_enabled: bool,
    #[serde(default = "default_host")]
    pub ssh_host: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    #[serde(default)]
    pub legacy_ssh_algorithms: bool,

    #[serde(default = "default_true")]
    pub telnet_enabled: bool,
    #[serde(default = "default_host")]
    pub telnet_host: String,
    #[serde(default = "default_telnet_port")]
    pub telnet_port: u16,

    /// 0 means unbounded.
    #[serde(default)]
    pub max_nodes: u32,
    /// 0 means unbounded.
    #[serde(default, rename = "maxConnectionsPerIP")]
    pub max_connections_per_ip: u32,

    /// 0 disables auto-lockout.
    #[serde(default)]
    pub max_failed_logins: u32,
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: u64,

    #[serde(default)]
    pub ip_blocklist_path: Option<PathBuf>,
    #[serde(default)]
    pub ip_allowlist_path: Option<PathBuf>,

    #[serde(default = "default_board_name")]
    pub board_name: String,
    #[serde(default = "default_cosysop_level")]
    pub co_sysop_level: u32,

    /// Path to the PEM-encoded SSH host key. Named by §6 but not assigned
    /// an explicit JSON key there; this expansion gives it one.
    #[serde(default = "default_host_key_path")]
    pub host_key_path: PathBuf,

    /// Where call records are appended on disconnect (§10.2).
    #[serde(default = "default_node_record_path")]
    pub node_record_path: PathBuf,
}

fn default_true() -> bool {
    true
}
fn default_host() -> String {
    "0.0.0.0".to_owned()
}
fn default_ssh_port() -> u16 {
    2222
}
fn default_telnet_port() -> u16 {
    2323
}
fn default_lockout_minutes() -> u64 {
    15
}
fn default_board_name() -> String {
    "A Node Server".to_owned()
}
fn default_cosysop_level() -> u32 {
    200
}
fn default_host_key_path() -> PathBuf {
    PathBuf::from("configs/host_key.pem")
}
fn default_node_record_path() -> PathBuf {
    PathBuf::from("data/callers.log")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ssh_enabled: default_true(),
            ssh_host: default_host(),
            ssh_port: default_ssh_port(),
            legacy_ssh_algorithms: false,
            telnet_enabled: default_true(),
            telnet_host: default_host(),
            telnet_port: default_telnet_port(),
            max_nodes: 0,
            max_connections_per_ip: 0,
            max_failed_logins: 0,
            lockout_minutes: default_lockout_minutes(),
            ip_blocklist_path: None,
            ip_allowlist_path: None,
            board_name: default_board_name(),
            co_sysop_level: default_cosysop_level(),
            host_key_path: default_host_key_path(),
            node_record_path: default_node_record_path(),
        }
    }
}

impl ServerConfig {
    /// Load and validate the server configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigInvalid(format!("reading {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::ConfigInvalid(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that aren't expressible in the type system alone.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.ssh_enabled && !self.telnet_enabled {
            return Err(Error::ConfigInvalid(
                "at least one of sshEnabled/telnetEnabled must be true".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
