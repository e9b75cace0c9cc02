//! Daemon configuration with TOML file support.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use ballot_types::Address;
use ballot_utils::LogFormat;
use ballot_voting::{ParamsError, VotingParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid [voting] table: {0}")]
    Voting(#[from] ParamsError),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("no administrator configured: pass --administrator or set `administrator` in the config file")]
    MissingAdministrator,
}

/// Configuration of a ballot daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; every field
/// has a default so a partial file is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address allowed to create sessions and drive their workflow.
    #[serde(default)]
    pub administrator: Option<Address>,

    /// Directory of the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Keep the ledger in memory only; nothing survives a restart.
    #[serde(default)]
    pub in_memory: bool,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    /// Interface both servers bind to.
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    #[serde(default = "default_true")]
    pub enable_websocket: bool,

    #[serde(default = "default_ws_port")]
    pub websocket_port: u16,

    /// Buffered records per WebSocket broadcast channel.
    #[serde(default = "default_ws_capacity")]
    pub websocket_channel_capacity: usize,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub voting: VotingParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./ballot_data")
}

fn default_map_size() -> usize {
    ballot_store_lmdb::environment::DEFAULT_MAP_SIZE
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    7077
}

fn default_ws_port() -> u16 {
    7078
}

fn default_ws_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.voting.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn administrator(&self) -> Result<Address, ConfigError> {
        self.administrator.ok_or(ConfigError::MissingAdministrator)
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.rpc_port)
    }

    pub fn websocket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.websocket_port)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            administrator: None,
            data_dir: default_data_dir(),
            in_memory: false,
            lmdb_map_size: default_map_size(),
            bind: default_bind(),
            enable_rpc: true,
            rpc_port: default_rpc_port(),
            enable_websocket: true,
            websocket_port: default_ws_port(),
            websocket_channel_capacity: default_ws_capacity(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            voting: VotingParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_voting::VoteReadPolicy;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(DaemonConfig::from_toml_str("").unwrap(), DaemonConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = DaemonConfig::from_toml_str(
            r#"
            administrator = "0x00000000000000000000000000000000000000ad"
            rpc_port = 9000
            log_format = "json"

            [voting]
            max_proposals_per_voter = 5
            vote_read_policy = "always"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.administrator().unwrap(), Address::from_low_u64(0xad));
        assert_eq!(cfg.rpc_port, 9000);
        assert_eq!(cfg.websocket_port, 7078);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.voting.max_proposals_per_voter, 5);
        assert_eq!(cfg.voting.max_proposals_per_session, 256);
        assert_eq!(cfg.voting.vote_read_policy, VoteReadPolicy::Always);
    }

    #[test]
    fn out_of_range_voting_limits_are_rejected() {
        let err = DaemonConfig::from_toml_str("[voting]\nmax_proposals_per_session = 1\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Voting(ParamsError::SessionCapOutOfRange(1))
        ));
        let err =
            DaemonConfig::from_toml_str("[voting]\nmax_proposals_per_voter = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Voting(ParamsError::NoProposalsPerVoter)));
    }

    #[test]
    fn missing_administrator_is_reported() {
        let err = DaemonConfig::default().administrator().unwrap_err();
        assert!(matches!(err, ConfigError::MissingAdministrator));
    }

    #[test]
    fn rendered_config_parses_back() {
        let mut cfg = DaemonConfig::default();
        cfg.administrator = Some(Address::from_low_u64(7));
        cfg.in_memory = true;
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(DaemonConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "in_memory = true\nbind = \"0.0.0.0\"").unwrap();
        let cfg = DaemonConfig::from_toml_file(file.path()).unwrap();
        assert!(cfg.in_memory);
        assert_eq!(cfg.rpc_addr().to_string(), "0.0.0.0:7077");
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = DaemonConfig::from_toml_file(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
