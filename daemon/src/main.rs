//! Ballot daemon: entry point for running a voting ledger.

mod config;
mod shutdown;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use ballot_ledger::Ledger;
use ballot_rpc::{RpcMetrics, RpcServer, RpcState};
use ballot_store::{BlockStore, MemoryBlockStore};
use ballot_store_lmdb::LmdbEnvironment;
use ballot_types::Address;
use ballot_utils::{format_duration, init_logging, LogFormat};
use ballot_websocket::{WebSocketServer, WsState};
use clap::Parser;
use tokio::task::JoinSet;

use crate::config::DaemonConfig;
use crate::shutdown::ShutdownController;

#[derive(Parser, Debug)]
#[command(name = "ballot-daemon", about = "Voting session ledger daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "BALLOT_CONFIG")]
    config: Option<PathBuf>,

    /// Administrator address (0x-prefixed, 20 bytes).
    #[arg(long, env = "BALLOT_ADMINISTRATOR")]
    administrator: Option<Address>,

    /// Data directory for ledger storage.
    #[arg(long, env = "BALLOT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Keep the ledger in memory; nothing is written to disk.
    #[arg(long, env = "BALLOT_IN_MEMORY")]
    in_memory: bool,

    /// Interface the servers bind to.
    #[arg(long, env = "BALLOT_BIND")]
    bind: Option<IpAddr>,

    /// RPC server port.
    #[arg(long, env = "BALLOT_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Disable the RPC server.
    #[arg(long, env = "BALLOT_DISABLE_RPC")]
    no_rpc: bool,

    /// WebSocket server port.
    #[arg(long, env = "BALLOT_WS_PORT")]
    websocket_port: Option<u16>,

    /// Disable the WebSocket server.
    #[arg(long, env = "BALLOT_DISABLE_WEBSOCKET")]
    no_websocket: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "BALLOT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BALLOT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Open the ledger and serve it (the default).
    Run,
    /// Replay the stored blocks, print every session, and exit.
    Replay,
    /// Print the default configuration as TOML.
    DefaultConfig,
}

impl Cli {
    /// Layer CLI flags and env vars over `base`.
    fn apply(&self, mut base: DaemonConfig) -> DaemonConfig {
        if let Some(admin) = self.administrator {
            base.administrator = Some(admin);
        }
        if let Some(dir) = &self.data_dir {
            base.data_dir = dir.clone();
        }
        base.in_memory |= self.in_memory;
        if let Some(bind) = self.bind {
            base.bind = bind;
        }
        if let Some(port) = self.rpc_port {
            base.rpc_port = port;
        }
        if let Some(port) = self.websocket_port {
            base.websocket_port = port;
        }
        base.enable_rpc &= !self.no_rpc;
        base.enable_websocket &= !self.no_websocket;
        if let Some(level) = &self.log_level {
            base.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            base.log_format = format;
        }
        base
    }

    fn load_config(&self) -> anyhow::Result<DaemonConfig> {
        let base = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        Ok(self.apply(base))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.command == Some(Command::DefaultConfig) {
        print!("{}", DaemonConfig::default().to_toml_string()?);
        return Ok(());
    }

    let config = cli.load_config()?;
    init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    let ledger = Arc::new(open_ledger(&config)?);

    match cli.command.unwrap_or(Command::Run) {
        Command::Replay => {
            print_sessions(&ledger);
            Ok(())
        }
        Command::Run => run(config, ledger).await,
        Command::DefaultConfig => Ok(()),
    }
}

fn open_ledger(config: &DaemonConfig) -> anyhow::Result<Ledger> {
    let administrator = config.administrator()?;
    let store: Arc<dyn BlockStore> = if config.in_memory {
        tracing::warn!("running with an in-memory ledger, state is lost on exit");
        Arc::new(MemoryBlockStore::new())
    } else {
        let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)
            .with_context(|| format!("opening {}", config.data_dir.display()))?;
        Arc::new(env.block_store())
    };
    Ok(Ledger::open(store, administrator, config.voting.clone())?)
}

fn print_sessions(ledger: &Ledger) {
    let summary = ledger.summary();
    println!(
        "administrator {}: {} blocks, {} sessions",
        summary.administrator, summary.blocks, summary.sessions
    );
    for session in ledger.sessions() {
        println!(
            "  session {} {:?}: {} ({} voters, {} proposals)",
            session.id,
            session.name,
            session.status,
            session.voters.len(),
            session.proposals.len()
        );
        if let Some(result) = &session.result {
            let winners: Vec<String> = result
                .winning_proposals
                .iter()
                .map(|p| format!("#{} {:?}", p.proposal_id, p.description))
                .collect();
            println!(
                "    {} of {} voted, winners: {}",
                result.total_votes,
                result.voters_count,
                winners.join(", ")
            );
        }
    }
}

async fn run(config: DaemonConfig, ledger: Arc<Ledger>) -> anyhow::Result<()> {
    let started = Instant::now();
    tracing::info!(
        "starting ballot daemon (RPC:{}, WS:{})",
        if config.enable_rpc {
            config.rpc_addr().to_string()
        } else {
            "off".into()
        },
        if config.enable_websocket {
            config.websocket_addr().to_string()
        } else {
            "off".into()
        },
    );

    let shutdown = ShutdownController::new();
    let mut servers: JoinSet<anyhow::Result<()>> = JoinSet::new();

    if config.enable_rpc {
        let metrics = Arc::new(RpcMetrics::new());
        metrics.observe(&ledger.summary());
        let state = Arc::new(RpcState::new(Arc::clone(&ledger), metrics));
        let server = RpcServer::new(config.rpc_addr(), state);
        let signal = shutdown.signal();
        servers.spawn(async move { Ok(server.start(signal).await?) });
    }

    if config.enable_websocket {
        let state = Arc::new(WsState::attach(
            Arc::clone(&ledger),
            config.websocket_channel_capacity,
        ));
        let server = WebSocketServer::new(config.websocket_addr(), state);
        let signal = shutdown.signal();
        servers.spawn(async move { Ok(server.start(signal).await?) });
    }

    tokio::select! {
        _ = shutdown.wait_for_signal() => {}
        Some(joined) = servers.join_next() => {
            log_server_exit(joined);
            shutdown.shutdown();
        }
    }

    while let Some(joined) = servers.join_next().await {
        log_server_exit(joined);
    }

    let summary = ledger.summary();
    tracing::info!(
        blocks = summary.blocks,
        sessions = summary.sessions,
        uptime = %format_duration(started.elapsed().as_secs()),
        "ballot daemon stopped"
    );
    Ok(())
}

fn log_server_exit(joined: Result<anyhow::Result<()>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("server failed: {e:#}"),
        Err(e) => tracing::error!("server task panicked: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_ledger::LedgerError;
    use ballot_types::WorkflowStatus;

    #[test]
    fn cli_flags_override_file_values() {
        let file = DaemonConfig::from_toml_str(
            r#"
            administrator = "0x0000000000000000000000000000000000000001"
            rpc_port = 9000
            websocket_port = 9001
            log_level = "debug"
            "#,
        )
        .unwrap();
        let cli = Cli::parse_from([
            "ballot-daemon",
            "--rpc-port",
            "9100",
            "--no-websocket",
            "--administrator",
            "0x00000000000000000000000000000000000000aa",
        ]);
        let cfg = cli.apply(file);
        assert_eq!(cfg.rpc_port, 9100);
        assert_eq!(cfg.websocket_port, 9001);
        assert!(!cfg.enable_websocket);
        assert!(cfg.enable_rpc);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.administrator, Some(Address::from_low_u64(0xaa)));
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::parse_from(["ballot-daemon", "--in-memory", "replay"]);
        assert_eq!(cli.command, Some(Command::Replay));
        assert!(cli.in_memory);
        let cli = Cli::parse_from(["ballot-daemon", "default-config"]);
        assert_eq!(cli.command, Some(Command::DefaultConfig));
        assert_eq!(Cli::parse_from(["ballot-daemon"]).command, None);
    }

    #[test]
    fn replay_reads_an_lmdb_ledger_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = DaemonConfig::default();
        cfg.administrator = Some(Address::from_low_u64(1));
        cfg.data_dir = dir.path().to_path_buf();
        cfg.lmdb_map_size = 10 * 1024 * 1024;

        {
            let ledger = open_ledger(&cfg).unwrap();
            let owner = ledger.as_caller(Address::from_low_u64(1));
            let s = owner.create_session("board", "annual").unwrap();
            while owner.advance(s).unwrap() != WorkflowStatus::VotesTallied {}
        }

        let ledger = open_ledger(&cfg).unwrap();
        assert_eq!(ledger.summary().sessions, 1);
        let sessions = ledger.sessions();
        let session = &sessions[0];
        assert_eq!(session.name, "board");
        assert_eq!(session.status, WorkflowStatus::VotesTallied);
        assert!(session.result.is_some());
        print_sessions(&ledger);
        drop(ledger);

        cfg.administrator = Some(Address::from_low_u64(2));
        let err = open_ledger(&cfg).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::AdministratorMismatch { .. })
        ));
    }

    #[test]
    fn missing_administrator_fails_to_open() {
        let mut cfg = DaemonConfig::default();
        cfg.in_memory = true;
        assert!(open_ledger(&cfg).is_err());
    }
}
