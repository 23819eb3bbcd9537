//! Student verification daemon: entry point for running a node or seeding
//! its store.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sv_node::{init_logging, NodeConfig, SeedFile, StudentNode};

#[derive(Parser)]
#[command(name = "sv-daemon", about = "Student record verification daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SV_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "SV_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address the HTTP server binds to.
    #[arg(long, env = "SV_RPC_HOST")]
    rpc_host: Option<String>,

    /// HTTP server port.
    #[arg(long, env = "SV_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Serve Prometheus metrics at `/metrics`: "true" or "false".
    #[arg(long, env = "SV_ENABLE_METRICS")]
    enable_metrics: Option<bool>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SV_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SV_LOG_LEVEL")]
    log_level: Option<String>,

    /// Seconds an issued OTP stays valid.
    #[arg(long, env = "SV_OTP_TTL_SECS")]
    otp_ttl_secs: Option<u64>,

    /// LMDB memory map size in bytes.
    #[arg(long, env = "SV_LMDB_MAP_SIZE")]
    lmdb_map_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP API until interrupted.
    Run,
    /// Register students listed in a TOML file. Existing roll numbers are
    /// skipped.
    Seed {
        /// TOML file with a `[[students]]` array.
        file: PathBuf,
    },
}

impl Cli {
    /// File settings (or defaults) with every given flag applied on top.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => NodeConfig::default(),
        };
        let config = NodeConfig {
            data_dir: self.data_dir.clone().unwrap_or(base.data_dir),
            rpc_host: self.rpc_host.clone().unwrap_or(base.rpc_host),
            rpc_port: self.rpc_port.unwrap_or(base.rpc_port),
            enable_metrics: self.enable_metrics.unwrap_or(base.enable_metrics),
            log_format: self.log_format.clone().unwrap_or(base.log_format),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            otp_ttl_secs: self.otp_ttl_secs.unwrap_or(base.otp_ttl_secs),
            lmdb_map_size: self.lmdb_map_size.unwrap_or(base.lmdb_map_size),
        };
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.node_config()?;
    init_logging(config.log_format()?, &config.log_level)?;

    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    match cli.command {
        Command::Run => {
            tracing::info!(
                "starting student verification node (data: {}, HTTP: {}:{})",
                config.data_dir.display(),
                config.rpc_host,
                config.rpc_port,
            );

            let mut node = StudentNode::new(config).context("failed to initialise node")?;
            node.start().await.context("failed to start node")?;

            node.shutdown_controller().wait_for_signal().await;

            node.stop().await.context("error during shutdown")?;
        }
        Command::Seed { file } => {
            let seeds = SeedFile::from_toml_file(&file)?;
            let node = StudentNode::new(config).context("failed to initialise node")?;
            let report = node.seed(&seeds)?;
            tracing::info!(
                "seeded {} student(s) from {}, skipped {}",
                report.inserted,
                file.display(),
                report.skipped.len(),
            );
        }
    }

    Ok(())
}
