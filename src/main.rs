//! dev-allowlist
//!
//! Runs in front of a local development server and only lets allowlisted
//! addresses through.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 DEV-ALLOWLIST                 │
//!                         │                                               │
//!     Client Request      │  ┌─────────┐    ┌────────────┐   ┌─────────┐  │
//!     ────────────────────┼─▶│  trace  │───▶│ gatekeeper │──▶│ forward │──┼──▶ Upstream
//!                         │  │ timeout │    │ (allow/403)│   │ handler │  │    dev server
//!                         │  └─────────┘    └─────▲──────┘   └─────────┘  │
//!                         │                       │                       │
//!                         │               ┌───────┴───────┐               │
//!                         │               │   AllowSet    │               │
//!                         │               │ (built once)  │               │
//!                         │               └───────▲───────┘               │
//!                         │        options ───────┴─────── .env files     │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use dev_allowlist::config::{self, DevConfig, EnvFiles};
use dev_allowlist::lifecycle::{signals, Shutdown};
use dev_allowlist::observability::{logging, metrics};
use dev_allowlist::{AllowlistPlugin, HttpServer};

/// Config file read when `--config` is not given. Optional.
const DEFAULT_CONFIG_PATH: &str = "dev-allowlist.toml";

#[derive(Parser)]
#[command(name = "dev-allowlist")]
#[command(about = "Address allowlist in front of a local development server", long_about = None)]
struct Cli {
    /// TOML config file (default: ./dev-allowlist.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Upstream dev server as host:port
    #[arg(long)]
    upstream: Option<String>,

    /// Allowed address, added to the configured list (repeatable)
    #[arg(long = "allow", value_name = "ADDR")]
    allow: Vec<String>,

    /// Env file to read instead of the configured ones (repeatable)
    #[arg(long = "env-file", value_name = "PATH")]
    env_files: Vec<String>,

    /// Env file key listing allowed addresses
    #[arg(long)]
    env_var: Option<String>,

    /// Do not let loopback addresses through unconditionally
    #[arg(long)]
    no_localhost: bool,

    /// Run mode selecting the default `.env.<mode>` file
    #[arg(long)]
    mode: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq, Debug)]
enum Commands {
    /// Serve and forward allowed requests (default)
    Serve,
    /// Print the assembled allowlist as JSON and exit
    Show,
}

impl Cli {
    fn apply_overrides(&self, config: &mut DevConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(upstream) = &self.upstream {
            config.server.upstream = upstream.clone();
        }
        config.allowlist.allowlist.extend(self.allow.iter().cloned());
        if !self.env_files.is_empty() {
            config.allowlist.env_files = Some(EnvFiles::Many(self.env_files.clone()));
        }
        if let Some(env_var) = &self.env_var {
            config.allowlist.env_var = env_var.clone();
        }
        if self.no_localhost {
            config.allowlist.allow_localhost = false;
        }
        if let Some(mode) = &self.mode {
            config.allowlist.mode = Some(mode.clone());
        }
    }

    fn load_config(&self) -> Result<DevConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => config::load_config_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
        };
        self.apply_overrides(&mut config);
        config::validated(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.server.bind_address,
        upstream = %config.server.upstream,
        env_files = ?config.allowlist.env_files(),
        env_var = %config.allowlist.env_var,
        allow_localhost = config.allowlist.allow_localhost,
        "Configuration loaded"
    );

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Show => {
            let plugin = AllowlistPlugin::new(config.allowlist.clone());
            let out = serde_json::json!({
                "plugin": plugin.name(),
                "allow_localhost": config.allowlist.allow_localhost,
                "env_files": config.allowlist.env_files(),
                "env_var": config.allowlist.env_var,
                "allowlist": plugin.allowed().sorted(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Serve => serve(config).await?,
    }

    Ok(())
}

async fn serve(config: DevConfig) -> Result<(), Box<dyn std::error::Error>> {
    // The recorder must be installed before the plugin publishes its gauge.
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let plugin = AllowlistPlugin::new(config.allowlist.clone());

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config.server, &plugin)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
