//! Wagerbook Server
//!
//! Serves the tournament wagering ledger over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use wagerbook_core::SystemClock;
use wagerbook_core::config::load_config;
use wagerbook_core::tracing_init::{LogFormat, init_tracing};
use wagerbook_ledger::auth::{Argon2Credentials, RosterWhitelist};
use wagerbook_ledger::storage::LedgerDatabase;
use wagerbook_ledger::{Ledger, LedgerSettings};
use wagerbook_server::routes::{AppState, build_router};

#[derive(Parser, Debug)]
#[command(name = "wagerbook-server")]
#[command(version, about = "Wagerbook server - tournament wagering ledger over HTTP")]
struct Args {
    /// Settings file, merged over the global one.
    #[arg(long, env = "WAGERBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on. Overrides the settings file.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to `SQLite` database file. Overrides the settings file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let level = &config.server.log_level;
    init_tracing(
        &format!("wagerbook_server={level},wagerbook_ledger={level},tower_http={level}"),
        LogFormat::from_json_flag(args.log_json),
    );

    let addr = match args.addr {
        Some(addr) => addr,
        None => config
            .server
            .addr
            .parse()
            .with_context(|| format!("Invalid listen address {:?}", config.server.addr))?,
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        "Starting wagerbook-server"
    );

    let db_path = match args.db_path.or_else(|| config.server.database_path.clone()) {
        Some(path) => path,
        None => default_db_path()?,
    };
    info!(path = %db_path.display(), "Opening ledger database");
    let db = LedgerDatabase::open(&db_path).await?;

    let whitelist = match &config.whitelist.roster_csv {
        Some(roster) => {
            RosterWhitelist::load(roster, config.whitelist.additions_csv.as_deref())?
        }
        None => RosterWhitelist::default(),
    };

    let settings = LedgerSettings::from_config(&config.ledger, config.whitelist.enabled);
    info!(
        initial_balance = %settings.initial_balance,
        daily_reward = %settings.daily_reward,
        whitelist = settings.whitelist_enabled,
        "Ledger configured"
    );

    let ledger = Ledger::new(
        db,
        settings,
        Arc::new(SystemClock),
        Arc::new(whitelist),
        Arc::new(Argon2Credentials),
    );

    let app = build_router(AppState { ledger });
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".wagerbook").join("ledger.db"))
}
