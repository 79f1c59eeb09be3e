//! # matti-client
//!
//! The Matti application: state container, history ledger, profile registry,
//! screen/session controller and the command handlers that tie the sensor
//! link, advisory service and local store together.  The `matti` binary is a
//! thin command line front end over [`commands`].

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod location;
pub mod profiles;
pub mod session;
pub mod state;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

pub use context::AppContext;
pub use error::ClientError;
pub use state::{AppState, SharedState};

pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("matti_client=debug,matti_link=debug,matti_advisory=info,matti_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Matti v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cli::dispatch(cli))
}
