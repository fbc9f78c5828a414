//! `platformops` -- terminal front end for the PlatformOPS console.
//!
//! # Environment variables
//!
//! | Variable                        | Default                 | Description                     |
//! |---------------------------------|-------------------------|---------------------------------|
//! | `PLATFORMOPS_API_URL`           | `http://localhost:8000` | Backend base URL                |
//! | `PLATFORMOPS_STATE_DIR`         | `.platformops`          | Where the session is persisted  |
//! | `PLATFORMOPS_HEALTH_COMPONENTS` | `C1,C6`                 | Components in the health tab    |
//! | `RUST_LOG`                      | `platformops=info`      | Log filter                      |

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;

const DEFAULT_LOG_FILTER: &str = "platformops=info,platformops_client=info,platformops_core=info";
const VERBOSE_LOG_FILTER: &str = "platformops=debug,platformops_client=debug,platformops_core=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // Panels go to stdout; keep logs on stderr.
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    commands::run(cli).await
}
