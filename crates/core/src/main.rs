// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use nodeserver::config::{Cli, ServerConfig};
use nodeserver::error::Error;
use nodeserver::run::{self, ServerDeps};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.validate() {
        eprintln!("error: {e}");
        std::process::exit(exit_code(&e));
    }

    init_tracing(&cli.log_level, &cli.log_format);

    let config = match ServerConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("fatal: {e}");
            std::process::exit(exit_code(&e));
        }
    };

    let shutdown = tokio_util::sync::CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown_signal.cancel();
    });

    match run::run(config, cli.output_mode, ServerDeps::default(), shutdown).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("fatal: {e}");
            std::process::exit(exit_code(&e));
        }
    }
}

fn init_tracing(log_level: &str, log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log_format.eq_ignore_ascii_case("json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Exit codes per §6: 0 clean shutdown, distinct non-zero codes for the
/// fatal-startup error kinds.
fn exit_code(error: &Error) -> i32 {
    match error {
        Error::ConfigInvalid(_) => 2,
        Error::HostKeyMissing(_) => 3,
        _ => 1,
    }
}
