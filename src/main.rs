use clap::Parser;
use pr_review_service::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Pull request reviewer assignment service.
#[derive(Parser, Debug)]
#[command(name = "pr-review-server", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PR_REVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Apply database migrations and exit
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("[app] {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = if cli.migrate_only {
        pr_review_service::migrate(&config).await
    } else {
        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("[app] Failed to listen for Ctrl-C: {}", e);
                return;
            }
            log::info!("[app] Shutdown requested");
            signal_token.cancel();
        });

        pr_review_service::run(config, shutdown).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("[app] {}", e);
            ExitCode::FAILURE
        }
    }
}
