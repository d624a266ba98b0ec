use anyhow::Result;
use clap::Parser;
use oidc_token_agent::utils::agent::Agent;
use oidc_token_agent::utils::config_loader;
use oidc_token_agent::utils::logging;
use oidc_token_agent::utils::logging::LogLevel;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "oidc-token-agent.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// refresh every token once and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let agent_config = config_loader::run(&args.config).await?;
    logging::run(&agent_config, args.log_level);

    // -------------------------------
    // 2. Provider -> cache -> supplier -> federation -> token files
    // -------------------------------

    let agent = Agent::from_config(&agent_config)?;

    if args.once {
        return agent.refresh().await;
    }

    // -------------------------------
    // 3. Refresh loop until shutdown
    // -------------------------------

    info!(interval = ?agent.refresh_interval(), "Agent starting...");
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        if let Err(e) = agent.refresh().await {
            error!("refresh failed: {e:#}");
        }

        tokio::select! {
            _ = tokio::time::sleep(agent.refresh_interval()) => {}
            _ = &mut shutdown => break,
        }
    }

    info!("Shutting down, removing token files");
    agent.cleanup().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
