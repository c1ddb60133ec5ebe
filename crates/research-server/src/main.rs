use anyhow::Context;
use clap::Parser;

use research_server::logging::init_logging;
use research_server::{run, AppState, Cli, ServerConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(cli.debug, cli.log_level.as_deref());

    let config = match ServerConfig::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    log::info!("LLM Configuration:");
    log::info!("  Base URL: {}", config.llm.base_url);
    log::info!("  Model: {}", config.llm.model);
    if let Some(timeout) = config.llm.timeout {
        log::info!("  Timeout: {}s", timeout.as_secs());
    }
    log::debug!("Server configuration: {:?}", config);

    let state = AppState::new(&config).context("Invalid prompt template")?;

    run(config, state)
        .await
        .context("Research server exited with error")
}
