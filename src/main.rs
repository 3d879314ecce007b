use anyhow::Result;
use relaychat::{config::Config, logging, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging before anything can emit events
    let log_filter = logging::init();

    info!("🚀 relaychat v{}", relaychat::VERSION);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::load()?;
    logging::apply_level(&log_filter, &config.server.log_level)?;

    config.validate()?;
    info!("✓ Configuration loaded");
    info!("  HTTP: {}", config.bind_addr());
    info!("  Prompt limit: {} chars", config.limits.max_prompt_chars);

    server::run(config).await?;

    Ok(())
}
