pub mod http;

use crate::config::Config;
use crate::relay::Relay;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub use http::{AppState, build_router};

/// Build the upstream provider once and serve the relay until shutdown
pub async fn run(config: Config) -> Result<()> {
    let provider = crate::providers::from_config(&config.upstream)?;
    let relay = Relay::from_config(&config, provider);
    info!("✓ Upstream: {} ({})", relay.provider().name(), relay.model());

    let state = AppState {
        config: Arc::new(config),
        relay: Arc::new(relay),
    };

    info!("🌐 HTTP server starting on {}", state.config.bind_addr());
    http::serve(state).await
}
