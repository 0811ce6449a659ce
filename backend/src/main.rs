use std::net::SocketAddr;

use tracing::{info, warn};
use vardcoachen::config::AppConfig;
use vardcoachen::io::{create_router, ProxyState};
use vardcoachen::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    if config.proxy.api_key.is_none() {
        warn!("No OPENAI_API_KEY found, /api/ai will answer 500 until one is set");
    }

    let port = config.proxy.port;
    let app = create_router(ProxyState::new(config.proxy)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("AI proxy listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
