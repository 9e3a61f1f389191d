use anyhow::Result;
use arogya_api::{build_app, ServiceConfig};
use arogya_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("arogya_api");

    let config = ServiceConfig::from_env();
    let bind = config.bind.clone();

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "arogya health messaging api started");

    axum::serve(listener, app).await?;
    Ok(())
}
