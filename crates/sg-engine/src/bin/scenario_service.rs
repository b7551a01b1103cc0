use sg_engine::{ScenGenConfig, ScenarioService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ScenGenConfig::load()?;
    let addr = config.service.listen_addr.clone();
    let service = Arc::new(ScenarioService::from_config(config)?);

    let listener = TcpListener::bind(&addr).await?;

    service.serve(listener).await?;
    Ok(())
}
