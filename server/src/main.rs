use anyhow::Context;
use todo_server::config::AppConfig;
use todo_server::SqliteGateway;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let gateway = SqliteGateway::connect(&config.database.url).context("opening the todo store")?;

    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    todo_server::run(listener, gateway).await?;
    Ok(())
}
