use bookstore::config::Config;
use bookstore::http::{AppState, HttpServer, HttpServerConfig};
use bookstore::sqlite::Sqlite;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookstore=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = Sqlite::new(config.database_url(), config.database_max_connections()).await?;
    let state = AppState::new(store);
    let server_config = HttpServerConfig::new(config.server_port());
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
