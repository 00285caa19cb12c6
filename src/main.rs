use tracing_subscriber::EnvFilter;

use taskhub::api;
use taskhub::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    tracing::info!(
        "Starting taskhub on port {} (data dir: {})",
        config.port,
        config.data_dir.display()
    );

    api::serve(config).await
}
