mod config;

use kombu_db::{Database, WorkerPool};

fn parse_level(level: &str) -> tracing::Level {
    match level {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI args for config file path
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "kombudb.yaml".to_string());

    // Load configuration (file first, falling back to environment variables)
    let config = if std::path::Path::new(&config_path).exists() {
        config::ServerConfig::load_from_file(&config_path)?
    } else {
        config::ServerConfig::load_from_env()?
    };

    tracing_subscriber::fmt()
        .with_max_level(parse_level(&config.main.log_level))
        .init();

    tracing::info!("configuration loaded from: {}", config_path);
    tracing::info!(
        port = config.server.port,
        threads = config.server.threads,
        workers = config.server.db_worker_pool_size,
        "starting kombudb"
    );

    // The engine and the pool its request bodies run on. The RPC front end
    // plugs in here and submits closures over `db`.
    let db = Database::new();
    let pool = WorkerPool::new(config.server.db_worker_pool_size);

    tracing::info!("kombudb is ready");

    // Wait for shutdown signal (SIGINT/SIGTERM)
    tokio::signal::ctrl_c().await?;

    tracing::info!("received shutdown signal, shutting down");
    pool.shutdown();
    tracing::info!(collections = db.list_collections().len(), "shutdown complete");
    Ok(())
}
