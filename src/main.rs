use std::{sync::Arc, time::Duration};

use topic_rag::{
    infrastructure::{AppConfig, AppContainer, create_connection_pool, run_migrations},
    presentation::http::HttpServer,
};

const USAGE_PUBLISH_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let db_pool = create_connection_pool(&config.database_url)?;
    let applied = run_migrations(&db_pool)?;
    tracing::info!("Applied {} pending migrations", applied);

    let port = config.server_port;
    let container = AppContainer::new(config, db_pool)?;
    container.ensure_collection().await?;

    let background_processor = container.background_processor.clone();
    tokio::spawn(async move {
        background_processor.start().await;
    });

    let usage_monitor = container.usage_monitor.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(USAGE_PUBLISH_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = usage_monitor.publish().await {
                tracing::warn!("Failed to publish usage stats: {}", e);
            }
        }
    });

    let server = HttpServer::new(
        Arc::clone(&container.rag_handler),
        Arc::clone(&container.admin_handler),
        Some(port),
    );
    server.run().await
}
