use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omnipath_server::server;
use omnipath_server::service::Service;
use omnipath_server::settings::Settings;
use omnipath_server::store::Store;

#[tokio::main]
async fn main() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Loaded configuration: database={}, listen={}",
        settings.database.path.display(),
        settings.server.listen
    );

    let store = match Store::open(&settings.database.path, settings.database.chunk_size) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = store.create_schema() {
        tracing::error!("Failed to create schema: {e}");
        std::process::exit(1);
    }
    let service = match Service::new(store, &settings.service) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Failed to build catalog: {e}");
            std::process::exit(1);
        }
    };

    let app = server::router(service, &settings.server);
    let listener = match tokio::net::TcpListener::bind(&settings.server.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {e}", settings.server.listen);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", settings.server.listen);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}
