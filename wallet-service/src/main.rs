use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use wallet_service::api;
use wallet_service::app::wallet_service::{WalletOperations, WalletService};
use wallet_service::infrastructure::config::Config;
use wallet_service::infrastructure::logger::{LogConfig, Logger};
use wallet_service::infrastructure::storage;

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    log::error!("❌ {context}: {e}");
    io::Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            let _guard = Logger::init(&LogConfig::default());
            return Err(startup_error("Configuration initialization failed", e));
        }
    };

    // Keeps the file appender flushing until shutdown.
    let _log_guard = Logger::init(&LogConfig::from(&config.logging));

    log::info!("🚀 Starting Wallet Service v{}...", config.version);
    log::info!("📊 Environment: {}", config.environment);
    if let Some(path) = &config.config_file_path {
        log::info!("📄 Configuration loaded from {path}");
    }

    let store = storage::connect(&config)
        .await
        .map_err(|e| startup_error("Storage initialization failed", e))?;
    log::info!("✅ Storage initialized ({} backend)", store.backend());

    let service: Arc<dyn WalletOperations> = Arc::new(WalletService::new(store));

    let address = config.bind_address();
    log::info!("🌐 Listening on {address}");

    let mut server = HttpServer::new({
        let service = Arc::clone(&service);
        move || {
            App::new()
                .app_data(web::Data::from(Arc::clone(&service)))
                .configure(api::configure)
        }
    })
    .shutdown_timeout(config.shutdown_timeout_secs)
    .bind(&address)?;

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    // SIGINT/SIGTERM stop accepting connections and drain in-flight requests.
    server.run().await?;

    log::info!("👋 Server exited properly");
    Ok(())
}
