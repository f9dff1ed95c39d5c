use actix_web::{get, web, HttpResponse, Responder};

use crate::app::wallet_service::WalletOperations;

#[get("/health")]
pub async fn health(service: web::Data<dyn WalletOperations>) -> impl Responder {
    let (mut response, status) = match service.health_check().await {
        Ok(()) => (HttpResponse::Ok(), "healthy"),
        Err(e) => {
            log::error!("Health check failed: {e}");
            (HttpResponse::ServiceUnavailable(), "unhealthy")
        }
    };

    response.json(serde_json::json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
