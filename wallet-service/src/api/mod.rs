pub mod handlers;

use actix_web::web;

use crate::middleware::RequestLogging;

/// Register every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::health::health).service(
        web::scope("/api/v1")
            .wrap(RequestLogging)
            .route("/wallet", web::post().to(handlers::wallet::apply_operation))
            .route("/wallets/{wallet_id}", web::get().to(handlers::wallet::get_balance))
            .route("/wallets/", web::get().to(handlers::wallet::missing_wallet_id))
            .route("/wallets", web::get().to(handlers::wallet::missing_wallet_id)),
    );
}
