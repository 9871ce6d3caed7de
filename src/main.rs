use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use gig_market_backend::auth::middleware::Authenticate;
use gig_market_backend::auth::verifier::TokenVerifier;
use gig_market_backend::services::{GigService, OrderService};
use gig_market_backend::socket::SocketHub;
use gig_market_backend::{AppConfig, db, handlers};
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let store = db::connect(&config.storage).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open document store");
        io::Error::other(e)
    })?;
    tracing::info!("Document store ready");

    let gig_service = web::Data::new(GigService::new(store.clone()));
    let order_service = web::Data::new(OrderService::new(store));
    let verifier = web::Data::new(Arc::new(TokenVerifier::new(&config.auth)));

    // Shared registry of WebSocket sessions used for order notifications.
    let socket_hub = web::Data::new(Arc::new(SocketHub::new()));

    let bind_addr = config.bind_addr();
    tracing::info!("Server running at http://{bind_addr}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        App::new()
            .wrap(Authenticate)
            .wrap(cors)
            .app_data(gig_service.clone())
            .app_data(order_service.clone())
            .app_data(verifier.clone())
            .app_data(socket_hub.clone())
            .service(web::scope("/api").configure(handlers::init_routes))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
