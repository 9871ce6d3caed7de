pub mod gigs;
pub mod orders;

use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};
use tracing::error;

use crate::socket::session;

const INVALID_REQUEST: &str = "Invalid request";

/// The single error shape every endpoint responds with.
pub(crate) fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "err": message }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Malformed bodies and query strings get the same `{ err }` envelope.
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| {
        error!(path = %req.path(), error = %err, "Rejected request body");
        InternalError::from_response(err, bad_request(INVALID_REQUEST)).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, req| {
        error!(path = %req.path(), error = %err, "Rejected query string");
        InternalError::from_response(err, bad_request(INVALID_REQUEST)).into()
    }));

    // ── Gig routes (reads are public, writes require a logged-in user) ──
    cfg.service(
        web::scope("/gigs")
            .route("", web::get().to(gigs::get_gigs))
            .route("", web::post().to(gigs::add_gig))
            .route("/{id}", web::get().to(gigs::get_gig))
            .route("/{id}", web::put().to(gigs::update_gig))
            .route("/{id}", web::delete().to(gigs::remove_gig))
            .route("/{id}/msg", web::post().to(gigs::add_gig_msg))
            .route("/{id}/msg/{msg_id}", web::delete().to(gigs::remove_gig_msg)),
    );

    // ── Order routes (all protected) ──
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(orders::get_orders))
            .route("", web::post().to(orders::add_order))
            .route("", web::put().to(orders::update_order))
            .route("/{id}", web::get().to(orders::get_order_by_id))
            .route("/{id}", web::delete().to(orders::remove_order))
            .route("/{id}/msg", web::post().to(orders::add_order_msg))
            .route("/{id}/msg/{msg_id}", web::delete().to(orders::remove_order_msg)),
    );

    // ── Real-time notifications ──
    cfg.route("/socket", web::get().to(session::ws_connect));
}
