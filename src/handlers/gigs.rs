use actix_web::{HttpResponse, Responder, web};
use tracing::error;

use super::bad_request;
use crate::auth::middleware::AuthenticatedUser;
use crate::models::gigs::{Gig, GigFilter, GigListQuery, UpdateGig};
use crate::models::messages::{CreateMsg, Msg};
use crate::models::users::MiniUser;
use crate::services::GigService;

/// GET /api/gigs: search gigs.
///
/// Query params: `title`, `category`, `budget`, `daysToMake`, `rate`, `loc`,
/// `language` (comma-separated), `sortField`, `sortDir`, `pageIdx`.
pub async fn get_gigs(
    gigs: web::Data<GigService>,
    query: web::Query<GigListQuery>,
) -> impl Responder {
    let filter = match GigFilter::try_from(query.into_inner()) {
        Ok(filter) => filter,
        Err(e) => {
            error!(error = %e, "Failed to get gigs");
            return bad_request("Failed to get gigs");
        }
    };

    match gigs.query(&filter).await {
        Ok(gigs) => HttpResponse::Ok().json(gigs),
        Err(e) => {
            error!(error = %e, "Failed to get gigs");
            bad_request("Failed to get gigs")
        }
    }
}

/// GET /api/gigs/{id}
pub async fn get_gig(gigs: web::Data<GigService>, path: web::Path<String>) -> impl Responder {
    let gig_id = path.into_inner();
    match gigs.get_by_id(&gig_id).await {
        Ok(gig) => HttpResponse::Ok().json(gig),
        Err(e) => {
            error!(%gig_id, error = %e, "Failed to get gig");
            bad_request("Failed to get gig")
        }
    }
}

/// POST /api/gigs: the caller becomes the gig's owner.
pub async fn add_gig(
    user: AuthenticatedUser,
    gigs: web::Data<GigService>,
    body: web::Json<Gig>,
) -> impl Responder {
    let mut gig = body.into_inner();
    gig.owner.id = user.0.id;

    match gigs.add(gig).await {
        Ok(added) => HttpResponse::Ok().json(added),
        Err(e) => {
            error!(error = %e, "Failed to add gig");
            bad_request("Failed to add gig")
        }
    }
}

/// PUT /api/gigs/{id}: only `title` and `price` are persisted.
pub async fn update_gig(
    _user: AuthenticatedUser,
    gigs: web::Data<GigService>,
    path: web::Path<String>,
    body: web::Json<UpdateGig>,
) -> impl Responder {
    let mut gig = body.into_inner();
    gig.id = Some(path.into_inner());

    match gigs.update(gig).await {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => {
            error!(error = %e, "Failed to update gig");
            bad_request("Failed to update gig")
        }
    }
}

/// DELETE /api/gigs/{id}: owner or admin only. Responds with the removed id.
pub async fn remove_gig(
    _user: AuthenticatedUser,
    gigs: web::Data<GigService>,
    path: web::Path<String>,
) -> impl Responder {
    let gig_id = path.into_inner();
    match gigs.remove(&gig_id).await {
        Ok(removed_id) => HttpResponse::Ok().body(removed_id),
        Err(e) => {
            error!(%gig_id, error = %e, "Failed to remove gig");
            bad_request("Failed to remove gig")
        }
    }
}

/// POST /api/gigs/{id}/msg: body `{ "txt": "..." }`, authored by the caller.
pub async fn add_gig_msg(
    user: AuthenticatedUser,
    gigs: web::Data<GigService>,
    path: web::Path<String>,
    body: web::Json<CreateMsg>,
) -> impl Responder {
    let gig_id = path.into_inner();
    let msg = Msg::new(body.into_inner().txt, Some(MiniUser::from(&user.0)));

    match gigs.add_gig_msg(&gig_id, msg).await {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(e) => {
            error!(%gig_id, error = %e, "Failed to add gig msg");
            bad_request("Failed to add gig msg")
        }
    }
}

/// DELETE /api/gigs/{id}/msg/{msg_id}
pub async fn remove_gig_msg(
    _user: AuthenticatedUser,
    gigs: web::Data<GigService>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (gig_id, msg_id) = path.into_inner();
    match gigs.remove_gig_msg(&gig_id, &msg_id).await {
        Ok(removed_id) => HttpResponse::Ok().body(removed_id),
        Err(e) => {
            error!(%gig_id, error = %e, "Failed to remove gig msg");
            bad_request("Failed to remove gig msg")
        }
    }
}
