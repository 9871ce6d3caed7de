use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use tracing::error;

use super::bad_request;
use crate::auth::middleware::AuthenticatedUser;
use crate::models::messages::{CreateMsg, Msg};
use crate::models::orders::{Order, OrderListQuery};
use crate::models::users::MiniUser;
use crate::services::OrderService;
use crate::socket::{Notification, ServerEvent, SocketHub};

/// GET /api/orders?status=<status|all>&isSeller=<bool>
///
/// Lists the caller's orders as buyer, or as seller when `isSeller=true`.
pub async fn get_orders(
    user: AuthenticatedUser,
    orders: web::Data<OrderService>,
    query: web::Query<OrderListQuery>,
) -> impl Responder {
    let filter = match query.into_inner().into_filter(user.0.id) {
        Ok(filter) => filter,
        Err(e) => {
            error!(error = %e, "Failed to get orders");
            return bad_request("Failed to get orders");
        }
    };

    match orders.query(&filter).await {
        Ok(orders) => HttpResponse::Ok().json(orders),
        Err(e) => {
            error!(error = %e, "Failed to get orders");
            bad_request("Failed to get orders")
        }
    }
}

/// GET /api/orders/{id}
pub async fn get_order_by_id(
    _user: AuthenticatedUser,
    orders: web::Data<OrderService>,
    path: web::Path<String>,
) -> impl Responder {
    let order_id = path.into_inner();
    match orders.get_by_id(&order_id).await {
        Ok(order) => HttpResponse::Ok().json(order),
        Err(e) => {
            error!(%order_id, error = %e, "Failed to get order");
            bad_request("Failed to get order")
        }
    }
}

/// POST /api/orders: notifies the seller with `add-order`.
pub async fn add_order(
    _user: AuthenticatedUser,
    orders: web::Data<OrderService>,
    hub: web::Data<Arc<SocketHub>>,
    body: web::Json<Order>,
) -> impl Responder {
    match orders.add(body.into_inner()).await {
        Ok(added) => {
            let seller_id = added.seller.id.clone();
            hub.emit_to_user(Notification::new(ServerEvent::AddOrder(added.clone()), seller_id))
                .await;
            HttpResponse::Ok().json(added)
        }
        Err(e) => {
            error!(error = %e, "Failed to add order");
            bad_request("Failed to add order")
        }
    }
}

/// PUT /api/orders: body carries the order's `_id`; notifies the buyer
/// with `update-order`.
pub async fn update_order(
    _user: AuthenticatedUser,
    orders: web::Data<OrderService>,
    hub: web::Data<Arc<SocketHub>>,
    body: web::Json<Order>,
) -> impl Responder {
    match orders.update(body.into_inner()).await {
        Ok(updated) => {
            let buyer_id = updated.buyer.id.clone();
            hub.emit_to_user(Notification::new(
                ServerEvent::UpdateOrder(updated.clone()),
                buyer_id,
            ))
            .await;
            HttpResponse::Ok().json(updated)
        }
        Err(e) => {
            error!(error = %e, "Failed to update order");
            bad_request("Failed to update order")
        }
    }
}

/// DELETE /api/orders/{id}: notifies the seller with `remove-order`.
///
/// The order is read first so the seller is known after the delete; the two
/// steps are not atomic.
pub async fn remove_order(
    _user: AuthenticatedUser,
    orders: web::Data<OrderService>,
    hub: web::Data<Arc<SocketHub>>,
    path: web::Path<String>,
) -> impl Responder {
    let order_id = path.into_inner();

    let removed = match orders.get_by_id(&order_id).await {
        Ok(order) => order,
        Err(e) => {
            error!(%order_id, error = %e, "Failed to remove order");
            return bad_request("Failed to remove order");
        }
    };

    match orders.remove(&order_id).await {
        Ok(removed_id) => {
            hub.emit_to_user(Notification::new(
                ServerEvent::RemoveOrder(removed_id.clone()),
                removed.seller.id,
            ))
            .await;
            HttpResponse::Ok().body(removed_id)
        }
        Err(e) => {
            error!(%order_id, error = %e, "Failed to remove order");
            bad_request("Failed to remove order")
        }
    }
}

/// POST /api/orders/{id}/msg: body `{ "txt": "..." }`, authored by the caller.
pub async fn add_order_msg(
    user: AuthenticatedUser,
    orders: web::Data<OrderService>,
    path: web::Path<String>,
    body: web::Json<CreateMsg>,
) -> impl Responder {
    let order_id = path.into_inner();
    let msg = Msg::new(body.into_inner().txt, Some(MiniUser::from(&user.0)));

    match orders.add_order_msg(&order_id, msg).await {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(e) => {
            error!(%order_id, error = %e, "Failed to add order msg");
            bad_request("Failed to add order msg")
        }
    }
}

/// DELETE /api/orders/{id}/msg/{msg_id}
pub async fn remove_order_msg(
    _user: AuthenticatedUser,
    orders: web::Data<OrderService>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (order_id, msg_id) = path.into_inner();
    match orders.remove_order_msg(&order_id, &msg_id).await {
        Ok(removed_id) => HttpResponse::Ok().body(removed_id),
        Err(e) => {
            error!(%order_id, error = %e, "Failed to remove order msg");
            bad_request("Failed to remove order msg")
        }
    }
}
