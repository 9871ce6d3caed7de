use mongodb::bson::{self, Document, doc};
use std::sync::Arc;
use tracing::error;

use super::{pull_msg, push_msg};
use crate::auth::context::RequestContext;
use crate::db::codec::{created_at, from_document, id_to_hex, parse_object_id, to_document};
use crate::db::{Collection, DbError, DocumentStore, FindOptions};
use crate::error::ServiceError;
use crate::models::messages::Msg;
use crate::models::orders::{Order, OrderFilter};

const ORDER_COLLECTION: &str = "order";

/// CRUD and embedded-message operations on the `order` collection.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn DocumentStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(&self) -> Arc<dyn Collection> {
        self.store.collection(ORDER_COLLECTION)
    }

    /// Orders where the user is the seller (`is_seller`) or the buyer,
    /// newest first.
    pub async fn query(&self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError> {
        async {
            let party = if filter.is_seller { "seller._id" } else { "buyer._id" };
            let mut criteria = Document::new();
            criteria.insert(party, filter.user_id.as_str());
            if let Some(status) = filter.status {
                criteria.insert("status", status.as_str());
            }

            let docs = self
                .collection()
                .find(criteria, FindOptions::sorted(doc! { "_id": -1 }))
                .await?;
            let orders = docs
                .into_iter()
                .map(decode_order)
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, ServiceError>(orders)
        }
        .await
        .inspect_err(|err| error!(user_id = %filter.user_id, error = %err, "Cannot find orders"))
    }

    pub async fn get_by_id(&self, order_id: &str) -> Result<Order, ServiceError> {
        async {
            let oid = parse_object_id(order_id)?;
            let doc = self
                .collection()
                .find_one(doc! { "_id": oid })
                .await?
                .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
            decode_order(doc)
        }
        .await
        .inspect_err(|err| error!(order_id, error = %err, "While finding order"))
    }

    /// Delete an order. Admins may delete any order, other users only orders
    /// they are the buyer or the seller of.
    ///
    /// A missing order is `NotFound`; somebody else's order is `Forbidden`.
    pub async fn remove(&self, order_id: &str) -> Result<String, ServiceError> {
        async {
            let user = RequestContext::current_user().ok_or(ServiceError::Unauthenticated)?;

            let oid = parse_object_id(order_id)?;
            let mut criteria = doc! { "_id": oid };
            if !user.is_admin {
                criteria.insert(
                    "$or",
                    vec![
                        doc! { "buyer._id": user.id.as_str() },
                        doc! { "seller._id": user.id.as_str() },
                    ],
                );
            }

            let collection = self.collection();
            let deleted = collection.delete_one(criteria).await?;
            if deleted == 0 {
                // Gone already (e.g. a concurrent delete) or owned by someone else.
                return match collection.find_one(doc! { "_id": oid }).await? {
                    None => Err(ServiceError::not_found("Order", order_id)),
                    Some(_) => Err(ServiceError::Forbidden("Not your order".to_string())),
                };
            }
            Ok(order_id.to_string())
        }
        .await
        .inspect_err(|err| error!(order_id, error = %err, "Cannot remove order"))
    }

    /// Insert the order as given. The returned order carries the new `_id`.
    pub async fn add(&self, mut order: Order) -> Result<Order, ServiceError> {
        async move {
            let doc = to_document(&order)?;
            let inserted_id = self.collection().insert_one(doc).await?;
            order.id = id_to_hex(&inserted_id);
            Ok::<_, ServiceError>(order)
        }
        .await
        .inspect_err(|err| error!(error = %err, "Cannot insert order"))
    }

    /// Replace the mutable fields (status, parties, gig snapshot).
    /// Messages are only changed through the msg operations.
    pub async fn update(&self, order: Order) -> Result<Order, ServiceError> {
        let order_id = order.id.clone().unwrap_or_default();

        async move {
            let oid = parse_object_id(&order_id)?;

            let mut changes = doc! {
                "status": order.status.as_str(),
                "buyer": bson::to_bson(&order.buyer).map_err(DbError::from)?,
                "seller": bson::to_bson(&order.seller).map_err(DbError::from)?,
            };
            if let Some(gig) = &order.gig {
                changes.insert("gig", bson::to_bson(gig).map_err(DbError::from)?);
            }

            let outcome = self
                .collection()
                .update_one(doc! { "_id": oid }, doc! { "$set": changes })
                .await?;
            if outcome.matched == 0 {
                return Err(ServiceError::not_found("Order", order_id));
            }
            Ok(order)
        }
        .await
        .inspect_err(|err| error!(error = %err, "Cannot update order"))
    }

    pub async fn add_order_msg(&self, order_id: &str, msg: Msg) -> Result<Msg, ServiceError> {
        async move {
            let oid = parse_object_id(order_id)?;
            let collection = self.collection();
            push_msg(collection.as_ref(), "Order", order_id, oid, msg).await
        }
        .await
        .inspect_err(|err| error!(order_id, error = %err, "Cannot add order msg"))
    }

    pub async fn remove_order_msg(
        &self,
        order_id: &str,
        msg_id: &str,
    ) -> Result<String, ServiceError> {
        async {
            let oid = parse_object_id(order_id)?;
            let collection = self.collection();
            pull_msg(collection.as_ref(), oid, msg_id).await?;
            Ok::<_, ServiceError>(msg_id.to_string())
        }
        .await
        .inspect_err(|err| error!(order_id, msg_id, error = %err, "Cannot remove order msg"))
    }
}

fn decode_order(doc: Document) -> Result<Order, ServiceError> {
    let created_at = created_at(&doc);
    let mut order: Order = from_document(doc)?;
    order.created_at = created_at;
    Ok(order)
}
