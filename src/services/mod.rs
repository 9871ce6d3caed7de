pub mod gig_query;
pub mod gigs;
pub mod orders;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, doc};
use uuid::Uuid;

use crate::db::{Collection, DbError};
use crate::error::ServiceError;
use crate::models::messages::Msg;

pub use gigs::GigService;
pub use orders::OrderService;

/// Assign `msg` a fresh id and append it to the parent's `msgs` array.
async fn push_msg(
    collection: &dyn Collection,
    entity: &'static str,
    parent_id: &str,
    oid: ObjectId,
    mut msg: Msg,
) -> Result<Msg, ServiceError> {
    msg.id = Some(Uuid::new_v4().to_string());
    let value = bson::to_bson(&msg).map_err(DbError::from)?;

    let outcome = collection
        .update_one(doc! { "_id": oid }, doc! { "$push": { "msgs": value } })
        .await?;
    if outcome.matched == 0 {
        return Err(ServiceError::not_found(entity, parent_id));
    }
    Ok(msg)
}

/// Remove the message with `msg_id` from the parent's `msgs` array.
/// Removing a message that is not there is not an error.
async fn pull_msg(collection: &dyn Collection, oid: ObjectId, msg_id: &str) -> Result<(), ServiceError> {
    collection
        .update_one(
            doc! { "_id": oid },
            doc! { "$pull": { "msgs": { "id": msg_id } } },
        )
        .await?;
    Ok(())
}
