use mongodb::bson::{Document, doc};
use std::sync::Arc;
use tracing::error;

use super::gig_query::{build_criteria, build_sort};
use super::{pull_msg, push_msg};
use crate::auth::context::RequestContext;
use crate::db::codec::{created_at, from_document, id_to_hex, parse_object_id, to_document};
use crate::db::{Collection, DocumentStore, FindOptions};
use crate::error::ServiceError;
use crate::models::gigs::{Gig, GigFilter, UpdateGig};
use crate::models::messages::Msg;

const GIG_COLLECTION: &str = "gig";

/// Gigs returned per page when the filter carries a `pageIdx`.
pub const PAGE_SIZE: u64 = 3;

/// CRUD and embedded-message operations on the `gig` collection.
#[derive(Clone)]
pub struct GigService {
    store: Arc<dyn DocumentStore>,
}

impl GigService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(&self) -> Arc<dyn Collection> {
        self.store.collection(GIG_COLLECTION)
    }

    /// Gigs matching `filter`, one page of [`PAGE_SIZE`] when `pageIdx` is set.
    pub async fn query(&self, filter: &GigFilter) -> Result<Vec<Gig>, ServiceError> {
        async {
            let criteria = build_criteria(filter)?;
            let mut options = FindOptions::sorted(build_sort(filter));
            if let Some(page_idx) = filter.page_idx {
                options = options.page(page_idx, PAGE_SIZE).ok_or_else(|| {
                    ServiceError::InvalidArgument(format!("Page index {page_idx} is out of range"))
                })?;
            }

            let docs = self.collection().find(criteria, options).await?;
            let gigs = docs
                .into_iter()
                .map(decode_gig)
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, ServiceError>(gigs)
        }
        .await
        .inspect_err(|err| error!(error = %err, "Cannot find gigs"))
    }

    pub async fn get_by_id(&self, gig_id: &str) -> Result<Gig, ServiceError> {
        async {
            let oid = parse_object_id(gig_id)?;
            let doc = self
                .collection()
                .find_one(doc! { "_id": oid })
                .await?
                .ok_or_else(|| ServiceError::not_found("Gig", gig_id))?;
            decode_gig(doc)
        }
        .await
        .inspect_err(|err| error!(gig_id, error = %err, "While finding gig"))
    }

    /// Delete a gig. Admins may delete any gig, other users only their own.
    ///
    /// A missing gig and somebody else's gig both yield `Forbidden`.
    pub async fn remove(&self, gig_id: &str) -> Result<String, ServiceError> {
        async {
            let user = RequestContext::current_user().ok_or(ServiceError::Unauthenticated)?;

            let mut criteria = doc! { "_id": parse_object_id(gig_id)? };
            if !user.is_admin {
                criteria.insert("owner._id", user.id);
            }

            let deleted = self.collection().delete_one(criteria).await?;
            if deleted == 0 {
                return Err(ServiceError::Forbidden("Not your gig".to_string()));
            }
            Ok(gig_id.to_string())
        }
        .await
        .inspect_err(|err| error!(gig_id, error = %err, "Cannot remove gig"))
    }

    /// Insert the gig as given. The returned gig carries the new `_id`.
    pub async fn add(&self, mut gig: Gig) -> Result<Gig, ServiceError> {
        async move {
            let doc = to_document(&gig)?;
            let inserted_id = self.collection().insert_one(doc).await?;
            gig.id = id_to_hex(&inserted_id);
            Ok::<_, ServiceError>(gig)
        }
        .await
        .inspect_err(|err| error!(error = %err, "Cannot insert gig"))
    }

    /// Persist `title` and `price` only; the input is returned as-is.
    pub async fn update(&self, gig: UpdateGig) -> Result<UpdateGig, ServiceError> {
        let gig_id = gig.id.clone().unwrap_or_default();

        async move {
            let oid = parse_object_id(&gig_id)?;
            let changes = doc! { "title": gig.title.clone(), "price": gig.price };

            let outcome = self
                .collection()
                .update_one(doc! { "_id": oid }, doc! { "$set": changes })
                .await?;
            if outcome.matched == 0 {
                return Err(ServiceError::not_found("Gig", gig_id));
            }
            Ok(gig)
        }
        .await
        .inspect_err(|err| error!(error = %err, "Cannot update gig"))
    }

    pub async fn add_gig_msg(&self, gig_id: &str, msg: Msg) -> Result<Msg, ServiceError> {
        async move {
            let oid = parse_object_id(gig_id)?;
            let collection = self.collection();
            push_msg(collection.as_ref(), "Gig", gig_id, oid, msg).await
        }
        .await
        .inspect_err(|err| error!(gig_id, error = %err, "Cannot add gig msg"))
    }

    pub async fn remove_gig_msg(&self, gig_id: &str, msg_id: &str) -> Result<String, ServiceError> {
        async {
            let oid = parse_object_id(gig_id)?;
            let collection = self.collection();
            pull_msg(collection.as_ref(), oid, msg_id).await?;
            Ok::<_, ServiceError>(msg_id.to_string())
        }
        .await
        .inspect_err(|err| error!(gig_id, msg_id, error = %err, "Cannot remove gig msg"))
    }
}

fn decode_gig(doc: Document) -> Result<Gig, ServiceError> {
    let created_at = created_at(&doc);
    let mut gig: Gig = from_document(doc)?;
    gig.created_at = created_at;
    Ok(gig)
}
