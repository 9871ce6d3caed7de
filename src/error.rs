use thiserror::Error;

use crate::db::DbError;

/// Failures surfaced by the gig and order services.
///
/// The HTTP layer collapses every variant into a 400 response, but the kinds
/// stay distinct here so callers inside the crate can tell them apart.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No logged in user")]
    Unauthenticated,

    #[error(transparent)]
    Upstream(#[from] DbError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_id(id: &str) -> Self {
        Self::InvalidArgument(format!("'{id}' is not a valid identifier"))
    }
}
