use serde::{Deserialize, Serialize};

use crate::models::users::MiniUser;

/// A message embedded in a gig's or an order's `msgs` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    /// Assigned by the service when the message is pushed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub txt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<MiniUser>,
}

impl Msg {
    pub fn new(txt: impl Into<String>, by: Option<MiniUser>) -> Self {
        Self {
            id: None,
            txt: txt.into(),
            by,
        }
    }
}

// ── DTOs ──

/// Request body for `POST /{resource}/{id}/msg`. The author comes from the token.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMsg {
    pub txt: String,
}
