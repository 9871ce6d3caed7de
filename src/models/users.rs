use serde::{Deserialize, Serialize};

use crate::auth::context::LoggedInUser;

/// Denormalized user reference embedded in gigs, orders and messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
}

impl MiniUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fullname: None,
            img_url: None,
        }
    }
}

impl From<&LoggedInUser> for MiniUser {
    fn from(user: &LoggedInUser) -> Self {
        Self {
            id: user.id.clone(),
            fullname: user.fullname.clone(),
            img_url: user.img_url.clone(),
        }
    }
}
