use serde::Serialize;

use crate::models::orders::Order;

// ── Server -> Client events ──

/// Events pushed to a user's WebSocket sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A buyer placed an order on one of the seller's gigs.
    AddOrder(Order),
    /// The order's status or parties changed.
    UpdateOrder(Order),
    /// The order with this id was removed.
    RemoveOrder(String),
}

impl ServerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::AddOrder(_) => "add-order",
            ServerEvent::UpdateOrder(_) => "update-order",
            ServerEvent::RemoveOrder(_) => "remove-order",
        }
    }
}

/// An event addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(flatten)]
    pub event: ServerEvent,
    pub user_id: String,
}

impl Notification {
    pub fn new(event: ServerEvent, user_id: impl Into<String>) -> Self {
        Self {
            event,
            user_id: user_id.into(),
        }
    }
}
