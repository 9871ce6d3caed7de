use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::messages::Msg;
use crate::models::users::MiniUser;

/// Order status stored as a lowercase string. Transitions are not validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Completed => "completed",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "approved" => Ok(OrderStatus::Approved),
            "rejected" => Ok(OrderStatus::Rejected),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(format!("Unknown order status: {other}")),
        }
    }
}

/// A buyer's engagement of a seller's gig, stored in the `order` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    pub buyer: MiniUser,
    pub seller: MiniUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gig: Option<OrderedGig>,
    #[serde(default)]
    pub msgs: Vec<Msg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Snapshot of the gig an order was placed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedGig {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub price: f64,
}

/// Which of a user's orders to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    /// `None` lists every status.
    pub status: Option<OrderStatus>,
    pub user_id: String,
    /// List orders where the user is the seller rather than the buyer.
    pub is_seller: bool,
}

// ── DTOs ──

/// Query string for `GET /api/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub is_seller: Option<bool>,
}

impl OrderListQuery {
    pub fn into_filter(self, user_id: String) -> Result<OrderFilter, String> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "all")
            .map(str::parse)
            .transpose()?;

        Ok(OrderFilter {
            status,
            user_id,
            is_seller: self.is_seller.unwrap_or(false),
        })
    }
}
