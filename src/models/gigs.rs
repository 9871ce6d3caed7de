use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::messages::Msg;

/// A service offering posted by a seller, stored in the `gig` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gig {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub days_to_make: i32,
    pub owner: GigOwner,
    #[serde(default)]
    pub msgs: Vec<Msg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub img_urls: Vec<String>,
    /// Derived from the stored `_id`, never written by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Seller profile embedded in a gig. `rate`, `loc` and `language` are the
/// facets the gig filter can select on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigOwner {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDir {
    #[default]
    #[serde(rename = "1", alias = "asc")]
    Asc,
    #[serde(rename = "-1", alias = "desc")]
    Desc,
}

impl SortDir {
    pub fn as_i32(self) -> i32 {
        match self {
            SortDir::Asc => 1,
            SortDir::Desc => -1,
        }
    }
}

impl FromStr for SortDir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" | "asc" => Ok(SortDir::Asc),
            "-1" | "desc" => Ok(SortDir::Desc),
            other => Err(format!("Invalid sort direction: {other}")),
        }
    }
}

/// Optional owner facets. Absent and empty lists both mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerFacets {
    pub rate: Option<Vec<String>>,
    pub loc: Option<Vec<String>>,
    pub language: Option<Vec<String>>,
}

/// Gig search descriptor. Every field is optional; an absent field adds no
/// clause to the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GigFilter {
    pub title: Option<String>,
    pub category: Option<String>,
    pub budget: Option<f64>,
    pub days_to_make: Option<f64>,
    pub owner: OwnerFacets,
    pub sort_field: Option<String>,
    pub sort_dir: Option<SortDir>,
    pub page_idx: Option<u64>,
}

// ── DTOs ──

/// Query string for `GET /api/gigs`. Facet lists are comma-separated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigListQuery {
    pub title: Option<String>,
    pub category: Option<String>,
    pub budget: Option<f64>,
    pub days_to_make: Option<f64>,
    pub rate: Option<String>,
    pub loc: Option<String>,
    pub language: Option<String>,
    pub sort_field: Option<String>,
    pub sort_dir: Option<String>,
    pub page_idx: Option<u64>,
}

/// Request body for `PUT /api/gigs/{id}`. Only `title` and `price` are
/// persisted; any other fields are accepted and echoed back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGig {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub price: f64,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

fn split_list(raw: Option<String>) -> Option<Vec<String>> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
}

impl TryFrom<GigListQuery> for GigFilter {
    type Error = String;

    fn try_from(query: GigListQuery) -> Result<Self, Self::Error> {
        let sort_dir = query.sort_dir.as_deref().map(str::parse).transpose()?;

        Ok(Self {
            title: query.title,
            category: query.category,
            budget: query.budget,
            days_to_make: query.days_to_make,
            owner: OwnerFacets {
                rate: split_list(query.rate),
                loc: split_list(query.loc),
                language: split_list(query.language),
            },
            sort_field: query.sort_field.filter(|f| !f.is_empty()),
            sort_dir,
            page_idx: query.page_idx,
        })
    }
}
