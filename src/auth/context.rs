//! Request-scoped identity of the logged-in user.
//!
//! The [`Authenticate`](crate::auth::middleware::Authenticate) middleware binds
//! the caller into tokio task-local storage for the lifetime of one request,
//! so services can read it without threading it through every call. Task-local
//! values are not inherited by spawned tasks; wrap spawned work in
//! [`RequestContext::scope`] if it needs the identity.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::task_local;

task_local! {
    static CURRENT_USER: Option<LoggedInUser>;
}

/// The authenticated caller, derived from validated token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedInUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub fullname: Option<String>,
    pub img_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl LoggedInUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fullname: None,
            img_url: None,
            is_admin: false,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(id)
        }
    }
}

pub struct RequestContext;

impl RequestContext {
    /// The user bound to the current request, if any.
    pub fn current_user() -> Option<LoggedInUser> {
        CURRENT_USER.try_with(|user| user.clone()).ok().flatten()
    }

    /// Run `fut` with `user` as the current request's identity.
    pub async fn scope<Fut>(user: Option<LoggedInUser>, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CURRENT_USER.scope(user, fut).await
    }
}
