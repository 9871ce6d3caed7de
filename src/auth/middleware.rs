use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::Header;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, web};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, error};

use crate::auth::context::{LoggedInUser, RequestContext};
use crate::auth::verifier::TokenVerifier;

/// Resolves the bearer token (if any) into a [`LoggedInUser`] and runs the
/// rest of the request inside [`RequestContext::scope`].
///
/// Requests without an `Authorization` header pass through anonymously; an
/// invalid token is rejected with 401. Routes that need an identity take the
/// [`AuthenticatedUser`] extractor.
#[derive(Clone, Default)]
pub struct Authenticate;

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthenticateMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = Authorization::<Bearer>::parse(&req)
                .ok()
                .map(|auth| auth.into_scheme().token().to_string());

            let user = match token {
                Some(token) => {
                    let verifier = req
                        .app_data::<web::Data<Arc<TokenVerifier>>>()
                        .cloned()
                        .ok_or_else(|| {
                            error!("Token verifier not configured");
                            actix_web::error::ErrorInternalServerError(
                                "Token verifier not configured",
                            )
                        })?;

                    let user = verifier.authenticate(&token).await.map_err(|e| {
                        debug!(error = %e, "Rejected bearer token");
                        actix_web::error::ErrorUnauthorized(format!("Invalid token: {e}"))
                    })?;
                    req.extensions_mut().insert(user.clone());
                    Some(user)
                }
                None => None,
            };

            RequestContext::scope(user, service.call(req)).await
        })
    }
}

/// Extractor for routes that require a logged-in user.
pub struct AuthenticatedUser(pub LoggedInUser);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<LoggedInUser>()
            .cloned()
            .or_else(RequestContext::current_user);

        ready(
            user.map(AuthenticatedUser)
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("Not logged in")),
        )
    }
}
