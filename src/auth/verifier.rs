use jsonwebtoken::{Algorithm, decode_header};

use crate::auth::context::LoggedInUser;
use crate::auth::jwks::JwksCache;
use crate::auth::jwt::{self, Claims};
use crate::config::AuthConfig;

/// Validates bearer tokens with whichever methods are configured: the shared
/// HS256 secret, the project's JWKS, or both.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Option<String>,
    jwks: Option<JwksCache>,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let jwks = match (&config.project_ref, &config.anon_key) {
            (Some(project_ref), Some(anon_key)) => Some(JwksCache::new(project_ref, anon_key)),
            _ => None,
        };
        Self {
            secret: config.jwt_secret.clone(),
            jwks,
        }
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            jwks: None,
        }
    }

    pub async fn verify(&self, token: &str) -> Result<Claims, String> {
        let header = decode_header(token).map_err(|e| format!("Failed to decode header: {e}"))?;

        match (header.alg, &self.secret, &self.jwks, header.kid) {
            (Algorithm::HS256, Some(secret), _, _) => jwt::validate_token(token, secret),
            (Algorithm::HS256, None, _, _) => Err("HS256 tokens are not accepted".to_string()),
            (_, _, Some(jwks), Some(kid)) => jwks.validate_token(token, &kid).await,
            (_, _, Some(_), None) => Err("No 'kid' in token header".to_string()),
            (alg, _, None, _) => Err(format!("{alg:?} tokens are not accepted")),
        }
    }

    /// Validate `token` and map its claims to the request identity.
    pub async fn authenticate(&self, token: &str) -> Result<LoggedInUser, String> {
        self.verify(token).await?.logged_in_user()
    }
}
