use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::jwt::Claims;

const JWKS_URL_TEMPLATE: &str = "https://{}.supabase.co/auth/v1/.well-known/jwks.json";

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// An EC public key as published in the Supabase JWKS document.
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    x: String,
    y: String,
    #[serde(default)]
    alg: Option<String>,
}

impl Jwk {
    fn algorithm(&self) -> Algorithm {
        match self.alg.as_deref() {
            Some("ES384") => Algorithm::ES384,
            _ => Algorithm::ES256,
        }
    }
}

/// Fetches Supabase signing keys and caches them by `kid` for an hour.
#[derive(Clone)]
pub struct JwksCache {
    cache: Arc<Cache<String, Jwk>>,
    jwks_url: String,
    client: reqwest::Client,
    anon_key: String,
}

impl JwksCache {
    pub fn new(project_ref: &str, anon_key: &str) -> Self {
        let cache = Arc::new(
            Cache::builder()
                .time_to_live(Duration::from_secs(3600))
                .max_capacity(10)
                .build(),
        );

        Self {
            cache,
            jwks_url: JWKS_URL_TEMPLATE.replace("{}", project_ref),
            client: reqwest::Client::new(),
            anon_key: anon_key.to_string(),
        }
    }

    async fn fetch_keys(&self) -> Result<Vec<Jwk>, String> {
        debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .client
            .get(&self.jwks_url)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch JWKS: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Failed to fetch JWKS: HTTP {status}"));
        }

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse JWKS JSON: {e}"))?;
        Ok(set.keys)
    }

    async fn key(&self, kid: &str) -> Result<Jwk, String> {
        if let Some(cached) = self.cache.get(kid).await {
            return Ok(cached);
        }

        let keys = self.fetch_keys().await?;
        for key in &keys {
            self.cache.insert(key.kid.clone(), key.clone()).await;
        }

        keys.into_iter()
            .find(|k| k.kid == kid)
            .ok_or(format!("Key with kid={kid} not found in JWKS"))
    }

    /// Validate an asymmetrically signed token whose header names a `kid`.
    pub async fn validate_token(&self, token: &str, kid: &str) -> Result<Claims, String> {
        let key = self.key(kid).await?;

        let decoding_key = DecodingKey::from_ec_components(&key.x, &key.y)
            .map_err(|e| format!("Failed to create decoding key: {e}"))?;

        let mut validation = Validation::new(key.algorithm());
        validation.validate_aud = false;

        decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| format!("Token validation failed: {e}"))
    }
}
