//! Application configuration loaded from environment variables.
//!
//! Call `dotenv().ok()` before [`AppConfig::from_env`] so a local `.env` file
//! is picked up during development.

use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Invalid SUPABASE_URL format. Expected: https://PROJECT.supabase.co")]
    SupabaseUrl,

    #[error("No token verification configured: set SUPABASE_JWT_SECRET or SUPABASE_URL")]
    NoTokenVerifier,
}

/// Which document store backs the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Mongo { url: String, database: String },
    /// Process-local store, lost on restart. Intended for local runs.
    Memory,
}

/// Supabase settings used to validate bearer tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// Shared HS256 secret (legacy Supabase projects).
    pub jwt_secret: Option<String>,
    /// `PROJECT` part of `https://PROJECT.supabase.co`, for JWKS lookups.
    pub project_ref: Option<String>,
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Env: `PORT`, default `8080`.
    pub port: u16,
    /// Env: `STORAGE` (`mongo` | `memory`), `DATABASE_URL`, `DATABASE_NAME`.
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let storage = match lookup("STORAGE").as_deref().unwrap_or("mongo") {
            "mongo" => StorageConfig::Mongo {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                database: lookup("DATABASE_NAME").unwrap_or_else(|| "gig_market".to_string()),
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE",
                    value: other.to_string(),
                });
            }
        };

        let project_ref = match lookup("SUPABASE_URL") {
            Some(url) => Some(
                url.strip_prefix("https://")
                    .and_then(|s| s.strip_suffix(".supabase.co"))
                    .map(str::to_string)
                    .ok_or(ConfigError::SupabaseUrl)?,
            ),
            None => None,
        };

        let auth = AuthConfig {
            jwt_secret: lookup("SUPABASE_JWT_SECRET"),
            anon_key: lookup("SUPABASE_ANON_KEY"),
            project_ref,
        };

        if auth.jwt_secret.is_none() && auth.project_ref.is_none() {
            return Err(ConfigError::NoTokenVerifier);
        }
        if auth.project_ref.is_some() && auth.anon_key.is_none() {
            return Err(ConfigError::Missing("SUPABASE_ANON_KEY"));
        }

        Ok(Self {
            port,
            storage,
            auth,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_for_memory_storage() {
        let config =
            AppConfig::from_lookup(lookup(&[("STORAGE", "memory"), ("SUPABASE_JWT_SECRET", "s")]))
                .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s"));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn mongo_storage_requires_database_url() {
        let err = AppConfig::from_lookup(lookup(&[("SUPABASE_JWT_SECRET", "s")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn supabase_url_yields_project_ref() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "mongodb://localhost:27017"),
            ("SUPABASE_URL", "https://abcd.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();

        assert_eq!(config.auth.project_ref.as_deref(), Some("abcd"));
        assert_eq!(
            config.storage,
            StorageConfig::Mongo {
                url: "mongodb://localhost:27017".to_string(),
                database: "gig_market".to_string(),
            }
        );
    }

    #[test]
    fn missing_token_verification_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("STORAGE", "memory")])).unwrap_err();
        assert!(matches!(err, ConfigError::NoTokenVerifier));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("STORAGE", "memory"),
            ("SUPABASE_JWT_SECRET", "s"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }
}
