pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod socket;

pub use config::AppConfig;
pub use error::ServiceError;
