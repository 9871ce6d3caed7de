pub mod context;
pub mod jwks;
pub mod jwt;
pub mod middleware;
pub mod verifier;
