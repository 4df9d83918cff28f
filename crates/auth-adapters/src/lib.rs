//! # auth-adapters
//!
//! Implementations of `domains::IdentityVerifier`. Token issuance exists only
//! so operators and tests can mint credentials; sign-up and login flows are
//! handled by another service.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtVerifier;
