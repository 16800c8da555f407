//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the session user from a Bearer token or the `jwt` cookie.

pub mod auth;
