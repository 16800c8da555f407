//! Session authentication.
//!
//! - [`jwt`] -- HS256 session token issuance and validation.
//! - [`cookie`] -- the `jwt` session cookie.
//! - [`discord`] -- Discord OAuth2 code exchange and user lookup.

pub mod cookie;
pub mod discord;
pub mod jwt;
