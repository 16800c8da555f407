//! Domain primitives shared by every Lost Sons TV crate.
//!
//! - [`error`] -- the domain error enum.
//! - [`types`] -- shared type aliases.
//! - [`clip`] -- clip metadata limits and submission validation.

pub mod clip;
pub mod error;
pub mod types;
