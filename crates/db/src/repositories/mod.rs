//! Repository layer.
//!
//! [`ClipStore`] is the storage capability the pipeline and HTTP layer depend
//! on; [`PgClipStore`] is its PostgreSQL implementation.

pub mod clip_repo;

pub use clip_repo::{ClipStore, PgClipStore};
