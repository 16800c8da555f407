//! Clip submission pipeline.
//!
//! Turns an uploaded video plus metadata into a durable clip record:
//! stage the bytes under a web-reachable name, hand the URL to the asset
//! provider, then commit the metadata row. Also owns the two other
//! operations that span provider and repository: deletion and ready-webhook
//! resolution.
//!
//! Provider and repository writes are not transactional. A failed row insert
//! after the provider accepted an asset triggers a best-effort provider
//! delete; if that also fails the asset is orphaned and logged for an
//! operator. A row whose provider asset could not be deleted is kept.

pub mod error;
pub mod pipeline;
pub mod staging;

pub use error::PipelineError;
pub use pipeline::{ClipPipeline, ClipSubmission, ResolutionMode, SubmissionOutcome};
pub use staging::{StagedFile, StagingArea};
