use lostsons_core::error::CoreError;
use lostsons_db::StoreError;
use lostsons_mux::ProviderError;

/// Failure of a pipeline operation, tagged by the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The submission itself is unusable (empty file, oversized field).
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// Writing the staged copy failed; the provider was never contacted.
    #[error("failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
