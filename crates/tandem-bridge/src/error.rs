use tandem_engine::render::{CacheKey, EngineError};
use tandem_gpu::{BufferId, TypedError, Usage};

/// Errors raised while sharing resources between the two systems.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Only 32-bit scalars and vectors of them can back a renderer attribute.
    #[error("element type `{found}` cannot back a storage attribute")]
    UnsupportedElementType { found: String },

    #[error("buffer {buffer} lacks `{usage}` usage")]
    MissingUsage { buffer: BufferId, usage: Usage },

    #[error("renderer hooks version {found} is not supported (supported: {supported})")]
    IncompatibleRendererVersion { found: u32, supported: String },

    #[error("a pipeline is already registered under cache key {key}")]
    DuplicateInjection { key: CacheKey },

    #[error("GPU submission failed: {0}")]
    GpuSubmissionFailure(String),

    #[error(transparent)]
    Renderer(#[from] EngineError),

    #[error(transparent)]
    Shader(#[from] TypedError),
}
