use super::nodes::BindGroupId;
use super::node::NodeId;
use super::pipelines::CacheKey;
use super::attribute::AttributeId;

/// Errors raised by the renderer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no pipeline record for cache key {key}")]
    UnknownPipeline { key: CacheKey },

    #[error("no bind group {id}")]
    UnknownBindGroup { id: BindGroupId },

    #[error("compute node {node} has no bind group {group}")]
    NoSuchGroup { node: NodeId, group: u32 },

    #[error("attribute {id:?} has no backing buffer")]
    UnallocatedAttribute { id: AttributeId },

    #[error("attribute {id:?} write of {len} bytes exceeds its {size} byte buffer")]
    AttributeWriteOutOfBounds { id: AttributeId, len: u64, size: u64 },

    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("buffer map failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("GPU callback was dropped before completion")]
    CallbackDropped,

    #[error("GPU validation failed: {0}")]
    Validation(String),
}

impl EngineError {
    /// True when the device rejected or lost submitted work, as opposed to a
    /// cache lookup failing before anything reached the GPU.
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Poll(_) | Self::Map(_) | Self::CallbackDropped
        )
    }
}
