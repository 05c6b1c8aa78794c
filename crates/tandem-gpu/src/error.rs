use crate::buffer::{BufferId, Usage};

/// Errors raised by the typed layer.
#[derive(Debug, thiserror::Error)]
pub enum TypedError {
    #[error("failed to acquire a GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create a GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("write of {len} bytes at offset {offset} exceeds buffer {buffer} of {size} bytes")]
    WriteOutOfBounds { buffer: BufferId, offset: u64, len: u64, size: u64 },

    #[error("write to buffer {buffer} at offset {offset} with {len} bytes is not 4-byte aligned")]
    UnalignedWrite { buffer: BufferId, offset: u64, len: u64 },

    #[error("initial data is {len} bytes but schema `{schema}` needs {size}")]
    InitialDataSize { schema: String, len: u64, size: u64 },

    #[error("buffer {buffer} lacks `{usage}` usage")]
    MissingUsage { buffer: BufferId, usage: Usage },

    #[error("layout `{layout}` has no entry named `{name}`")]
    UnknownEntry { layout: String, name: String },

    #[error("layout `{layout}` entry `{name}` has no resource")]
    MissingEntry { layout: String, name: String },

    #[error("layout `{layout}` entry `{name}` expects `{expected}`, buffer holds `{found}`")]
    SchemaMismatch { layout: String, name: String, expected: String, found: String },

    #[error("bind group was created for layout `{found}`, pipeline slot expects `{expected}`")]
    LayoutMismatch { expected: String, found: String },

    #[error("compute function `{function}` has no workgroup size")]
    MissingWorkgroupSize { function: String },

    #[error("compute function `{function}` declares no bind group for group {group}")]
    MissingBindGroup { function: String, group: u32 },

    #[error("buffer map failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("buffer map callback was dropped before completion")]
    MapCallbackDropped,

    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
}
