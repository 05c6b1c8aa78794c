//! Rendering: scene draw, node-based compute and the external registration
//! hooks.

mod attribute;
mod backend;
mod ctx;
mod error;
mod external;
mod mesh;
mod node;
mod nodes;
mod pipelines;
mod readback;
mod renderer;

pub use attribute::{AttributeId, StorageAttribute, StorageNode};
pub use backend::BufferOrigin;
pub use ctx::RenderTarget;
pub use error::EngineError;
pub use external::{ExternalHooks, RendererStats, HOOKS_VERSION};
pub use node::{CodeNode, ComputeKind, ComputeNode, FnNode, NodeId};
pub use nodes::{BindGroupId, ComputeNodeData};
pub use pipelines::{CacheKey, ComputePipelineRecord};
pub use renderer::{Renderer, RendererConfig};
