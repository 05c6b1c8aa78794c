//! Typed shader-authoring layer over wgpu.
//!
//! Buffers carry a [`data::DataType`] schema, bind-group layouts name their
//! entries, and compute functions are resolved into complete WGSL against the
//! layouts they use. A finished pipeline plus bind group can be frozen into a
//! [`CompiledProgram`] for execution by another system.

pub mod data;

mod buffer;
mod compute;
mod error;
mod layout;
mod pipeline;
mod readback;
mod resolve;
mod root;

pub use buffer::{BufferBuilder, BufferId, TypedBuffer, Usage};
pub use compute::{Builtin, ComputeFn};
pub use error::TypedError;
pub use layout::{Access, BindGroup, BindGroupLayout, LayoutEntry};
pub use pipeline::{CompiledProgram, ComputePipeline, PipelineBuilder, ProgramKey};
pub use resolve::resolve;
pub use root::Root;
