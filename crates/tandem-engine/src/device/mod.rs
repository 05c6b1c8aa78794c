//! Adapter, device and surface.
//!
//! Adapters that cannot run compute shaders are rejected up front; everything
//! in this workspace dispatches compute work every frame.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction, request_headless};
