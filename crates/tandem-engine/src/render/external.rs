//! Registration interface for GPU objects built outside the renderer.
//!
//! Everything here writes into caches the renderer would otherwise fill
//! lazily. Callers register node data and program first, then bindings, then
//! the pipeline record and its pipeline. The interface is versioned;
//! consumers compare [`ExternalHooks::hooks_version`] against the versions
//! they were written for before touching anything else.

use super::attribute::StorageAttribute;
use super::error::EngineError;
use super::node::ComputeNode;
use super::nodes::{BindGroupId, ComputeNodeData};
use super::pipelines::{CacheKey, ComputePipelineRecord};

/// Version of the [`ExternalHooks`] contract implemented by this crate.
pub const HOOKS_VERSION: u32 = 1;

/// Resource counts, for diagnostics and tests.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RendererStats {
    pub owned_attribute_buffers: usize,
    pub external_attribute_buffers: usize,
    pub pipeline_records: usize,
    pub programs: usize,
    pub bind_groups: usize,
}

pub trait ExternalHooks {
    fn hooks_version(&self) -> u32;

    fn is_initialized(&self) -> bool;

    /// Creates renderer-wide GPU state. Idempotent.
    fn init(&mut self);

    /// Installs `buffer` as the backing store of `attribute`, tagged with
    /// the caller's buffer id. Bind groups that captured an older buffer are
    /// rebuilt on next use.
    fn adopt_attribute_buffer(&mut self, attribute: &StorageAttribute, buffer: wgpu::Buffer, origin: u64);

    /// Per-dispatch bookkeeping for `node`, built on first request.
    fn materialize_compute(&mut self, node: &ComputeNode) -> &mut ComputeNodeData;

    fn register_compute_program(&mut self, source: &str, module: wgpu::ShaderModule);

    /// The key the renderer files `node` under when it runs `source`.
    fn compute_cache_key(&self, node: &ComputeNode, source: &str) -> CacheKey;

    fn has_pipeline_record(&self, key: &CacheKey) -> bool;

    fn insert_pipeline_record(&mut self, record: ComputePipelineRecord);

    /// Replaces the GPU pipeline behind an existing record.
    fn override_pipeline(&mut self, key: &CacheKey, pipeline: wgpu::ComputePipeline) -> Result<(), EngineError>;

    /// Builds bind group `group` of `node` the way [`compute`] would.
    ///
    /// [`compute`]: super::Renderer::compute
    fn create_bindings(&mut self, node: &ComputeNode, group: u32) -> Result<BindGroupId, EngineError>;

    /// Replaces a bind group and its layout. The replacement is never rebuilt
    /// by the renderer.
    fn override_bind_group(
        &mut self,
        id: &BindGroupId,
        group: wgpu::BindGroup,
        layout: wgpu::BindGroupLayout,
    ) -> Result<(), EngineError>;

    fn stats(&self) -> RendererStats;
}
