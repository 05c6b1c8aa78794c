use tandem_engine::render::{CacheKey, CodeNode, ComputeNode, ComputePipelineRecord, ExternalHooks, StorageNode};
use tandem_gpu::CompiledProgram;

use crate::{Bridge, BridgeError};

/// An injected program, dispatched through `Renderer::compute`.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    node: ComputeNode,
    key: CacheKey,
}

impl DispatchHandle {
    pub fn node(&self) -> &ComputeNode {
        &self.node
    }

    /// Key of the renderer's pipeline record for this program.
    pub fn key(&self) -> CacheKey {
        self.key
    }
}

impl Bridge {
    /// Installs `program` in the renderer's caches so that dispatching the
    /// returned handle runs the externally built pipeline and bind group.
    ///
    /// `storages` are bound at group 0 in order and must match the program's
    /// bind group entries.
    pub fn inject(
        &mut self,
        program: &CompiledProgram,
        storages: &[StorageNode],
        renderer: &mut impl ExternalHooks,
    ) -> Result<DispatchHandle, BridgeError> {
        if !renderer.is_initialized() {
            renderer.init();
        }

        let source = program.source();
        let node = CodeNode::new(source, storages).compute(program.dispatch());

        let key = renderer.compute_cache_key(&node, source);
        if renderer.has_pipeline_record(&key) {
            return Err(BridgeError::DuplicateInjection { key });
        }

        renderer.materialize_compute(&node).compute_shader = source.to_string();
        renderer.register_compute_program(source, program.module().clone());

        let group = renderer.create_bindings(&node, 0)?;
        renderer.override_bind_group(
            &group,
            program.bind_group().clone(),
            program.bind_group_layout().clone(),
        )?;

        // Last, so a failed injection leaves no record to collide with a retry.
        renderer.insert_pipeline_record(ComputePipelineRecord::new(key, source));
        renderer.override_pipeline(&key, program.pipeline().clone())?;

        log::debug!("injected program {} as {} (cache key {key})", program.key(), node.id());
        self.injected.push(key);

        Ok(DispatchHandle { node, key })
    }
}
