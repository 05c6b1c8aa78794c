use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};

use crate::paint::Color;
use crate::scene::{PerspectiveCamera, PositionSource, Scene};
use crate::time::FrameTime;

use super::attribute::StorageAttribute;
use super::backend::{Backend, BindGroupData, BufferOrigin};
use super::ctx::RenderTarget;
use super::error::EngineError;
use super::external::{ExternalHooks, RendererStats, HOOKS_VERSION};
use super::mesh::{DrawItem, FrameUniform, MeshRenderer};
use super::node::{ComputeNode, GroupLayout};
use super::nodes::{BindGroupId, ComputeNodeData, Nodes};
use super::pipelines::{CacheKey, ComputePipelineRecord, Pipelines};
use super::readback::read_buffer;

/// Renderer settings.
#[derive(Debug, Clone, Copy)]
pub struct RendererConfig {
    /// Used when the scene has no background.
    pub clear_color: Color,
    /// Workgroup size for `Fn` compute nodes that do not pin their own.
    pub workgroup_size: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::from_hex(0x0f0f0f),
            workgroup_size: 64,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
struct RenderInfo {
    time: f32,
    delta: f32,
    frame: u32,
    _pad: u32,
}

/// Renderer-wide uniform state, created by [`Renderer::init`].
struct Shared {
    render_info: wgpu::Buffer,
    render_info_layout: wgpu::BindGroupLayout,
}

/// Scene renderer with node-based compute.
///
/// Compute nodes are compiled lazily: the first [`compute`](Self::compute)
/// call for a node builds its shader, pipeline record, pipeline and bind
/// groups; later calls reuse them.
pub struct Renderer {
    config: RendererConfig,
    backend: Backend,
    nodes: Nodes,
    pipelines: Pipelines,
    mesh: MeshRenderer,
    shared: Option<Shared>,
    info: RenderInfo,
}

impl Renderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, config: RendererConfig) -> Self {
        Self {
            config,
            backend: Backend::new(device, queue),
            nodes: Nodes::default(),
            pipelines: Pipelines::default(),
            mesh: MeshRenderer::default(),
            shared: None,
            info: RenderInfo::default(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn device(&self) -> &wgpu::Device {
        self.backend.device()
    }

    pub fn queue(&self) -> &wgpu::Queue {
        self.backend.queue()
    }

    pub fn init(&mut self) {
        if self.shared.is_some() {
            return;
        }

        let device = self.backend.device();
        let render_info = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tandem render info"),
            size: std::mem::size_of::<RenderInfo>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let render_info_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tandem render info bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<RenderInfo>() as u64),
                },
                count: None,
            }],
        });
        self.backend
            .queue()
            .write_buffer(&render_info, 0, bytemuck::bytes_of(&self.info));

        log::debug!("renderer initialized");
        self.shared = Some(Shared {
            render_info,
            render_info_layout,
        });
    }

    /// Advances the clock `Fn` compute nodes see as `time` and `delta`.
    pub fn advance(&mut self, time: &FrameTime) {
        self.info = RenderInfo {
            time: time.elapsed,
            delta: time.dt,
            frame: time.frame_index as u32,
            _pad: 0,
        };
        if let Some(shared) = &self.shared {
            self.backend
                .queue()
                .write_buffer(&shared.render_info, 0, bytemuck::bytes_of(&self.info));
        }
    }

    /// Records and submits one dispatch of `node`.
    ///
    /// Validation errors raised while building or submitting the dispatch
    /// are returned as [`EngineError::Validation`] instead of reaching the
    /// device's uncaptured error handler.
    pub fn compute(&mut self, node: &ComputeNode) -> Result<(), EngineError> {
        let scope = self
            .backend
            .device()
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let result = self.dispatch(node);
        let captured = pollster::block_on(scope.pop());
        result?;
        validated(captured)
    }

    fn dispatch(&mut self, node: &ComputeNode) -> Result<(), EngineError> {
        self.init();

        let data = self.nodes.get_for_compute(node, self.config.workgroup_size);
        let source = data.compute_shader.clone();
        let dispatch = data.dispatch;
        let bindings = data.bindings.clone();

        let module = self.pipelines.program(self.backend.device(), &source);
        let key = CacheKey::for_compute(&source, dispatch);

        for id in &bindings {
            self.ensure_bindings(node, id.group)?;
        }

        if self.pipelines.record(&key).is_none() {
            log::debug!("pipeline record {key} for {}", node.id());
            self.pipelines
                .insert_record(ComputePipelineRecord::new(key, source.as_str()));
        }

        if self.backend.pipeline(&key).is_none() {
            let pipeline = self.create_pipeline(&key, &module, &bindings)?;
            self.backend.set_pipeline(key, pipeline);
        }

        let record = self
            .pipelines
            .record_mut(&key)
            .ok_or(EngineError::UnknownPipeline { key })?;
        record.used_times += 1;

        let pipeline = self
            .backend
            .pipeline(&key)
            .ok_or(EngineError::UnknownPipeline { key })?;

        let mut encoder = self
            .backend
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tandem compute encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tandem compute pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            for id in &bindings {
                let group = self
                    .backend
                    .bind_group(id)
                    .ok_or(EngineError::UnknownBindGroup { id: *id })?;
                pass.set_bind_group(id.group, &group.group, &[]);
            }
            let [x, y, z] = dispatch;
            pass.dispatch_workgroups(x, y, z);
        }
        self.backend.queue().submit(std::iter::once(encoder.finish()));

        Ok(())
    }

    fn create_pipeline(
        &self,
        key: &CacheKey,
        module: &wgpu::ShaderModule,
        bindings: &[BindGroupId],
    ) -> Result<wgpu::ComputePipeline, EngineError> {
        let layouts = bindings
            .iter()
            .map(|id| {
                self.backend
                    .bind_group(id)
                    .map(|g| &g.layout)
                    .ok_or(EngineError::UnknownBindGroup { id: *id })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let device = self.backend.device();
        let label = format!("tandem compute {key}");
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        log::debug!("creating compute pipeline {key}");
        Ok(device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&label),
            layout: Some(&layout),
            module,
            entry_point: None,
            compilation_options: Default::default(),
            cache: None,
        }))
    }

    /// Builds (or rebuilds) bind group `group` of `node`.
    ///
    /// Storage groups are rebuilt when any attribute's buffer changed since
    /// the group was created. Groups installed from outside are left alone.
    fn ensure_bindings(&mut self, node: &ComputeNode, group: u32) -> Result<BindGroupId, EngineError> {
        let id = BindGroupId { node: node.id(), group };
        let layout = node
            .group(group)
            .ok_or(EngineError::NoSuchGroup { node: node.id(), group })?;

        match layout {
            GroupLayout::Storages(storages) => {
                let generations: Vec<u64> = storages
                    .iter()
                    .map(|s| self.backend.ensure_attribute(s.attribute()).generation)
                    .collect();

                if let Some(existing) = self.backend.bind_group(&id) {
                    if existing.external || existing.generations == generations {
                        return Ok(id);
                    }
                    log::debug!("rebuilding {id}: attribute buffers changed");
                }

                let buffers = storages
                    .iter()
                    .map(|s| {
                        self.backend
                            .attribute(s.attribute().id())
                            .map(|a| a.buffer.clone())
                            .ok_or(EngineError::UnallocatedAttribute { id: s.attribute().id() })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let data = self.storage_bind_group(&id, &buffers, generations);
                self.backend.set_bind_group(id, data);
            }
            GroupLayout::RenderInfo => {
                if self.backend.bind_group(&id).is_some() {
                    return Ok(id);
                }
                self.init();
                let Some(shared) = &self.shared else {
                    return Err(EngineError::NoSuchGroup { node: node.id(), group });
                };

                let label = id.to_string();
                let bind_group = self.backend.device().create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&label),
                    layout: &shared.render_info_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: shared.render_info.as_entire_binding(),
                    }],
                });
                let data = BindGroupData {
                    group: bind_group,
                    layout: shared.render_info_layout.clone(),
                    generations: Vec::new(),
                    external: false,
                };
                self.backend.set_bind_group(id, data);
            }
        }

        Ok(id)
    }

    fn storage_bind_group(&self, id: &BindGroupId, buffers: &[wgpu::Buffer], generations: Vec<u64>) -> BindGroupData {
        let device = self.backend.device();
        let label = id.to_string();

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..buffers.len() as u32)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&label),
            entries: &layout_entries,
        });

        let entries: Vec<wgpu::BindGroupEntry> = buffers
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout: &layout,
            entries: &entries,
        });

        BindGroupData {
            group,
            layout,
            generations,
            external: false,
        }
    }

    /// Draws `scene` from `camera` into `target`, clearing it first.
    ///
    /// Only errors raised while recording are caught here; the caller owns
    /// the encoder and its submission.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        target: &mut RenderTarget<'_>,
    ) -> Result<(), EngineError> {
        let scope = self
            .backend
            .device()
            .push_error_scope(wgpu::ErrorFilter::Validation);
        self.init();

        let clear = scene.background.unwrap_or(self.config.clear_color);
        let frame = FrameUniform::new(scene, camera);

        let backend = &mut self.backend;
        let items: Vec<DrawItem<'_>> = scene
            .meshes()
            .iter()
            .map(|mesh| {
                let positions = match mesh.geometry.position_source() {
                    PositionSource::Static => None,
                    PositionSource::Storage(attribute) => Some(backend.ensure_attribute(attribute).buffer.clone()),
                };
                DrawItem { mesh, positions }
            })
            .collect();

        self.mesh.render(
            self.backend.device(),
            self.backend.queue(),
            target,
            &frame,
            clear,
            &items,
        );
        validated(pollster::block_on(scope.pop()))
    }

    /// Copies the attribute's current contents back to the CPU.
    ///
    /// Reads at most the attribute's byte size; an adopted buffer smaller
    /// than that is read in full.
    pub fn read_attribute(&self, attribute: &StorageAttribute) -> Result<Vec<u8>, EngineError> {
        let data = self
            .backend
            .attribute(attribute.id())
            .ok_or(EngineError::UnallocatedAttribute { id: attribute.id() })?;
        let size = attribute.byte_size().min(data.buffer.size());
        read_buffer(self.backend.device(), self.backend.queue(), &data.buffer, size)
    }

    /// Queues a write at offset 0, allocating the attribute if needed.
    pub fn write_attribute(&mut self, attribute: &StorageAttribute, bytes: &[u8]) -> Result<(), EngineError> {
        let buffer = self.backend.ensure_attribute(attribute).buffer.clone();
        if bytes.len() as u64 > buffer.size() {
            return Err(EngineError::AttributeWriteOutOfBounds {
                id: attribute.id(),
                len: bytes.len() as u64,
                size: buffer.size(),
            });
        }
        self.backend.queue().write_buffer(&buffer, 0, bytes);
        Ok(())
    }

    /// Blocks until everything submitted so far has finished on the GPU.
    pub fn wait_for_submitted_work(&self) -> Result<(), EngineError> {
        let (tx, rx) = mpsc::channel();
        self.backend.queue().on_submitted_work_done(move || {
            let _ = tx.send(());
        });
        // Callbacks only fire while the device is polled.
        self.backend.device().poll(wgpu::PollType::wait_indefinitely())?;
        rx.try_recv().map_err(|_| EngineError::CallbackDropped)
    }

    pub fn record(&self, key: &CacheKey) -> Option<&ComputePipelineRecord> {
        self.pipelines.record(key)
    }

    pub fn compute_data(&self, node: &ComputeNode) -> Option<&ComputeNodeData> {
        self.nodes.get(node.id())
    }

    /// Origin of the buffer currently backing `attribute`, if any.
    pub fn attribute_origin(&self, attribute: &StorageAttribute) -> Option<BufferOrigin> {
        self.backend.attribute(attribute.id()).map(|a| a.origin)
    }
}

impl ExternalHooks for Renderer {
    fn hooks_version(&self) -> u32 {
        HOOKS_VERSION
    }

    fn is_initialized(&self) -> bool {
        self.shared.is_some()
    }

    fn init(&mut self) {
        Renderer::init(self);
    }

    fn adopt_attribute_buffer(&mut self, attribute: &StorageAttribute, buffer: wgpu::Buffer, origin: u64) {
        self.backend.adopt_attribute(attribute, buffer, origin);
    }

    fn materialize_compute(&mut self, node: &ComputeNode) -> &mut ComputeNodeData {
        self.nodes.get_for_compute(node, self.config.workgroup_size)
    }

    fn register_compute_program(&mut self, source: &str, module: wgpu::ShaderModule) {
        log::debug!("registering external program ({} bytes)", source.len());
        self.pipelines.register_program(source, module);
    }

    fn compute_cache_key(&self, node: &ComputeNode, source: &str) -> CacheKey {
        let dispatch = self
            .nodes
            .get(node.id())
            .map(|d| d.dispatch)
            .unwrap_or_else(|| node.dispatch(self.config.workgroup_size));
        CacheKey::for_compute(source, dispatch)
    }

    fn has_pipeline_record(&self, key: &CacheKey) -> bool {
        self.pipelines.record(key).is_some()
    }

    fn insert_pipeline_record(&mut self, record: ComputePipelineRecord) {
        log::debug!("inserting pipeline record {}", record.cache_key);
        self.pipelines.insert_record(record);
    }

    fn override_pipeline(&mut self, key: &CacheKey, pipeline: wgpu::ComputePipeline) -> Result<(), EngineError> {
        if self.pipelines.record(key).is_none() {
            return Err(EngineError::UnknownPipeline { key: *key });
        }
        log::debug!("overriding pipeline {key}");
        self.backend.set_pipeline(*key, pipeline);
        Ok(())
    }

    fn create_bindings(&mut self, node: &ComputeNode, group: u32) -> Result<BindGroupId, EngineError> {
        self.ensure_bindings(node, group)
    }

    fn override_bind_group(
        &mut self,
        id: &BindGroupId,
        group: wgpu::BindGroup,
        layout: wgpu::BindGroupLayout,
    ) -> Result<(), EngineError> {
        let data = self
            .backend
            .bind_group_mut(id)
            .ok_or(EngineError::UnknownBindGroup { id: *id })?;
        log::debug!("overriding bind group {id}");
        data.group = group;
        data.layout = layout;
        data.external = true;
        Ok(())
    }

    fn stats(&self) -> RendererStats {
        let (owned, external) = self.backend.attribute_counts();
        RendererStats {
            owned_attribute_buffers: owned,
            external_attribute_buffers: external,
            pipeline_records: self.pipelines.record_count(),
            programs: self.pipelines.program_count(),
            bind_groups: self.backend.bind_group_count(),
        }
    }
}

fn validated(captured: Option<wgpu::Error>) -> Result<(), EngineError> {
    match captured {
        Some(err) => Err(EngineError::Validation(err.to_string())),
        None => Ok(()),
    }
}
