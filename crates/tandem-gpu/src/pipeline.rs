use std::fmt;

use sha2::{Digest, Sha256};

use crate::compute::ComputeFn;
use crate::layout::{BindGroup, BindGroupLayout};
use crate::resolve::resolve;
use crate::{Root, TypedError};

/// Deterministic identity of a compiled program: SHA-256 over the resolved
/// source and the dispatch shape.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramKey([u8; 32]);

impl ProgramKey {
    pub fn new(source: &str, dispatch: [u32; 3]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        for d in dispatch {
            hasher.update(d.to_le_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Builder returned by [`Root::with_compute`].
pub struct PipelineBuilder<'r, 'l> {
    root: &'r Root,
    function: ComputeFn,
    layouts: Vec<&'l BindGroupLayout>,
}

impl<'r, 'l> PipelineBuilder<'r, 'l> {
    pub(crate) fn new(root: &'r Root, function: ComputeFn) -> Self {
        Self {
            root,
            function,
            layouts: Vec::new(),
        }
    }

    /// Appends `layout` at the next bind-group index.
    pub fn layout(mut self, layout: &'l BindGroupLayout) -> Self {
        self.layouts.push(layout);
        self
    }

    pub fn create(self) -> Result<ComputePipeline, TypedError> {
        let source = resolve(&self.function, &self.layouts)?;
        let device = self.root.device();
        let label = format!("tandem compute `{}`", self.function.name());

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
        });

        let raw_layouts: Vec<wgpu::BindGroupLayout> =
            self.layouts.iter().map(|l| l.unwrap(device).clone()).collect();
        let layout_refs: Vec<&wgpu::BindGroupLayout> = raw_layouts.iter().collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let raw = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&label),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(self.function.name()),
            compilation_options: Default::default(),
            cache: None,
        });

        log::debug!("created {label} ({} bind groups)", raw_layouts.len());

        Ok(ComputePipeline {
            function: self.function.name().to_string(),
            workgroup_size: self.function.size().unwrap_or([1, 1, 1]),
            source,
            module,
            raw,
            layout_names: self.layouts.iter().map(|l| l.name().to_string()).collect(),
            raw_layouts,
            queue: self.root.queue().clone(),
            device: device.clone(),
        })
    }
}

/// A compute pipeline built from a [`ComputeFn`] and its layouts.
pub struct ComputePipeline {
    function: String,
    workgroup_size: [u32; 3],
    source: String,
    module: wgpu::ShaderModule,
    raw: wgpu::ComputePipeline,
    layout_names: Vec<String>,
    raw_layouts: Vec<wgpu::BindGroupLayout>,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl ComputePipeline {
    /// Resolved WGSL the pipeline was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn workgroup_size(&self) -> [u32; 3] {
        self.workgroup_size
    }

    pub fn raw(&self) -> &wgpu::ComputePipeline {
        &self.raw
    }

    fn check_groups(&self, groups: &[&BindGroup]) -> Result<(), TypedError> {
        for (index, expected) in self.layout_names.iter().enumerate() {
            let group = groups.get(index).ok_or_else(|| TypedError::MissingBindGroup {
                function: self.function.clone(),
                group: index as u32,
            })?;
            if group.layout_name() != expected {
                return Err(TypedError::LayoutMismatch {
                    expected: expected.clone(),
                    found: group.layout_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Records and submits a single dispatch with `groups` bound in order.
    pub fn dispatch_workgroups(&self, groups: &[&BindGroup], dispatch: [u32; 3]) -> Result<(), TypedError> {
        self.check_groups(groups)?;

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tandem compute encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&self.function),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.raw);
            for (index, group) in groups.iter().enumerate() {
                pass.set_bind_group(index as u32, group.raw(), &[]);
            }
            let [x, y, z] = dispatch;
            pass.dispatch_workgroups(x, y, z);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Freezes the pipeline with bind group 0 and a dispatch shape into a
    /// [`CompiledProgram`] other systems can execute.
    ///
    /// Only single-group pipelines can be compiled this way.
    pub fn compile(&self, group: &BindGroup, dispatch: [u32; 3]) -> Result<CompiledProgram, TypedError> {
        self.check_groups(&[group])?;
        let layout = self.raw_layouts.first().ok_or_else(|| TypedError::MissingBindGroup {
            function: self.function.clone(),
            group: 0,
        })?;

        let key = ProgramKey::new(&self.source, dispatch);
        log::debug!("compiled `{}` as program {key}", self.function);

        Ok(CompiledProgram {
            source: self.source.clone(),
            module: self.module.clone(),
            pipeline: self.raw.clone(),
            bind_group: group.raw().clone(),
            bind_group_layout: layout.clone(),
            workgroup_size: self.workgroup_size,
            dispatch,
            key,
        })
    }
}

/// Everything needed to run a compute program outside this crate.
///
/// Immutable once produced.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    source: String,
    module: wgpu::ShaderModule,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    bind_group_layout: wgpu::BindGroupLayout,
    workgroup_size: [u32; 3],
    dispatch: [u32; 3],
    key: ProgramKey,
}

impl CompiledProgram {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn workgroup_size(&self) -> [u32; 3] {
        self.workgroup_size
    }

    /// Workgroup counts per dimension.
    pub fn dispatch(&self) -> [u32; 3] {
        self.dispatch
    }

    pub fn key(&self) -> ProgramKey {
        self.key
    }
}
