use crate::buffer::{BufferBuilder, TypedBuffer};
use crate::compute::ComputeFn;
use crate::data::DataType;
use crate::layout::{BindGroup, BindGroupLayout};
use crate::pipeline::PipelineBuilder;
use crate::TypedError;

/// Entry point of the typed layer: a device and queue plus factories for
/// buffers, bind groups and pipelines.
///
/// `Root` can own a headless device ([`Root::init`]) or share one created
/// elsewhere ([`Root::from_device`]); handles are reference counted by wgpu.
#[derive(Debug, Clone)]
pub struct Root {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Root {
    /// Acquires a headless device with downlevel limits.
    pub async fn init() -> Result<Self, TypedError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("tandem-gpu adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tandem-gpu device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self { device, queue })
    }

    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn create_buffer(&self, schema: DataType) -> BufferBuilder<'_> {
        BufferBuilder::new(self, schema)
    }

    /// Binds named buffers against `layout`.
    ///
    /// Every layout entry needs exactly one resource with a matching schema and
    /// the usage the entry requires.
    pub fn create_bind_group(
        &self,
        layout: &BindGroupLayout,
        resources: &[(&str, &TypedBuffer)],
    ) -> Result<BindGroup, TypedError> {
        let bound = layout.match_resources(resources)?;

        let entries: Vec<wgpu::BindGroupEntry> = bound
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.raw().as_entire_binding(),
            })
            .collect();

        let raw = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(layout.name()),
            layout: layout.unwrap(&self.device),
            entries: &entries,
        });

        Ok(BindGroup::new(layout, raw, &bound))
    }

    pub fn with_compute<'l>(&self, function: ComputeFn) -> PipelineBuilder<'_, 'l> {
        PipelineBuilder::new(self, function)
    }
}
