//! GPU-side state of renderer objects.
//!
//! Attribute buffers, compute pipelines and bind groups live here, keyed by
//! the identity of the object that owns them. Nothing in this module decides
//! *when* to build; it only stores, allocates on request and reports.

use std::collections::HashMap;

use super::attribute::{AttributeId, StorageAttribute};
use super::nodes::BindGroupId;
use super::pipelines::CacheKey;

/// Who allocated an attribute's buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferOrigin {
    /// Allocated by the renderer; destroyed when replaced.
    Owned,
    /// Adopted from another system, tagged with that system's buffer id.
    External(u64),
}

#[derive(Debug)]
pub(crate) struct AttributeData {
    pub buffer: wgpu::Buffer,
    pub origin: BufferOrigin,
    /// Bumped whenever the buffer is replaced.
    pub generation: u64,
}

#[derive(Debug)]
pub(crate) struct BindGroupData {
    pub group: wgpu::BindGroup,
    pub layout: wgpu::BindGroupLayout,
    /// Attribute generations captured at creation.
    pub generations: Vec<u64>,
    /// Installed from outside; never rebuilt by the renderer.
    pub external: bool,
}

#[derive(Debug)]
pub(crate) struct Backend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    attributes: HashMap<AttributeId, AttributeData>,
    pipelines: HashMap<CacheKey, wgpu::ComputePipeline>,
    bind_groups: HashMap<BindGroupId, BindGroupData>,
    next_generation: u64,
}

impl Backend {
    pub(crate) fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            attributes: HashMap::new(),
            pipelines: HashMap::new(),
            bind_groups: HashMap::new(),
            next_generation: 1,
        }
    }

    pub(crate) fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub(crate) fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn bump_generation(&mut self) -> u64 {
        let g = self.next_generation;
        self.next_generation += 1;
        g
    }

    // ── attributes ──────────────────────────────────────────────────────

    pub(crate) fn attribute(&self, id: AttributeId) -> Option<&AttributeData> {
        self.attributes.get(&id)
    }

    /// Returns the attribute's buffer, allocating a zeroed renderer-owned one
    /// if none exists. Existing buffers, owned or adopted, are never replaced.
    pub(crate) fn ensure_attribute(&mut self, attribute: &StorageAttribute) -> &AttributeData {
        if !self.attributes.contains_key(&attribute.id()) {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tandem storage attribute"),
                size: attribute.byte_size().max(wgpu::COPY_BUFFER_ALIGNMENT),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            });
            log::debug!(
                "allocated {} bytes for attribute {:?}",
                buffer.size(),
                attribute.id()
            );
            let generation = self.bump_generation();
            self.attributes.insert(
                attribute.id(),
                AttributeData {
                    buffer,
                    origin: BufferOrigin::Owned,
                    generation,
                },
            );
        }

        &self.attributes[&attribute.id()]
    }

    /// Installs `buffer` as the attribute's backing store.
    ///
    /// A previous renderer-owned buffer is destroyed here; a previous external
    /// buffer is released to its owner.
    pub(crate) fn adopt_attribute(&mut self, attribute: &StorageAttribute, buffer: wgpu::Buffer, origin: u64) {
        let generation = self.bump_generation();
        let previous = self.attributes.insert(
            attribute.id(),
            AttributeData {
                buffer,
                origin: BufferOrigin::External(origin),
                generation,
            },
        );

        match previous {
            Some(AttributeData { buffer, origin: BufferOrigin::Owned, .. }) => {
                log::warn!(
                    "attribute {:?} already had a renderer-owned buffer; destroying it",
                    attribute.id()
                );
                buffer.destroy();
            }
            Some(AttributeData { origin: BufferOrigin::External(old), .. }) if old != origin => {
                log::debug!("attribute {:?} switched external buffer #{old} -> #{origin}", attribute.id());
            }
            _ => log::debug!("attribute {:?} adopted external buffer #{origin}", attribute.id()),
        }
    }

    // ── pipelines ───────────────────────────────────────────────────────

    pub(crate) fn pipeline(&self, key: &CacheKey) -> Option<&wgpu::ComputePipeline> {
        self.pipelines.get(key)
    }

    pub(crate) fn set_pipeline(&mut self, key: CacheKey, pipeline: wgpu::ComputePipeline) {
        self.pipelines.insert(key, pipeline);
    }

    // ── bind groups ─────────────────────────────────────────────────────

    pub(crate) fn bind_group(&self, id: &BindGroupId) -> Option<&BindGroupData> {
        self.bind_groups.get(id)
    }

    pub(crate) fn bind_group_mut(&mut self, id: &BindGroupId) -> Option<&mut BindGroupData> {
        self.bind_groups.get_mut(id)
    }

    pub(crate) fn set_bind_group(&mut self, id: BindGroupId, data: BindGroupData) {
        self.bind_groups.insert(id, data);
    }

    // ── stats ───────────────────────────────────────────────────────────

    pub(crate) fn attribute_counts(&self) -> (usize, usize) {
        self.attributes
            .values()
            .fold((0, 0), |(owned, external), a| match a.origin {
                BufferOrigin::Owned => (owned + 1, external),
                BufferOrigin::External(_) => (owned, external + 1),
            })
    }

    pub(crate) fn bind_group_count(&self) -> usize {
        self.bind_groups.len()
    }
}
