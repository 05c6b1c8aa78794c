//! Typed bind-group layouts and bind groups.
//!
//! Entries are named; binding slots follow declaration order. The same layout
//! value produces both the WGSL declarations used by [`crate::resolve`] and the
//! `wgpu::BindGroupLayout` used by pipelines and bind groups, so the two cannot
//! drift apart.

use std::sync::OnceLock;

use crate::buffer::{BufferId, TypedBuffer, Usage};
use crate::data::{DataType, Scalar};
use crate::TypedError;

/// Shader access mode for storage entries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Access {
    ReadOnly,
    Mutable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEntry {
    Storage { schema: DataType, access: Access },
    Uniform { schema: DataType },
}

impl LayoutEntry {
    pub fn schema(&self) -> &DataType {
        match self {
            LayoutEntry::Storage { schema, .. } | LayoutEntry::Uniform { schema } => schema,
        }
    }

    /// Usage a buffer must carry to be bound to this entry.
    pub fn required_usage(&self) -> Usage {
        match self {
            LayoutEntry::Storage { .. } => Usage::Storage,
            LayoutEntry::Uniform { .. } => Usage::Uniform,
        }
    }

    fn binding_type(&self) -> wgpu::BindingType {
        let ty = match self {
            LayoutEntry::Storage { access, .. } => wgpu::BufferBindingType::Storage {
                read_only: *access == Access::ReadOnly,
            },
            LayoutEntry::Uniform { .. } => wgpu::BufferBindingType::Uniform,
        };
        wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(self.schema().size()),
        }
    }

    fn address_space(&self) -> &'static str {
        match self {
            LayoutEntry::Storage { access: Access::ReadOnly, .. } => "storage, read",
            LayoutEntry::Storage { access: Access::Mutable, .. } => "storage, read_write",
            LayoutEntry::Uniform { .. } => "uniform",
        }
    }
}

/// Named, ordered set of buffer bindings for one bind group.
#[derive(Debug)]
pub struct BindGroupLayout {
    name: String,
    entries: Vec<(String, LayoutEntry)>,
    raw: OnceLock<wgpu::BindGroupLayout>,
}

impl BindGroupLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            raw: OnceLock::new(),
        }
    }

    pub fn storage(self, name: impl Into<String>, schema: DataType, access: Access) -> Self {
        self.entry(name, LayoutEntry::Storage { schema, access })
    }

    pub fn uniform(self, name: impl Into<String>, schema: DataType) -> Self {
        self.entry(name, LayoutEntry::Uniform { schema })
    }

    fn entry(mut self, name: impl Into<String>, entry: LayoutEntry) -> Self {
        let name = name.into();
        debug_assert!(
            self.entries.iter().all(|(n, _)| *n != name),
            "duplicate layout entry `{name}`"
        );
        self.entries.push((name, entry));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries with their binding slots.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &str, &LayoutEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, (name, entry))| (i as u32, name.as_str(), entry))
    }

    pub fn binding_of(&self, name: &str) -> Option<u32> {
        self.entries.iter().position(|(n, _)| n == name).map(|i| i as u32)
    }

    /// Whether any entry needs the `f16` extension.
    pub(crate) fn uses_f16(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, e)| e.schema().element_type().scalar() == Some(Scalar::F16))
    }

    /// WGSL module-scope declarations for this layout bound at `group`.
    pub fn declarations(&self, group: u32) -> String {
        self.entries()
            .map(|(binding, name, entry)| {
                format!(
                    "@group({group}) @binding({binding}) var<{}> {name}: {};\n",
                    entry.address_space(),
                    entry.schema().wgsl()
                )
            })
            .collect()
    }

    /// Returns the wgpu layout, creating it on first use.
    pub fn unwrap(&self, device: &wgpu::Device) -> &wgpu::BindGroupLayout {
        self.raw.get_or_init(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = self
                .entries()
                .map(|(binding, _, entry)| wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: entry.binding_type(),
                    count: None,
                })
                .collect();

            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&self.name),
                entries: &entries,
            })
        })
    }

    /// Checks `resources` against the layout and returns them in binding order.
    pub(crate) fn match_resources<'b>(
        &self,
        resources: &[(&str, &'b TypedBuffer)],
    ) -> Result<Vec<&'b TypedBuffer>, TypedError> {
        if let Some((name, _)) = resources.iter().find(|(n, _)| self.binding_of(n).is_none()) {
            return Err(TypedError::UnknownEntry {
                layout: self.name.clone(),
                name: name.to_string(),
            });
        }

        self.entries
            .iter()
            .map(|(name, entry)| {
                let buffer = resources
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, b)| *b)
                    .ok_or_else(|| TypedError::MissingEntry {
                        layout: self.name.clone(),
                        name: name.clone(),
                    })?;

                if buffer.schema() != entry.schema() {
                    return Err(TypedError::SchemaMismatch {
                        layout: self.name.clone(),
                        name: name.clone(),
                        expected: entry.schema().wgsl(),
                        found: buffer.schema().wgsl(),
                    });
                }

                let usage = entry.required_usage();
                if !buffer.has_usage(usage) {
                    return Err(TypedError::MissingUsage { buffer: buffer.id(), usage });
                }

                Ok(buffer)
            })
            .collect()
    }
}

/// Resources bound against a [`BindGroupLayout`].
#[derive(Debug)]
pub struct BindGroup {
    layout_name: String,
    raw: wgpu::BindGroup,
    buffers: Vec<(String, BufferId)>,
}

impl BindGroup {
    pub(crate) fn new(layout: &BindGroupLayout, raw: wgpu::BindGroup, bound: &[&TypedBuffer]) -> Self {
        let buffers = layout
            .entries
            .iter()
            .zip(bound)
            .map(|((name, _), b)| (name.clone(), b.id()))
            .collect();
        Self {
            layout_name: layout.name.clone(),
            raw,
            buffers,
        }
    }

    pub fn layout_name(&self) -> &str {
        &self.layout_name
    }

    pub fn raw(&self) -> &wgpu::BindGroup {
        &self.raw
    }

    /// Id of the buffer bound to entry `name`.
    pub fn buffer_for(&self, name: &str) -> Option<BufferId> {
        self.buffers.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
    }
}
