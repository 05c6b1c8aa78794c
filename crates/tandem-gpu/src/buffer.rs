use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use crate::data::DataType;
use crate::readback::read_buffer;
use crate::{Root, TypedError};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`TypedBuffer`].
///
/// Identity survives cloning of the underlying `wgpu::Buffer` handle, so other
/// systems can record which typed buffer a raw handle came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Declared usage of a typed buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Usage {
    Storage,
    Vertex,
    Uniform,
}

impl Usage {
    fn flags(self) -> wgpu::BufferUsages {
        match self {
            Usage::Storage => wgpu::BufferUsages::STORAGE,
            Usage::Vertex => wgpu::BufferUsages::VERTEX,
            Usage::Uniform => wgpu::BufferUsages::UNIFORM,
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Usage::Storage => "storage",
            Usage::Vertex => "vertex",
            Usage::Uniform => "uniform",
        })
    }
}

/// Schema-tagged GPU buffer.
///
/// Owns the allocation. Other systems may hold clones of [`raw`](Self::raw) but
/// must not destroy it; the allocation is released when the last handle drops.
pub struct TypedBuffer {
    id: BufferId,
    label: String,
    schema: DataType,
    usages: Vec<Usage>,
    raw: wgpu::Buffer,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl TypedBuffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn schema(&self) -> &DataType {
        &self.schema
    }

    pub fn usages(&self) -> &[Usage] {
        &self.usages
    }

    pub fn has_usage(&self, usage: Usage) -> bool {
        self.usages.contains(&usage)
    }

    /// Underlying wgpu handle.
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.raw
    }

    /// Allocation size in bytes (schema size rounded up to the copy alignment).
    pub fn size(&self) -> u64 {
        self.raw.size()
    }

    pub fn element_count(&self) -> u32 {
        self.schema.element_count()
    }

    /// Writes raw bytes at `offset` through the queue.
    ///
    /// Offset and length must be multiples of `wgpu::COPY_BUFFER_ALIGNMENT`.
    pub fn write_bytes(&self, offset: u64, bytes: &[u8]) -> Result<(), TypedError> {
        let len = bytes.len() as u64;
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || len % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(TypedError::UnalignedWrite { buffer: self.id, offset, len });
        }
        if offset.saturating_add(len) > self.size() {
            return Err(TypedError::WriteOutOfBounds {
                buffer: self.id,
                offset,
                len,
                size: self.size(),
            });
        }
        self.queue.write_buffer(&self.raw, offset, bytes);
        Ok(())
    }

    /// Writes a slice of plain values starting at offset zero.
    pub fn write<T: Pod>(&self, data: &[T]) -> Result<(), TypedError> {
        self.write_bytes(0, bytemuck::cast_slice(data))
    }

    /// Copies the buffer contents back to the host. Blocks until the copy completes.
    pub fn read(&self) -> Result<Vec<u8>, TypedError> {
        let mut bytes = read_buffer(&self.device, &self.queue, &self.raw)?;
        bytes.truncate(self.schema.size() as usize);
        Ok(bytes)
    }

    /// Reads the contents as a vector of plain values.
    pub fn read_as<T: Pod>(&self) -> Result<Vec<T>, TypedError> {
        Ok(bytemuck::pod_collect_to_vec(&self.read()?))
    }
}

impl fmt::Debug for TypedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedBuffer")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("schema", &self.schema.wgsl())
            .field("usages", &self.usages)
            .finish()
    }
}

/// Builder returned by [`Root::create_buffer`].
pub struct BufferBuilder<'r> {
    root: &'r Root,
    schema: DataType,
    label: Option<String>,
    usages: Vec<Usage>,
    initial: Option<Vec<u8>>,
}

impl<'r> BufferBuilder<'r> {
    pub(crate) fn new(root: &'r Root, schema: DataType) -> Self {
        Self {
            root,
            schema,
            label: None,
            usages: Vec::new(),
            initial: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a usage. Copy source/destination are always included.
    pub fn usage(mut self, usage: Usage) -> Self {
        if !self.usages.contains(&usage) {
            self.usages.push(usage);
        }
        self
    }

    pub fn usages(self, usages: impl IntoIterator<Item = Usage>) -> Self {
        usages.into_iter().fold(self, Self::usage)
    }

    /// Initial contents, mapped at creation. Must match the schema size exactly.
    pub fn initial<T: Pod>(mut self, data: &[T]) -> Self {
        self.initial = Some(bytemuck::cast_slice(data).to_vec());
        self
    }

    pub fn create(self) -> Result<TypedBuffer, TypedError> {
        let id = BufferId::next();
        let label = self
            .label
            .unwrap_or_else(|| format!("tandem buffer {id} ({})", self.schema));
        let usage = self
            .usages
            .iter()
            .fold(wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC, |acc, u| {
                acc | u.flags()
            });
        let device = self.root.device();

        let raw = match self.initial {
            Some(contents) => {
                let size = self.schema.size();
                if contents.len() as u64 != size {
                    return Err(TypedError::InitialDataSize {
                        schema: self.schema.wgsl(),
                        len: contents.len() as u64,
                        size,
                    });
                }
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&label),
                    contents: &contents,
                    usage,
                })
            }
            None => device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&label),
                size: self.schema.size().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
                usage,
                mapped_at_creation: false,
            }),
        };

        log::debug!("created {label} ({} bytes, {:?})", raw.size(), self.usages);

        Ok(TypedBuffer {
            id,
            label,
            schema: self.schema,
            usages: self.usages,
            raw,
            device: device.clone(),
            queue: self.root.queue().clone(),
        })
    }
}
