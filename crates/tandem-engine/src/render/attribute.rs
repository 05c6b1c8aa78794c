use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ATTRIBUTE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct AttributeId(u64);

impl AttributeId {
    fn next() -> Self {
        Self(NEXT_ATTRIBUTE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A GPU-resident attribute usable as compute storage and as vertex data.
///
/// The attribute is only a description; its buffer lives in the renderer
/// backend, allocated on first use unless an external buffer was adopted
/// first. Handles are cheap to clone and compare by identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageAttribute {
    id: AttributeId,
    count: u32,
    item_size: u32,
}

impl StorageAttribute {
    /// Components per element are always `f32`.
    pub const COMPONENT_SIZE: u64 = 4;

    pub fn new(count: u32, item_size: u32) -> Self {
        debug_assert!((1..=4).contains(&item_size), "item size must be 1..=4");
        Self {
            id: AttributeId::next(),
            count,
            item_size,
        }
    }

    pub fn id(&self) -> AttributeId {
        self.id
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    /// Bytes between consecutive elements.
    pub fn stride(&self) -> u64 {
        u64::from(self.item_size) * Self::COMPONENT_SIZE
    }

    /// Bytes a renderer-owned allocation for this attribute occupies.
    pub fn byte_size(&self) -> u64 {
        u64::from(self.count) * self.stride()
    }

    /// WGSL element type used when the attribute is bound as storage.
    pub fn wgsl_element(&self) -> &'static str {
        match self.item_size {
            1 => "f32",
            2 => "vec2<f32>",
            3 => "vec3<f32>",
            _ => "vec4<f32>",
        }
    }
}

/// Compute-graph handle over a [`StorageAttribute`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageNode {
    attribute: StorageAttribute,
}

impl StorageNode {
    pub fn new(attribute: StorageAttribute) -> Self {
        Self { attribute }
    }

    pub fn attribute(&self) -> &StorageAttribute {
        &self.attribute
    }

    pub fn count(&self) -> u32 {
        self.attribute.count
    }
}

impl From<&StorageAttribute> for StorageNode {
    fn from(attribute: &StorageAttribute) -> Self {
        Self::new(attribute.clone())
    }
}
