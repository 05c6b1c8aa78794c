use tandem_engine::render::{ExternalHooks, StorageAttribute, StorageNode};
use tandem_gpu::data::{DataType, Scalar};
use tandem_gpu::{BufferId, TypedBuffer, Usage};

use crate::{Bridge, BridgeError};

/// A typed buffer seen through the renderer.
///
/// The attribute and the typed buffer share one `wgpu::Buffer`.
#[derive(Debug, Clone)]
pub struct AliasedStorage {
    node: StorageNode,
    attribute: StorageAttribute,
    origin: BufferId,
}

impl AliasedStorage {
    /// Storage node for compute graphs.
    pub fn node(&self) -> &StorageNode {
        &self.node
    }

    /// Attribute for geometry binding.
    pub fn attribute(&self) -> &StorageAttribute {
        &self.attribute
    }

    /// The typed buffer the storage aliases.
    pub fn origin(&self) -> BufferId {
        self.origin
    }
}

/// Element count of a schema that can back a storage attribute.
pub(crate) fn storage_element_count(schema: &DataType) -> Result<u32, BridgeError> {
    let element = schema.element_type();
    let supported = match element {
        DataType::Scalar(s) | DataType::Vector { scalar: s, .. } => {
            matches!(s, Scalar::U32 | Scalar::I32 | Scalar::F32)
        }
        DataType::Matrix { .. } | DataType::Array { .. } => false,
    };

    if !supported {
        return Err(BridgeError::UnsupportedElementType { found: element.wgsl() });
    }
    Ok(schema.element_count())
}

impl Bridge {
    /// Makes `descriptor`'s buffer the backing store of a new renderer
    /// attribute. The renderer allocates nothing for it.
    pub fn alias(
        &self,
        descriptor: &TypedBuffer,
        renderer: &mut impl ExternalHooks,
    ) -> Result<AliasedStorage, BridgeError> {
        let count = storage_element_count(descriptor.schema())?;
        if !descriptor.has_usage(Usage::Storage) {
            return Err(BridgeError::MissingUsage {
                buffer: descriptor.id(),
                usage: Usage::Storage,
            });
        }

        let attribute = StorageAttribute::new(count, 4);
        renderer.adopt_attribute_buffer(&attribute, descriptor.raw().clone(), descriptor.id().get());
        log::debug!(
            "aliased buffer {} ({}) as attribute {:?}",
            descriptor.id(),
            descriptor.schema(),
            attribute.id()
        );

        Ok(AliasedStorage {
            node: StorageNode::new(attribute.clone()),
            attribute,
            origin: descriptor.id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tandem_gpu::data as d;

    fn supported_element() -> impl Strategy<Value = DataType> {
        let scalar = prop_oneof![Just(Scalar::U32), Just(Scalar::I32), Just(Scalar::F32)];
        (scalar, 1u8..=4).prop_map(|(s, width)| match width {
            1 => DataType::Scalar(s),
            w => d::vector(s, w),
        })
    }

    fn unsupported_element() -> impl Strategy<Value = DataType> {
        prop_oneof![
            Just(d::f16()),
            Just(d::vec2h()),
            Just(d::vec3h()),
            Just(d::vec4h()),
            Just(d::mat4x4f()),
            (1u32..8).prop_map(|n| d::array_of(d::f32(), n)),
        ]
    }

    proptest! {
        #[test]
        fn supported_arrays_keep_their_count(element in supported_element(), count in 0u32..4096) {
            let schema = d::array_of(element, count);
            prop_assert_eq!(storage_element_count(&schema).unwrap(), count);
        }

        #[test]
        fn bare_elements_count_as_one(element in supported_element()) {
            prop_assert_eq!(storage_element_count(&element).unwrap(), 1);
        }

        #[test]
        fn unsupported_elements_name_the_type(element in unsupported_element(), count in 1u32..64) {
            let expected = element.wgsl();
            let err = storage_element_count(&d::array_of(element, count)).unwrap_err();
            prop_assert!(
                matches!(&err, BridgeError::UnsupportedElementType { found } if *found == expected),
                "unexpected error: {err}"
            );
        }
    }

    #[test]
    fn vec3h_is_rejected() {
        let err = storage_element_count(&d::array_of(d::vec3h(), 24)).unwrap_err();
        assert_eq!(err.to_string(), "element type `vec3h` cannot back a storage attribute");
    }
}
