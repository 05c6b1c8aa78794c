use tandem_gpu::data as d;
use tandem_gpu::{Root, TypedBuffer, Usage};

use crate::BridgeError;

/// Per-frame `u32` counter mirrored into a storage buffer.
///
/// Wraps at `u32::MAX`.
pub struct FrameCounter {
    value: u32,
    buffer: TypedBuffer,
}

impl FrameCounter {
    pub fn new(root: &Root) -> Result<Self, BridgeError> {
        Self::starting_at(root, 0)
    }

    /// Counter whose buffer initially holds `value`.
    pub fn starting_at(root: &Root, value: u32) -> Result<Self, BridgeError> {
        let buffer = root
            .create_buffer(d::u32())
            .label("tandem frame counter")
            .usage(Usage::Storage)
            .initial(&[value])
            .create()?;
        Ok(Self { value, buffer })
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn buffer(&self) -> &TypedBuffer {
        &self.buffer
    }

    /// Increments and queues the upload. Returns the new value.
    pub fn tick(&mut self) -> Result<u32, BridgeError> {
        self.value = self.value.wrapping_add(1);
        self.buffer.write(&[self.value])?;
        Ok(self.value)
    }
}
