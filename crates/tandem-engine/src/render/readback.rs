use std::sync::mpsc;

use super::error::EngineError;

/// Copies `size` bytes of `src` into a staging buffer and maps them.
pub(crate) fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<u8>, EngineError> {
    let copy_size = size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT).min(src.size());
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("tandem attribute readback"),
        size: copy_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("tandem readback encoder"),
    });
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, copy_size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });

    device.poll(wgpu::PollType::wait_indefinitely())?;
    rx.recv().map_err(|_| EngineError::CallbackDropped)??;

    let mut bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    bytes.truncate(size as usize);
    Ok(bytes)
}
