use crate::buffer::SharedBuffer;
use crate::context::InteropContext;
use crate::error::InteropError;

/// Read the shared buffer back to the host through the graphics runtime.
///
/// This is the verification path used by tests and diagnostics, not part of
/// the per-frame loop (the whole point of the interop pipeline is that
/// frames never take this copy). Requires the buffer to be
/// `AvailableForGraphics`.
pub fn read_colors(ctx: &InteropContext, shared: &SharedBuffer) -> Result<Vec<f32>, InteropError> {
    let source = shared.graphics_binding()?;
    let size_bytes = u64::from(shared.capacity()) * std::mem::size_of::<f32>() as u64;

    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("fieldscope readback staging"),
        size: size_bytes,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fieldscope readback enc"),
        });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size_bytes);
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |v| {
        sender.send(v).ok();
    });
    let _ = ctx.device.poll(wgpu::Maintain::Wait);
    pollster::block_on(receiver.receive())
        .ok_or_else(|| InteropError::Readback("map_async callback dropped".into()))?
        .map_err(|err| InteropError::Readback(format!("map_async failed: {err:?}")))?;

    let data = {
        let mapped = slice.get_mapped_range();
        bytemuck::cast_slice::<u8, f32>(&mapped).to_vec()
    };
    staging.unmap();
    Ok(data)
}
