use crate::buffer::SharedBuffer;
use crate::context::InteropContext;
use crate::error::InteropError;

/// Element count of the shared color buffer for a width × height field:
/// one f32 RGB triple per pixel.
pub fn color_elements(width: u32, height: u32) -> u32 {
    3 * width * height
}

/// Allocate a shared color buffer of `element_count` f32 elements and
/// register it for cross-runtime access.
///
/// The buffer is written every frame by the compute transform and consumed
/// by the presentation pass, so it carries `STORAGE | COPY_SRC` usage
/// (`COPY_SRC` feeds the readback path). Creation failures are captured via
/// device error scopes; on registration failure the already-created buffer
/// is released before returning, so ownership never leaks.
pub fn allocate(
    ctx: &mut InteropContext,
    element_count: u32,
) -> Result<SharedBuffer, InteropError> {
    let size_bytes = u64::from(element_count) * std::mem::size_of::<f32>() as u64;

    ctx.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let raw = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("fieldscope shared color buffer"),
        size: size_bytes,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let _ = ctx.device.poll(wgpu::Maintain::Wait);
    let validation = pollster::block_on(ctx.device.pop_error_scope());
    let oom = pollster::block_on(ctx.device.pop_error_scope());
    if let Some(err) = validation.or(oom) {
        raw.destroy();
        tracing::warn!(element_count, %err, "shared buffer creation failed");
        return Err(InteropError::BufferCreation(err));
    }

    let registration = match ctx.registry.register(size_bytes) {
        Ok(id) => id,
        Err(err) => {
            // Registration failed after the graphics buffer was created;
            // ownership transfers back here, so release it before bailing.
            raw.destroy();
            return Err(err);
        }
    };

    tracing::debug!(
        id = ?registration,
        element_count,
        size_bytes,
        "shared buffer allocated"
    );
    Ok(SharedBuffer::new(raw, registration, element_count))
}

/// Unregister and free a shared buffer.
pub fn release(ctx: &mut InteropContext, shared: SharedBuffer) -> Result<(), InteropError> {
    let id = shared.registration();
    ctx.registry.unregister(id)?;
    shared.destroy();
    tracing::debug!(?id, "shared buffer released");
    Ok(())
}
