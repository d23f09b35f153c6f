use std::marker::PhantomData;

use wgpu::util::DeviceExt;

use crate::context::InteropContext;

/// Numeric element types the transform can read from a device field.
///
/// The colormap must be defined for the element's WGSL scalar type; the
/// scalar name is substituted into the transform shader source.
pub trait FieldElement: bytemuck::Pod {
    const WGSL_SCALAR: &'static str;
}

impl FieldElement for f32 {
    const WGSL_SCALAR: &'static str = "f32";
}

impl FieldElement for u32 {
    const WGSL_SCALAR: &'static str = "u32";
}

impl FieldElement for i32 {
    const WGSL_SCALAR: &'static str = "i32";
}

/// An owned device-resident numeric array, the source data of a draw.
///
/// In the intended setup the field is produced on the GPU by the simulation
/// driving the viewer; this type also lets a host-side producer upload and
/// refresh one.
pub struct DeviceField<T: FieldElement> {
    buffer: wgpu::Buffer,
    len: u32,
    _marker: PhantomData<T>,
}

impl<T: FieldElement> DeviceField<T> {
    /// Upload `data` into a fresh storage buffer.
    pub fn from_slice(ctx: &InteropContext, label: &str, data: &[T]) -> Self {
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            });
        Self {
            buffer,
            len: data.len() as u32,
            _marker: PhantomData,
        }
    }

    /// Overwrite the field in place. `data` must have the same length the
    /// field was created with.
    pub fn write(&self, ctx: &InteropContext, data: &[T]) {
        debug_assert_eq!(data.len() as u32, self.len, "field length is fixed at creation");
        ctx.queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn view(&self) -> FieldView<'_, T> {
        FieldView {
            buffer: &self.buffer,
            len: self.len,
            _marker: PhantomData,
        }
    }
}

/// A read-only reference to a device-resident numeric array plus its
/// declared element count.
///
/// The producing collaborator guarantees the count equals width × height
/// before a draw call.
#[derive(Clone, Copy)]
pub struct FieldView<'a, T: FieldElement> {
    pub(crate) buffer: &'a wgpu::Buffer,
    pub(crate) len: u32,
    _marker: PhantomData<T>,
}

impl<'a, T: FieldElement> FieldView<'a, T> {
    /// View over a caller-managed storage buffer holding `len` elements of
    /// `T`. The buffer must carry `STORAGE` usage.
    pub fn from_raw(buffer: &'a wgpu::Buffer, len: u32) -> Self {
        Self {
            buffer,
            len,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
