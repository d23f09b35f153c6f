use thiserror::Error;

use crate::buffer::BufferState;

/// Failures of the interop pipeline: allocation, registration, mapping,
/// transform, or readback.
///
/// Each variant is raised at the specific call site that detected it and is
/// non-recoverable for the current frame. There is no retry policy here; the
/// caller may retry a whole frame.
#[derive(Debug, Error)]
pub enum InteropError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("shared buffer creation failed: {0}")]
    BufferCreation(wgpu::Error),

    #[error("interop registration failed: {0}")]
    Registration(String),

    #[error("registration {0:?} is not live")]
    UnknownRegistration(crate::registry::RegistrationId),

    #[error("shared buffer is {actual:?}, expected {expected:?}")]
    WrongState {
        expected: BufferState,
        actual: BufferState,
    },

    #[error("transform pipeline build failed: {0}")]
    PipelineBuild(wgpu::Error),

    #[error("field length {field_len} does not match buffer capacity {capacity} (3 elements per pixel)")]
    SizeMismatch { field_len: u32, capacity: u32 },

    #[error("readback failed: {0}")]
    Readback(String),
}
