use thiserror::Error;

/// Windowing/context bring-up failures. Construction does not proceed to a
/// usable viewer when any of these occur.
#[derive(Debug, Error)]
pub enum WindowInitError {
    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no GPU adapter is compatible with the window surface")]
    AdapterNotFound,

    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Top-level error surface of the viewer.
///
/// Interop failures (allocation, registration, mapping, transform, and the
/// debug-only size mismatch) pass through unchanged so callers can match on
/// the specific cause.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("window init: {0}")]
    WindowInit(#[from] WindowInitError),

    #[error(transparent)]
    Interop(#[from] fieldscope_interop::InteropError),
}
