//! `fieldscope-viewer` renders a GPU-resident numeric field to an on-screen
//! window through the `fieldscope-interop` shared-buffer pipeline.
//!
//! The windowing runtime is an external collaborator: the caller owns the
//! `winit` event loop and window, constructs a [`Viewer`] from it, forwards
//! resize events to [`Viewer::handle_resize`], and calls [`Viewer::draw`]
//! once per frame.

mod error;
mod present;
mod surface;
mod viewer;

pub use error::{ViewerError, WindowInitError};
pub use present::PresentOutcome;
pub use surface::SurfaceManager;
pub use viewer::{Viewer, ViewerConfig, ViewerStats};
