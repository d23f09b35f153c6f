//! `fieldscope-interop` binds a compute-written color buffer to the
//! presentation path without a device-to-host copy.
//!
//! This crate provides:
//! - A [`SharedBuffer`] owned by exactly one side at a time, with explicit
//!   map/unmap transitions.
//! - Allocation + cross-runtime registration with leak accounting (see
//!   [`allocate`] and [`InteropRegistry`]).
//! - The per-frame element-wise colormap transform from a device-resident
//!   field into the shared buffer (see [`transform::write_colors`]).
//! - A staging readback path used by tests and diagnostics (see
//!   [`read_colors`]).

mod alloc;
mod buffer;
mod colormap;
mod context;
mod error;
mod field;
mod readback;
mod registry;

pub mod transform;

pub use alloc::{allocate, color_elements, release};
pub use buffer::{BufferState, SharedBuffer};
pub use colormap::ColorMap;
pub use context::InteropContext;
pub use error::InteropError;
pub use field::{DeviceField, FieldElement, FieldView};
pub use readback::read_colors;
pub use registry::{InteropRegistry, RegistrationId, RegistryStats};
