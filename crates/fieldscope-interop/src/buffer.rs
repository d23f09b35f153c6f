use crate::error::InteropError;
use crate::registry::RegistrationId;

/// Which side currently owns the shared buffer.
///
/// The buffer is aliased by two consumers of one physical allocation; at any
/// instant exactly one of them may touch it. Transitions are explicit:
/// [`SharedBuffer::map_for_compute`] and [`SharedBuffer::unmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    MappedForCompute,
    AvailableForGraphics,
}

/// A single allocation visible to both the compute and graphics passes.
///
/// Holds 3 × width × height `f32` elements, one RGB triple per pixel. The
/// wrapped `wgpu::Buffer` is private; the only way to reach it is through
/// the state transitions below, so a caller cannot bind it for one side
/// while the other still owns it.
pub struct SharedBuffer {
    raw: wgpu::Buffer,
    registration: RegistrationId,
    capacity: u32,
    state: BufferState,
}

impl SharedBuffer {
    pub(crate) fn new(raw: wgpu::Buffer, registration: RegistrationId, capacity: u32) -> Self {
        Self {
            raw,
            registration,
            capacity,
            state: BufferState::AvailableForGraphics,
        }
    }

    /// Element capacity (f32 count = 3 × width × height).
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn registration(&self) -> RegistrationId {
        self.registration
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Transition to `MappedForCompute` and hand out the compute-side
    /// binding. Queue submission ordering guarantees pending graphics reads
    /// of this buffer complete before the transform executes.
    pub(crate) fn map_for_compute(&mut self) -> Result<&wgpu::Buffer, InteropError> {
        if self.state != BufferState::AvailableForGraphics {
            return Err(InteropError::WrongState {
                expected: BufferState::AvailableForGraphics,
                actual: self.state,
            });
        }
        self.state = BufferState::MappedForCompute;
        Ok(&self.raw)
    }

    /// Return ownership to the graphics side.
    ///
    /// Must be called on every exit path of the transform, including
    /// failures after a successful map; a buffer left in
    /// `MappedForCompute` would wedge every later frame.
    pub(crate) fn unmap(&mut self) {
        self.state = BufferState::AvailableForGraphics;
    }

    /// Graphics-side binding; only legal while no compute write is mapped.
    ///
    /// This is the presentation pass's access path. It hands out the buffer
    /// for reading only; the compute side goes through
    /// [`Self::map_for_compute`].
    pub fn graphics_binding(&self) -> Result<&wgpu::Buffer, InteropError> {
        if self.state != BufferState::AvailableForGraphics {
            return Err(InteropError::WrongState {
                expected: BufferState::AvailableForGraphics,
                actual: self.state,
            });
        }
        Ok(&self.raw)
    }

    /// Tear down the graphics allocation. Consumes the value; the
    /// registration must already have been dropped by the caller.
    pub(crate) fn destroy(self) {
        self.raw.destroy();
    }
}
