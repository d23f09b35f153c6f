use fieldscope_interop::{
    allocate, color_elements, release, InteropContext, InteropError, RegistrationId, SharedBuffer,
};

struct BoundBuffer {
    shared: SharedBuffer,
    width: u32,
    height: u32,
}

/// Owns the shared buffer's lifecycle across dimension changes.
///
/// Two states: `Uninitialized` (no buffer) and `Bound(width, height)`. A
/// draw with the bound dimensions reuses the buffer (handle identity
/// preserved); a draw with different dimensions fully releases the old
/// buffer before a new one is created. If reallocation itself fails the
/// manager re-enters `Uninitialized`; the old handle is already gone, so
/// nothing leaks, and the next draw retries allocation.
///
/// Window resize events do not reach this type; reallocation is driven only
/// by the dimensions declared at each draw call.
#[derive(Default)]
pub struct SurfaceManager {
    bound: Option<BoundBuffer>,
}

impl SurfaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded dimensions, `None` while `Uninitialized`.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.bound.as_ref().map(|b| (b.width, b.height))
    }

    /// Registration handle of the bound buffer, `None` while
    /// `Uninitialized`.
    pub fn registration(&self) -> Option<RegistrationId> {
        self.bound.as_ref().map(|b| b.shared.registration())
    }

    /// Return the buffer for (width, height), reallocating on a dimension
    /// change.
    pub fn ensure<'a>(
        &'a mut self,
        ctx: &mut InteropContext,
        width: u32,
        height: u32,
    ) -> Result<&'a mut SharedBuffer, InteropError> {
        let reuse = matches!(&self.bound, Some(b) if b.width == width && b.height == height);
        if !reuse {
            if let Some(old) = self.bound.take() {
                tracing::debug!(
                    from = ?(old.width, old.height),
                    to = ?(width, height),
                    "surface dimensions changed, reallocating shared buffer"
                );
                release(ctx, old.shared)?;
            }
            let shared = allocate(ctx, color_elements(width, height))?;
            self.bound = Some(BoundBuffer {
                shared,
                width,
                height,
            });
        }

        let bound = self
            .bound
            .as_mut()
            .expect("a buffer is bound on every non-error path above");
        Ok(&mut bound.shared)
    }

    /// Release the bound buffer, if any, re-entering `Uninitialized`.
    pub fn release(&mut self, ctx: &mut InteropContext) -> Result<(), InteropError> {
        if let Some(old) = self.bound.take() {
            release(ctx, old.shared)?;
        }
        Ok(())
    }
}
