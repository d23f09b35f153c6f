use std::collections::HashMap;

use crate::error::InteropError;

/// Stable identity for one shared-buffer registration.
///
/// Handle equality across frames is the observable for the no-reallocation
/// property: a draw that reuses the bound buffer reports the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

#[derive(Debug, Clone, Copy)]
struct RegisteredBuffer {
    size_bytes: u64,
    /// The compute producer overwrites the whole buffer every frame; prior
    /// contents never need to survive a map.
    write_discard: bool,
}

/// Counters for allocation/release accounting.
///
/// `allocations == releases` (and `live == 0`) after teardown is the
/// leak-freedom property the lifecycle owner asserts in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub allocations: u64,
    pub releases: u64,
    pub live: usize,
}

/// Table of live cross-runtime registrations.
///
/// Informing both consumers that a buffer is shared is bookkeeping on this
/// side of the API: both passes run on the same `wgpu::Device`, so a
/// registration is an entry here plus the usage flags chosen at allocation.
/// The table still enforces the lifecycle duties: a buffer may be mapped or
/// presented only while its registration is live, and teardown must release
/// every entry.
#[derive(Debug, Default)]
pub struct InteropRegistry {
    next_id: u64,
    entries: HashMap<RegistrationId, RegisteredBuffer>,
    released: u64,
}

impl InteropRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buffer for shared compute/graphics access under a
    /// write-discard policy.
    pub fn register(&mut self, size_bytes: u64) -> Result<RegistrationId, InteropError> {
        if size_bytes == 0 {
            return Err(InteropError::Registration(
                "registered buffer must be non-empty".into(),
            ));
        }

        self.next_id += 1;
        let id = RegistrationId(self.next_id);
        self.entries.insert(
            id,
            RegisteredBuffer {
                size_bytes,
                write_discard: true,
            },
        );
        tracing::debug!(id = id.0, size_bytes, "interop registration");
        Ok(id)
    }

    /// Drop a live registration. Unknown ids are an error: a double release
    /// means the caller's ownership accounting is already broken.
    pub fn unregister(&mut self, id: RegistrationId) -> Result<(), InteropError> {
        let entry = self
            .entries
            .remove(&id)
            .ok_or(InteropError::UnknownRegistration(id))?;
        self.released += 1;
        tracing::debug!(
            id = id.0,
            size_bytes = entry.size_bytes,
            write_discard = entry.write_discard,
            "interop release"
        );
        Ok(())
    }

    pub fn is_registered(&self, id: RegistrationId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            allocations: self.next_id,
            releases: self.released,
            live: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_unregister_balances() {
        let mut reg = InteropRegistry::new();
        let a = reg.register(1024).unwrap();
        let b = reg.register(2048).unwrap();
        assert_ne!(a, b);
        assert!(reg.is_registered(a));

        reg.unregister(a).unwrap();
        assert!(!reg.is_registered(a));
        assert!(reg.is_registered(b));

        reg.unregister(b).unwrap();
        let stats = reg.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.releases, 2);
        assert_eq!(stats.live, 0);
    }

    #[test]
    fn empty_registration_is_rejected() {
        let mut reg = InteropRegistry::new();
        assert!(matches!(
            reg.register(0),
            Err(InteropError::Registration(_))
        ));
        assert_eq!(reg.stats(), RegistryStats::default());
    }

    #[test]
    fn double_release_is_an_error() {
        let mut reg = InteropRegistry::new();
        let id = reg.register(64).unwrap();
        reg.unregister(id).unwrap();
        assert!(matches!(
            reg.unregister(id),
            Err(InteropError::UnknownRegistration(_))
        ));
    }
}
