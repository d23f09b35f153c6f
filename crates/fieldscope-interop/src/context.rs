use crate::error::InteropError;
use crate::registry::InteropRegistry;
use crate::transform::TransformPipelines;

/// Wrapper around a `wgpu::Device`/`wgpu::Queue` pair that owns the interop
/// registry and the transform pipeline cache.
///
/// Exactly one context exists per lifecycle owner; all allocation, transform
/// and readback calls go through it. Mutable access is required wherever the
/// registry or pipeline cache can change, which also rules out concurrent
/// draws from safe code.
pub struct InteropContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub(crate) registry: InteropRegistry,
    pub(crate) pipelines: TransformPipelines,
}

impl InteropContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            registry: InteropRegistry::new(),
            pipelines: TransformPipelines::new(),
        }
    }

    /// Creates a context without a presentation surface.
    ///
    /// Primarily intended for tests and diagnostics. On Linux the GL backend
    /// is tried first; some Vulkan software adapters (lavapipe/llvmpipe)
    /// have been observed to crash in headless environments.
    pub async fn headless() -> Result<Self, InteropError> {
        let adapter = if cfg!(target_os = "linux") {
            let gl_instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends: wgpu::Backends::GL,
                ..Default::default()
            });
            let adapter = gl_instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await;
            if adapter.is_some() {
                adapter
            } else {
                let primary = wgpu::Instance::new(wgpu::InstanceDescriptor {
                    backends: wgpu::Backends::PRIMARY,
                    ..Default::default()
                });
                primary
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::LowPower,
                        compatible_surface: None,
                        force_fallback_adapter: false,
                    })
                    .await
            }
        } else {
            let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends: wgpu::Backends::PRIMARY,
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
        }
        .ok_or(InteropError::AdapterNotFound)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("fieldscope headless device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await?;

        Ok(Self::new(device, queue))
    }

    /// Registry accounting: allocations, releases, live registrations.
    pub fn registry_stats(&self) -> crate::registry::RegistryStats {
        self.registry.stats()
    }

    /// Whether `id` refers to a live registration.
    pub fn is_registered(&self, id: crate::registry::RegistrationId) -> bool {
        self.registry.is_registered(id)
    }
}
