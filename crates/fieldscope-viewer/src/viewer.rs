use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use fieldscope_interop::{
    transform::write_colors, ColorMap, FieldElement, FieldView, InteropContext, RegistryStats,
};

use crate::error::{ViewerError, WindowInitError};
use crate::present::{PresentOutcome, PresentPipeline, WindowFrames};
use crate::surface::SurfaceManager;

/// Construction-time knobs. The defaults match what the rest of the stack
/// expects from an interactive viewer: vsync'd presentation on the
/// high-performance adapter over a near-black clear.
#[derive(Debug, Clone, Copy)]
pub struct ViewerConfig {
    pub clear_color: wgpu::Color,
    pub present_mode: wgpu::PresentMode,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color {
                r: 0.02,
                g: 0.02,
                b: 0.04,
                a: 1.0,
            },
            present_mode: wgpu::PresentMode::Fifo,
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Frame and allocation counters, for diagnostics and leak checks.
#[derive(Debug, Clone, Copy)]
pub struct ViewerStats {
    pub frames_presented: u64,
    pub frames_dropped: u64,
    pub registry: RegistryStats,
}

/// Ties the interop pipeline to one window: owns the GPU context, the
/// shared-buffer lifecycle, and the presentation pipeline behind a single
/// [`Viewer::draw`] entry point.
///
/// Not thread-safe by design: draws take `&mut self` and are issued from
/// the same thread that drives the compute loop. Teardown is deterministic:
/// dropping the viewer releases the shared buffer and logs the final
/// allocation accounting.
pub struct Viewer {
    ctx: InteropContext,
    manager: SurfaceManager,
    present: PresentPipeline,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    window: Arc<Window>,
    frames_presented: u64,
    frames_dropped: u64,
    rendering_enabled: bool,
    _instance: wgpu::Instance,
}

impl Viewer {
    /// Build a viewer on a window created by the windowing collaborator.
    ///
    /// Creates the wgpu instance/surface/device, configures the surface to
    /// the window's current size, and establishes initial rendering state.
    pub fn open(window: Arc<Window>, config: ViewerConfig) -> Result<Self, ViewerError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(WindowInitError::CreateSurface)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: config.power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(WindowInitError::AdapterNotFound)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("fieldscope device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))
        .map_err(WindowInitError::RequestDevice)?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: config.present_mode,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let present = PresentPipeline::new(&device, format, config.clear_color);

        tracing::info!(
            adapter = %adapter.get_info().name,
            ?format,
            width = surface_config.width,
            height = surface_config.height,
            "viewer opened"
        );

        Ok(Self {
            ctx: InteropContext::new(device, queue),
            manager: SurfaceManager::new(),
            present,
            surface,
            surface_config,
            window,
            frames_presented: 0,
            frames_dropped: 0,
            rendering_enabled: true,
            _instance: instance,
        })
    }

    /// Invoked by the windowing collaborator on window resize. Updates the
    /// presentation viewport only; the shared buffer is reallocated solely
    /// when a draw call declares new field dimensions.
    pub fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.ctx.device, &self.surface_config);
        }
    }

    /// The sole per-frame entry point: transform `field` through `colormap`
    /// into the shared buffer and present it.
    ///
    /// Precondition: `field` holds exactly `width × height` elements. The
    /// check runs in debug builds only; release builds trust the caller, so
    /// a mismatched release-mode call reads whatever the field buffer
    /// holds (the transform never writes outside the shared buffer).
    ///
    /// On `Err` the frame was dropped (no draw, no present). The viewer
    /// stays usable; if the failure happened during buffer setup, the next
    /// call re-attempts allocation.
    pub fn draw<T: FieldElement>(
        &mut self,
        field: FieldView<'_, T>,
        width: u32,
        height: u32,
        colormap: &ColorMap,
    ) -> Result<(), ViewerError> {
        #[cfg(debug_assertions)]
        if u64::from(field.len()) != u64::from(width) * u64::from(height) {
            return Err(fieldscope_interop::InteropError::SizeMismatch {
                field_len: field.len(),
                capacity: fieldscope_interop::color_elements(width, height),
            }
            .into());
        }

        if !self.rendering_enabled {
            self.frames_dropped += 1;
            return Ok(());
        }

        let shared = self.manager.ensure(&mut self.ctx, width, height)?;
        write_colors(&mut self.ctx, colormap, field, shared)?;

        let colors = shared.graphics_binding()?;
        let mut frames = WindowFrames {
            surface: &self.surface,
            device: &self.ctx.device,
            config: &mut self.surface_config,
        };
        let outcome = self.present.present(
            &self.ctx.device,
            &self.ctx.queue,
            colors,
            width,
            height,
            &mut frames,
        );

        match outcome {
            PresentOutcome::Presented => self.frames_presented += 1,
            PresentOutcome::Dropped => self.frames_dropped += 1,
            PresentOutcome::FatalOutOfMemory => {
                self.frames_dropped += 1;
                self.rendering_enabled = false;
                tracing::error!("surface out of memory; presentation disabled");
            }
        }
        Ok(())
    }

    /// Dimensions recorded by the surface manager, `None` before the first
    /// draw.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.manager.dimensions()
    }

    pub fn stats(&self) -> ViewerStats {
        ViewerStats {
            frames_presented: self.frames_presented,
            frames_dropped: self.frames_dropped,
            registry: self.ctx.registry_stats(),
        }
    }

    /// The interop context, for creating and refreshing device fields.
    pub fn context(&self) -> &InteropContext {
        &self.ctx
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        if let Err(err) = self.manager.release(&mut self.ctx) {
            tracing::warn!(%err, "shared buffer release at teardown failed");
        }
        let stats = self.ctx.registry_stats();
        tracing::info!(
            allocations = stats.allocations,
            releases = stats.releases,
            live = stats.live,
            frames_presented = self.frames_presented,
            frames_dropped = self.frames_dropped,
            "viewer teardown"
        );
    }
}
