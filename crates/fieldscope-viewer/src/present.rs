//! Presentation stage: draw the shared color buffer as a viewport-filling
//! image and present the frame.
//!
//! Surface acquisition failures are handled here rather than reported
//! upward: `Lost`/`Outdated` get a reconfigure and a single retry,
//! `Timeout` drops the frame, `OutOfMemory` is fatal.

/// What happened to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    Dropped,
    FatalOutOfMemory,
}

/// Source of presentable frames.
///
/// Abstracted from `wgpu::Surface` so the retry policy is testable without
/// a window.
pub(crate) trait FrameSource {
    type Frame;

    fn acquire(&mut self) -> Result<Self::Frame, wgpu::SurfaceError>;
    fn reconfigure(&mut self);
    fn finish(&mut self, frame: Self::Frame);
}

/// Acquire a frame, render into it, present, with a single automatic
/// reconfigure retry on `Lost`/`Outdated`.
pub(crate) fn present_with_retry<S: FrameSource>(
    source: &mut S,
    mut render: impl FnMut(&S::Frame),
) -> PresentOutcome {
    let mut attempt = 0u8;

    loop {
        attempt += 1;
        match source.acquire() {
            Ok(frame) => {
                render(&frame);
                source.finish(frame);
                return PresentOutcome::Presented;
            }
            Err(err) => {
                tracing::warn!(%err, attempt, "surface frame acquisition failed");
                match err {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated if attempt == 1 => {
                        source.reconfigure();
                        continue;
                    }
                    wgpu::SurfaceError::OutOfMemory => return PresentOutcome::FatalOutOfMemory,
                    _ => return PresentOutcome::Dropped,
                }
            }
        }
    }
}

/// The window surface as a [`FrameSource`].
pub(crate) struct WindowFrames<'a> {
    pub surface: &'a wgpu::Surface<'static>,
    pub device: &'a wgpu::Device,
    pub config: &'a mut wgpu::SurfaceConfiguration,
}

impl FrameSource for WindowFrames<'_> {
    type Frame = wgpu::SurfaceTexture;

    fn acquire(&mut self) -> Result<Self::Frame, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }

    fn reconfigure(&mut self) {
        self.surface.configure(self.device, self.config);
    }

    fn finish(&mut self, frame: Self::Frame) {
        frame.present();
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
struct FieldDims {
    width: u32,
    height: u32,
    _pad0: u32,
    _pad1: u32,
}

impl FieldDims {
    fn to_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..4].copy_from_slice(&self.width.to_le_bytes());
        out[4..8].copy_from_slice(&self.height.to_le_bytes());
        out
    }
}

/// The first buffer element is the bottom-left of the field, rows proceed
/// bottom-to-top; the fragment shader flips the window-space row so the
/// image lands the same way up.
const PRESENT_WGSL: &str = r#"struct FieldDims {
    width: u32,
    height: u32,
    _pad0: u32,
    _pad1: u32,
}

@group(0) @binding(0) var<uniform> dims: FieldDims;
@group(0) @binding(1) var<storage, read> colors: array<f32>;

struct VSOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VSOut {
    var p = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -3.0),
        vec2<f32>(3.0, 1.0),
        vec2<f32>(-1.0, 1.0)
    );
    var uv = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 2.0),
        vec2<f32>(2.0, 0.0),
        vec2<f32>(0.0, 0.0)
    );

    var o: VSOut;
    o.pos = vec4<f32>(p[vi], 0.0, 1.0);
    o.uv = uv[vi];
    return o;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    let x = min(u32(in.uv.x * f32(dims.width)), dims.width - 1u);
    let y_top = min(u32(in.uv.y * f32(dims.height)), dims.height - 1u);
    let y = dims.height - 1u - y_top;
    let base = 3u * (y * dims.width + x);
    return vec4<f32>(colors[base], colors[base + 1u], colors[base + 2u], 1.0);
}
"#;

/// Viewport-filling draw of the shared buffer's contents.
pub(crate) struct PresentPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    dims: wgpu::Buffer,
    clear_color: wgpu::Color,
}

impl PresentPipeline {
    pub(crate) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        clear_color: wgpu::Color,
    ) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fieldscope present shader"),
            source: wgpu::ShaderSource::Wgsl(PRESENT_WGSL.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fieldscope present bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fieldscope present pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("fieldscope present pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: "vs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: "fs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let dims = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fieldscope present dims"),
            size: std::mem::size_of::<FieldDims>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bind_group_layout,
            dims,
            clear_color,
        }
    }

    /// Draw `colors` (width × height RGB triples) over the whole surface
    /// and present. This is the sole point at which a frame becomes
    /// externally observable.
    pub(crate) fn present(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        colors: &wgpu::Buffer,
        width: u32,
        height: u32,
        frames: &mut WindowFrames<'_>,
    ) -> PresentOutcome {
        queue.write_buffer(
            &self.dims,
            0,
            &FieldDims {
                width,
                height,
                _pad0: 0,
                _pad1: 0,
            }
            .to_bytes(),
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fieldscope present bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.dims.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: colors.as_entire_binding(),
                },
            ],
        });

        present_with_retry(frames, |frame| {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fieldscope present enc"),
            });
            {
                let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("fieldscope present pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.clear_color),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &bind_group, &[]);
                rpass.draw(0..3, 0..1);
            }
            queue.submit(std::iter::once(encoder.finish()));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted frame source: pops the front error, or yields a frame.
    struct MockFrames {
        errors: Vec<wgpu::SurfaceError>,
        reconfigures: u32,
        presented: u32,
    }

    impl MockFrames {
        fn new(errors: Vec<wgpu::SurfaceError>) -> Self {
            Self {
                errors,
                reconfigures: 0,
                presented: 0,
            }
        }
    }

    impl FrameSource for MockFrames {
        type Frame = ();

        fn acquire(&mut self) -> Result<(), wgpu::SurfaceError> {
            if self.errors.is_empty() {
                Ok(())
            } else {
                Err(self.errors.remove(0))
            }
        }

        fn reconfigure(&mut self) {
            self.reconfigures += 1;
        }

        fn finish(&mut self, _frame: ()) {
            self.presented += 1;
        }
    }

    #[test]
    fn clean_acquire_presents() {
        let mut frames = MockFrames::new(vec![]);
        let outcome = present_with_retry(&mut frames, |_| {});
        assert_eq!(outcome, PresentOutcome::Presented);
        assert_eq!(frames.presented, 1);
        assert_eq!(frames.reconfigures, 0);
    }

    #[test]
    fn lost_surface_reconfigures_and_retries_once() {
        let mut frames = MockFrames::new(vec![wgpu::SurfaceError::Lost]);
        let outcome = present_with_retry(&mut frames, |_| {});
        assert_eq!(outcome, PresentOutcome::Presented);
        assert_eq!(frames.reconfigures, 1);
        assert_eq!(frames.presented, 1);
    }

    #[test]
    fn repeated_loss_drops_the_frame() {
        let mut frames =
            MockFrames::new(vec![wgpu::SurfaceError::Lost, wgpu::SurfaceError::Outdated]);
        let outcome = present_with_retry(&mut frames, |_| {});
        assert_eq!(outcome, PresentOutcome::Dropped);
        assert_eq!(frames.reconfigures, 1);
        assert_eq!(frames.presented, 0);
    }

    #[test]
    fn timeout_drops_without_reconfigure() {
        let mut frames = MockFrames::new(vec![wgpu::SurfaceError::Timeout]);
        let outcome = present_with_retry(&mut frames, |_| {});
        assert_eq!(outcome, PresentOutcome::Dropped);
        assert_eq!(frames.reconfigures, 0);
    }

    #[test]
    fn out_of_memory_is_fatal() {
        let mut frames = MockFrames::new(vec![wgpu::SurfaceError::OutOfMemory]);
        let outcome = present_with_retry(&mut frames, |_| {});
        assert_eq!(outcome, PresentOutcome::FatalOutOfMemory);
        assert_eq!(frames.presented, 0);
    }
}
