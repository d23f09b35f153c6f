//! Per-frame element-wise transform from a device field into the shared
//! color buffer.
//!
//! The sequence is fixed: map the buffer for compute write, dispatch the
//! colormap transform, block on an explicit synchronization barrier, unmap.
//! The barrier is required because the next consumer is the presentation
//! pass, which must observe a finished write.

use std::collections::HashMap;

use crate::buffer::SharedBuffer;
use crate::colormap::ColorMap;
use crate::context::InteropContext;
use crate::error::InteropError;
use crate::field::{FieldElement, FieldView};

const WORKGROUP_SIZE: u32 = 256;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct TransformParams {
    count: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TransformKey {
    scalar: &'static str,
    colormap: ColorMap,
}

struct TransformPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params: wgpu::Buffer,
}

/// Cache of transform pipelines keyed by (element scalar, colormap).
///
/// A viewer typically draws with one or two maps, so entries are never
/// evicted.
pub(crate) struct TransformPipelines {
    entries: HashMap<TransformKey, TransformPipeline>,
}

impl TransformPipelines {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

fn shader_source(scalar: &str, colormap: &ColorMap) -> String {
    format!(
        r#"struct TransformParams {{
    count: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}}

@group(0) @binding(0) var<uniform> params: TransformParams;
@group(0) @binding(1) var<storage, read> field_in: array<{scalar}>;
@group(0) @binding(2) var<storage, read_write> colors: array<f32>;

{colormap}

@compute @workgroup_size({workgroup})
fn write_colors(@builtin(global_invocation_id) gid: vec3<u32>) {{
    let i = gid.x;
    if (i >= params.count) {{
        return;
    }}
    let c = colormap(field_in[i]);
    let base = 3u * i;
    colors[base] = c.x;
    colors[base + 1u] = c.y;
    colors[base + 2u] = c.z;
}}
"#,
        scalar = scalar,
        colormap = colormap.source(),
        workgroup = WORKGROUP_SIZE,
    )
}

fn build_pipeline(
    device: &wgpu::Device,
    scalar: &'static str,
    colormap: &ColorMap,
) -> Result<TransformPipeline, InteropError> {
    let source = shader_source(scalar, colormap);

    // The colormap body is caller-supplied WGSL; trap compile/validation
    // errors in an error scope instead of letting them reach the device
    // error handler.
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fieldscope transform shader"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("fieldscope transform bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("fieldscope transform pl"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("fieldscope transform pipeline"),
        layout: Some(&layout),
        module: &module,
        entry_point: "write_colors",
        compilation_options: wgpu::PipelineCompilationOptions::default(),
    });

    let _ = device.poll(wgpu::Maintain::Wait);
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        tracing::warn!(colormap = colormap.label(), scalar, %err, "transform pipeline build failed");
        return Err(InteropError::PipelineBuild(err));
    }

    let params = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("fieldscope transform params"),
        size: std::mem::size_of::<TransformParams>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    Ok(TransformPipeline {
        pipeline,
        bind_group_layout,
        params,
    })
}

/// Apply `colormap` to every field element, writing interleaved RGB triples
/// into the shared buffer.
///
/// Preconditions: the buffer is `AvailableForGraphics`, and
/// `field.len() × 3` equals the buffer capacity. The length check runs in
/// debug builds only; release builds trust the caller, keeping the
/// per-frame hot path free of it. On success the buffer holds
/// `colormap(field[i])` at elements `3i..3i+3` and is back in
/// `AvailableForGraphics`; the same state is restored on every failure
/// after the map, so no half-mapped buffer survives an error.
pub fn write_colors<T: FieldElement>(
    ctx: &mut InteropContext,
    colormap: &ColorMap,
    field: FieldView<'_, T>,
    shared: &mut SharedBuffer,
) -> Result<(), InteropError> {
    #[cfg(debug_assertions)]
    if field.len().checked_mul(3) != Some(shared.capacity()) {
        return Err(InteropError::SizeMismatch {
            field_len: field.len(),
            capacity: shared.capacity(),
        });
    }

    let outcome = {
        let colors = shared.map_for_compute()?;
        dispatch_transform(ctx, colormap, field, colors)
    };
    // Ownership goes back to the graphics side whether or not the dispatch
    // succeeded.
    shared.unmap();
    outcome
}

fn dispatch_transform<T: FieldElement>(
    ctx: &mut InteropContext,
    colormap: &ColorMap,
    field: FieldView<'_, T>,
    colors: &wgpu::Buffer,
) -> Result<(), InteropError> {
    let key = TransformKey {
        scalar: T::WGSL_SCALAR,
        colormap: colormap.clone(),
    };
    if !ctx.pipelines.entries.contains_key(&key) {
        let built = build_pipeline(&ctx.device, T::WGSL_SCALAR, colormap)?;
        ctx.pipelines.entries.insert(key.clone(), built);
    }
    let entry = &ctx.pipelines.entries[&key];

    ctx.queue.write_buffer(
        &entry.params,
        0,
        bytemuck::bytes_of(&TransformParams {
            count: field.len(),
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        }),
    );

    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("fieldscope transform bg"),
        layout: &entry.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: entry.params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: field.buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: colors.as_entire_binding(),
            },
        ],
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fieldscope transform enc"),
        });
    {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("fieldscope transform pass"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&entry.pipeline);
        cpass.set_bind_group(0, &bind_group, &[]);
        cpass.dispatch_workgroups(field.len().div_ceil(WORKGROUP_SIZE), 1, 1);
    }
    ctx.queue.submit(std::iter::once(encoder.finish()));

    // Synchronization barrier: the buffer is handed to the presentation
    // pass right after this call, which must observe a finished write.
    let _ = ctx.device.poll(wgpu::Maintain::Wait);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_source_substitutes_scalar_and_colormap() {
        let src = shader_source("u32", &ColorMap::new("test", "fn colormap(v: u32) -> vec3<f32> { return vec3<f32>(0.0); }"));
        assert!(src.contains("array<u32>"));
        assert!(src.contains("fn colormap(v: u32)"));
        assert!(src.contains("@workgroup_size(256)"));
    }
}
