//! Demo: an animated ripple field drawn through the fieldscope pipeline.
//!
//! Plays the windowing-collaborator role: owns the winit event loop and
//! window, forwards resize events, and produces the field the viewer draws.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

use fieldscope_interop::{ColorMap, DeviceField};
use fieldscope_viewer::{Viewer, ViewerConfig};

/// Radial ripple in [0, 1], animated over `t` seconds.
fn field_values(width: u32, height: u32, t: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
        for x in 0..width {
            let u = x as f32 / width.max(1) as f32 - 0.5;
            let v = y as f32 / height.max(1) as f32 - 0.5;
            let r = (u * u + v * v).sqrt();
            out.push(0.5 + 0.5 * (24.0 * r - 4.0 * t).sin() * (-3.0 * r).exp());
        }
    }
    out
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let event_loop = EventLoop::new().context("create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("fieldscope demo")
            .with_inner_size(PhysicalSize::new(800, 600))
            .build(&event_loop)
            .context("create window")?,
    );

    let mut viewer = Viewer::open(Arc::clone(&window), ViewerConfig::default())
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let colormap = ColorMap::heat();
    let started = Instant::now();
    let mut field: Option<(DeviceField<f32>, u32, u32)> = None;

    event_loop
        .run(move |event, elwt| match event {
            Event::AboutToWait => window.request_redraw(),
            Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => viewer.handle_resize(size),
                WindowEvent::RedrawRequested => {
                    let size = window.inner_size();
                    let (width, height) = (size.width, size.height);
                    if width == 0 || height == 0 {
                        return;
                    }

                    let values = field_values(width, height, started.elapsed().as_secs_f32());
                    let reuse = matches!(&field, Some((_, w, h)) if *w == width && *h == height);
                    if reuse {
                        if let Some((f, _, _)) = &field {
                            f.write(viewer.context(), &values);
                        }
                    } else {
                        field = Some((
                            DeviceField::from_slice(viewer.context(), "demo field", &values),
                            width,
                            height,
                        ));
                    }

                    let Some((f, _, _)) = &field else { return };
                    if let Err(err) = viewer.draw(f.view(), width, height, &colormap) {
                        tracing::error!(%err, "frame dropped");
                    }
                }
                _ => {}
            },
            _ => {}
        })
        .context("run event loop")?;

    Ok(())
}
