mod common;

use fieldscope_interop::{
    allocate, color_elements, read_colors, release, transform::write_colors, BufferState,
    ColorMap, DeviceField, InteropError,
};
use pretty_assertions::assert_eq;

fn assert_rgb_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() < 1e-6,
            "element {i}: got {a}, expected {e}"
        );
    }
}

#[test]
fn identity_roundtrip_matches_field() {
    let Some(mut ctx) = common::headless_context("identity_roundtrip_matches_field") else {
        return;
    };

    let values = [0.0f32, 0.25, 0.5, 1.0];
    let field = DeviceField::from_slice(&ctx, "test field", &values);
    let mut shared = allocate(&mut ctx, color_elements(2, 2)).expect("allocate");

    write_colors(&mut ctx, &ColorMap::identity(), field.view(), &mut shared)
        .expect("write_colors");
    assert_eq!(shared.state(), BufferState::AvailableForGraphics);

    let colors = read_colors(&ctx, &shared).expect("read_colors");
    let expected: Vec<f32> = values.iter().flat_map(|&v| [v, v, v]).collect();
    assert_rgb_close(&colors, &expected);

    release(&mut ctx, shared).expect("release");
}

#[test]
fn heat_ramp_produces_known_colors() {
    let Some(mut ctx) = common::headless_context("heat_ramp_produces_known_colors") else {
        return;
    };

    let values = [0.0f32, 0.25, 0.5, 1.0];
    let field = DeviceField::from_slice(&ctx, "test field", &values);
    let mut shared = allocate(&mut ctx, color_elements(4, 1)).expect("allocate");

    write_colors(&mut ctx, &ColorMap::heat(), field.view(), &mut shared).expect("write_colors");

    let colors = read_colors(&ctx, &shared).expect("read_colors");
    let expected = [
        0.0, 0.0, 0.0, // v = 0.0
        0.5, 0.0, 0.0, // v = 0.25
        1.0, 0.0, 0.0, // v = 0.5
        1.0, 1.0, 0.0, // v = 1.0
    ];
    assert_rgb_close(&colors, &expected);

    release(&mut ctx, shared).expect("release");
}

#[test]
fn integer_fields_use_their_own_colormap() {
    let Some(mut ctx) = common::headless_context("integer_fields_use_their_own_colormap") else {
        return;
    };

    let values = [0u32, 1, 2, 3];
    let field = DeviceField::from_slice(&ctx, "label field", &values);
    let mut shared = allocate(&mut ctx, color_elements(4, 1)).expect("allocate");

    let map = ColorMap::new(
        "label ramp",
        "fn colormap(v: u32) -> vec3<f32> { return vec3<f32>(f32(v) / 4.0, 0.0, 1.0); }",
    );
    write_colors(&mut ctx, &map, field.view(), &mut shared).expect("write_colors");

    let colors = read_colors(&ctx, &shared).expect("read_colors");
    let expected = [
        0.0, 0.0, 1.0, //
        0.25, 0.0, 1.0, //
        0.5, 0.0, 1.0, //
        0.75, 0.0, 1.0, //
    ];
    assert_rgb_close(&colors, &expected);

    release(&mut ctx, shared).expect("release");
}

#[test]
fn repeated_transforms_overwrite_in_place() {
    let Some(mut ctx) = common::headless_context("repeated_transforms_overwrite_in_place") else {
        return;
    };

    let field = DeviceField::from_slice(&ctx, "test field", &[0.5f32, 0.5]);
    let mut shared = allocate(&mut ctx, color_elements(2, 1)).expect("allocate");

    write_colors(&mut ctx, &ColorMap::identity(), field.view(), &mut shared)
        .expect("first write");

    // Write-discard contract: the second frame fully overwrites the first.
    field.write(&ctx, &[0.125f32, 0.75]);
    write_colors(&mut ctx, &ColorMap::identity(), field.view(), &mut shared)
        .expect("second write");

    let colors = read_colors(&ctx, &shared).expect("read_colors");
    assert_rgb_close(&colors, &[0.125, 0.125, 0.125, 0.75, 0.75, 0.75]);

    release(&mut ctx, shared).expect("release");
}

#[test]
fn invalid_colormap_fails_but_returns_the_buffer() {
    let Some(mut ctx) = common::headless_context("invalid_colormap_fails_but_returns_the_buffer")
    else {
        return;
    };

    let field = DeviceField::from_slice(&ctx, "test field", &[1.0f32]);
    let mut shared = allocate(&mut ctx, color_elements(1, 1)).expect("allocate");

    let broken = ColorMap::new("broken", "fn colormap(v: f32) -> vec3<f32> { nonsense }");
    match write_colors(&mut ctx, &broken, field.view(), &mut shared) {
        Err(InteropError::PipelineBuild(_)) => {}
        Err(err) => panic!("expected pipeline build failure, got {err}"),
        Ok(()) => panic!("expected pipeline build failure, got success"),
    }

    // A failed frame must not leave the buffer half-mapped.
    assert_eq!(shared.state(), BufferState::AvailableForGraphics);
    assert!(ctx.is_registered(shared.registration()));

    release(&mut ctx, shared).expect("release");
}

#[cfg(debug_assertions)]
#[test]
fn mismatched_field_length_is_rejected_in_debug() {
    let Some(mut ctx) = common::headless_context("mismatched_field_length_is_rejected_in_debug")
    else {
        return;
    };

    let field = DeviceField::from_slice(&ctx, "test field", &[1.0f32, 2.0, 3.0]);
    let mut shared = allocate(&mut ctx, color_elements(2, 2)).expect("allocate");

    match write_colors(&mut ctx, &ColorMap::identity(), field.view(), &mut shared) {
        Err(InteropError::SizeMismatch {
            field_len: 3,
            capacity: 12,
        }) => {}
        Err(err) => panic!("expected size mismatch, got {err}"),
        Ok(()) => panic!("expected size mismatch, got success"),
    }

    release(&mut ctx, shared).expect("release");
}
