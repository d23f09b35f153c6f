//! Shared helpers for `fieldscope-interop` integration tests.

use fieldscope_interop::InteropContext;

pub fn require_gpu() -> bool {
    let Ok(raw) = std::env::var("FIELDSCOPE_REQUIRE_GPU") else {
        return false;
    };

    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

pub fn skip_or_panic(test_name: &str, reason: &str) {
    if require_gpu() {
        panic!("FIELDSCOPE_REQUIRE_GPU is enabled but {test_name} cannot run: {reason}");
    }
    eprintln!("skipping {test_name}: {reason}");
}

/// Headless context for GPU-dependent tests; `None` skips the test when no
/// adapter exists (software CI runners).
pub fn headless_context(test_name: &str) -> Option<InteropContext> {
    match pollster::block_on(InteropContext::headless()) {
        Ok(ctx) => Some(ctx),
        Err(fieldscope_interop::InteropError::AdapterNotFound) => {
            skip_or_panic(test_name, "wgpu adapter not found");
            None
        }
        Err(err) => panic!("failed to create headless context: {err}"),
    }
}
