use std::borrow::Cow;

/// An opaque per-element transform capability: WGSL source defining
/// `fn colormap(v: <scalar>) -> vec3<f32>`.
///
/// Stateless from the interop core's perspective; the function body is
/// composed into the transform shader and the result cached per
/// (element type, colormap) pair. Designing colormaps is the caller's
/// concern; the constructors here are trivial conveniences for demos and
/// tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorMap {
    label: Cow<'static, str>,
    source: Cow<'static, str>,
}

impl ColorMap {
    /// Wrap caller-supplied WGSL. `source` must define
    /// `fn colormap(v: <scalar>) -> vec3<f32>` for every scalar the caller
    /// draws with; anything else fails pipeline creation at first use.
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
        }
    }

    /// Grayscale identity: every channel is the field value itself.
    pub fn identity() -> Self {
        Self::new(
            "identity",
            "fn colormap(v: f32) -> vec3<f32> { return vec3<f32>(v, v, v); }",
        )
    }

    /// Linear black→red→yellow ramp over values in [0, 1].
    pub fn heat() -> Self {
        Self::new(
            "heat",
            "fn colormap(v: f32) -> vec3<f32> {\n\
             \x20   let t = clamp(v, 0.0, 1.0);\n\
             \x20   return vec3<f32>(min(2.0 * t, 1.0), max(2.0 * t - 1.0, 0.0), 0.0);\n\
             }",
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_maps_define_the_entry_point() {
        for map in [ColorMap::identity(), ColorMap::heat()] {
            assert!(map.source().contains("fn colormap("), "{}", map.label());
        }
    }
}
