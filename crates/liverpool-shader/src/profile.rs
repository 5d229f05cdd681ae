use bitflags::bitflags;

/// Largest buffer the backend can bind as a uniform buffer.
pub const MAX_UBO_SIZE: u32 = 64 * 1024;

bitflags! {
    /// Host backend capabilities that change how shaders are generated.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct ProfileFeatures: u32 {
        /// Vertex inputs may be declared with a type that differs from the bound format, so
        /// attribute number classes never need to be baked into a permutation.
        const LEGACY_VERTEX_ATTRIBUTES = 1 << 0;
    }
}

/// Read-only description of the backend a shader is being compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Profile {
    pub features: ProfileFeatures,
    /// Buffers larger than this are bound as storage buffers even when read-only.
    pub max_ubo_size: u32,
}

impl Profile {
    pub fn supports_legacy_vertex_attributes(&self) -> bool {
        self.features
            .contains(ProfileFeatures::LEGACY_VERTEX_ATTRIBUTES)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            features: ProfileFeatures::empty(),
            max_ubo_size: MAX_UBO_SIZE,
        }
    }
}
