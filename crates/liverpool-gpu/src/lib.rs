//! Decoders for Liverpool (GCN) GPU resource descriptors.
//!
//! Shaders on this GPU address memory through "sharps": 128-bit or 256-bit descriptors the guest
//! writes into user-data SGPRs or into tables in guest memory. This crate treats those dwords as
//! untrusted input and exposes them as plain value types:
//!
//! - [`BufferSharp`] (V#) for vertex/constant/storage/texel buffers,
//! - [`ImageSharp`] (T#) for images and FMask surfaces,
//! - [`SamplerSharp`] (S#) for samplers.
//!
//! Decoding never panics; unknown enum encodings map to explicit fallback variants.

#![forbid(unsafe_code)]

mod buffer;
mod format;
mod guest_memory;
mod image;
mod sampler;
mod swizzle;
mod tessellation;

/// Helpers for building synthetic descriptor dwords in tests.
///
/// Only available for this crate's own tests or with the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::buffer::BufferSharp;
pub use crate::format::{DataFormat, NumberClass, NumberConversion, NumberFormat};
pub use crate::guest_memory::{GuestMemory, GuestMemoryError, VecGuestMemory};
pub use crate::image::{ImageSharp, ImageType};
pub use crate::sampler::{ClampMode, DepthCompare, FilterMode, MipFilter, SamplerSharp};
pub use crate::swizzle::{CompMapping, CompSwizzle};
pub use crate::tessellation::{
    TessellationParams, TessellationPartitioning, TessellationTopology, TessellationType,
};

/// Extracts `width` bits of `value` starting at bit `shift`.
#[inline]
pub(crate) const fn bits(value: u32, shift: u32, width: u32) -> u32 {
    (value >> shift) & ((1u32 << width) - 1)
}
