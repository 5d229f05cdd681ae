//! Tessellation constants read from guest memory for hull and domain programs.

use bytemuck::{Pod, Zeroable};

/// Constant buffer the guest driver fills for hull and domain shaders.
///
/// Strides and bases are in bytes and describe the LDS / off-chip layout the local and hull
/// stages agreed on.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TessellationDataConstantBuffer {
    pub ls_stride: u32,
    /// Output control point stride; falls back to `ls_stride` when the hull shader passes
    /// control points through.
    pub hs_cp_stride: u32,
    /// Patches per threadgroup.
    pub num_patches: u32,
    pub hs_output_base: u32,
    pub patch_const_size: u32,
    pub patch_const_base: u32,
    pub patch_output_size: u32,
    pub off_chip_tess_factor_threshold: f32,
    pub first_edge_tess_factor_index: u32,
}

impl TessellationDataConstantBuffer {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        bytemuck::pod_read_unaligned(bytes)
    }
}

const _: [(); 36] = [(); TessellationDataConstantBuffer::SIZE];
