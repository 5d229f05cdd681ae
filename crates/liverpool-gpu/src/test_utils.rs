//! Encoders for synthetic descriptors.
//!
//! Each builder starts from a plausible bound resource and exposes setters for the fields tests
//! usually vary. Encoding is the inverse of the decoders in this crate for the covered fields.

use crate::format::{DataFormat, NumberFormat};
use crate::image::ImageType;
use crate::swizzle::CompMapping;
use crate::{BufferSharp, ImageSharp, SamplerSharp};

fn number_format_raw(format: NumberFormat) -> u32 {
    match format {
        NumberFormat::Unorm => 0,
        NumberFormat::Snorm => 1,
        NumberFormat::Uscaled => 2,
        NumberFormat::Sscaled => 3,
        NumberFormat::Uint => 4,
        NumberFormat::Sint => 5,
        NumberFormat::SnormNz => 6,
        NumberFormat::Float => 7,
        NumberFormat::Srgb => 9,
        NumberFormat::Ubnorm => 10,
        NumberFormat::UbnormNz => 11,
        NumberFormat::Ubint => 12,
        NumberFormat::Ubscaled => 13,
        NumberFormat::Reserved(raw) => u32::from(raw),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BufferSharpBuilder {
    base_address: u64,
    stride: u32,
    num_records: u32,
    dst_select: CompMapping,
    num_format: NumberFormat,
    data_format: DataFormat,
}

impl BufferSharpBuilder {
    /// A float4 buffer with identity swizzle.
    pub fn new(base_address: u64, stride: u32, num_records: u32) -> Self {
        Self {
            base_address,
            stride,
            num_records,
            dst_select: CompMapping::IDENTITY,
            num_format: NumberFormat::Float,
            data_format: DataFormat::Format32_32_32_32,
        }
    }

    pub fn format(mut self, data_format: DataFormat, num_format: NumberFormat) -> Self {
        self.data_format = data_format;
        self.num_format = num_format;
        self
    }

    pub fn dst_select(mut self, dst_select: CompMapping) -> Self {
        self.dst_select = dst_select;
        self
    }

    pub fn build(self) -> BufferSharp {
        BufferSharp::from_dwords(self.dwords())
    }

    pub fn dwords(self) -> [u32; 4] {
        let num_format = number_format_raw(self.num_format) & 0x7;
        [
            self.base_address as u32,
            ((self.base_address >> 32) as u32 & 0xfff) | ((self.stride & 0x3fff) << 16),
            self.num_records,
            self.dst_select.to_bits() | (num_format << 12) | ((self.data_format as u32 & 0xf) << 15),
        ]
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ImageSharpBuilder {
    base_address: u64,
    width: u32,
    height: u32,
    ty: ImageType,
    dst_select: CompMapping,
    num_format: NumberFormat,
    data_format: DataFormat,
    base_array: u32,
    last_array: u32,
}

impl ImageSharpBuilder {
    /// A single-layer RGBA8 unorm 2D image. `base_address` must be 256-byte aligned.
    pub fn new(base_address: u64, width: u32, height: u32) -> Self {
        Self {
            base_address,
            width,
            height,
            ty: ImageType::Color2D,
            dst_select: CompMapping::IDENTITY,
            num_format: NumberFormat::Unorm,
            data_format: DataFormat::Format8_8_8_8,
            base_array: 0,
            last_array: 0,
        }
    }

    pub fn image_type(mut self, ty: ImageType) -> Self {
        self.ty = ty;
        self
    }

    pub fn format(mut self, data_format: DataFormat, num_format: NumberFormat) -> Self {
        self.data_format = data_format;
        self.num_format = num_format;
        self
    }

    pub fn dst_select(mut self, dst_select: CompMapping) -> Self {
        self.dst_select = dst_select;
        self
    }

    pub fn layers(mut self, base_array: u32, last_array: u32) -> Self {
        self.base_array = base_array;
        self.last_array = last_array;
        self
    }

    pub fn build(self) -> ImageSharp {
        ImageSharp::from_dwords(self.dwords())
    }

    pub fn dwords(self) -> [u32; 8] {
        let units = self.base_address >> 8;
        [
            units as u32,
            ((units >> 32) as u32 & 0xff)
                | ((self.data_format as u32 & 0x3f) << 20)
                | ((number_format_raw(self.num_format) & 0xf) << 26),
            (self.width.saturating_sub(1) & 0x3fff)
                | ((self.height.saturating_sub(1) & 0x3fff) << 14),
            self.dst_select.to_bits() | (self.ty.raw() << 28),
            0,
            (self.base_array & 0x1fff) | ((self.last_array & 0x1fff) << 13),
            0,
            0,
        ]
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SamplerSharpBuilder {
    force_unnormalized: bool,
}

impl SamplerSharpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_unnormalized(mut self, value: bool) -> Self {
        self.force_unnormalized = value;
        self
    }

    pub fn build(self) -> SamplerSharp {
        SamplerSharp::from_dwords(self.dwords())
    }

    pub fn dwords(self) -> [u32; 4] {
        // Bilinear min/mag, linear mips.
        [
            u32::from(self.force_unnormalized) << 15,
            0xfff << 12,
            (1 << 20) | (1 << 22) | (2 << 26),
            0,
        ]
    }
}
