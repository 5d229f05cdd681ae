use crate::format::{DataFormat, NumberConversion, NumberFormat};
use crate::swizzle::CompMapping;
use crate::bits;

/// `SQ_RSRC_IMG_*` resource type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// Types `0..=7` are buffers or reserved and never describe an image.
    Invalid,
    Color1D,
    #[default]
    Color2D,
    Color3D,
    Cube,
    Color1DArray,
    Color2DArray,
    Color2DMsaa,
    Color2DMsaaArray,
}

impl ImageType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            8 => Self::Color1D,
            9 => Self::Color2D,
            10 => Self::Color3D,
            11 => Self::Cube,
            12 => Self::Color1DArray,
            13 => Self::Color2DArray,
            14 => Self::Color2DMsaa,
            15 => Self::Color2DMsaaArray,
            _ => Self::Invalid,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Invalid => 0,
            Self::Color1D => 8,
            Self::Color2D => 9,
            Self::Color3D => 10,
            Self::Cube => 11,
            Self::Color1DArray => 12,
            Self::Color2DArray => 13,
            Self::Color2DMsaa => 14,
            Self::Color2DMsaaArray => 15,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::Color1DArray | Self::Color2DArray | Self::Color2DMsaaArray
        )
    }
}

/// Image resource descriptor (T#), eight dwords.
///
/// Only the first four dwords are defined for 128-bit descriptors; the rest read as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageSharp {
    raw: [u32; 8],
}

impl ImageSharp {
    pub const DWORDS: usize = 8;

    pub const fn from_dwords(raw: [u32; 8]) -> Self {
        Self { raw }
    }

    /// Builds a descriptor from a 128-bit (R128) read.
    pub fn from_r128(raw: [u32; 4]) -> Self {
        let mut full = [0u32; 8];
        full[..4].copy_from_slice(&raw);
        Self { raw: full }
    }

    pub const fn dwords(&self) -> [u32; 8] {
        self.raw
    }

    /// Byte address; the descriptor stores it in 256-byte units.
    pub fn base_address(&self) -> u64 {
        let units = u64::from(self.raw[0]) | (u64::from(bits(self.raw[1], 0, 8)) << 32);
        units << 8
    }

    pub fn data_format(&self) -> DataFormat {
        DataFormat::from_raw(bits(self.raw[1], 20, 6))
    }

    pub fn number_format(&self) -> NumberFormat {
        NumberFormat::from_raw(bits(self.raw[1], 26, 4))
    }

    pub fn width(&self) -> u32 {
        bits(self.raw[2], 0, 14) + 1
    }

    pub fn height(&self) -> u32 {
        bits(self.raw[2], 14, 14) + 1
    }

    pub fn dst_select(&self) -> CompMapping {
        CompMapping::from_dword(self.raw[3])
    }

    pub fn base_level(&self) -> u32 {
        bits(self.raw[3], 12, 4)
    }

    pub fn last_level(&self) -> u32 {
        bits(self.raw[3], 16, 4)
    }

    pub fn tiling_index(&self) -> u32 {
        bits(self.raw[3], 20, 5)
    }

    pub fn image_type(&self) -> ImageType {
        ImageType::from_raw(bits(self.raw[3], 28, 4))
    }

    pub fn depth(&self) -> u32 {
        bits(self.raw[4], 0, 13) + 1
    }

    pub fn pitch(&self) -> u32 {
        bits(self.raw[4], 13, 14) + 1
    }

    pub fn base_array(&self) -> u32 {
        bits(self.raw[5], 0, 13)
    }

    pub fn last_array(&self) -> u32 {
        bits(self.raw[5], 13, 13)
    }

    pub fn is_layered(&self) -> bool {
        self.last_array() > self.base_array()
    }

    /// The view type a shader is compiled against.
    ///
    /// Array types that expose a single layer are bound as their non-array counterpart.
    pub fn bound_type(&self) -> ImageType {
        let ty = self.image_type();
        if self.is_layered() {
            return ty;
        }
        match ty {
            ImageType::Color1DArray => ImageType::Color1D,
            ImageType::Color2DArray => ImageType::Color2D,
            ImageType::Color2DMsaaArray => ImageType::Color2DMsaa,
            other => other,
        }
    }

    pub fn number_conversion(&self) -> NumberConversion {
        NumberConversion::for_format(self.data_format(), self.number_format())
    }

    pub fn is_valid(&self) -> bool {
        self.image_type() != ImageType::Invalid
    }

    pub fn is_null(&self) -> bool {
        !self.is_valid() || self.base_address() == 0
    }
}
