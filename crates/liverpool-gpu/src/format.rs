//! Numeric and data formats shared by buffer and image descriptors.

/// Per-component numeric interpretation (`NUM_FORMAT` / `NFMT`).
///
/// Buffers encode this in 3 bits and images in 4, so the buffer range is a prefix of the image
/// range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    #[default]
    Unorm,
    Snorm,
    Uscaled,
    Sscaled,
    Uint,
    Sint,
    SnormNz,
    Float,
    Srgb,
    Ubnorm,
    UbnormNz,
    Ubint,
    Ubscaled,
    /// Encodings the hardware documents as reserved.
    Reserved(u8),
}

impl NumberFormat {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Unorm,
            1 => Self::Snorm,
            2 => Self::Uscaled,
            3 => Self::Sscaled,
            4 => Self::Uint,
            5 => Self::Sint,
            6 => Self::SnormNz,
            7 => Self::Float,
            9 => Self::Srgb,
            10 => Self::Ubnorm,
            11 => Self::UbnormNz,
            12 => Self::Ubint,
            13 => Self::Ubscaled,
            other => Self::Reserved(other as u8),
        }
    }

    /// The class of values a shader observes when reading this format.
    ///
    /// Scaled formats are converted to floating point by the fetch unit, so only the pure integer
    /// formats produce integer classes.
    pub fn class(self) -> NumberClass {
        match self {
            Self::Sint => NumberClass::Sint,
            Self::Uint | Self::Ubint => NumberClass::Uint,
            _ => NumberClass::Float,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Sint | Self::Uint | Self::Ubint)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NumberClass {
    #[default]
    Float,
    Sint,
    Uint,
}

/// Fix-up a shader must apply after a read because the host API has no equivalent format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NumberConversion {
    #[default]
    None,
    UintToUscaled,
    SintToSscaled,
    UnormToUbnorm,
    Sint8ToSnormNz,
    Sint16ToSnormNz,
    Uint32ToUnorm,
}

impl NumberConversion {
    pub fn for_format(data_format: DataFormat, num_format: NumberFormat) -> Self {
        match num_format {
            NumberFormat::Uscaled => Self::UintToUscaled,
            NumberFormat::Sscaled => Self::SintToSscaled,
            NumberFormat::Ubnorm | NumberFormat::UbnormNz => Self::UnormToUbnorm,
            NumberFormat::SnormNz => match data_format.component_bits() {
                Some(8) => Self::Sint8ToSnormNz,
                Some(16) => Self::Sint16ToSnormNz,
                _ => Self::None,
            },
            NumberFormat::Unorm if data_format.component_bits() == Some(32) => {
                Self::Uint32ToUnorm
            }
            _ => Self::None,
        }
    }
}

/// Component layout (`DATA_FORMAT` / `DFMT`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataFormat {
    #[default]
    Invalid = 0,
    Format8 = 1,
    Format16 = 2,
    Format8_8 = 3,
    Format32 = 4,
    Format16_16 = 5,
    Format10_11_11 = 6,
    Format11_11_10 = 7,
    Format10_10_10_2 = 8,
    Format2_10_10_10 = 9,
    Format8_8_8_8 = 10,
    Format32_32 = 11,
    Format16_16_16_16 = 12,
    Format32_32_32 = 13,
    Format32_32_32_32 = 14,
    Format5_6_5 = 16,
    Format1_5_5_5 = 17,
    Format5_5_5_1 = 18,
    Format4_4_4_4 = 19,
    Format8_24 = 20,
    Format24_8 = 21,
    FormatX24_8_32 = 22,
    FormatGbGr = 32,
    FormatBgRg = 33,
    Format5_9_9_9 = 34,
    FormatBc1 = 35,
    FormatBc2 = 36,
    FormatBc3 = 37,
    FormatBc4 = 38,
    FormatBc5 = 39,
    FormatBc6 = 40,
    FormatBc7 = 41,
}

impl DataFormat {
    /// Decodes a raw format field; unknown encodings read as [`DataFormat::Invalid`], which the
    /// hardware treats as an unbound resource.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Format8,
            2 => Self::Format16,
            3 => Self::Format8_8,
            4 => Self::Format32,
            5 => Self::Format16_16,
            6 => Self::Format10_11_11,
            7 => Self::Format11_11_10,
            8 => Self::Format10_10_10_2,
            9 => Self::Format2_10_10_10,
            10 => Self::Format8_8_8_8,
            11 => Self::Format32_32,
            12 => Self::Format16_16_16_16,
            13 => Self::Format32_32_32,
            14 => Self::Format32_32_32_32,
            16 => Self::Format5_6_5,
            17 => Self::Format1_5_5_5,
            18 => Self::Format5_5_5_1,
            19 => Self::Format4_4_4_4,
            20 => Self::Format8_24,
            21 => Self::Format24_8,
            22 => Self::FormatX24_8_32,
            32 => Self::FormatGbGr,
            33 => Self::FormatBgRg,
            34 => Self::Format5_9_9_9,
            35 => Self::FormatBc1,
            36 => Self::FormatBc2,
            37 => Self::FormatBc3,
            38 => Self::FormatBc4,
            39 => Self::FormatBc5,
            40 => Self::FormatBc6,
            41 => Self::FormatBc7,
            _ => Self::Invalid,
        }
    }

    /// Bit width of each component for formats with uniform component sizes.
    pub fn component_bits(self) -> Option<u32> {
        match self {
            Self::Format8 | Self::Format8_8 | Self::Format8_8_8_8 => Some(8),
            Self::Format16 | Self::Format16_16 | Self::Format16_16_16_16 => Some(16),
            Self::Format32 | Self::Format32_32 | Self::Format32_32_32 | Self::Format32_32_32_32 => {
                Some(32)
            }
            _ => None,
        }
    }

    pub fn num_components(self) -> u32 {
        match self {
            Self::Invalid => 0,
            Self::Format8 | Self::Format16 | Self::Format32 => 1,
            Self::Format8_8
            | Self::Format16_16
            | Self::Format32_32
            | Self::Format8_24
            | Self::Format24_8
            | Self::FormatX24_8_32 => 2,
            Self::Format10_11_11
            | Self::Format11_11_10
            | Self::Format32_32_32
            | Self::Format5_6_5
            | Self::Format5_9_9_9 => 3,
            _ => 4,
        }
    }

    pub fn is_block_compressed(self) -> bool {
        (Self::FormatBc1 as u8..=Self::FormatBc7 as u8).contains(&(self as u8))
    }
}
