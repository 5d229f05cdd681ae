use crate::bits;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClampMode {
    #[default]
    Wrap,
    Mirror,
    ClampLastTexel,
    MirrorOnceLastTexel,
    ClampHalfBorder,
    MirrorOnceHalfBorder,
    ClampBorder,
    MirrorOnceBorder,
}

impl ClampMode {
    fn from_raw(raw: u32) -> Self {
        match raw & 0x7 {
            0 => Self::Wrap,
            1 => Self::Mirror,
            2 => Self::ClampLastTexel,
            3 => Self::MirrorOnceLastTexel,
            4 => Self::ClampHalfBorder,
            5 => Self::MirrorOnceHalfBorder,
            6 => Self::ClampBorder,
            _ => Self::MirrorOnceBorder,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    #[default]
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl DepthCompare {
    fn from_raw(raw: u32) -> Self {
        match raw & 0x7 {
            0 => Self::Never,
            1 => Self::Less,
            2 => Self::Equal,
            3 => Self::LessEqual,
            4 => Self::Greater,
            5 => Self::NotEqual,
            6 => Self::GreaterEqual,
            _ => Self::Always,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    #[default]
    Point,
    Bilinear,
    AnisoPoint,
    AnisoLinear,
}

impl FilterMode {
    fn from_raw(raw: u32) -> Self {
        match raw & 0x3 {
            0 => Self::Point,
            1 => Self::Bilinear,
            2 => Self::AnisoPoint,
            _ => Self::AnisoLinear,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MipFilter {
    #[default]
    None,
    Point,
    Linear,
}

impl MipFilter {
    fn from_raw(raw: u32) -> Self {
        match raw & 0x3 {
            1 => Self::Point,
            2 => Self::Linear,
            _ => Self::None,
        }
    }
}

/// Sampler descriptor (S#), four dwords.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SamplerSharp {
    raw: [u32; 4],
}

impl SamplerSharp {
    pub const DWORDS: usize = 4;

    pub const fn from_dwords(raw: [u32; 4]) -> Self {
        Self { raw }
    }

    pub const fn dwords(&self) -> [u32; 4] {
        self.raw
    }

    pub fn clamp_x(&self) -> ClampMode {
        ClampMode::from_raw(bits(self.raw[0], 0, 3))
    }

    pub fn clamp_y(&self) -> ClampMode {
        ClampMode::from_raw(bits(self.raw[0], 3, 3))
    }

    pub fn clamp_z(&self) -> ClampMode {
        ClampMode::from_raw(bits(self.raw[0], 6, 3))
    }

    /// Max anisotropy as a power of two (`1 << ratio`).
    pub fn max_aniso_ratio(&self) -> u32 {
        bits(self.raw[0], 9, 3)
    }

    pub fn depth_compare(&self) -> DepthCompare {
        DepthCompare::from_raw(bits(self.raw[0], 12, 3))
    }

    /// Texture coordinates are in texels rather than `[0, 1]`.
    pub fn force_unnormalized(&self) -> bool {
        bits(self.raw[0], 15, 1) != 0
    }

    pub fn force_degamma(&self) -> bool {
        bits(self.raw[0], 20, 1) != 0
    }

    pub fn min_lod(&self) -> u32 {
        bits(self.raw[1], 0, 12)
    }

    pub fn max_lod(&self) -> u32 {
        bits(self.raw[1], 12, 12)
    }

    pub fn mag_filter(&self) -> FilterMode {
        FilterMode::from_raw(bits(self.raw[2], 20, 2))
    }

    pub fn min_filter(&self) -> FilterMode {
        FilterMode::from_raw(bits(self.raw[2], 22, 2))
    }

    pub fn mip_filter(&self) -> MipFilter {
        MipFilter::from_raw(bits(self.raw[2], 26, 2))
    }

    pub fn border_color_ptr(&self) -> u32 {
        bits(self.raw[3], 0, 12)
    }

    pub fn border_color_type(&self) -> u32 {
        bits(self.raw[3], 30, 2)
    }
}
