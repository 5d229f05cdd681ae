//! Tessellator configuration enums (`VGT_TF_PARAM`).

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TessellationType {
    Isoline,
    #[default]
    Triangle,
    Quad,
}

impl TessellationType {
    pub fn from_raw(raw: u32) -> Self {
        match raw & 0x3 {
            0 => Self::Isoline,
            2 => Self::Quad,
            _ => Self::Triangle,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TessellationPartitioning {
    #[default]
    Integer,
    Pow2,
    FracOdd,
    FracEven,
}

impl TessellationPartitioning {
    pub fn from_raw(raw: u32) -> Self {
        match raw & 0x7 {
            1 => Self::Pow2,
            2 => Self::FracOdd,
            3 => Self::FracEven,
            _ => Self::Integer,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TessellationTopology {
    Point,
    Line,
    #[default]
    TriangleCw,
    TriangleCcw,
}

impl TessellationTopology {
    pub fn from_raw(raw: u32) -> Self {
        match raw & 0x7 {
            0 => Self::Point,
            1 => Self::Line,
            3 => Self::TriangleCcw,
            _ => Self::TriangleCw,
        }
    }
}

/// Decoded `VGT_TF_PARAM` register.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TessellationParams {
    pub ty: TessellationType,
    pub partitioning: TessellationPartitioning,
    pub topology: TessellationTopology,
}

impl TessellationParams {
    pub fn from_vgt_tf_param(value: u32) -> Self {
        Self {
            ty: TessellationType::from_raw(crate::bits(value, 0, 2)),
            partitioning: TessellationPartitioning::from_raw(crate::bits(value, 2, 3)),
            topology: TessellationTopology::from_raw(crate::bits(value, 5, 3)),
        }
    }
}
