use crate::bits;

/// Source of one destination component (`DST_SEL_*`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompSwizzle {
    #[default]
    Zero,
    One,
    Red,
    Green,
    Blue,
    Alpha,
}

impl CompSwizzle {
    /// Encodings 2 and 3 are reserved and read back as zero.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::One,
            4 => Self::Red,
            5 => Self::Green,
            6 => Self::Blue,
            7 => Self::Alpha,
            _ => Self::Zero,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Red => 4,
            Self::Green => 5,
            Self::Blue => 6,
            Self::Alpha => 7,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompMapping {
    pub r: CompSwizzle,
    pub g: CompSwizzle,
    pub b: CompSwizzle,
    pub a: CompSwizzle,
}

impl CompMapping {
    pub const IDENTITY: Self = Self {
        r: CompSwizzle::Red,
        g: CompSwizzle::Green,
        b: CompSwizzle::Blue,
        a: CompSwizzle::Alpha,
    };

    /// Decodes the four 3-bit selectors packed from bit 0 of `dword`.
    pub(crate) fn from_dword(dword: u32) -> Self {
        Self {
            r: CompSwizzle::from_raw(bits(dword, 0, 3)),
            g: CompSwizzle::from_raw(bits(dword, 3, 3)),
            b: CompSwizzle::from_raw(bits(dword, 6, 3)),
            a: CompSwizzle::from_raw(bits(dword, 9, 3)),
        }
    }

    pub(crate) fn to_bits(self) -> u32 {
        self.r.raw() | (self.g.raw() << 3) | (self.b.raw() << 6) | (self.a.raw() << 9)
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

impl std::fmt::Display for CompMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ch = |s: CompSwizzle| match s {
            CompSwizzle::Zero => '0',
            CompSwizzle::One => '1',
            CompSwizzle::Red => 'r',
            CompSwizzle::Green => 'g',
            CompSwizzle::Blue => 'b',
            CompSwizzle::Alpha => 'a',
        };
        write!(f, "{}{}{}{}", ch(self.r), ch(self.g), ch(self.b), ch(self.a))
    }
}
