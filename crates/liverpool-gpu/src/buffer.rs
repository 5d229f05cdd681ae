use crate::format::{DataFormat, NumberConversion, NumberFormat};
use crate::swizzle::CompMapping;
use crate::bits;

/// Buffer resource descriptor (V#), four dwords.
///
/// | dword | bits    | field                      |
/// |-------|---------|----------------------------|
/// | 0     | 31:0    | base address [31:0]        |
/// | 1     | 11:0    | base address [43:32]       |
/// | 1     | 29:16   | stride                     |
/// | 1     | 30      | cache swizzle              |
/// | 1     | 31      | swizzle enable             |
/// | 2     | 31:0    | num records                |
/// | 3     | 11:0    | dst_sel x/y/z/w            |
/// | 3     | 14:12   | num format                 |
/// | 3     | 18:15   | data format                |
/// | 3     | 22:21   | index stride               |
/// | 3     | 23      | add tid enable             |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BufferSharp {
    raw: [u32; 4],
}

impl BufferSharp {
    pub const DWORDS: usize = 4;

    pub const fn from_dwords(raw: [u32; 4]) -> Self {
        Self { raw }
    }

    pub const fn dwords(&self) -> [u32; 4] {
        self.raw
    }

    pub fn base_address(&self) -> u64 {
        u64::from(self.raw[0]) | (u64::from(bits(self.raw[1], 0, 12)) << 32)
    }

    pub fn stride(&self) -> u32 {
        bits(self.raw[1], 16, 14)
    }

    pub fn swizzle_enabled(&self) -> bool {
        bits(self.raw[1], 31, 1) != 0
    }

    pub fn num_records(&self) -> u32 {
        self.raw[2]
    }

    /// Size in bytes addressable through this descriptor.
    ///
    /// With a zero stride `num_records` counts bytes; otherwise it counts elements.
    pub fn size(&self) -> u32 {
        match self.stride() {
            0 => self.num_records(),
            stride => stride.saturating_mul(self.num_records()),
        }
    }

    pub fn dst_select(&self) -> CompMapping {
        CompMapping::from_dword(self.raw[3])
    }

    pub fn number_format(&self) -> NumberFormat {
        NumberFormat::from_raw(bits(self.raw[3], 12, 3))
    }

    pub fn data_format(&self) -> DataFormat {
        DataFormat::from_raw(bits(self.raw[3], 15, 4))
    }

    pub fn index_stride(&self) -> u32 {
        8 << bits(self.raw[3], 21, 2)
    }

    pub fn add_tid_enabled(&self) -> bool {
        bits(self.raw[3], 23, 1) != 0
    }

    pub fn number_conversion(&self) -> NumberConversion {
        NumberConversion::for_format(self.data_format(), self.number_format())
    }

    /// A descriptor with no address and no records has never been written by the guest.
    pub fn is_null(&self) -> bool {
        self.base_address() == 0 && self.num_records() == 0
    }
}
