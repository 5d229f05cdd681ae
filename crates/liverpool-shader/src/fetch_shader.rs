//! Vertex fetch shader decoding.
//!
//! The guest driver splits vertex attribute loads out of the vertex shader into a small
//! subroutine the shader calls through `s_swappc`. The subroutine only ever contains V# loads,
//! buffer fetches, offset adds and waits, so decoding that subset is enough to recover the
//! attribute layout.

use liverpool_gpu::{BufferSharp, GuestMemory};

use crate::descriptor::{DescriptorTable, SharpLocation};
use crate::error::FetchShaderError;
use crate::info::{read_buffer_sharp, Info, SharpResource};

pub const MAX_FETCH_SHADER_DWORDS: usize = 256;

/// Which index the hardware feeds into an attribute fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InstanceIdType {
    /// Per-vertex data.
    #[default]
    None,
    OverStepRate0,
    OverStepRate1,
    Plain,
}

impl InstanceIdType {
    fn from_index_vgpr(vgpr: u32) -> Option<Self> {
        Some(match vgpr {
            0 => Self::None,
            1 => Self::OverStepRate0,
            2 => Self::OverStepRate1,
            3 => Self::Plain,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Attribute index in fetch order.
    pub semantic: u8,
    pub dest_vgpr: u8,
    pub num_elements: u8,
    /// User-data SGPR pair holding the vertex buffer table pointer.
    pub sgpr_base: u8,
    /// Offset of this attribute's V# within the table, in dwords.
    pub dword_offset: u8,
    pub instance_data: InstanceIdType,
}

impl VertexAttribute {
    pub fn location(&self) -> SharpLocation {
        SharpLocation::Indirect {
            pointer: u16::from(self.sgpr_base),
            dword_offset: u32::from(self.dword_offset),
        }
    }

    pub fn uses_step_rates(&self) -> bool {
        matches!(
            self.instance_data,
            InstanceIdType::OverStepRate0 | InstanceIdType::OverStepRate1
        )
    }
}

impl SharpResource for VertexAttribute {
    type Sharp = BufferSharp;

    fn get_sharp(&self, table: &DescriptorTable<'_>) -> Option<BufferSharp> {
        read_buffer_sharp(table, self.location())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FetchShaderData {
    pub attributes: Vec<VertexAttribute>,
    pub vertex_offset_sgpr: Option<u8>,
    pub instance_offset_sgpr: Option<u8>,
}

const SMRD_ENCODING: u32 = 0b11000;
const MUBUF_ENCODING: u32 = 0b111000;
const MTBUF_ENCODING: u32 = 0b111010;
const SOPP_ENCODING: u32 = 0b1_0111_1111;
const SOP1_ENCODING: u32 = 0b1_0111_1101;

const S_LOAD_DWORDX4: u32 = 2;
const S_MOV_B32: u32 = 0x03;
const S_SETPC_B64: u32 = 0x20;
const V_ADD_I32: u32 = 0x25;
const LITERAL_CONST: u32 = 255;
/// Last SGPR encoding in the VOP `src0` operand space.
const SGPR_MAX: u32 = 103;

const fn field(word: u32, shift: u32, width: u32) -> u32 {
    (word >> shift) & ((1 << width) - 1)
}

struct Cursor<'a> {
    memory: &'a dyn GuestMemory,
    base: u64,
    offset: usize,
}

impl Cursor<'_> {
    fn next(&mut self) -> Result<u32, FetchShaderError> {
        if self.offset >= MAX_FETCH_SHADER_DWORDS {
            return Err(FetchShaderError::TooLong {
                max: MAX_FETCH_SHADER_DWORDS,
            });
        }
        let gpa = self.base + self.offset as u64 * 4;
        let mut word = [0u32; 1];
        self.memory
            .read_dwords(gpa, &mut word)
            .map_err(|_| match self.offset {
                0 => FetchShaderError::Unreadable { gpa },
                offset => FetchShaderError::Truncated { offset },
            })?;
        self.offset += 1;
        Ok(word[0])
    }
}

/// V# loaded by `s_load_dwordx4` into four consecutive SGPRs.
#[derive(Clone, Copy)]
struct LoadedSharp {
    sdst: u32,
    sbase: u32,
    dword_offset: u32,
}

/// Decodes the fetch shader `info` calls, if it has one.
///
/// Returns `Ok(None)` for programs without a fetch shader.
pub fn parse_fetch_shader(
    info: &Info,
    table: &DescriptorTable<'_>,
) -> Result<Option<FetchShaderData>, FetchShaderError> {
    let Some(pointer) = info.fetch_shader else {
        return Ok(None);
    };
    let base = table
        .read_pointer(pointer)
        .ok_or(FetchShaderError::MissingPointer)?;
    decode(table.memory, base).map(Some)
}

fn decode(memory: &dyn GuestMemory, base: u64) -> Result<FetchShaderData, FetchShaderError> {
    let mut cursor = Cursor {
        memory,
        base,
        offset: 0,
    };
    let mut data = FetchShaderData::default();
    let mut loads: Vec<LoadedSharp> = Vec::new();

    loop {
        let offset = cursor.offset;
        let word = cursor.next()?;

        if field(word, 23, 9) == SOP1_ENCODING {
            match field(word, 8, 8) {
                S_SETPC_B64 => return Ok(data),
                S_MOV_B32 => continue,
                _ => return Err(FetchShaderError::UnsupportedInstruction { word, offset }),
            }
        }
        if field(word, 23, 9) == SOPP_ENCODING {
            // s_waitcnt, s_nop
            continue;
        }
        if field(word, 27, 5) == SMRD_ENCODING {
            let op = field(word, 22, 5);
            let imm = field(word, 8, 1) != 0;
            if op != S_LOAD_DWORDX4 || !imm {
                return Err(FetchShaderError::UnsupportedInstruction { word, offset });
            }
            let load = LoadedSharp {
                sdst: field(word, 15, 7),
                sbase: field(word, 9, 6) * 2,
                dword_offset: field(word, 0, 8),
            };
            // A later load into the same registers replaces the earlier V#.
            loads.retain(|prev| prev.sdst != load.sdst);
            loads.push(load);
            continue;
        }
        let enc6 = field(word, 26, 6);
        if enc6 == MUBUF_ENCODING || enc6 == MTBUF_ENCODING {
            let op = if enc6 == MUBUF_ENCODING {
                field(word, 18, 7)
            } else {
                field(word, 16, 3)
            };
            let word1 = cursor.next()?;
            // buffer_load_format_{x,xy,xyz,xyzw} / tbuffer_load_format_{x,xy,xyz,xyzw}
            if op > 3 {
                return Err(FetchShaderError::UnsupportedInstruction { word, offset });
            }
            let vaddr = field(word1, 0, 8);
            let vdata = field(word1, 8, 8);
            let srsrc = field(word1, 16, 5) * 4;

            let load = loads
                .iter()
                .find(|load| load.sdst == srsrc)
                .ok_or(FetchShaderError::UnknownResource {
                    sgpr: srsrc,
                    offset,
                })?;
            let instance_data = InstanceIdType::from_index_vgpr(vaddr)
                .ok_or(FetchShaderError::UnsupportedInstruction { word, offset })?;

            data.attributes.push(VertexAttribute {
                semantic: data.attributes.len() as u8,
                dest_vgpr: vdata as u8,
                num_elements: (op + 1) as u8,
                sgpr_base: load.sbase as u8,
                dword_offset: load.dword_offset as u8,
                instance_data,
            });
            continue;
        }
        if field(word, 31, 1) == 0 {
            // VOP2
            let op = field(word, 25, 6);
            let vdst = field(word, 17, 8);
            let src0 = field(word, 0, 9);
            if src0 == LITERAL_CONST {
                cursor.next()?;
            }
            if op != V_ADD_I32 {
                return Err(FetchShaderError::UnsupportedInstruction { word, offset });
            }
            if src0 <= SGPR_MAX {
                match vdst {
                    0 => data.vertex_offset_sgpr = Some(src0 as u8),
                    3 => data.instance_offset_sgpr = Some(src0 as u8),
                    _ => {}
                }
            }
            continue;
        }
        return Err(FetchShaderError::UnsupportedInstruction { word, offset });
    }
}
