//! Static analysis results for one shader program.
//!
//! An [`Info`] is produced once per distinct bytecode blob and lists every resource the program
//! may touch. It knows *where* each sharp lives, never what is currently bound there.

use std::fmt;

use liverpool_gpu::{BufferSharp, GuestMemoryError, ImageSharp, SamplerSharp};
use tracing::trace;

use crate::descriptor::{DescriptorTable, SharpLocation};
use crate::error::SpecializationError;
use crate::profile::Profile;
use crate::stage::{LogicalStage, Stage};
use crate::tess_constants::TessellationDataConstantBuffer;

/// Content hash of a program's bytecode. Identifies an [`Info`] in the program cache.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHash(blake3::Hash);

impl ShaderHash {
    pub fn of_code(code: &[u32]) -> Self {
        Self(blake3::hash(bytemuck::cast_slice(code)))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl From<[u8; 32]> for ShaderHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(blake3::Hash::from(bytes))
    }
}

impl fmt::Debug for ShaderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShaderHash({})", &self.0.to_hex()[..16])
    }
}

impl fmt::Display for ShaderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

/// Reads the live sharp behind a resource descriptor.
pub trait SharpResource {
    type Sharp;

    /// `None` when nothing is bound to the slot.
    fn get_sharp(&self, table: &DescriptorTable<'_>) -> Option<Self::Sharp>;
}

/// A sharp either read from live state or embedded in the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SharpSource<S> {
    Location(SharpLocation),
    Inline(S),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferResource {
    pub source: SharpSource<BufferSharp>,
    pub is_written: bool,
    /// Accessed through typed (`buffer_load_format`) instructions.
    pub is_formatted: bool,
}

impl BufferResource {
    pub fn at(location: SharpLocation) -> Self {
        Self {
            source: SharpSource::Location(location),
            is_written: false,
            is_formatted: false,
        }
    }

    pub fn inline_cbuf(sharp: BufferSharp) -> Self {
        Self {
            source: SharpSource::Inline(sharp),
            is_written: false,
            is_formatted: false,
        }
    }

    pub fn written(mut self) -> Self {
        self.is_written = true;
        self
    }

    /// Written buffers, and buffers too large for a uniform binding, are bound as storage.
    pub fn is_storage(&self, sharp: &BufferSharp, profile: &Profile) -> bool {
        self.is_written || sharp.size() > profile.max_ubo_size
    }
}

impl SharpResource for BufferResource {
    type Sharp = BufferSharp;

    fn get_sharp(&self, table: &DescriptorTable<'_>) -> Option<BufferSharp> {
        match self.source {
            SharpSource::Inline(sharp) => Some(sharp),
            SharpSource::Location(location) => read_buffer_sharp(table, location),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureBufferResource {
    pub location: SharpLocation,
    pub is_written: bool,
}

impl TextureBufferResource {
    pub fn at(location: SharpLocation) -> Self {
        Self {
            location,
            is_written: false,
        }
    }
}

impl SharpResource for TextureBufferResource {
    type Sharp = BufferSharp;

    fn get_sharp(&self, table: &DescriptorTable<'_>) -> Option<BufferSharp> {
        read_buffer_sharp(table, self.location)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageResource {
    pub location: SharpLocation,
    pub is_written: bool,
    pub is_atomic: bool,
    pub is_array: bool,
    pub is_depth: bool,
    /// The program loads only the first four dwords of the T#.
    pub is_r128: bool,
}

impl ImageResource {
    pub fn at(location: SharpLocation) -> Self {
        Self {
            location,
            is_written: false,
            is_atomic: false,
            is_array: false,
            is_depth: false,
            is_r128: false,
        }
    }

    pub fn written(mut self) -> Self {
        self.is_written = true;
        self
    }

    pub fn is_storage(&self, _sharp: &ImageSharp) -> bool {
        self.is_written || self.is_atomic
    }
}

impl SharpResource for ImageResource {
    type Sharp = ImageSharp;

    fn get_sharp(&self, table: &DescriptorTable<'_>) -> Option<ImageSharp> {
        read_image_sharp(table, self.location, self.is_r128)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FMaskResource {
    pub location: SharpLocation,
}

impl SharpResource for FMaskResource {
    type Sharp = ImageSharp;

    fn get_sharp(&self, table: &DescriptorTable<'_>) -> Option<ImageSharp> {
        read_image_sharp(table, self.location, false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SamplerResource {
    pub source: SharpSource<SamplerSharp>,
}

impl SamplerResource {
    pub fn at(location: SharpLocation) -> Self {
        Self {
            source: SharpSource::Location(location),
        }
    }

    pub fn inline(sharp: SamplerSharp) -> Self {
        Self {
            source: SharpSource::Inline(sharp),
        }
    }
}

impl SharpResource for SamplerResource {
    type Sharp = SamplerSharp;

    // An all-zero S# is a valid point-clamp sampler, so only a failed read counts as unbound.
    fn get_sharp(&self, table: &DescriptorTable<'_>) -> Option<SamplerSharp> {
        match self.source {
            SharpSource::Inline(sharp) => Some(sharp),
            SharpSource::Location(location) => table
                .read_dwords::<{ SamplerSharp::DWORDS }>(location)
                .map(SamplerSharp::from_dwords),
        }
    }
}

pub(crate) fn read_buffer_sharp(
    table: &DescriptorTable<'_>,
    location: SharpLocation,
) -> Option<BufferSharp> {
    let sharp = BufferSharp::from_dwords(table.read_dwords::<{ BufferSharp::DWORDS }>(location)?);
    if sharp.is_null() {
        trace!(?location, "unbound buffer sharp");
        return None;
    }
    Some(sharp)
}

fn read_image_sharp(
    table: &DescriptorTable<'_>,
    location: SharpLocation,
    is_r128: bool,
) -> Option<ImageSharp> {
    let sharp = if is_r128 {
        ImageSharp::from_r128(table.read_dwords::<4>(location)?)
    } else {
        ImageSharp::from_dwords(table.read_dwords::<{ ImageSharp::DWORDS }>(location)?)
    };
    if sharp.is_null() {
        trace!(?location, "unbound image sharp");
        return None;
    }
    Some(sharp)
}

/// Where the tessellation data constants live: `dword_offset` dwords into the buffer whose V#
/// sits at `buffer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TessConstantsLocation {
    pub buffer: SharpLocation,
    pub dword_offset: u32,
}

#[derive(Clone, Debug)]
pub struct Info {
    pub hash: ShaderHash,
    pub stage: Stage,
    pub l_stage: LogicalStage,
    pub buffers: Vec<BufferResource>,
    pub texture_buffers: Vec<TextureBufferResource>,
    pub images: Vec<ImageResource>,
    pub fmasks: Vec<FMaskResource>,
    pub samplers: Vec<SamplerResource>,
    /// The program reads constants through an implicit buffer bound ahead of its own buffers.
    pub has_readconst: bool,
    /// User-data SGPR pair holding the fetch shader address.
    pub fetch_shader: Option<u16>,
    pub tess_constants: Option<TessConstantsLocation>,
}

impl Info {
    pub fn new(hash: ShaderHash, stage: Stage, l_stage: LogicalStage) -> Self {
        Self {
            hash,
            stage,
            l_stage,
            buffers: Vec::new(),
            texture_buffers: Vec::new(),
            images: Vec::new(),
            fmasks: Vec::new(),
            samplers: Vec::new(),
            has_readconst: false,
            fetch_shader: None,
            tess_constants: None,
        }
    }

    pub fn read_tess_constant_buffer(
        &self,
        table: &DescriptorTable<'_>,
    ) -> Result<TessellationDataConstantBuffer, SpecializationError> {
        let location = self
            .tess_constants
            .ok_or(SpecializationError::MissingTessConstants)?;
        let sharp = read_buffer_sharp(table, location.buffer)
            .ok_or(SpecializationError::MissingTessConstants)?;

        let len = TessellationDataConstantBuffer::SIZE;
        let gpa = sharp
            .base_address()
            .checked_add(u64::from(location.dword_offset) * 4)
            .ok_or(SpecializationError::TessConstantsRead(GuestMemoryError {
                gpa: sharp.base_address(),
                len,
            }))?;
        let mut bytes = [0u8; TessellationDataConstantBuffer::SIZE];
        table
            .memory
            .read(gpa, &mut bytes)
            .map_err(SpecializationError::TessConstantsRead)?;
        Ok(TessellationDataConstantBuffer::from_bytes(&bytes))
    }
}
