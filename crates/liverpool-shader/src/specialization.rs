//! Permutation keys.
//!
//! A [`StageSpecialization`] captures exactly the bound-resource facts that change the code
//! generated for a program: strides, storage-vs-uniform binding, number classes, swizzles,
//! image dimensionality and the tessellation layout. Two specializations of the same program
//! that [match](StageSpecialization::matches) can share a compiled module.

use std::hash::{Hash, Hasher};

use liverpool_gpu::{
    BufferSharp, CompMapping, ImageSharp, ImageType, NumberClass, NumberConversion, SamplerSharp,
};
use tracing::{debug, warn};
use xxhash_rust::xxh3::Xxh3;

use crate::bindings::{BindingMask, Bindings, MAX_STAGE_RESOURCES};
use crate::descriptor::DescriptorTable;
use crate::error::SpecializationError;
use crate::fetch_shader::{parse_fetch_shader, FetchShaderData};
use crate::info::{
    BufferResource, ImageResource, Info, SamplerResource, ShaderHash, SharpResource,
    TextureBufferResource,
};
use crate::profile::Profile;
use crate::runtime_info::{RuntimeInfo, StageRuntimeInfo};
use crate::stage::{LogicalStage, Stage};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VsAttribSpecialization {
    pub num_class: NumberClass,
}

impl VsAttribSpecialization {
    fn extract(&mut self, sharp: BufferSharp) {
        self.num_class = sharp.number_format().class();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BufferSpecialization {
    pub stride: u32,
    pub is_storage: bool,
    /// Only recorded for uniform buffers; storage buffers are sized at runtime.
    pub size: u32,
}

impl BufferSpecialization {
    fn extract(&mut self, desc: &BufferResource, sharp: BufferSharp, profile: &Profile) {
        self.stride = sharp.stride();
        self.is_storage = desc.is_storage(&sharp, profile);
        if !self.is_storage {
            self.size = sharp.size();
        }
    }
}

impl PartialEq for BufferSpecialization {
    fn eq(&self, other: &Self) -> bool {
        self.stride == other.stride
            && self.is_storage == other.is_storage
            && (self.is_storage || self.size == other.size)
    }
}

impl Eq for BufferSpecialization {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureBufferSpecialization {
    pub is_integer: bool,
    pub dst_select: CompMapping,
    pub num_conversion: NumberConversion,
}

impl TextureBufferSpecialization {
    fn extract(&mut self, sharp: BufferSharp) {
        self.is_integer = sharp.number_format().is_integer();
        self.dst_select = sharp.dst_select();
        self.num_conversion = sharp.number_conversion();
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageSpecialization {
    pub ty: ImageType,
    pub is_integer: bool,
    pub is_storage: bool,
    /// Sampled reads are swizzled by the texture unit, so this is left at identity for them.
    pub dst_select: CompMapping,
    pub num_conversion: NumberConversion,
}

impl ImageSpecialization {
    fn extract(&mut self, desc: &ImageResource, sharp: ImageSharp) {
        self.ty = sharp.bound_type();
        self.is_integer = sharp.number_format().is_integer();
        self.is_storage = desc.is_storage(&sharp);
        if self.is_storage {
            self.dst_select = sharp.dst_select();
        }
        self.num_conversion = sharp.number_conversion();
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FMaskSpecialization {
    pub width: u32,
    pub height: u32,
}

impl FMaskSpecialization {
    fn extract(&mut self, sharp: ImageSharp) {
        self.width = sharp.width();
        self.height = sharp.height();
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SamplerSpecialization {
    pub force_unnormalized: bool,
}

impl SamplerSpecialization {
    fn extract(&mut self, sharp: SamplerSharp) {
        self.force_unnormalized = sharp.force_unnormalized();
    }
}

/// Permutation key for one program against the resources bound for one draw or dispatch.
///
/// Every per-kind list is index-aligned with the matching list of the program's [`Info`]; an
/// unbound slot keeps its default entry and leaves its bit in [`bound`](Self::bound) clear.
/// Binding slots are numbered across buffers, texture buffers, images and fmasks in that order,
/// after slot 0 when the program has an implicit constant buffer. Samplers are not numbered.
#[derive(Clone, Debug)]
pub struct StageSpecialization {
    program: ShaderHash,
    has_readconst: bool,
    pub runtime_info: RuntimeInfo,
    pub fetch_shader_data: Option<FetchShaderData>,
    pub vs_attribs: Vec<VsAttribSpecialization>,
    pub bound: BindingMask,
    pub buffers: Vec<BufferSpecialization>,
    pub tex_buffers: Vec<TextureBufferSpecialization>,
    pub images: Vec<ImageSpecialization>,
    pub fmasks: Vec<FMaskSpecialization>,
    pub samplers: Vec<SamplerSpecialization>,
    pub start: Bindings,
}

impl StageSpecialization {
    /// Builds the key for `info` against the live state in `table`.
    pub fn new(
        info: &Info,
        runtime_info: RuntimeInfo,
        profile: &Profile,
        start: Bindings,
        table: &DescriptorTable<'_>,
    ) -> Result<Self, SpecializationError> {
        SpecializationBuilder::new(info, runtime_info, profile, start)
            .extract(table)?
            .finish(table)
    }

    /// Content hash of the program this key was built for.
    pub fn program(&self) -> ShaderHash {
        self.program
    }

    pub fn has_readconst(&self) -> bool {
        self.has_readconst
    }

    /// Whether a module compiled for `self` is valid for the resources described by `other`.
    ///
    /// Resource entries are compared only at slots `other` had bound. The relation is
    /// directional: `a.matches(&b)` does not imply `b.matches(&a)`. Both keys must come from the
    /// same program under the same profile; mismatched list lengths panic.
    pub fn matches(&self, other: &Self) -> bool {
        if self.start != other.start
            || self.runtime_info != other.runtime_info
            || self.fetch_shader_data != other.fetch_shader_data
        {
            return false;
        }
        assert_eq!(
            self.vs_attribs.len(),
            other.vs_attribs.len(),
            "vertex attribute specializations are not aligned"
        );
        if self.vs_attribs != other.vs_attribs {
            return false;
        }
        if self.has_readconst != other.has_readconst {
            return false;
        }

        let mut binding = u32::from(self.has_readconst);
        let mask = other.bound;
        gated_eq(&mut binding, mask, &self.buffers, &other.buffers)
            && gated_eq(&mut binding, mask, &self.tex_buffers, &other.tex_buffers)
            && gated_eq(&mut binding, mask, &self.images, &other.images)
            && gated_eq(&mut binding, mask, &self.fmasks, &other.fmasks)
            && {
                assert_eq!(
                    self.samplers.len(),
                    other.samplers.len(),
                    "sampler specializations are not aligned"
                );
                self.samplers == other.samplers
            }
    }

    /// Hash of the fields [`matches`](Self::matches) compares unconditionally.
    ///
    /// Matching keys always share a bucket hash, so a table may bucket on it and run `matches`
    /// within the bucket.
    pub fn bucket_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        self.start.hash(&mut hasher);
        self.runtime_info.hash(&mut hasher);
        self.fetch_shader_data.hash(&mut hasher);
        self.vs_attribs.hash(&mut hasher);
        self.samplers.hash(&mut hasher);
        self.has_readconst.hash(&mut hasher);
        hasher.finish()
    }
}

fn gated_eq<T: PartialEq>(binding: &mut u32, mask: BindingMask, ours: &[T], theirs: &[T]) -> bool {
    assert_eq!(
        ours.len(),
        theirs.len(),
        "resource specializations are not aligned"
    );
    ours.iter().zip(theirs).all(|(a, b)| {
        let slot = *binding;
        *binding += 1;
        !mask.test(slot) || a == b
    })
}

/// First phase of specialization: walks the program's resources against live state.
#[derive(Debug)]
pub struct SpecializationBuilder<'a> {
    info: &'a Info,
    runtime_info: RuntimeInfo,
    profile: &'a Profile,
    start: Bindings,
}

/// A specialization whose resource walk is complete but whose runtime info may still need
/// fields derived from guest memory.
#[derive(Debug)]
pub struct ExtractedSpecialization<'a> {
    info: &'a Info,
    spec: StageSpecialization,
}

impl<'a> SpecializationBuilder<'a> {
    pub fn new(
        info: &'a Info,
        runtime_info: RuntimeInfo,
        profile: &'a Profile,
        start: Bindings,
    ) -> Self {
        Self {
            info,
            runtime_info,
            profile,
            start,
        }
    }

    pub fn extract(
        self,
        table: &DescriptorTable<'_>,
    ) -> Result<ExtractedSpecialization<'a>, SpecializationError> {
        let info = self.info;
        let runtime_stage = self.runtime_info.stage.stage();
        if runtime_stage != info.stage {
            return Err(SpecializationError::RuntimeInfoStageMismatch {
                expected: info.stage,
                runtime: runtime_stage,
            });
        }

        let fetch_shader_data = match parse_fetch_shader(info, table) {
            Ok(data) => data,
            Err(err) => {
                warn!(program = %info.hash, "ignoring unparsable fetch shader: {err}");
                None
            }
        };

        // Backends without legacy attribute typing declare inputs with the bound number class,
        // so it becomes part of the key.
        let vs_attribs = match &fetch_shader_data {
            Some(fetch)
                if info.stage == Stage::Vertex
                    && !self.profile.supports_legacy_vertex_attributes() =>
            {
                walk_unmasked(
                    table,
                    &fetch.attributes,
                    |spec: &mut VsAttribSpecialization, _, sharp| spec.extract(sharp),
                )
            }
            _ => Vec::new(),
        };

        let mut walk = MaskedWalk {
            table,
            binding: u32::from(info.has_readconst),
            mask: BindingMask::EMPTY,
        };
        let profile = self.profile;
        let buffers = walk.run(&info.buffers, |spec: &mut BufferSpecialization, desc, sharp| {
            spec.extract(desc, sharp, profile)
        })?;
        let tex_buffers = walk.run(
            &info.texture_buffers,
            |spec: &mut TextureBufferSpecialization, _: &TextureBufferResource, sharp| {
                spec.extract(sharp)
            },
        )?;
        let images = walk.run(&info.images, |spec: &mut ImageSpecialization, desc, sharp| {
            spec.extract(desc, sharp)
        })?;
        let fmasks = walk.run(&info.fmasks, |spec: &mut FMaskSpecialization, _, sharp| {
            spec.extract(sharp)
        })?;
        let samplers = walk_unmasked(
            table,
            &info.samplers,
            |spec: &mut SamplerSpecialization, _: &SamplerResource, sharp| spec.extract(sharp),
        );

        Ok(ExtractedSpecialization {
            info,
            spec: StageSpecialization {
                program: info.hash,
                has_readconst: info.has_readconst,
                runtime_info: self.runtime_info,
                fetch_shader_data,
                vs_attribs,
                bound: walk.mask,
                buffers,
                tex_buffers,
                images,
                fmasks,
                samplers,
                start: self.start,
            },
        })
    }
}

impl ExtractedSpecialization<'_> {
    pub fn specialization(&self) -> &StageSpecialization {
        &self.spec
    }

    /// Second phase: fills in the tessellation layout of hull and domain programs.
    pub fn finish(
        mut self,
        table: &DescriptorTable<'_>,
    ) -> Result<StageSpecialization, SpecializationError> {
        let l_stage = self.info.l_stage;
        if !l_stage.is_tessellation() {
            return Ok(self.spec);
        }

        let consts = self.info.read_tess_constant_buffer(table)?;
        // Domain shaders run on the export stage when a geometry shader follows.
        match (l_stage, &mut self.spec.runtime_info.stage) {
            (LogicalStage::TessellationControl, StageRuntimeInfo::Hull(hs)) => {
                hs.init_from_tess_constants(&consts)
            }
            (LogicalStage::TessellationEval, StageRuntimeInfo::Vertex(vs)) => {
                vs.init_from_tess_constants(&consts)
            }
            (LogicalStage::TessellationEval, StageRuntimeInfo::Export(es)) => {
                es.init_from_tess_constants(&consts)
            }
            (l_stage, other) => {
                let expected = match l_stage {
                    LogicalStage::TessellationControl => Stage::Hull,
                    _ => Stage::Vertex,
                };
                return Err(SpecializationError::RuntimeInfoStageMismatch {
                    expected,
                    runtime: other.stage(),
                });
            }
        }
        debug!(
            program = %self.info.hash,
            ls_stride = consts.ls_stride,
            hs_cp_stride = consts.hs_cp_stride,
            hs_output_base = consts.hs_output_base,
            "derived tessellation layout"
        );
        Ok(self.spec)
    }
}

struct MaskedWalk<'t, 'a> {
    table: &'t DescriptorTable<'a>,
    binding: u32,
    mask: BindingMask,
}

impl MaskedWalk<'_, '_> {
    /// Every descriptor consumes a binding slot; only bound ones set their bit.
    fn run<R, S>(
        &mut self,
        descs: &[R],
        mut extract: impl FnMut(&mut S, &R, R::Sharp),
    ) -> Result<Vec<S>, SpecializationError>
    where
        R: SharpResource,
        S: Default,
    {
        let mut specs = Vec::with_capacity(descs.len());
        for desc in descs {
            let binding = self.binding;
            if binding >= MAX_STAGE_RESOURCES {
                return Err(SpecializationError::BindingOverflow {
                    binding,
                    max: MAX_STAGE_RESOURCES,
                });
            }
            self.binding += 1;

            let mut spec = S::default();
            if let Some(sharp) = desc.get_sharp(self.table) {
                self.mask.set(binding)?;
                extract(&mut spec, desc, sharp);
            }
            specs.push(spec);
        }
        Ok(specs)
    }
}

fn walk_unmasked<R, S>(
    table: &DescriptorTable<'_>,
    descs: &[R],
    mut extract: impl FnMut(&mut S, &R, R::Sharp),
) -> Vec<S>
where
    R: SharpResource,
    S: Default,
{
    descs
        .iter()
        .map(|desc| {
            let mut spec = S::default();
            if let Some(sharp) = desc.get_sharp(table) {
                extract(&mut spec, desc, sharp);
            }
            spec
        })
        .collect()
}
