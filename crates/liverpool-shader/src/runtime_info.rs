//! Per-draw facts that affect code generation but cannot be derived from bytecode.
//!
//! The command-stream interpreter fills these in from context registers before a
//! specialization is built. Every field participates in permutation equality, so only
//! code-affecting state belongs here.

use bitflags::bitflags;
use liverpool_gpu::{
    CompMapping, NumberConversion, NumberFormat, TessellationParams, TessellationPartitioning,
    TessellationTopology, TessellationType,
};

use crate::stage::Stage;
use crate::tess_constants::TessellationDataConstantBuffer;

pub const MAX_COLOR_TARGETS: usize = 8;

bitflags! {
    /// Color targets a fragment shader exports to.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct ColorTargetMask: u8 {
        const MRT0 = 1 << 0;
        const MRT1 = 1 << 1;
        const MRT2 = 1 << 2;
        const MRT3 = 1 << 3;
        const MRT4 = 1 << 4;
        const MRT5 = 1 << 5;
        const MRT6 = 1 << 6;
        const MRT7 = 1 << 7;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FpDenormMode {
    #[default]
    InOutFlush,
    InAllowOutFlush,
    InFlushOutAllow,
    InOutAllow,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocalRuntimeInfo {
    pub ls_stride: u32,
}

/// Export stage facts. With tessellation and a geometry shader both enabled, the domain shader
/// runs here and needs the same patch layout the vertex stage would get.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExportRuntimeInfo {
    pub vertex_data_size: u32,
    pub tess_type: TessellationType,
    pub tess_topology: TessellationTopology,
    pub tess_partitioning: TessellationPartitioning,
    pub hs_output_cp_stride: u32,
}

impl ExportRuntimeInfo {
    pub fn set_tessellation(&mut self, params: TessellationParams) {
        self.tess_type = params.ty;
        self.tess_topology = params.topology;
        self.tess_partitioning = params.partitioning;
    }

    pub fn init_from_tess_constants(&mut self, consts: &TessellationDataConstantBuffer) {
        self.hs_output_cp_stride = consts.hs_cp_stride;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexRuntimeInfo {
    pub num_outputs: u32,
    pub clip_disable: bool,
    pub emulate_depth_negative_one_to_one: bool,
    pub step_rate_0: u32,
    pub step_rate_1: u32,
    // Domain shader state.
    pub tess_type: TessellationType,
    pub tess_topology: TessellationTopology,
    pub tess_partitioning: TessellationPartitioning,
    pub hs_output_cp_stride: u32,
}

impl VertexRuntimeInfo {
    pub fn set_tessellation(&mut self, params: TessellationParams) {
        self.tess_type = params.ty;
        self.tess_topology = params.topology;
        self.tess_partitioning = params.partitioning;
    }

    pub fn init_from_tess_constants(&mut self, consts: &TessellationDataConstantBuffer) {
        self.hs_output_cp_stride = consts.hs_cp_stride;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HullRuntimeInfo {
    pub num_input_control_points: u32,
    pub num_threads: u32,
    pub tess_type: TessellationType,
    // Filled in from the tessellation constant buffer.
    pub ls_stride: u32,
    pub hs_output_cp_stride: u32,
    pub hs_output_base: u32,
}

impl HullRuntimeInfo {
    pub fn init_from_tess_constants(&mut self, consts: &TessellationDataConstantBuffer) {
        self.ls_stride = consts.ls_stride;
        self.hs_output_cp_stride = consts.hs_cp_stride;
        self.hs_output_base = consts.hs_output_base;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GeometryRuntimeInfo {
    pub num_invocations: u32,
    pub output_vertices: u32,
    pub in_primitive: u32,
    pub out_primitive: [u32; 4],
    /// Hash of the copy shader the geometry stage hands its outputs to.
    pub vs_copy_hash: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorTargetInfo {
    pub num_format: NumberFormat,
    pub num_conversion: NumberConversion,
    pub swizzle: CompMapping,
    pub export_format: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FragmentRuntimeInfo {
    pub num_inputs: u32,
    pub en_flags: u32,
    pub addr_flags: u32,
    pub enabled_targets: ColorTargetMask,
    pub color_targets: [ColorTargetInfo; MAX_COLOR_TARGETS],
}

impl FragmentRuntimeInfo {
    /// Color targets that are both enabled and described.
    pub fn active_targets(&self) -> impl Iterator<Item = (usize, &ColorTargetInfo)> + '_ {
        self.color_targets
            .iter()
            .enumerate()
            .filter(|(i, _)| self.enabled_targets.bits() & (1 << i) != 0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComputeRuntimeInfo {
    pub shared_memory_size: u32,
    pub workgroup_size: [u32; 3],
    pub tgid_enable: [bool; 3],
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StageRuntimeInfo {
    Local(LocalRuntimeInfo),
    Export(ExportRuntimeInfo),
    Vertex(VertexRuntimeInfo),
    Hull(HullRuntimeInfo),
    Geometry(GeometryRuntimeInfo),
    Fragment(FragmentRuntimeInfo),
    Compute(ComputeRuntimeInfo),
}

impl StageRuntimeInfo {
    /// Default (all-zero) facts for `stage`.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Local => Self::Local(Default::default()),
            Stage::Export => Self::Export(Default::default()),
            Stage::Vertex => Self::Vertex(Default::default()),
            Stage::Hull => Self::Hull(Default::default()),
            Stage::Geometry => Self::Geometry(Default::default()),
            Stage::Fragment => Self::Fragment(Default::default()),
            Stage::Compute => Self::Compute(Default::default()),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Local(_) => Stage::Local,
            Self::Export(_) => Stage::Export,
            Self::Vertex(_) => Stage::Vertex,
            Self::Hull(_) => Stage::Hull,
            Self::Geometry(_) => Stage::Geometry,
            Self::Fragment(_) => Stage::Fragment,
            Self::Compute(_) => Stage::Compute,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuntimeInfo {
    pub num_user_data: u32,
    pub num_input_vgprs: u32,
    pub num_allocated_vgprs: u32,
    pub fp_denorm_mode: FpDenormMode,
    pub stage: StageRuntimeInfo,
}

impl RuntimeInfo {
    pub fn new(stage: Stage) -> Self {
        Self {
            num_user_data: 0,
            num_input_vgprs: 0,
            num_allocated_vgprs: 0,
            fp_denorm_mode: FpDenormMode::default(),
            stage: StageRuntimeInfo::for_stage(stage),
        }
    }

    pub fn hull(&self) -> Option<&HullRuntimeInfo> {
        match &self.stage {
            StageRuntimeInfo::Hull(info) => Some(info),
            _ => None,
        }
    }

    pub fn vertex(&self) -> Option<&VertexRuntimeInfo> {
        match &self.stage {
            StageRuntimeInfo::Vertex(info) => Some(info),
            _ => None,
        }
    }

    pub fn fragment(&self) -> Option<&FragmentRuntimeInfo> {
        match &self.stage {
            StageRuntimeInfo::Fragment(info) => Some(info),
            _ => None,
        }
    }
}
