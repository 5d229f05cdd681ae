//! Shader permutation keys and caching for Liverpool (GCN) programs.
//!
//! Guest shaders are compiled once per distinct combination of bytecode and the bound-resource
//! facts that change generated code. This crate decides what those facts are:
//!
//! - [`Info`] lists the resources a program may touch (produced once per bytecode blob),
//! - [`StageSpecialization`] snapshots the code-affecting parts of what is bound for one
//!   draw/dispatch and compares against other snapshots,
//! - [`ShaderCache`] keeps analyzed programs and their compiled permutations, compiling on miss
//!   through a [`ShaderBackend`].
//!
//! Bytecode analysis and code generation themselves live outside this crate.

#![forbid(unsafe_code)]

mod bindings;
mod compile;
mod descriptor;
mod error;
mod fetch_shader;
mod info;
mod permutation;
mod profile;
mod runtime_info;
mod shader_cache;
mod specialization;
mod stage;
mod stats;
mod tess_constants;

pub use crate::bindings::{BindingMask, Bindings, MAX_STAGE_RESOURCES};
pub use crate::compile::{CompileStatus, CompileTicket};
pub use crate::descriptor::{DescriptorTable, SharpLocation};
pub use crate::error::{CacheError, CodegenFailure, FetchShaderError, SpecializationError};
pub use crate::fetch_shader::{
    parse_fetch_shader, FetchShaderData, InstanceIdType, VertexAttribute, MAX_FETCH_SHADER_DWORDS,
};
pub use crate::info::{
    BufferResource, FMaskResource, ImageResource, Info, SamplerResource, ShaderHash,
    SharpResource, SharpSource, TessConstantsLocation, TextureBufferResource,
};
pub use crate::permutation::{PermutationId, PermutationState, PermutationTable};
pub use crate::profile::{Profile, ProfileFeatures, MAX_UBO_SIZE};
pub use crate::runtime_info::{
    ColorTargetInfo, ColorTargetMask, ComputeRuntimeInfo, ExportRuntimeInfo, FpDenormMode,
    FragmentRuntimeInfo, GeometryRuntimeInfo, HullRuntimeInfo, LocalRuntimeInfo, RuntimeInfo,
    StageRuntimeInfo, VertexRuntimeInfo, MAX_COLOR_TARGETS,
};
pub use crate::shader_cache::{
    CompileMode, ModuleHandle, PermutationLookup, Program, ProgramHandle, ShaderBackend,
    ShaderCache, ShaderCacheConfig,
};
pub use crate::specialization::{
    BufferSpecialization, ExtractedSpecialization, FMaskSpecialization, ImageSpecialization,
    SamplerSpecialization, SpecializationBuilder, StageSpecialization,
    TextureBufferSpecialization, VsAttribSpecialization,
};
pub use crate::stage::{LogicalStage, Stage};
pub use crate::stats::ShaderCacheStats;
pub use crate::tess_constants::TessellationDataConstantBuffer;
