use std::fmt;
use std::sync::Arc;

use liverpool_gpu::GuestMemoryError;
use thiserror::Error;

use crate::Stage;

#[derive(Debug, Error)]
pub enum SpecializationError {
    #[error("binding slot {binding} exceeds the per-stage limit of {max}")]
    BindingOverflow { binding: u32, max: u32 },
    #[error("tessellation stage has no tessellation constant buffer")]
    MissingTessConstants,
    #[error("failed to read the tessellation constant buffer: {0}")]
    TessConstantsRead(#[source] GuestMemoryError),
    #[error("runtime info describes the {runtime:?} stage but the program runs on {expected:?}")]
    RuntimeInfoStageMismatch { expected: Stage, runtime: Stage },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchShaderError {
    #[error("fetch shader pointer is null or outside user data")]
    MissingPointer,
    #[error("fetch shader code at 0x{gpa:x} is not readable")]
    Unreadable { gpa: u64 },
    #[error("fetch shader is truncated at dword {offset}")]
    Truncated { offset: usize },
    #[error("unsupported fetch shader instruction 0x{word:08x} at dword {offset}")]
    UnsupportedInstruction { word: u32, offset: usize },
    #[error("buffer load at dword {offset} uses s[{sgpr}:{}] which no s_load_dwordx4 wrote", .sgpr + 3)]
    UnknownResource { sgpr: u32, offset: usize },
    #[error("fetch shader does not terminate within {max} dwords")]
    TooLong { max: usize },
}

/// Codegen error shared between every caller waiting on the same compile.
#[derive(Clone)]
pub struct CodegenFailure(pub Arc<anyhow::Error>);

impl CodegenFailure {
    pub fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

impl fmt::Debug for CodegenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for CodegenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("specialization was built for a different program")]
    ForeignSpecialization,
    #[error("shader codegen failed: {0}")]
    Codegen(CodegenFailure),
    #[error("compile was cancelled because its program was evicted")]
    Cancelled,
}
