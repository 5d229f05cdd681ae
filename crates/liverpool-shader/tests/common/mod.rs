#![allow(dead_code)]

use liverpool_gpu::VecGuestMemory;
use liverpool_shader::{
    Bindings, DescriptorTable, Info, LogicalStage, Profile, RuntimeInfo, ShaderHash,
    SharpLocation, SpecializationError, Stage, StageSpecialization,
};

pub const MEMORY_BASE: u64 = 0x10_0000;
pub const MEMORY_SIZE: usize = 0x2_0000;
pub const USER_DATA_DWORDS: usize = 64;

/// Resources used in these tests are bound at these user-data offsets, one slot per 8 dwords so
/// images fit.
pub fn slot(index: u16) -> SharpLocation {
    SharpLocation::UserData { dword: index * 8 }
}

pub fn program(code: &[u32], stage: Stage, l_stage: LogicalStage) -> Info {
    Info::new(ShaderHash::of_code(code), stage, l_stage)
}

pub fn compute_program() -> Info {
    program(&[0xbf81_0000], Stage::Compute, LogicalStage::Compute)
}

/// User data plus a flat guest memory region.
pub struct GpuState {
    pub memory: VecGuestMemory,
    pub user_data: [u32; USER_DATA_DWORDS],
}

impl GpuState {
    pub fn new() -> Self {
        Self {
            memory: VecGuestMemory::new(MEMORY_BASE, MEMORY_SIZE),
            user_data: [0; USER_DATA_DWORDS],
        }
    }

    pub fn bind(&mut self, index: u16, dwords: &[u32]) -> &mut Self {
        let start = usize::from(index) * 8;
        self.user_data[start..start + dwords.len()].copy_from_slice(dwords);
        self
    }

    pub fn set_user_data(&mut self, dword: usize, values: &[u32]) -> &mut Self {
        self.user_data[dword..dword + values.len()].copy_from_slice(values);
        self
    }

    /// Stores a 64-bit pointer in user-data dwords `dword` and `dword + 1`.
    pub fn set_pointer(&mut self, dword: usize, gpa: u64) -> &mut Self {
        self.set_user_data(dword, &[gpa as u32, (gpa >> 32) as u32])
    }

    pub fn write(&mut self, gpa: u64, dwords: &[u32]) -> &mut Self {
        self.memory
            .write_dwords(gpa, dwords)
            .expect("write inside test memory");
        self
    }

    pub fn table(&self) -> DescriptorTable<'_> {
        DescriptorTable::new(&self.user_data, &self.memory)
    }

    pub fn try_specialize(
        &self,
        info: &Info,
        runtime_info: RuntimeInfo,
        profile: &Profile,
    ) -> Result<StageSpecialization, SpecializationError> {
        StageSpecialization::new(
            info,
            runtime_info,
            profile,
            Bindings::default(),
            &self.table(),
        )
    }

    pub fn specialize(&self, info: &Info) -> StageSpecialization {
        self.try_specialize(info, RuntimeInfo::new(info.stage), &Profile::default())
            .expect("specialization")
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
