//! Binding slot bookkeeping for one shader stage.

use crate::error::SpecializationError;

/// Upper bound on the binding slots one stage may address.
pub const MAX_STAGE_RESOURCES: u32 = 64;

/// Binding offsets a stage's resources start at within the pipeline layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bindings {
    pub unified: u32,
    pub buffer: u32,
    pub user_data: u32,
}

/// Which stage-local binding slots had a live sharp when a specialization was built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BindingMask(u64);

impl BindingMask {
    pub const EMPTY: Self = Self(0);

    pub fn set(&mut self, binding: u32) -> Result<(), SpecializationError> {
        if binding >= MAX_STAGE_RESOURCES {
            return Err(SpecializationError::BindingOverflow {
                binding,
                max: MAX_STAGE_RESOURCES,
            });
        }
        self.0 |= 1 << binding;
        Ok(())
    }

    /// Slots at or past the capacity are never set.
    pub fn test(&self, binding: u32) -> bool {
        binding < MAX_STAGE_RESOURCES && self.0 & (1 << binding) != 0
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..MAX_STAGE_RESOURCES).filter(|&binding| self.test(binding))
    }
}
