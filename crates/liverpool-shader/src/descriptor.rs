//! Live descriptor state a specialization is built against.

use liverpool_gpu::GuestMemory;
use tracing::trace;

/// Where a sharp lives at draw time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SharpLocation {
    /// Stored directly in the stage's user-data SGPRs, starting at `dword`.
    UserData { dword: u16 },
    /// Stored in guest memory: `pointer` names the user-data SGPR pair holding a 64-bit address,
    /// and the sharp starts `dword_offset` dwords past that address.
    Indirect { pointer: u16, dword_offset: u32 },
}

/// Point-in-time view of a stage's user data and the guest memory behind it.
///
/// The caller guarantees neither is mutated while a specialization is being built.
#[derive(Clone, Copy)]
pub struct DescriptorTable<'a> {
    pub user_data: &'a [u32],
    pub memory: &'a dyn GuestMemory,
}

impl<'a> DescriptorTable<'a> {
    pub fn new(user_data: &'a [u32], memory: &'a dyn GuestMemory) -> Self {
        Self { user_data, memory }
    }

    /// Reads the 64-bit guest address held in user-data SGPRs `index` and `index + 1`.
    ///
    /// Only the low 48 bits are address bits; a zero address reads as `None`.
    pub fn read_pointer(&self, index: u16) -> Option<u64> {
        let index = usize::from(index);
        let lo = *self.user_data.get(index)?;
        let hi = *self.user_data.get(index + 1)?;
        let address = (u64::from(lo) | (u64::from(hi) << 32)) & 0xffff_ffff_ffff;
        (address != 0).then_some(address)
    }

    /// Reads `N` dwords from `location`, or `None` if the location is unmapped.
    pub fn read_dwords<const N: usize>(&self, location: SharpLocation) -> Option<[u32; N]> {
        let mut out = [0u32; N];
        match location {
            SharpLocation::UserData { dword } => {
                let start = usize::from(dword);
                let src = self.user_data.get(start..start + N)?;
                out.copy_from_slice(src);
            }
            SharpLocation::Indirect {
                pointer,
                dword_offset,
            } => {
                let base = self.read_pointer(pointer)?;
                let gpa = base.checked_add(u64::from(dword_offset) * 4)?;
                if let Err(err) = self.memory.read_dwords(gpa, &mut out) {
                    trace!("sharp read faulted: {err}");
                    return None;
                }
            }
        }
        Some(out)
    }
}

impl std::fmt::Debug for DescriptorTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorTable")
            .field("user_data", &self.user_data)
            .finish_non_exhaustive()
    }
}
