use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of shader cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShaderCacheStats {
    pub programs: u64,
    pub program_evictions: u64,

    pub permutation_hits: u64,
    pub permutation_misses: u64,
    /// Lookups that joined a compile another caller started.
    pub permutation_joins: u64,
    pub permutation_evictions: u64,

    pub compiles: u64,
    pub compile_failures: u64,
    pub compiles_cancelled: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ShaderCacheCounters {
    program_evictions: AtomicU64,
    permutation_hits: AtomicU64,
    permutation_misses: AtomicU64,
    permutation_joins: AtomicU64,
    permutation_evictions: AtomicU64,
    compiles: AtomicU64,
    compile_failures: AtomicU64,
    compiles_cancelled: AtomicU64,
}

impl ShaderCacheCounters {
    pub fn inc_program_evictions(&self) {
        self.program_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_permutation_hits(&self) {
        self.permutation_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_permutation_misses(&self) {
        self.permutation_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_permutation_joins(&self) {
        self.permutation_joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_permutation_evictions(&self, n: u64) {
        self.permutation_evictions.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_compiles(&self) {
        self.compiles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_compile_failures(&self) {
        self.compile_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_compiles_cancelled(&self, n: u64) {
        self.compiles_cancelled.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, programs: u64) -> ShaderCacheStats {
        ShaderCacheStats {
            programs,
            program_evictions: self.program_evictions.load(Ordering::Relaxed),
            permutation_hits: self.permutation_hits.load(Ordering::Relaxed),
            permutation_misses: self.permutation_misses.load(Ordering::Relaxed),
            permutation_joins: self.permutation_joins.load(Ordering::Relaxed),
            permutation_evictions: self.permutation_evictions.load(Ordering::Relaxed),
            compiles: self.compiles.load(Ordering::Relaxed),
            compile_failures: self.compile_failures.load(Ordering::Relaxed),
            compiles_cancelled: self.compiles_cancelled.load(Ordering::Relaxed),
        }
    }
}
