//! Program and permutation cache.
//!
//! Programs are analyzed once per distinct bytecode and kept in an LRU arena keyed by content
//! hash. Each program owns the table of permutations compiled for it. Lookups that hit only take
//! the table's read lock; misses take the write lock, re-check, and register a compile ticket so
//! concurrent misses on the same permutation compile it once.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use lru::LruCache;
use tracing::{debug, warn};

use crate::compile::CompileTicket;
use crate::error::{CacheError, CodegenFailure};
use crate::info::{Info, ShaderHash};
use crate::permutation::{PermutationId, PermutationState, PermutationTable};
use crate::specialization::StageSpecialization;
use crate::stats::{ShaderCacheCounters, ShaderCacheStats};

/// Code generator the cache compiles permutations with.
pub trait ShaderBackend: Send + Sync + 'static {
    type Module: Send + Sync + 'static;

    fn compile(&self, info: &Info, spec: &StageSpecialization) -> anyhow::Result<Self::Module>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileMode {
    /// Compile on the thread that missed. Other threads missing on the same permutation wait
    /// at most [`ShaderCacheConfig::join_wait`].
    Inline,
    /// Compile on a worker thread and wait at most `wait` for it.
    Background { wait: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShaderCacheConfig {
    pub max_programs: usize,
    pub max_permutations_per_program: usize,
    pub compile_mode: CompileMode,
    /// How long an inline-mode lookup waits on a compile another thread is running.
    pub join_wait: Duration,
}

impl Default for ShaderCacheConfig {
    fn default() -> Self {
        Self {
            max_programs: 1024,
            max_permutations_per_program: 64,
            compile_mode: CompileMode::Inline,
            join_wait: Duration::from_millis(100),
        }
    }
}

/// An analyzed program and the permutations compiled for it.
pub struct Program<M> {
    info: Arc<Info>,
    permutations: RwLock<PermutationTable<M>>,
    evicted: AtomicBool,
}

impl<M: Clone> Program<M> {
    fn new(info: Info) -> Self {
        Self {
            info: Arc::new(info),
            permutations: RwLock::new(PermutationTable::new()),
            evicted: AtomicBool::new(false),
        }
    }

    pub fn info(&self) -> &Arc<Info> {
        &self.info
    }

    pub fn hash(&self) -> ShaderHash {
        self.info.hash
    }

    pub fn permutation_count(&self) -> usize {
        self.read().len()
    }

    /// Whether the program has been dropped from its cache. Evicted programs compile nothing.
    pub fn is_evicted(&self) -> bool {
        self.evicted.load(Ordering::Acquire)
    }

    fn read(&self) -> RwLockReadGuard<'_, PermutationTable<M>> {
        self.permutations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PermutationTable<M>> {
        self.permutations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the program evicted and cancels its in-flight compiles.
    fn evict(&self) -> usize {
        self.evicted.store(true, Ordering::Release);
        self.write()
            .drain_pending()
            .into_iter()
            .filter(|ticket| ticket.cancel())
            .count()
    }
}

impl<M> std::fmt::Debug for Program<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("hash", &self.info.hash)
            .field("stage", &self.info.stage)
            .field("evicted", &self.evicted.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum PermutationLookup<M> {
    /// A ready permutation matched.
    Hit(M),
    /// The permutation was compiled (or finished compiling) during this lookup.
    Compiled(M),
    /// The compile outlived the configured wait. `fallback` is the program's most recently
    /// compiled permutation, if any.
    Pending {
        ticket: CompileTicket<M>,
        fallback: Option<M>,
    },
}

impl<M> PermutationLookup<M> {
    /// The module usable for this draw right now.
    pub fn module(&self) -> Option<&M> {
        match self {
            Self::Hit(module) | Self::Compiled(module) => Some(module),
            Self::Pending { fallback, .. } => fallback.as_ref(),
        }
    }
}

pub type ModuleHandle<B> = Arc<<B as ShaderBackend>::Module>;
pub type ProgramHandle<B> = Arc<Program<ModuleHandle<B>>>;

pub struct ShaderCache<B: ShaderBackend> {
    backend: Arc<B>,
    config: ShaderCacheConfig,
    programs: Mutex<LruCache<ShaderHash, ProgramHandle<B>>>,
    counters: Arc<ShaderCacheCounters>,
}

struct CompileJob<B: ShaderBackend> {
    backend: Arc<B>,
    program: ProgramHandle<B>,
    spec: StageSpecialization,
    id: PermutationId,
    ticket: CompileTicket<ModuleHandle<B>>,
    counters: Arc<ShaderCacheCounters>,
}

impl<B: ShaderBackend> CompileJob<B> {
    fn run(self) {
        if self.program.is_evicted() {
            self.ticket.cancel();
            return;
        }
        if self.ticket.is_cancelled() {
            return;
        }
        self.counters.inc_compiles();
        // A panicking backend still resolves the ticket and drops the entry.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.backend.compile(&self.program.info, &self.spec)
        }))
        .unwrap_or_else(|payload| {
            Err(anyhow!(
                "shader backend panicked: {}",
                panic_message(payload.as_ref())
            ))
        });

        match result {
            Ok(module) => {
                let module = Arc::new(module);
                {
                    let mut table = self.program.write();
                    if !self.ticket.is_cancelled() {
                        table.set_ready(self.id, Arc::clone(&module));
                    }
                }
                self.ticket.complete(Ok(module));
            }
            Err(err) => {
                self.counters.inc_compile_failures();
                warn!(program = %self.program.hash(), "shader codegen failed: {err:#}");
                // Drop the entry before waking waiters so a retry misses instead of joining.
                self.program.write().remove(self.id);
                self.ticket.complete(Err(CodegenFailure::new(err)));
            }
        }
    }
}

impl<B: ShaderBackend> ShaderCache<B> {
    pub fn new(backend: B, config: ShaderCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_programs).unwrap_or(NonZeroUsize::MIN);
        Self {
            backend: Arc::new(backend),
            config,
            programs: Mutex::new(LruCache::new(capacity)),
            counters: Arc::new(ShaderCacheCounters::default()),
        }
    }

    pub fn config(&self) -> &ShaderCacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn programs(&self) -> MutexGuard<'_, LruCache<ShaderHash, ProgramHandle<B>>> {
        self.programs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The program for `code`, running `analyze` if this bytecode has not been seen.
    ///
    /// The returned [`Info`] is stamped with the content hash of `code`.
    pub fn get_or_analyze<E>(
        &self,
        code: &[u32],
        analyze: impl FnOnce() -> Result<Info, E>,
    ) -> Result<ProgramHandle<B>, E> {
        let hash = ShaderHash::of_code(code);
        if let Some(program) = self.programs().get(&hash) {
            return Ok(Arc::clone(program));
        }

        // Analysis runs unlocked; a racing caller may insert first, in which case its program
        // wins and this analysis is dropped.
        let mut info = analyze()?;
        info.hash = hash;

        let mut programs = self.programs();
        if let Some(program) = programs.get(&hash) {
            return Ok(Arc::clone(program));
        }
        let program = Arc::new(Program::new(info));
        if let Some((evicted_hash, evicted)) = programs.push(hash, Arc::clone(&program)) {
            drop(programs);
            self.retire(evicted_hash, &evicted);
        }
        debug!(program = %hash, "analyzed shader program");
        Ok(program)
    }

    pub fn program(&self, hash: ShaderHash) -> Option<ProgramHandle<B>> {
        self.programs().get(&hash).cloned()
    }

    /// Drops a program and cancels its in-flight compiles. Returns `false` if it was not
    /// cached.
    pub fn invalidate(&self, hash: ShaderHash) -> bool {
        let Some(program) = self.programs().pop(&hash) else {
            return false;
        };
        self.retire(hash, &program);
        true
    }

    fn retire(&self, hash: ShaderHash, program: &ProgramHandle<B>) {
        self.counters.inc_program_evictions();
        let cancelled = program.evict();
        if cancelled > 0 {
            warn!(program = %hash, cancelled, "evicted program with compiles in flight");
            self.counters.add_compiles_cancelled(cancelled as u64);
        } else {
            debug!(program = %hash, "evicted program");
        }
    }

    /// Finds or compiles the permutation of `program` described by `spec`.
    pub fn get_or_compile(
        &self,
        program: &ProgramHandle<B>,
        spec: StageSpecialization,
    ) -> Result<PermutationLookup<ModuleHandle<B>>, CacheError> {
        if spec.program() != program.hash() {
            return Err(CacheError::ForeignSpecialization);
        }
        if program.is_evicted() {
            return Err(CacheError::Cancelled);
        }

        let found = program.read().find(&spec).map(|(_, state)| state.clone());
        if let Some(state) = found {
            return self.resolve_existing(program, state);
        }

        let (id, ticket) = {
            let mut table = program.write();
            // Eviction sets the flag before draining the table.
            if program.is_evicted() {
                return Err(CacheError::Cancelled);
            }
            let found = table.find(&spec).map(|(_, state)| state.clone());
            if let Some(state) = found {
                drop(table);
                return self.resolve_existing(program, state);
            }
            let ticket = CompileTicket::new();
            let id = table.insert(spec.clone(), PermutationState::Compiling(ticket.clone()));
            let evicted = table.shrink_to(self.config.max_permutations_per_program);
            self.counters.add_permutation_evictions(evicted as u64);
            (id, ticket)
        };
        self.counters.inc_permutation_misses();
        debug!(
            program = %program.hash(),
            bound = spec.bound.bits(),
            "compiling shader permutation"
        );

        let job = CompileJob {
            backend: Arc::clone(&self.backend),
            program: Arc::clone(program),
            spec,
            id,
            ticket: ticket.clone(),
            counters: Arc::clone(&self.counters),
        };
        let wait = match self.config.compile_mode {
            CompileMode::Inline => {
                job.run();
                None
            }
            CompileMode::Background { wait } => {
                spawn_compile(job);
                Some(wait)
            }
        };
        self.await_ticket(program, ticket, wait)
    }

    fn resolve_existing(
        &self,
        program: &ProgramHandle<B>,
        state: PermutationState<ModuleHandle<B>>,
    ) -> Result<PermutationLookup<ModuleHandle<B>>, CacheError> {
        match state {
            PermutationState::Ready(module) => {
                self.counters.inc_permutation_hits();
                debug!(program = %program.hash(), "shader permutation hit");
                Ok(PermutationLookup::Hit(module))
            }
            PermutationState::Compiling(ticket) => {
                self.counters.inc_permutation_joins();
                let wait = match self.config.compile_mode {
                    CompileMode::Inline => self.config.join_wait,
                    CompileMode::Background { wait } => wait,
                };
                self.await_ticket(program, ticket, Some(wait))
            }
        }
    }

    fn await_ticket(
        &self,
        program: &ProgramHandle<B>,
        ticket: CompileTicket<ModuleHandle<B>>,
        wait: Option<Duration>,
    ) -> Result<PermutationLookup<ModuleHandle<B>>, CacheError> {
        // `None` only after this thread ran the compile itself, so the ticket is resolved.
        let outcome = match wait {
            None => Some(ticket.wait()),
            Some(wait) => ticket.wait_timeout(wait),
        };
        match outcome {
            Some(result) => result.map(PermutationLookup::Compiled),
            None => Ok(PermutationLookup::Pending {
                fallback: program.read().latest_ready(),
                ticket,
            }),
        }
    }

    pub fn stats(&self) -> ShaderCacheStats {
        let programs = self.programs().len() as u64;
        self.counters.snapshot(programs)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

fn spawn_compile<B: ShaderBackend>(job: CompileJob<B>) {
    // The job is handed back on spawn failure so the compile still happens.
    let slot = Arc::new(Mutex::new(Some(job)));
    let worker_slot = Arc::clone(&slot);
    let spawned = thread::Builder::new()
        .name("liverpool-shader-compile".into())
        .spawn(move || {
            let job = worker_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(job) = job {
                job.run();
            }
        });
    if let Err(err) = spawned {
        warn!("failed to spawn shader compile worker, compiling inline: {err}");
        let job = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(job) = job {
            job.run();
        }
    }
}
