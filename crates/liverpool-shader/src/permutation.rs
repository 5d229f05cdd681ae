//! Compiled permutations of a single program.

use hashbrown::HashMap;

use crate::compile::CompileTicket;
use crate::specialization::StageSpecialization;

#[derive(Clone, Debug)]
pub enum PermutationState<M> {
    Ready(M),
    Compiling(CompileTicket<M>),
}

/// Handle to a table entry that stays valid across unrelated inserts and removals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PermutationId {
    bucket: u64,
    seq: u64,
}

#[derive(Debug)]
struct Permutation<M> {
    seq: u64,
    spec: StageSpecialization,
    state: PermutationState<M>,
}

/// Permutations keyed by [`StageSpecialization::matches`].
///
/// Entries are bucketed by [`StageSpecialization::bucket_hash`] and matched pairwise within a
/// bucket, stored entry against candidate.
#[derive(Debug)]
pub struct PermutationTable<M> {
    buckets: HashMap<u64, Vec<Permutation<M>>>,
    next_seq: u64,
    len: usize,
}

impl<M> Default for PermutationTable<M> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            next_seq: 0,
            len: 0,
        }
    }
}

impl<M: Clone> PermutationTable<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The oldest stored permutation whose module is valid for `candidate`.
    pub fn find(
        &self,
        candidate: &StageSpecialization,
    ) -> Option<(PermutationId, &PermutationState<M>)> {
        let bucket = candidate.bucket_hash();
        self.buckets
            .get(&bucket)?
            .iter()
            .find(|entry| entry.spec.matches(candidate))
            .map(|entry| {
                (
                    PermutationId {
                        bucket,
                        seq: entry.seq,
                    },
                    &entry.state,
                )
            })
    }

    pub fn insert(
        &mut self,
        spec: StageSpecialization,
        state: PermutationState<M>,
    ) -> PermutationId {
        let bucket = spec.bucket_hash();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.buckets
            .entry(bucket)
            .or_default()
            .push(Permutation { seq, spec, state });
        self.len += 1;
        PermutationId { bucket, seq }
    }

    /// Marks a compiling entry ready. Returns `false` if the entry is gone.
    pub fn set_ready(&mut self, id: PermutationId, module: M) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.state = PermutationState::Ready(module);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: PermutationId) -> Option<PermutationState<M>> {
        let entries = self.buckets.get_mut(&id.bucket)?;
        let pos = entries.iter().position(|entry| entry.seq == id.seq)?;
        let entry = entries.remove(pos);
        if entries.is_empty() {
            self.buckets.remove(&id.bucket);
        }
        self.len -= 1;
        Some(entry.state)
    }

    /// Evicts ready entries, oldest first, until at most `max` remain. In-flight compiles are
    /// never evicted. Returns the number evicted.
    pub fn shrink_to(&mut self, max: usize) -> usize {
        let mut evicted = 0;
        while self.len > max {
            let Some(id) = self.oldest_ready() else {
                break;
            };
            self.remove(id);
            evicted += 1;
        }
        evicted
    }

    /// Module of the most recently inserted ready permutation.
    pub fn latest_ready(&self) -> Option<M> {
        self.ready_entries()
            .max_by_key(|(id, _)| id.seq)
            .map(|(_, module)| module.clone())
    }

    /// Removes every entry and returns the tickets of those still compiling.
    pub fn drain_pending(&mut self) -> Vec<CompileTicket<M>> {
        self.len = 0;
        self.buckets
            .drain()
            .flat_map(|(_, entries)| entries)
            .filter_map(|entry| match entry.state {
                PermutationState::Compiling(ticket) => Some(ticket),
                PermutationState::Ready(_) => None,
            })
            .collect()
    }

    fn oldest_ready(&self) -> Option<PermutationId> {
        self.ready_entries()
            .min_by_key(|(id, _)| id.seq)
            .map(|(id, _)| id)
    }

    fn ready_entries(&self) -> impl Iterator<Item = (PermutationId, &M)> + '_ {
        self.buckets.iter().flat_map(|(&bucket, entries)| {
            entries.iter().filter_map(move |entry| match &entry.state {
                PermutationState::Ready(module) => Some((
                    PermutationId {
                        bucket,
                        seq: entry.seq,
                    },
                    module,
                )),
                PermutationState::Compiling(_) => None,
            })
        })
    }

    fn entry_mut(&mut self, id: PermutationId) -> Option<&mut Permutation<M>> {
        self.buckets
            .get_mut(&id.bucket)?
            .iter_mut()
            .find(|entry| entry.seq == id.seq)
    }
}
