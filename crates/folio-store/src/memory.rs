//! In-memory fact store.
//!
//! Used for tests, fixtures, and editor sessions that sync elsewhere. All
//! data is lost when dropped.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use folio_types::{Attribute, Cardinality, EntityId, Fact, FactId};

use crate::StoreResult;
use crate::ops::{FactRead, FactStore};

type IndexKey = (EntityId, Attribute);

#[derive(Debug, Default)]
struct State {
    /// Live facts by insertion sequence.
    facts: BTreeMap<u64, Fact>,
    /// Fact id → insertion sequence.
    seq_of: HashMap<FactId, u64>,
    /// (entity, attribute) → sequences.
    eav: HashMap<IndexKey, BTreeSet<u64>>,
    /// (referenced entity, attribute) → sequences.
    vae: HashMap<IndexKey, BTreeSet<u64>>,
    next_seq: u64,
    initialized: bool,
}

impl State {
    fn insert(&mut self, fact: Fact, seq: u64) {
        self.eav
            .entry((fact.entity, fact.attribute))
            .or_default()
            .insert(seq);
        if let Some(value) = fact.data.referenced_entity() {
            self.vae
                .entry((value, fact.attribute))
                .or_default()
                .insert(seq);
        }
        self.seq_of.insert(fact.id, seq);
        self.facts.insert(seq, fact);
    }

    fn remove(&mut self, id: FactId) -> Option<(u64, Fact)> {
        let seq = self.seq_of.remove(&id)?;
        let fact = self.facts.remove(&seq)?;
        if let Some(set) = self.eav.get_mut(&(fact.entity, fact.attribute)) {
            set.remove(&seq);
        }
        if let Some(value) = fact.data.referenced_entity()
            && let Some(set) = self.vae.get_mut(&(value, fact.attribute))
        {
            set.remove(&seq);
        }
        Some((seq, fact))
    }

    fn collect(&self, seqs: Option<&BTreeSet<u64>>) -> Vec<Fact> {
        seqs.into_iter()
            .flatten()
            .filter_map(|seq| self.facts.get(seq).cloned())
            .collect()
    }
}

/// In-memory fact store.
///
/// Thread-safe via internal `RwLock`. Counts every write so callers can check
/// that a pass was a no-op.
#[derive(Debug, Default)]
pub struct MemoryFactStore {
    state: RwLock<State>,
    writes: AtomicU64,
}

impl MemoryFactStore {
    /// Create a new, uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an initialized store seeded with `facts` (in order).
    pub fn with_facts(facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut state = State {
            initialized: true,
            ..State::default()
        };
        for fact in facts {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.insert(fact, seq);
        }
        Self {
            state: RwLock::new(state),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of fact writes (puts and retractions) applied so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of live facts.
    pub fn len(&self) -> usize {
        self.state.read().facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(&self, n: u64) {
        self.writes.fetch_add(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl FactRead for MemoryFactStore {
    async fn is_initialized(&self) -> StoreResult<bool> {
        Ok(self.state.read().initialized)
    }

    async fn scan_eav(&self, entity: EntityId, attribute: Attribute) -> StoreResult<Vec<Fact>> {
        let state = self.state.read();
        Ok(state.collect(state.eav.get(&(entity, attribute))))
    }

    async fn scan_vae(&self, value: EntityId, attribute: Attribute) -> StoreResult<Vec<Fact>> {
        let state = self.state.read();
        Ok(state.collect(state.vae.get(&(value, attribute))))
    }

    async fn entity_facts(&self, entity: EntityId) -> StoreResult<Vec<Fact>> {
        let state = self.state.read();
        let seqs: BTreeSet<u64> = Attribute::ALL
            .iter()
            .filter_map(|attr| state.eav.get(&(entity, *attr)))
            .flatten()
            .copied()
            .collect();
        Ok(state.collect(Some(&seqs)))
    }

    async fn all_facts(&self) -> StoreResult<Vec<Fact>> {
        Ok(self.state.read().facts.values().cloned().collect())
    }
}

#[async_trait]
impl FactStore for MemoryFactStore {
    async fn set_initialized(&self) -> StoreResult<()> {
        self.state.write().initialized = true;
        Ok(())
    }

    async fn put_fact(&self, fact: Fact) -> StoreResult<()> {
        fact.validate()?;
        let mut state = self.state.write();

        // Replacing by id keeps the original insertion slot.
        let seq = match state.remove(fact.id) {
            Some((seq, _)) => seq,
            None => {
                let seq = state.next_seq;
                state.next_seq += 1;
                seq
            }
        };

        if fact.attribute.cardinality() == Cardinality::One {
            let stale: Vec<FactId> = state
                .collect(state.eav.get(&(fact.entity, fact.attribute)))
                .into_iter()
                .map(|f| f.id)
                .collect();
            for id in stale {
                state.remove(id);
            }
        }

        state.insert(fact, seq);
        self.touch(1);
        Ok(())
    }

    async fn retract_fact(&self, id: FactId) -> StoreResult<()> {
        if self.state.write().remove(id).is_some() {
            self.touch(1);
        }
        Ok(())
    }

    async fn retract_attribute(&self, entity: EntityId, attribute: Attribute) -> StoreResult<()> {
        let mut state = self.state.write();
        let ids: Vec<FactId> = state
            .collect(state.eav.get(&(entity, attribute)))
            .into_iter()
            .map(|f| f.id)
            .collect();
        for id in &ids {
            state.remove(*id);
        }
        self.touch(ids.len() as u64);
        Ok(())
    }
}
