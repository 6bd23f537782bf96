//! Fixed-capacity open-addressing table keyed by raw bytes.
//!
//! Used both as each scan worker's accumulator and as the merge target. Slots
//! are scanned linearly from `fnv1a(key) & mask`; keys are compared byte for
//! byte. Occupied slots are never cleared.
//!
//! The slot array stops taking new keys once 3/4 of it is occupied; later
//! keys go to an `FxHashMap` overflow so the lookup loop always finds a free
//! slot and cardinality is not capped by the preallocated size.

use fxhash::FxHashMap;
use tracing::warn;

use crate::config::{DEFAULT_TABLE_BITS, MAX_TABLE_BITS, MIN_TABLE_BITS};
use crate::stats::Stats;

const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

/// 64-bit FNV-1a.
#[inline]
pub fn fnv1a(key: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in key {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn slot_count(bits: u32) -> usize {
    1usize << bits.clamp(MIN_TABLE_BITS, MAX_TABLE_BITS)
}

struct Entry {
    key: Box<[u8]>,
    stats: Stats,
}

enum Lookup {
    Hit(usize),
    Vacant(usize),
    AtLimit,
}

pub struct Table {
    slots: Box<[Option<Entry>]>,
    mask: usize,
    occupied: usize,
    load_limit: usize,
    overflow: FxHashMap<Box<[u8]>, Stats>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    pub fn new() -> Self {
        Self::with_bits(DEFAULT_TABLE_BITS)
    }

    /// Table with `2^bits` slots, `bits` clamped to
    /// `MIN_TABLE_BITS..=MAX_TABLE_BITS`.
    pub fn with_bits(bits: u32) -> Self {
        let capacity = slot_count(bits);
        let slots = std::iter::repeat_with(|| None)
            .take(capacity)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            mask: capacity - 1,
            occupied: 0,
            load_limit: capacity - capacity / 4,
            overflow: FxHashMap::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of distinct keys, slot array and overflow together.
    pub fn len(&self) -> usize {
        self.occupied + self.overflow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Fold one decoded value into the entry for `key`, copying the key on
    /// first sight only.
    #[inline]
    pub fn upsert(&mut self, key: &[u8], value: i32) {
        self.upsert_with(key, Stats::new(value), |stats| stats.record(value));
    }

    /// Combine a partial summary for `key` into this table.
    pub fn merge_entry(&mut self, key: &[u8], stats: &Stats) {
        self.upsert_with(key, *stats, |existing| existing.merge(stats));
    }

    /// Like [`Table::merge_entry`] but plants the owned key directly when the
    /// key is new, so no copy is made.
    pub fn absorb(&mut self, key: Box<[u8]>, stats: Stats) {
        self.upsert_with(key, stats, |existing| existing.merge(&stats));
    }

    pub fn get(&self, key: &[u8]) -> Option<&Stats> {
        match self.lookup(key) {
            Lookup::Hit(idx) => self.slots[idx].as_ref().map(|entry| &entry.stats),
            Lookup::Vacant(_) | Lookup::AtLimit => self.overflow.get(key),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Stats)> {
        self.slots
            .iter()
            .flatten()
            .map(|entry| (&*entry.key, &entry.stats))
            .chain(self.overflow.iter().map(|(key, stats)| (&**key, stats)))
    }

    pub fn into_entries(self) -> impl Iterator<Item = (Box<[u8]>, Stats)> {
        self.slots
            .into_vec()
            .into_iter()
            .flatten()
            .map(|entry| (entry.key, entry.stats))
            .chain(self.overflow)
    }

    #[inline]
    fn lookup(&self, key: &[u8]) -> Lookup {
        let mut idx = fnv1a(key) as usize & self.mask;
        loop {
            match &self.slots[idx] {
                None if self.occupied < self.load_limit => return Lookup::Vacant(idx),
                None => return Lookup::AtLimit,
                Some(entry) if *entry.key == *key => return Lookup::Hit(idx),
                Some(_) => idx = (idx + 1) & self.mask,
            }
        }
    }

    #[inline]
    fn upsert_with<K>(&mut self, key: K, fresh: Stats, update: impl FnOnce(&mut Stats))
    where
        K: AsRef<[u8]> + Into<Box<[u8]>>,
    {
        match self.lookup(key.as_ref()) {
            Lookup::Hit(idx) => {
                if let Some(entry) = self.slots[idx].as_mut() {
                    update(&mut entry.stats);
                }
            }
            Lookup::Vacant(idx) => {
                self.slots[idx] = Some(Entry {
                    key: key.into(),
                    stats: fresh,
                });
                self.occupied += 1;
            }
            Lookup::AtLimit => {
                if let Some(stats) = self.overflow.get_mut(key.as_ref()) {
                    update(stats);
                    return;
                }
                if self.overflow.is_empty() {
                    warn!(
                        capacity = self.capacity(),
                        occupied = self.occupied,
                        "table reached its load limit, new keys go to the overflow map"
                    );
                }
                self.overflow.insert(key.into(), fresh);
            }
        }
    }
}
