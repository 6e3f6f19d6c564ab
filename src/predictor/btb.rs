//! Branch target buffer (BTB) with a perceptron attached to each entry.

use crate::Outcome;
use crate::config::WeightPolicy;
use crate::predictor::*;

/// One slot in the [Btb].
#[derive(Clone, Debug, PartialEq)]
pub struct BtbEntry {
    /// Whether this slot currently holds a branch
    pub valid: bool,
    /// The full program counter of the branch in this slot
    pub tag: usize,
    /// Number of times this slot was handed over to a different branch
    pub replace_count: u64,
    /// Direction recorded when the branch was installed
    pub prediction: Outcome,
    /// Direction predictor for this slot
    pub perceptron: Perceptron,
}
impl BtbEntry {
    pub fn new(history_length: usize) -> Self {
        Self {
            valid: false,
            tag: 0,
            replace_count: 0,
            prediction: Outcome::N,
            perceptron: Perceptron::new(history_length),
        }
    }

    /// Returns 'true' if this slot holds the branch with 'tag'.
    pub fn matches(&self, tag: usize) -> bool {
        self.valid && self.tag == tag
    }
}

/// Result of [Btb::insert].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// The slot was empty.
    Filled,
    /// The slot was holding a different branch.
    Replaced { evicted: usize },
}

/// A direct-mapped BTB indexed by the low bits of the program counter.
///
/// Entries are tagged with the full program counter. Slots are never
/// returned to the empty state once filled.
#[derive(Clone, Debug)]
pub struct Btb {
    size: usize,
    data: Vec<BtbEntry>,
}
impl Btb {
    pub fn new(size: usize, history_length: usize) -> Self {
        assert!(size.is_power_of_two());
        Self {
            size,
            data: vec![BtbEntry::new(history_length); size],
        }
    }

    /// Returns 'true' if the branch at 'pc' is present.
    pub fn probe(&self, pc: usize) -> bool {
        let tag = self.get_tag(pc);
        self.get_entry(self.get_index(pc)).matches(tag)
    }

    /// Install the branch at 'pc', taking over its slot.
    ///
    /// Only meant to be called after a miss on 'pc'. The new branch is
    /// recorded as predicted-taken. Under [WeightPolicy::Inherit] the
    /// slot's perceptron is left exactly as the previous occupant left it.
    pub fn insert(&mut self, pc: usize, policy: WeightPolicy) -> Insertion {
        let idx = self.get_index(pc);
        let tag = self.get_tag(pc);
        let entry = self.get_entry_mut(idx);

        let res = if entry.valid {
            entry.replace_count += 1;
            Insertion::Replaced { evicted: entry.tag }
        } else {
            Insertion::Filled
        };

        if policy == WeightPolicy::Reset && entry.valid {
            entry.perceptron.reset();
        }
        entry.valid = true;
        entry.prediction = Outcome::T;
        entry.tag = tag;
        res
    }

    /// Returns the slot that 'pc' maps to.
    pub fn entry(&self, pc: usize) -> &BtbEntry {
        self.get_entry(self.get_index(pc))
    }

    /// Returns the slot that 'pc' maps to.
    pub fn entry_mut(&mut self, pc: usize) -> &mut BtbEntry {
        let idx = self.get_index(pc);
        self.get_entry_mut(idx)
    }

    pub fn entries(&self) -> &[BtbEntry] {
        &self.data
    }

    /// Number of slots currently holding a branch.
    pub fn occupancy(&self) -> usize {
        self.data.iter().filter(|e| e.valid).count()
    }
}

impl PredictorTable for Btb {
    type Input = usize;
    type Entry = BtbEntry;

    fn size(&self) -> usize { self.size }

    fn get_index(&self, pc: usize) -> usize {
        pc & self.index_mask()
    }

    fn get_entry(&self, idx: usize) -> &BtbEntry {
        &self.data[idx & self.index_mask()]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut BtbEntry {
        let index = idx & self.index_mask();
        &mut self.data[index]
    }
}

impl TaggedPredictorTable for Btb {
    fn get_tag(&self, pc: usize) -> usize { pc }
}
