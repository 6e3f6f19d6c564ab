//! Helpers for collecting statistics.

use itertools::*;
use serde::{ Deserialize, Serialize };

use crate::predictor::BtbEntry;

/// Running totals over every branch presented to the simulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Number of branches seen
    pub seen: u64,
    /// Number of branches resolved as taken
    pub taken: u64,
    /// Number of correct predictions
    pub correct: u64,
    /// Number of times a valid BTB slot was handed to a different branch
    pub replaced: u64,
    /// Number of BTB lookups that found the branch
    pub hits: u64,
    /// Number of BTB lookups that didn't
    pub misses: u64,
}
impl Counters {
    /// Fraction of lookups that hit, or [None] before any lookup.
    pub fn hit_rate(&self) -> Option<f64> {
        ratio(self.hits, self.hits + self.misses)
    }

    /// Fraction of lookups that missed, or [None] before any lookup.
    pub fn miss_rate(&self) -> Option<f64> {
        ratio(self.misses, self.hits + self.misses)
    }

    /// Fraction of branches predicted correctly, or [None] before any.
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.correct, self.seen)
    }

    /// Number of incorrect predictions.
    pub fn mispredicted(&self) -> u64 {
        self.seen - self.correct
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    if den == 0 { None } else { Some(num as f64 / den as f64) }
}

/// The reportable state of a single BTB slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStats {
    pub valid: bool,
    pub replace_count: u64,
}
impl From<&BtbEntry> for SlotStats {
    fn from(e: &BtbEntry) -> Self {
        Self { valid: e.valid, replace_count: e.replace_count }
    }
}

/// Counters plus per-slot state, taken at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub counters: Counters,
    pub slots: Vec<SlotStats>,
}
impl Snapshot {
    /// Number of slots holding a branch.
    pub fn occupancy(&self) -> usize {
        self.slots.iter().filter(|s| s.valid).count()
    }

    /// The 'n' slots replaced most often, as (index, stats), skipping slots
    /// that were never replaced. Ties go to the lower index.
    pub fn most_replaced(&self, n: usize) -> Vec<(usize, SlotStats)> {
        self.slots.iter().copied().enumerate()
            .filter(|(_, s)| s.replace_count > 0)
            .sorted_by(|x, y| {
                y.1.replace_count.cmp(&x.1.replace_count)
                    .then(x.0.cmp(&y.0))
            })
            .take(n)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_counters_have_no_rates() {
        let c = Counters::default();
        assert_eq!(c.accuracy(), None);
        assert_eq!(c.miss_rate(), None);
        assert_eq!(c.hit_rate(), None);
        assert_eq!(c.mispredicted(), 0);
    }

    #[test]
    fn rates() {
        let c = Counters {
            seen: 8, taken: 6, correct: 6, replaced: 0, hits: 3, misses: 1,
        };
        assert_eq!(c.accuracy(), Some(0.75));
        assert_eq!(c.hit_rate(), Some(0.75));
        assert_eq!(c.miss_rate(), Some(0.25));
        assert_eq!(c.mispredicted(), 2);
    }

    #[test]
    fn most_replaced_orders_by_count_then_index() {
        let slot = |valid, replace_count| SlotStats { valid, replace_count };
        let s = Snapshot {
            counters: Counters::default(),
            slots: vec![slot(true, 2), slot(false, 0), slot(true, 5), slot(true, 2)],
        };
        assert_eq!(s.occupancy(), 3);
        assert_eq!(s.most_replaced(2), vec![(2, slot(true, 5)), (0, slot(true, 2))]);
        assert_eq!(s.most_replaced(10).len(), 3);
    }
}
