//! The per-branch prediction loop.

use tracing::{ debug, info, trace };

use crate::branch::*;
use crate::config::*;
use crate::error::ConfigError;
use crate::history::HistoryRegister;
use crate::predictor::*;
use crate::report::StopReason;
use crate::stats::*;

/// A BTB of perceptrons, one global history register, and the counters
/// describing how well they did.
///
/// Everything is allocated up front by [Simulator::new]; processing a
/// branch never allocates or fails.
#[derive(Clone, Debug)]
pub struct Simulator {
    cfg: SimConfig,
    theta: f32,
    btb: Btb,
    history: HistoryRegister,
    counters: Counters,
}

impl Simulator {
    /// Create a simulator with every slot empty, every weight zero, and
    /// the history register reading `[+1, 0, 0, ..]`.
    pub fn new(cfg: SimConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        debug!(
            btb_size = cfg.btb_size,
            history_length = cfg.history_length,
            theta = cfg.theta(),
            weight_policy = ?cfg.weight_policy,
            "configured simulator"
        );
        Ok(Self {
            theta: cfg.theta(),
            btb: Btb::new(cfg.btb_size, cfg.history_length),
            history: HistoryRegister::new(cfg.history_length),
            counters: Counters::default(),
            cfg,
        })
    }

    pub fn config(&self) -> &SimConfig { &self.cfg }
    pub fn btb(&self) -> &Btb { &self.btb }
    pub fn history(&self) -> &HistoryRegister { &self.history }
    pub fn counters(&self) -> &Counters { &self.counters }

    /// Returns 'true' if the branch at 'pc' is in the BTB, counting the
    /// hit or miss.
    pub fn lookup(&mut self, pc: usize) -> bool {
        let hit = self.btb.probe(pc);
        if hit {
            self.counters.hits += 1;
        } else {
            self.counters.misses += 1;
        }
        hit
    }

    /// Install the branch at 'pc' using the configured [WeightPolicy].
    pub fn insert(&mut self, pc: usize) -> Insertion {
        self.insert_with(pc, self.cfg.weight_policy)
    }

    /// Install the branch at 'pc', counting a replacement if its slot was
    /// holding some other branch.
    pub fn insert_with(&mut self, pc: usize, policy: WeightPolicy) -> Insertion {
        let res = self.btb.insert(pc, policy);
        if let Insertion::Replaced { evicted } = res {
            self.counters.replaced += 1;
            trace!(
                slot = self.btb.get_index(pc),
                evicted,
                pc,
                "replaced BTB entry"
            );
        }
        res
    }

    /// Predict the direction of the branch at 'pc' from the perceptron in
    /// its slot and the global history.
    pub fn predict(&self, pc: usize) -> Outcome {
        self.btb.entry(pc).perceptron.predict(&self.history)
    }

    /// Train the perceptron in the slot for 'pc' on 'outcome', then shift
    /// 'outcome' into the global history. Returns 'true' if the weights
    /// were adjusted; the history is shifted either way.
    pub fn update(&mut self, pc: usize, outcome: Outcome) -> bool {
        let entry = self.btb.entry_mut(pc);
        let trained = entry.perceptron.train(&self.history, outcome, self.theta);
        self.history.push(outcome);
        trained
    }

    /// Run one branch through the predictor and return the prediction that
    /// was scored.
    ///
    /// On a BTB hit the perceptron predicts and is then trained. On a miss
    /// the branch is predicted not-taken; if it was actually taken it is
    /// installed in the BTB. Misses leave weights and history alone.
    pub fn process_branch(&mut self, pc: usize, outcome: Outcome) -> Outcome {
        self.counters.seen += 1;
        if outcome.is_taken() {
            self.counters.taken += 1;
        }

        let prediction = if self.lookup(pc) {
            let p = self.predict(pc);
            self.update(pc, outcome);
            p
        } else {
            if outcome.is_taken() {
                self.insert(pc);
            }
            Outcome::N
        };

        if prediction == outcome {
            self.counters.correct += 1;
        }
        prediction
    }

    /// Run one event through the predictor. The kind of branch is ignored.
    pub fn process(&mut self, event: &BranchEvent) -> Outcome {
        self.process_branch(event.pc, event.outcome)
    }

    /// Capture the counters and the state of every slot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            counters: self.counters,
            slots: self.btb.entries().iter().map(SlotStats::from).collect(),
        }
    }

    /// Process events until the source runs dry or, when 'limit' is
    /// non-zero, until 'limit' branches have been seen.
    pub fn run<I>(&mut self, events: I, limit: u64) -> StopReason
        where I: IntoIterator<Item = BranchEvent>
    {
        info!(limit, "starting run");
        for event in events {
            self.process(&event);
            if limit != 0 && self.counters.seen >= limit {
                info!(seen = self.counters.seen, "branch limit reached");
                return StopReason::LimitReached;
            }
        }
        info!(
            seen = self.counters.seen,
            occupancy = self.btb.occupancy(),
            "event source exhausted"
        );
        StopReason::Fini
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small() -> Simulator {
        Simulator::new(SimConfig {
            btb_size: 16,
            history_length: 4,
            ..Default::default()
        }).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = SimConfig { btb_size: 12, ..Default::default() };
        assert_eq!(
            Simulator::new(cfg).unwrap_err(),
            ConfigError::BtbSizeNotPowerOfTwo(12)
        );
    }

    #[test]
    fn initial_state() {
        let sim = Simulator::new(SimConfig::default()).unwrap();
        assert_eq!(sim.btb().size(), 1024);
        assert_eq!(sim.history().values().collect::<Vec<_>>(),
            vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(sim.btb().entries().iter().all(|e| {
            !e.valid && e.perceptron.weights().iter().all(|w| *w == 0.0)
        }));
        assert_eq!(*sim.counters(), Counters::default());
    }

    #[test]
    fn lookup_counts_hits_and_misses() {
        let mut sim = small();
        assert!(!sim.lookup(0x1000));
        sim.insert(0x1000);
        assert!(sim.lookup(0x1000));
        assert!(!sim.lookup(0x2000));
        assert_eq!(sim.counters().hits, 1);
        assert_eq!(sim.counters().misses, 2);
    }

    #[test]
    fn aliasing_insert_counts_replacement() {
        let mut sim = small();
        let (a, b) = (0x1005, 0x3005);
        assert_eq!(sim.insert(a), Insertion::Filled);
        assert_eq!(sim.insert(b), Insertion::Replaced { evicted: a });
        assert_eq!(sim.btb().entry(a).replace_count, 1);
        assert_eq!(sim.counters().replaced, 1);
        assert!(!sim.lookup(a));
        assert!(sim.lookup(b));
    }

    #[test]
    fn predict_is_pure() {
        let mut sim = small();
        sim.insert(0x40);
        sim.btb.entry_mut(0x40).perceptron =
            Perceptron::from_weights(vec![1.0, -2.0, 0.5, 0.0]);
        let before = sim.clone();
        let p0 = sim.predict(0x40);
        let p1 = sim.predict(0x40);
        assert_eq!(p0, p1);
        assert_eq!(sim.history(), before.history());
        assert_eq!(sim.btb().entries(), before.btb().entries());
    }

    #[test]
    fn update_always_shifts_history() {
        let mut sim = Simulator::new(SimConfig {
            btb_size: 16,
            history_length: 4,
            theta: Some(0.0),
            ..Default::default()
        }).unwrap();
        sim.insert(0x40);
        // Output is +1 with fresh history: correct and confident with
        // theta = 0, so the weights stay put.
        sim.btb.entry_mut(0x40).perceptron =
            Perceptron::from_weights(vec![1.0, 0.0, 0.0, 0.0]);

        assert!(!sim.update(0x40, Outcome::T));
        assert_eq!(sim.btb().entry(0x40).perceptron.weights(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(sim.history().values().collect::<Vec<_>>(), vec![1, 1, 0, 0]);

        // Now a misprediction: weights move and history shifts again.
        assert!(sim.update(0x40, Outcome::N));
        assert_eq!(sim.btb().entry(0x40).perceptron.weights(), &[0.0, -1.0, 0.0, 0.0]);
        assert_eq!(sim.history().values().collect::<Vec<_>>(), vec![-1, 1, 1, 0]);
    }

    #[test]
    fn update_trains_below_threshold_even_when_correct() {
        let mut sim = Simulator::new(SimConfig {
            btb_size: 16,
            history_length: 4,
            theta: Some(1.0e6),
            ..Default::default()
        }).unwrap();
        sim.insert(0x40);
        sim.btb.entry_mut(0x40).perceptron =
            Perceptron::from_weights(vec![50.0, 0.0, 0.0, 0.0]);
        assert_eq!(sim.predict(0x40), Outcome::T);
        assert!(sim.update(0x40, Outcome::T));
        assert_eq!(sim.btb().entry(0x40).perceptron.weights(), &[51.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn update_skips_training_when_correct_and_confident() {
        let mut sim = small();
        sim.insert(0x40);
        // 50 is well above the default threshold of 1.93 * 4 + 14
        sim.btb.entry_mut(0x40).perceptron =
            Perceptron::from_weights(vec![50.0, 0.0, 0.0, 0.0]);
        assert!(!sim.update(0x40, Outcome::T));
        assert_eq!(sim.btb().entry(0x40).perceptron.weights(), &[50.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn miss_not_taken_is_correct_and_not_installed() {
        let mut sim = small();
        assert_eq!(sim.process_branch(0x80, Outcome::N), Outcome::N);
        let c = sim.counters();
        assert_eq!((c.seen, c.taken, c.correct, c.misses), (1, 0, 1, 1));
        assert!(!sim.btb().probe(0x80));
        assert_eq!(sim.history(), &HistoryRegister::new(4));
    }

    #[test]
    fn miss_taken_is_wrong_and_installed() {
        let mut sim = small();
        assert_eq!(sim.process_branch(0x80, Outcome::T), Outcome::N);
        let c = sim.counters();
        assert_eq!((c.seen, c.taken, c.correct, c.misses), (1, 1, 0, 1));
        assert!(sim.btb().probe(0x80));
        assert_eq!(sim.btb().entry(0x80).perceptron.weights(), &[0.0; 4]);
        assert_eq!(sim.history(), &HistoryRegister::new(4));
    }

    #[test]
    fn hit_predicts_then_trains() {
        let mut sim = small();
        sim.process_branch(0x80, Outcome::T);

        // Zero weights predict not-taken
        assert_eq!(sim.process_branch(0x80, Outcome::T), Outcome::N);
        assert_eq!(sim.btb().entry(0x80).perceptron.weights(), &[1.0, 0.0, 0.0, 0.0]);

        // w[0] = 1 against history [+1, +1, 0, 0]
        assert_eq!(sim.process_branch(0x80, Outcome::T), Outcome::T);
        let c = sim.counters();
        assert_eq!((c.seen, c.correct, c.hits, c.misses), (3, 1, 2, 1));
    }

    #[test]
    fn event_kind_is_ignored() {
        let mut a = small();
        let mut b = small();
        let kinds = [
            BranchKind::DirectBranch, BranchKind::DirectJump,
            BranchKind::IndirectJump, BranchKind::DirectCall,
            BranchKind::IndirectCall, BranchKind::Return, BranchKind::Syscall,
        ];
        for (i, kind) in kinds.iter().enumerate() {
            let outcome = Outcome::from_bool(i % 3 != 0);
            a.process(&BranchEvent::new(0x100, *kind, outcome));
            b.process(&BranchEvent::conditional(0x100, outcome));
        }
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.history(), b.history());
    }

    #[test]
    fn run_stops_at_limit() {
        let mut sim = small();
        let events = (0..10).map(|i| BranchEvent::conditional(i * 4, Outcome::T));
        assert_eq!(sim.run(events, 3), StopReason::LimitReached);
        assert_eq!(sim.counters().seen, 3);
    }

    #[test]
    fn run_without_limit_drains_source() {
        let mut sim = small();
        let events = (0..10).map(|i| BranchEvent::conditional(i * 4, Outcome::N));
        assert_eq!(sim.run(events, 0), StopReason::Fini);
        assert_eq!(sim.counters().seen, 10);
        assert_eq!(sim.counters().correct, 10);
    }

    #[test]
    fn snapshot_reflects_slots() {
        let mut sim = small();
        sim.process_branch(0x01, Outcome::T);
        sim.process_branch(0x11, Outcome::T);
        let s = sim.snapshot();
        assert_eq!(s.slots.len(), 16);
        assert_eq!(s.slots[1], SlotStats { valid: true, replace_count: 1 });
        assert_eq!(s.slots[0], SlotStats { valid: false, replace_count: 0 });
        assert_eq!(s.counters.replaced, 1);
    }
}
