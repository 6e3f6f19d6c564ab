//! Generating traces from patterned branches.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::branch::*;
use crate::trace::BinaryTrace;

/// A pre-determined pattern of outcomes associated with a branch.
#[derive(Clone, Debug, PartialEq)]
pub enum BranchPattern {
    /// A branch whose outcome is always 'taken'.
    AlwaysTaken,

    /// A branch whose outcome is always 'not-taken'.
    NeverTaken,

    /// A branch whose outcome is only periodically "taken".
    /// Otherwise, the branch is "not-taken" by default.
    TakenPeriodic(usize),

    /// A branch whose outcome is only periodically "not-taken".
    /// Otherwise, the branch is "taken" by default.
    NotTakenPeriodic(usize),

    /// A branch with an arbitrary repeating pattern of outcomes.
    Pattern(Vec<Outcome>),

    /// A branch taken with some probability.
    Random(f64),
}
impl BranchPattern {
    /// Given some counter, generate a branch outcome.
    pub fn outcome(&self, ctr: usize, rng: &mut impl Rng) -> Outcome {
        match self {
            Self::AlwaysTaken => Outcome::T,
            Self::NeverTaken => Outcome::N,
            Self::TakenPeriodic(p) => {
                if ctr % p == (p - 1) { Outcome::T } else { Outcome::N }
            },
            Self::NotTakenPeriodic(p) => {
                if ctr % p == (p - 1) { Outcome::N } else { Outcome::T }
            },
            Self::Pattern(p) => p[ctr % p.len()],
            Self::Random(prob) => rng.gen_bool(prob.clamp(0.0, 1.0)).into(),
        }
    }
}

/// A branch placed at some address in a [SyntheticTrace].
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticBranch {
    pub pc: usize,
    pub tgt: usize,
    pub kind: BranchKind,
    pub pattern: BranchPattern,
}

/// Interleaves a set of patterned branches into a trace.
///
/// Each iteration emits one record for every branch, in the order they
/// were added, like the body of a loop.
pub struct SyntheticTrace {
    branches: Vec<SyntheticBranch>,
    rng: StdRng,
}
impl SyntheticTrace {
    pub fn new(seed: u64) -> Self {
        Self {
            branches: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Add a conditional branch at 'pc'.
    pub fn branch(&mut self, pc: usize, pattern: BranchPattern) -> &mut Self {
        self.add(SyntheticBranch {
            pc,
            tgt: pc.wrapping_add(0x40),
            kind: BranchKind::DirectBranch,
            pattern,
        })
    }

    pub fn add(&mut self, branch: SyntheticBranch) -> &mut Self {
        assert!(!matches!(branch.pattern, BranchPattern::Pattern(ref p) if p.is_empty()),
            "empty outcome pattern");
        assert!(!matches!(branch.pattern,
            BranchPattern::TakenPeriodic(0) | BranchPattern::NotTakenPeriodic(0)),
            "zero period");
        self.branches.push(branch);
        self
    }

    pub fn branches(&self) -> &[SyntheticBranch] { &self.branches }

    /// Emit 'iterations' passes over every branch.
    pub fn generate(&mut self, iterations: usize) -> Vec<BranchRecord> {
        let mut res = Vec::with_capacity(iterations * self.branches.len());
        for ctr in 0..iterations {
            for b in self.branches.iter() {
                let outcome = b.pattern.outcome(ctr, &mut self.rng);
                res.push(BranchRecord::new(b.pc, b.tgt, b.kind, outcome));
            }
        }
        res
    }

    /// Like [SyntheticTrace::generate], wrapped up as a named trace.
    pub fn compile(&mut self, name: &str, iterations: usize) -> BinaryTrace {
        BinaryTrace::from_records(name, self.generate(iterations))
    }
}
