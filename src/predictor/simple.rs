//! Stateless baselines to compare against.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::Outcome;
use crate::predictor::SimplePredictor;

/// Always predicts the same direction.
#[derive(Clone, Copy, Debug)]
pub struct StaticPredictor {
    outcome: Outcome,
}
impl StaticPredictor {
    pub fn taken() -> Self { Self { outcome: Outcome::T } }
    pub fn not_taken() -> Self { Self { outcome: Outcome::N } }
}
impl SimplePredictor for StaticPredictor {
    fn name(&self) -> &'static str {
        match self.outcome {
            Outcome::T => "AlwaysTaken",
            Outcome::N => "NeverTaken",
        }
    }
    fn predict(&mut self, _pc: usize) -> Outcome { self.outcome }
}

/// Flips a (seeded) coin for every branch.
#[derive(Clone, Debug)]
pub struct RandomPredictor {
    rng: StdRng,
}
impl RandomPredictor {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}
impl SimplePredictor for RandomPredictor {
    fn name(&self) -> &'static str { "Random" }
    fn predict(&mut self, _pc: usize) -> Outcome {
        self.rng.gen::<bool>().into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn static_predictors() {
        let mut t = StaticPredictor::taken();
        let mut n = StaticPredictor::not_taken();
        for pc in [0, 0x1000, usize::MAX] {
            assert_eq!(t.predict(pc), Outcome::T);
            assert_eq!(n.predict(pc), Outcome::N);
        }
        assert_eq!(t.name(), "AlwaysTaken");
        assert_eq!(n.name(), "NeverTaken");
    }

    #[test]
    fn random_is_reproducible() {
        let mut a = RandomPredictor::seeded(7);
        let mut b = RandomPredictor::seeded(7);
        let xs: Vec<Outcome> = (0..64).map(|pc| a.predict(pc)).collect();
        let ys: Vec<Outcome> = (0..64).map(|pc| b.predict(pc)).collect();
        assert_eq!(xs, ys);
        assert!(xs.contains(&Outcome::T) && xs.contains(&Outcome::N));
    }
}
