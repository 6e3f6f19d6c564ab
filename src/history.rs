use bitvec::prelude::*;

/// Global history of recent branch outcomes, shared by every perceptron.
///
/// Index 0 holds the newest outcome. Each position reads as +1 (taken),
/// -1 (not-taken), or 0 when no outcome has been shifted that far yet.
/// A fresh register reads `[+1, 0, 0, ..]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRegister {
    data: BitVec<usize, Lsb0>,
    len: usize,

    /// Number of positions that hold a real outcome.
    filled: usize,
}

// NOTE: The newest outcome is printed first.
impl std::fmt::Display for HistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let x: String = self.values()
            .map(|v| match v { 1 => '+', -1 => '-', _ => '0' })
            .collect();
        write!(f, "{}", x)
    }
}

impl HistoryRegister {
    /// Create a register with the specified length.
    /// Position 0 starts out as +1 and every other position as 0.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "history length must be non-zero");
        let mut data = bitvec![usize, Lsb0; 0; len];
        data.set(0, true);
        Self { data, len, filled: 1 }
    }

    /// Create a fully-populated register, newest outcome first.
    pub fn from_outcomes(outcomes: &[crate::Outcome]) -> Self {
        assert!(!outcomes.is_empty(), "history length must be non-zero");
        let data: BitVec<usize, Lsb0> = outcomes.iter()
            .map(|o| o.is_taken())
            .collect();
        Self { data, len: outcomes.len(), filled: outcomes.len() }
    }

    pub fn len(&self) -> usize { self.len }

    /// Return the signed value at position 'idx'.
    pub fn get(&self, idx: usize) -> i8 {
        if idx >= self.filled {
            0
        } else if self.data[idx] {
            1
        } else {
            -1
        }
    }

    /// Iterate over the signed values, newest first.
    pub fn values(&self) -> impl Iterator<Item = i8> + '_ {
        (0..self.len).map(move |idx| self.get(idx))
    }

    /// Shift every outcome one position older, discarding the oldest, and
    /// place 'outcome' at position 0.
    pub fn push(&mut self, outcome: crate::Outcome) {
        self.data.shift_right(1);
        self.data.set(0, outcome.is_taken());
        self.filled = (self.filled + 1).min(self.len);
    }

    /// Return to the initial `[+1, 0, 0, ..]` state.
    pub fn reset(&mut self) {
        *self = Self::new(self.len);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Outcome;

    #[test]
    fn initial_state() {
        let h = HistoryRegister::new(4);
        assert_eq!(h.values().collect::<Vec<_>>(), vec![1, 0, 0, 0]);
        assert_eq!(h.to_string(), "+000");
    }

    #[test]
    fn push_shifts_toward_oldest() {
        let mut h = HistoryRegister::new(4);
        h.push(Outcome::N);
        assert_eq!(h.values().collect::<Vec<_>>(), vec![-1, 1, 0, 0]);
        h.push(Outcome::T);
        h.push(Outcome::N);
        h.push(Outcome::N);
        assert_eq!(h.values().collect::<Vec<_>>(), vec![-1, -1, 1, -1]);

        // The oldest value falls off the end
        h.push(Outcome::T);
        assert_eq!(h.values().collect::<Vec<_>>(), vec![1, -1, -1, 1]);
        assert_eq!(h.len(), 4);
    }

    #[test]
    fn single_position_register() {
        let mut h = HistoryRegister::new(1);
        h.push(Outcome::N);
        assert_eq!(h.get(0), -1);
        h.push(Outcome::T);
        assert_eq!(h.get(0), 1);
    }

    #[test]
    fn from_outcomes_is_newest_first() {
        let mut h = HistoryRegister::from_outcomes(&[Outcome::T, Outcome::N]);
        assert_eq!(h.to_string(), "+-");
        h.reset();
        assert_eq!(h.to_string(), "+0");
    }
}
