//! Branch prediction structures.

pub mod table;
pub mod perceptron;
pub mod btb;
pub mod simple;

pub use table::*;
pub use perceptron::*;
pub use btb::*;
pub use simple::*;

use crate::Outcome;

/// Interface to a baseline predictor that guesses an outcome without
/// accepting feedback from the rest of the machine.
pub trait SimplePredictor {
    fn name(&self) -> &'static str;
    fn predict(&mut self, pc: usize) -> Outcome;
}
