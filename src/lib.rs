//! A trace-driven simulator for a branch target buffer (BTB) whose entries
//! each carry a perceptron direction predictor.

pub mod branch;
pub mod config;
pub mod error;
pub mod history;
pub mod predictor;
pub mod report;
pub mod sim;
pub mod stats;
pub mod trace;

pub use branch::*;
pub use config::*;
pub use error::*;
pub use history::*;
pub use predictor::*;
pub use report::*;
pub use sim::*;
pub use stats::*;
pub use trace::*;
