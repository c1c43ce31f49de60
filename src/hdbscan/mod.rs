//! Hierarchical density-based clustering with noise
mod algorithm;
mod hyperparams;
mod tree;

pub use algorithm::*;
pub use hyperparams::*;
