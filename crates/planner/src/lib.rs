//! Plan generation and cost prediction for FluxDispatch.

pub mod predictor;
pub mod strategy;

pub use predictor::*;
pub use strategy::*;
