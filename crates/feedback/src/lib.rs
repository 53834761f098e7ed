//! Feedback loop for FluxDispatch: reconciles predicted and observed flux
//! and decides when to explore suboptimal plans.

pub mod explore;
pub mod learner;

pub use explore::*;
pub use learner::*;
