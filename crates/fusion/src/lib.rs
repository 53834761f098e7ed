//! Pattern fusion for FluxDispatch: mines the executed-plan stream for
//! frequent adjacent step pairs and materializes fused kernels.

pub mod engine;

pub use engine::*;
