//! Data profiling for FluxDispatch: spectral features, Hamming structure
//! and environmental readings folded into one per-task profile.

pub mod analyzer;
pub mod profile;
pub mod sensor;

pub use analyzer::*;
pub use profile::*;
pub use sensor::*;
