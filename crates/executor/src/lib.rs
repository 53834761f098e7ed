//! Plan execution for FluxDispatch: step dispatch, measurement and the
//! JIT specializer.

pub mod jit;
pub mod runtime;

pub use jit::*;
pub use runtime::*;
