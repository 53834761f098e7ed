//! FluxDispatch: an adaptive compute dispatcher.
//!
//! Every submitted task runs through one closed loop: profile the data,
//! rank candidate execution plans under the learned hardware model,
//! execute the chosen plan (JIT-specializing where the plan asks for it),
//! measure what actually happened, and reconcile the beliefs. A fusion
//! layer watches the executed-plan stream and materializes fused kernels
//! for frequent adjacent step pairs.
//!
//! ```no_run
//! use fluxdispatch::{Buffer, DispatchEnvironment, Task, TaskParams};
//!
//! let mut env = DispatchEnvironment::new();
//! let mut task = Task::new(
//!     1,
//!     "SAXPY",
//!     Buffer::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
//!     Buffer::F32(vec![10.0; 5]),
//! )
//! .with_params(TaskParams::Saxpy { a: 2.5 });
//!
//! env.execute(&mut task).unwrap();
//! println!("{:?}", env.last_performance_record());
//! env.print_beliefs();
//! ```

pub mod dispatcher;
pub mod evolution;

pub use dispatcher::DispatchEnvironment;
pub use evolution::EvolutionAgentRecord;

pub use fluxdispatch_executor::PerformanceRecord;
pub use fluxdispatch_feedback::LearningContext;
pub use fluxdispatch_kernels::{
    Buffer, DispatchError, ExecutionPlan, HardwareProfile, KernelSpec, PlanStep, Task, TaskParams,
};
pub use fluxdispatch_profiler::{DataProfile, DeviceStatus, EnrichedContext};
