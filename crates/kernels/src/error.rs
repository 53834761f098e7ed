//! Error taxonomy for the dispatch loop.

use thiserror::Error;

/// Result type alias for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors raised across the dispatch loop.
///
/// The first four abort the owning task; sensor and fusion failures are
/// soft and are logged and counted by their subsystems instead of being
/// surfaced to callers.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Task failed intake validation.
    #[error("task rejected: {0}")]
    TaskRejected(String),

    /// A plan step references an operation absent from the registry.
    #[error("kernel not found in registry: {0}")]
    KernelMissing(String),

    /// JIT execution was requested but no kernel had been staged.
    #[error("jit execution requested but no kernel is staged")]
    JitPrecondition,

    /// The planner produced an empty candidate list.
    #[error("no candidate plan for task type: {0}")]
    NoCandidatePlan(String),

    /// Environmental sensor could not be reached.
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),

    /// Plan-history analysis failed.
    #[error("fusion analysis failed: {0}")]
    FusionError(String),

    /// IO error from belief persistence.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error from belief persistence.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DispatchError {
    /// Stable machine-readable code for each category.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::TaskRejected(_) => "TASK_REJECTED",
            DispatchError::KernelMissing(_) => "KERNEL_MISSING",
            DispatchError::JitPrecondition => "JIT_PRECONDITION",
            DispatchError::NoCandidatePlan(_) => "NO_CANDIDATE_PLAN",
            DispatchError::SensorUnavailable(_) => "SENSOR_UNAVAILABLE",
            DispatchError::FusionError(_) => "FUSION_ERROR",
            DispatchError::Io(_) => "IO_ERROR",
            DispatchError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
