//! Execution plans: an ordered step sequence plus a predicted cost.

use serde::{Deserialize, Serialize};

/// One operation in a plan, with logical source/destination buffer ids.
///
/// `"input"` and `"output"` address the task's own buffers; any other id is
/// a scratch slot the executor allocates for the plan's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub op: String,
    pub src: String,
    pub dst: String,
}

impl PlanStep {
    pub fn new(op: impl Into<String>, src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            src: src.into(),
            dst: dst.into(),
        }
    }
}

/// A candidate strategy for a task. Predicted flux is filled by the planner
/// once, then the plan is read-only through execution and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub path_name: String,
    pub predicted_flux: f64,
    pub steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn new(path_name: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        Self {
            path_name: path_name.into(),
            predicted_flux: 0.0,
            steps,
        }
    }

    pub fn step_ops(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.op.as_str())
    }

    pub fn contains_op(&self, op: &str) -> bool {
        self.steps.iter().any(|s| s.op == op)
    }
}
