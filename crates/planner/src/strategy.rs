//! Candidate strategy generation: the built-in table plus an optional
//! pluggable generator.

use fluxdispatch_kernels::plan::{ExecutionPlan, PlanStep};
use fluxdispatch_profiler::EnrichedContext;

/// A pluggable plan generator (e.g. an LLM-backed proposer). Returning an
/// empty list is the normal "nothing to offer" answer and is never fatal;
/// the built-in table is the fallback.
pub trait PlanStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn propose(&self, context: &EnrichedContext) -> Vec<ExecutionPlan>;
}

/// Built-in candidate paths per task type, in insertion order. The order
/// matters: it breaks predicted-cost ties downstream.
pub fn builtin_candidates(task_type: &str) -> Vec<ExecutionPlan> {
    match task_type {
        "CONVOLUTION" => vec![
            ExecutionPlan::new(
                "Time Domain (Direct)",
                vec![PlanStep::new("CONV_DIRECT", "input", "output")],
            ),
            ExecutionPlan::new(
                "Frequency Domain (FFT)",
                vec![
                    PlanStep::new("FFT_FORWARD", "input", "temp_freq"),
                    PlanStep::new("ELEMENT_WISE_MULTIPLY", "temp_freq", "temp_result"),
                    PlanStep::new("FFT_INVERSE", "temp_result", "output"),
                ],
            ),
        ],
        "GEMM" => vec![
            ExecutionPlan::new(
                "Naive GEMM",
                vec![PlanStep::new("GEMM_NAIVE", "input", "output")],
            ),
            ExecutionPlan::new(
                "Flux-Adaptive GEMM",
                vec![PlanStep::new("GEMM_FLUX_ADAPTIVE", "input", "output")],
            ),
        ],
        "SAXPY" => vec![
            ExecutionPlan::new(
                "Standard SAXPY",
                vec![PlanStep::new("SAXPY_STANDARD", "input", "output")],
            ),
            ExecutionPlan::new(
                "JIT Compiled SAXPY",
                vec![
                    PlanStep::new("JIT_COMPILE_SAXPY", "input", "input"),
                    PlanStep::new("EXECUTE_JIT_SAXPY", "input", "output"),
                ],
            ),
        ],
        _ => Vec::new(),
    }
}
