//! Kernel registry: name → callable, extended at runtime by the fusion layer.

use crate::error::Result;
use crate::plan::PlanStep;
use crate::report::FluxReport;
use crate::task::Task;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A flux-reporting kernel. `step` carries the logical buffer routing for
/// kernels that participate in multi-step plans; single-step kernels
/// operate on the task's own buffers and ignore it.
pub trait Kernel: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, task: &mut Task, step: &PlanStep) -> Result<FluxReport>;
}

pub type DynKernel = Arc<dyn Kernel>;

/// Shared handle with one exclusive writer at a time.
pub type SharedRegistry = Arc<RwLock<KernelRegistry>>;

#[derive(Default)]
pub struct KernelRegistry {
    kernels: BTreeMap<String, DynKernel>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self {
            kernels: BTreeMap::new(),
        }
    }

    /// Registry pre-populated with every built-in operation the planner's
    /// strategy table can emit.
    pub fn with_default_kernels() -> Self {
        let mut registry = Self::new();
        registry.register(crate::saxpy::SaxpyStandard);
        registry.register(crate::gemm::GemmNaive);
        registry.register(crate::gemm::GemmFluxAdaptive);
        registry.register(crate::conv::ConvDirect);
        registry.register(crate::conv::FftForward);
        registry.register(crate::conv::ElementWiseMultiply);
        registry.register(crate::conv::FftInverse);
        registry
    }

    pub fn shared_with_defaults() -> SharedRegistry {
        Arc::new(RwLock::new(Self::with_default_kernels()))
    }

    pub fn register<K>(&mut self, kernel: K)
    where
        K: Kernel + 'static,
    {
        self.kernels.insert(kernel.name().to_string(), Arc::new(kernel));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kernels.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<DynKernel> {
        self.kernels.get(name).map(Arc::clone)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kernels.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}
