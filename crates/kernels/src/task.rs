//! Task wire shape and typed payload buffers.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Typed data payload. Each operation declares the shape it accepts, so a
/// mismatch is a validation error rather than a bad cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Buffer {
    F32(Vec<f32>),
    F64(Vec<f64>),
    Bytes(Vec<u8>),
}

impl Buffer {
    /// Number of elements, in the buffer's native width.
    pub fn len(&self) -> usize {
        match self {
            Buffer::F32(v) => v.len(),
            Buffer::F64(v) => v.len(),
            Buffer::Bytes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(&self) -> usize {
        match self {
            Buffer::F32(v) => v.len() * 4,
            Buffer::F64(v) => v.len() * 8,
            Buffer::Bytes(v) => v.len(),
        }
    }

    /// Raw byte view, used by the Hamming-weight path.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Buffer::F32(v) => bytemuck::cast_slice(v),
            Buffer::F64(v) => bytemuck::cast_slice(v),
            Buffer::Bytes(v) => v,
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Buffer::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32_mut(&mut self) -> Option<&mut [f32]> {
        match self {
            Buffer::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Buffer::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            Buffer::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Real-valued view for spectral analysis: `F64` borrows, `F32` widens,
    /// raw bytes carry no sample semantics and yield `None`.
    pub fn real_view(&self) -> Option<Cow<'_, [f64]>> {
        match self {
            Buffer::F64(v) => Some(Cow::Borrowed(v)),
            Buffer::F32(v) => Some(Cow::Owned(v.iter().map(|&x| x as f64).collect())),
            Buffer::Bytes(_) => None,
        }
    }
}

/// Kernel variant declared by the submitter. Native tasks dispatch through
/// the process-wide registry; opaque modules are accepted and validated but
/// have no execution backend yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum KernelSpec {
    #[default]
    Native,
    OpaqueBinary {
        blob: Vec<u8>,
    },
}

impl KernelSpec {
    pub fn byte_len(&self) -> usize {
        match self {
            KernelSpec::Native => 0,
            KernelSpec::OpaqueBinary { blob } => blob.len(),
        }
    }
}

/// Task-specific parameter bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TaskParams {
    #[default]
    None,
    Saxpy {
        a: f32,
    },
    Gemm {
        m: usize,
        n: usize,
        k: usize,
    },
}

/// Named f64 scratch slots used by multi-step plans to pass intermediate
/// buffers between kernels. Cleared by the executor before each plan run.
#[derive(Debug, Clone, Default)]
pub struct ScratchSpace {
    slots: HashMap<String, Vec<f64>>,
}

impl ScratchSpace {
    pub fn put(&mut self, id: &str, data: Vec<f64>) {
        self.slots.insert(id.to_string(), data);
    }

    pub fn get(&self, id: &str) -> Option<&[f64]> {
        self.slots.get(id).map(|v| v.as_slice())
    }

    pub fn take(&mut self, id: &str) -> Option<Vec<f64>> {
        self.slots.remove(id)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// A submitted computational task with its data payload.
///
/// Identity fields are read-only during dispatch; the output buffer and
/// scratch slots are mutated by the executor.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: u64,
    /// Operation tag, e.g. "CONVOLUTION", "GEMM", "SAXPY".
    pub op: String,
    pub kernel: KernelSpec,
    pub input_a: Buffer,
    pub input_b: Option<Buffer>,
    pub output: Buffer,
    pub num_elements: usize,
    pub params: TaskParams,
    pub scratch: ScratchSpace,
}

impl Task {
    pub fn new(id: u64, op: impl Into<String>, input_a: Buffer, output: Buffer) -> Self {
        let num_elements = input_a.len();
        Self {
            id,
            op: op.into(),
            kernel: KernelSpec::Native,
            input_a,
            input_b: None,
            output,
            num_elements,
            params: TaskParams::None,
            scratch: ScratchSpace::default(),
        }
    }

    pub fn with_input_b(mut self, input_b: Buffer) -> Self {
        self.input_b = Some(input_b);
        self
    }

    pub fn with_params(mut self, params: TaskParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelSpec) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_num_elements(mut self, num_elements: usize) -> Self {
        self.num_elements = num_elements;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_byte_view_widths() {
        let f = Buffer::F32(vec![1.0, 2.0]);
        assert_eq!(f.byte_len(), 8);
        assert_eq!(f.as_bytes().len(), 8);

        let d = Buffer::F64(vec![1.0]);
        assert_eq!(d.byte_len(), 8);

        let b = Buffer::Bytes(vec![0xFF, 0x00]);
        assert_eq!(b.byte_len(), 2);
        assert_eq!(b.as_bytes(), &[0xFF, 0x00]);
    }

    #[test]
    fn test_real_view_widens_f32() {
        let f = Buffer::F32(vec![1.5, -2.0]);
        let view = f.real_view().unwrap();
        assert_eq!(view.as_ref(), &[1.5, -2.0]);
        assert!(Buffer::Bytes(vec![1, 2]).real_view().is_none());
    }

    #[test]
    fn test_scratch_slots() {
        let mut s = ScratchSpace::default();
        s.put("temp_freq", vec![1.0, 2.0]);
        assert_eq!(s.get("temp_freq").unwrap(), &[1.0, 2.0]);
        assert!(s.get("missing").is_none());
        s.clear();
        assert!(s.get("temp_freq").is_none());
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new(7, "SAXPY", Buffer::F32(vec![1.0; 4]), Buffer::F32(vec![0.0; 4]))
            .with_params(TaskParams::Saxpy { a: 2.0 });
        assert_eq!(task.num_elements, 4);
        assert_eq!(task.params, TaskParams::Saxpy { a: 2.0 });
        assert_eq!(task.kernel, KernelSpec::Native);
    }
}
