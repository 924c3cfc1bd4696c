use serde::{Deserialize, Serialize};
use strum::Display;

use crate::tensor::TensorData;
use crate::types::{ElementType, PartialShape};

/// Reduction performed by [`OpIr::Reduce`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ReduceKind {
    Sum,
    Mean,
    Max,
    Min,
    Prod,
    /// Sum of absolute values.
    L1,
    /// Square root of the sum of squares.
    L2,
}

/// Describe all operations the IR can hold.
///
/// Inputs of an operation are stored on the owning [`IrNode`](crate::IrNode), in the
/// order documented on each variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpIr {
    /// Graph input. No inputs.
    Parameter {
        elem_type: ElementType,
        shape: PartialShape,
    },
    /// Embedded constant. No inputs.
    Constant(TensorData),
    /// Shape of `input` as a rank-1 `i64` tensor. Inputs: `[input]`.
    ShapeOf,
    /// Remove size-1 dimensions listed in `axes`. Inputs: `[input]`.
    Squeeze { axes: Vec<i64> },
    /// Half-open arithmetic sequence. Inputs: `[start, stop, step]`, all rank-0.
    Range { elem_type: ElementType },
    /// Elementwise e^x. Inputs: `[input]`.
    Exp,
    /// Elementwise natural logarithm. Inputs: `[input]`.
    Log,
    /// Elementwise product with broadcasting. Inputs: `[lhs, rhs]`.
    Multiply,
    /// Reduction over the axes given by a rank-1 integer tensor.
    /// Inputs: `[input, axes]`.
    Reduce { kind: ReduceKind, keep_dims: bool },
}

impl OpIr {
    /// Number of inputs the operation consumes.
    pub fn num_inputs(&self) -> usize {
        match self {
            OpIr::Parameter { .. } | OpIr::Constant(_) => 0,
            OpIr::ShapeOf | OpIr::Squeeze { .. } | OpIr::Exp | OpIr::Log => 1,
            OpIr::Multiply | OpIr::Reduce { .. } => 2,
            OpIr::Range { .. } => 3,
        }
    }

    /// Short operation name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            OpIr::Parameter { .. } => "Parameter",
            OpIr::Constant(_) => "Constant",
            OpIr::ShapeOf => "ShapeOf",
            OpIr::Squeeze { .. } => "Squeeze",
            OpIr::Range { .. } => "Range",
            OpIr::Exp => "Exp",
            OpIr::Log => "Log",
            OpIr::Multiply => "Multiply",
            OpIr::Reduce { kind, .. } => match kind {
                ReduceKind::Sum => "ReduceSum",
                ReduceKind::Mean => "ReduceMean",
                ReduceKind::Max => "ReduceMax",
                ReduceKind::Min => "ReduceMin",
                ReduceKind::Prod => "ReduceProd",
                ReduceKind::L1 => "ReduceL1",
                ReduceKind::L2 => "ReduceL2",
            },
        }
    }
}
