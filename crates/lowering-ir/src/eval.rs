//! Reference evaluator for IR graphs.
//!
//! Executes a graph on host memory with every element widened to `f64`. It is meant
//! for checking lowered fragments, not for performance.

use std::collections::HashMap;

use ndarray::{ArrayD, Axis, IxDyn};

use crate::graph::{IrGraph, OperandHandle, ValueId, normalize_axis};
use crate::operation::{OpIr, ReduceKind};
use crate::types::{ElementType, PartialShape};

/// Errors raised while evaluating a graph.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("no value bound for graph input {0}")]
    MissingInput(ValueId),

    #[error("value {0} does not exist in the graph")]
    UnknownValue(ValueId),

    #[error("axis {axis} is out of range for rank {rank}")]
    AxisOutOfRange { axis: i64, rank: usize },

    #[error("cannot squeeze axis {axis} of size {size}")]
    NonUnitSqueeze { axis: usize, size: usize },

    #[error("range step must not be zero")]
    ZeroStep,

    #[error("{op} expects a single element, got shape {shape:?}")]
    NotScalar { op: &'static str, shape: Vec<usize> },

    #[error("shapes {lhs:?} and {rhs:?} cannot be broadcast together")]
    Broadcast { lhs: Vec<usize>, rhs: Vec<usize> },

    #[error("invalid tensor shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// A concrete tensor living in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    pub elem_type: ElementType,
    pub data: ArrayD<f64>,
}

impl HostTensor {
    pub fn new(elem_type: ElementType, data: ArrayD<f64>) -> Self {
        Self { elem_type, data }
    }

    pub fn from_vec(
        elem_type: ElementType,
        shape: &[usize],
        values: Vec<f64>,
    ) -> Result<Self, EvalError> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)?;
        Ok(Self::new(elem_type, data))
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Elements in logical (row-major) order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }
}

/// Evaluates values of an [`IrGraph`] given bindings for its inputs.
#[derive(Debug)]
pub struct Evaluator<'a> {
    graph: &'a IrGraph,
    values: HashMap<ValueId, HostTensor>,
}

impl<'a> Evaluator<'a> {
    pub fn new(graph: &'a IrGraph) -> Self {
        Self {
            graph,
            values: HashMap::new(),
        }
    }

    /// Bind a concrete tensor to a graph input.
    pub fn with_input(mut self, input: &OperandHandle, tensor: HostTensor) -> Self {
        self.values.insert(input.id(), tensor);
        self
    }

    /// Compute the value behind `handle`, evaluating its producers as needed.
    pub fn evaluate(&mut self, handle: &OperandHandle) -> Result<HostTensor, EvalError> {
        self.value(handle.id())
    }

    fn value(&mut self, id: ValueId) -> Result<HostTensor, EvalError> {
        if let Some(value) = self.values.get(&id) {
            return Ok(value.clone());
        }

        let graph = self.graph;
        let node = graph.node(id).ok_or(EvalError::UnknownValue(id))?;
        let inputs = node
            .inputs
            .iter()
            .map(|input| self.value(*input))
            .collect::<Result<Vec<_>, _>>()?;
        let elem_type = node.output.elem_type();

        let output = match &node.op {
            OpIr::Parameter { .. } => return Err(EvalError::MissingInput(id)),
            OpIr::Constant(tensor) => {
                HostTensor::from_vec(elem_type, &tensor.shape, tensor.data.to_f64_vec())?
            }
            OpIr::ShapeOf => {
                let dims: Vec<f64> = inputs[0].shape().iter().map(|d| *d as f64).collect();
                HostTensor::from_vec(ElementType::Int64, &[dims.len()], dims)?
            }
            OpIr::Squeeze { axes } => HostTensor::new(elem_type, squeeze(&inputs[0].data, axes)?),
            OpIr::Range { elem_type } => {
                let start = scalar("Range", &inputs[0])?;
                let stop = scalar("Range", &inputs[1])?;
                let step = scalar("Range", &inputs[2])?;
                range(*elem_type, start, stop, step)?
            }
            OpIr::Exp => HostTensor::new(elem_type, inputs[0].data.mapv(f64::exp)),
            OpIr::Log => HostTensor::new(elem_type, inputs[0].data.mapv(f64::ln)),
            OpIr::Multiply => HostTensor::new(elem_type, multiply(&inputs[0], &inputs[1])?),
            OpIr::Reduce { kind, keep_dims } => {
                let axes: Vec<i64> = inputs[1].data.iter().map(|a| *a as i64).collect();
                let mut data = reduce(&inputs[0].data, *kind, &axes, *keep_dims)?;
                if elem_type.is_int() {
                    data.mapv_inplace(f64::trunc);
                }
                HostTensor::new(elem_type, data)
            }
        };

        self.values.insert(id, output.clone());
        Ok(output)
    }
}

fn scalar(op: &'static str, tensor: &HostTensor) -> Result<f64, EvalError> {
    match tensor.data.len() {
        1 => Ok(tensor.to_vec()[0]),
        _ => Err(EvalError::NotScalar {
            op,
            shape: tensor.shape().to_vec(),
        }),
    }
}

fn squeeze(data: &ArrayD<f64>, axes: &[i64]) -> Result<ArrayD<f64>, EvalError> {
    let rank = data.ndim();
    let mut normalized = normalize_axes(axes, rank)?;
    normalized.sort_unstable_by(|a, b| b.cmp(a));

    let mut output = data.clone();
    for axis in normalized {
        let size = output.shape()[axis];
        if size != 1 {
            return Err(EvalError::NonUnitSqueeze { axis, size });
        }
        output = output.index_axis_move(Axis(axis), 0);
    }
    Ok(output)
}

fn range(
    elem_type: ElementType,
    start: f64,
    stop: f64,
    step: f64,
) -> Result<HostTensor, EvalError> {
    if step == 0.0 {
        return Err(EvalError::ZeroStep);
    }

    let mut values = Vec::new();
    let mut current = start;
    while (step > 0.0 && current < stop) || (step < 0.0 && current > stop) {
        values.push(current);
        current += step;
    }

    HostTensor::from_vec(elem_type, &[values.len()], values)
}

fn multiply(lhs: &HostTensor, rhs: &HostTensor) -> Result<ArrayD<f64>, EvalError> {
    let lhs_shape = PartialShape::from_static(lhs.shape());
    let rhs_shape = PartialShape::from_static(rhs.shape());
    if lhs_shape.broadcast(&rhs_shape).is_none() {
        return Err(EvalError::Broadcast {
            lhs: lhs.shape().to_vec(),
            rhs: rhs.shape().to_vec(),
        });
    }
    Ok(&lhs.data * &rhs.data)
}

fn normalize_axes(axes: &[i64], rank: usize) -> Result<Vec<usize>, EvalError> {
    let mut normalized = Vec::with_capacity(axes.len());
    for axis in axes {
        let value =
            normalize_axis(*axis, rank).ok_or(EvalError::AxisOutOfRange { axis: *axis, rank })?;
        if !normalized.contains(&value) {
            normalized.push(value);
        }
    }
    Ok(normalized)
}

/// Reduce `data` over `axes`. An empty axis list returns the input unchanged.
fn reduce(
    data: &ArrayD<f64>,
    kind: ReduceKind,
    axes: &[i64],
    keep_dims: bool,
) -> Result<ArrayD<f64>, EvalError> {
    let mut axes = normalize_axes(axes, data.ndim())?;
    if axes.is_empty() {
        return Ok(data.clone());
    }
    axes.sort_unstable();

    let count: usize = axes.iter().map(|axis| data.shape()[*axis]).product();
    let mut output = match kind {
        ReduceKind::L1 => data.mapv(f64::abs),
        ReduceKind::L2 => data.mapv(|x| x * x),
        _ => data.clone(),
    };

    // Highest axis first so the remaining indices stay valid.
    for axis in axes.iter().rev() {
        let axis = Axis(*axis);
        output = match kind {
            ReduceKind::Sum | ReduceKind::Mean | ReduceKind::L1 | ReduceKind::L2 => {
                output.sum_axis(axis)
            }
            ReduceKind::Prod => output.fold_axis(axis, 1.0, |acc, x| acc * x),
            ReduceKind::Max => output.fold_axis(axis, f64::NEG_INFINITY, |acc, x| acc.max(*x)),
            ReduceKind::Min => output.fold_axis(axis, f64::INFINITY, |acc, x| acc.min(*x)),
        };
    }

    match kind {
        ReduceKind::Mean if count > 0 => output.mapv_inplace(|x| x / count as f64),
        ReduceKind::L2 => output.mapv_inplace(f64::sqrt),
        _ => {}
    }

    if keep_dims {
        for axis in axes {
            output = output.insert_axis(Axis(axis));
        }
    }

    Ok(output)
}
