use core::fmt;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::operation::{OpIr, ReduceKind};
use crate::tensor::TensorData;
use crate::types::{Dim, ElementType, PartialShape};

/// Index of a value in an [`IrGraph`].
///
/// Every node produces exactly one value, so the id of a value is also the id of
/// the node producing it.
#[derive(new, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(usize);

impl ValueId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Reference to a value already present in an [`IrGraph`], with the static type
/// information known about it.
///
/// Handles are cheap to clone and may be consumed by any number of nodes. Two
/// handles refer to the same value when their [`ValueId`]s match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperandHandle {
    id: ValueId,
    elem_type: ElementType,
    shape: PartialShape,
}

impl OperandHandle {
    pub fn id(&self) -> ValueId {
        self.id
    }

    pub fn elem_type(&self) -> ElementType {
        self.elem_type
    }

    pub fn shape(&self) -> &PartialShape {
        &self.shape
    }

    /// Static rank, or `None` when the rank is only known at run time.
    pub fn rank(&self) -> Option<usize> {
        self.shape.rank()
    }

    /// Whether both handles name the same graph value.
    pub fn same_value(&self, other: &OperandHandle) -> bool {
        self.id == other.id
    }
}

/// A single operation in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrNode {
    pub op: OpIr,
    pub inputs: Vec<ValueId>,
    pub output: OperandHandle,
}

/// Append-only container of IR nodes.
///
/// Nodes are stored in creation order, which is always a valid topological order
/// because a node can only reference values that already exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrGraph {
    nodes: Vec<IrNode>,
}

impl IrGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[IrNode] {
        &self.nodes
    }

    pub fn node(&self, id: ValueId) -> Option<&IrNode> {
        self.nodes.get(id.index())
    }

    /// The node producing the value behind `handle`.
    pub fn producer(&self, handle: &OperandHandle) -> Option<&IrNode> {
        self.node(handle.id)
    }

    /// Graph inputs, in declaration order.
    pub fn inputs(&self) -> Vec<OperandHandle> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.op, OpIr::Parameter { .. }))
            .map(|node| node.output.clone())
            .collect()
    }

    /// The embedded value of `handle` if it is produced by a constant node.
    pub fn constant_value(&self, handle: &OperandHandle) -> Option<&TensorData> {
        match &self.producer(handle)?.op {
            OpIr::Constant(data) => Some(data),
            _ => None,
        }
    }

    /// Declare a graph input.
    pub fn parameter(&mut self, elem_type: ElementType, shape: PartialShape) -> OperandHandle {
        let op = OpIr::Parameter {
            elem_type,
            shape: shape.clone(),
        };
        self.push(op, Vec::new(), elem_type, shape)
    }

    pub fn constant(&mut self, data: TensorData) -> OperandHandle {
        let elem_type = data.elem_type();
        let shape = PartialShape::from_static(&data.shape);
        self.push(OpIr::Constant(data), Vec::new(), elem_type, shape)
    }

    pub fn shape_of(&mut self, input: &OperandHandle) -> OperandHandle {
        let len = match input.rank() {
            Some(rank) => Dim::Static(rank),
            None => Dim::Dynamic,
        };
        self.push(
            OpIr::ShapeOf,
            vec![input.id],
            ElementType::Int64,
            PartialShape::Static(vec![len]),
        )
    }

    pub fn squeeze(&mut self, input: &OperandHandle, axes: Vec<i64>) -> OperandHandle {
        let shape = match input.shape.dims() {
            Some(dims) => {
                let rank = dims.len();
                let squeezed: Vec<usize> = axes
                    .iter()
                    .filter_map(|axis| normalize_axis(*axis, rank))
                    .collect();
                PartialShape::Static(
                    dims.iter()
                        .enumerate()
                        .filter(|(i, _)| !squeezed.contains(i))
                        .map(|(_, d)| *d)
                        .collect(),
                )
            }
            None => PartialShape::Dynamic,
        };
        let elem_type = input.elem_type;
        self.push(OpIr::Squeeze { axes }, vec![input.id], elem_type, shape)
    }

    pub fn range(
        &mut self,
        start: &OperandHandle,
        stop: &OperandHandle,
        step: &OperandHandle,
        elem_type: ElementType,
    ) -> OperandHandle {
        let scalar = |handle: &OperandHandle| self.constant_value(handle)?.scalar_i64();
        let len = match (scalar(start), scalar(stop), scalar(step)) {
            (Some(start), Some(stop), Some(step)) if step != 0 => {
                let span = stop - start;
                let count = (span + step - step.signum()) / step;
                Dim::Static(count.max(0) as usize)
            }
            _ => Dim::Dynamic,
        };
        self.push(
            OpIr::Range { elem_type },
            vec![start.id, stop.id, step.id],
            elem_type,
            PartialShape::Static(vec![len]),
        )
    }

    pub fn exp(&mut self, input: &OperandHandle) -> OperandHandle {
        self.unary(OpIr::Exp, input)
    }

    pub fn log(&mut self, input: &OperandHandle) -> OperandHandle {
        self.unary(OpIr::Log, input)
    }

    pub fn multiply(&mut self, lhs: &OperandHandle, rhs: &OperandHandle) -> OperandHandle {
        let shape = lhs
            .shape
            .broadcast(&rhs.shape)
            .unwrap_or(PartialShape::Dynamic);
        let elem_type = lhs.elem_type;
        self.push(OpIr::Multiply, vec![lhs.id, rhs.id], elem_type, shape)
    }

    pub fn reduce(
        &mut self,
        kind: ReduceKind,
        input: &OperandHandle,
        axes: &OperandHandle,
        keep_dims: bool,
    ) -> OperandHandle {
        let static_axes = self
            .constant_value(axes)
            .and_then(|data| data.data.to_i64_vec());
        let shape = reduce_output_shape(&input.shape, static_axes, keep_dims);
        let elem_type = input.elem_type;
        self.push(
            OpIr::Reduce { kind, keep_dims },
            vec![input.id, axes.id],
            elem_type,
            shape,
        )
    }

    fn unary(&mut self, op: OpIr, input: &OperandHandle) -> OperandHandle {
        let elem_type = input.elem_type;
        let shape = input.shape.clone();
        self.push(op, vec![input.id], elem_type, shape)
    }

    fn push(
        &mut self,
        op: OpIr,
        inputs: Vec<ValueId>,
        elem_type: ElementType,
        shape: PartialShape,
    ) -> OperandHandle {
        debug_assert_eq!(op.num_inputs(), inputs.len(), "{}", op.name());
        let output = OperandHandle {
            id: ValueId::new(self.nodes.len()),
            elem_type,
            shape,
        };
        self.nodes.push(IrNode {
            op,
            inputs,
            output: output.clone(),
        });
        output
    }
}

/// Map an axis in `[-rank, rank-1]` to `[0, rank-1]`.
pub fn normalize_axis(axis: i64, rank: usize) -> Option<usize> {
    let rank = rank as i64;
    let axis = if axis < 0 { axis + rank } else { axis };
    (0..rank).contains(&axis).then_some(axis as usize)
}

fn reduce_output_shape(
    input: &PartialShape,
    static_axes: Option<Vec<i64>>,
    keep_dims: bool,
) -> PartialShape {
    let Some(dims) = input.dims() else {
        return PartialShape::Dynamic;
    };
    let rank = dims.len();

    if let Some(axes) = static_axes {
        let mut reduced = Vec::with_capacity(axes.len());
        for axis in axes {
            match normalize_axis(axis, rank) {
                Some(axis) => reduced.push(axis),
                None => return PartialShape::Dynamic,
            }
        }

        let dims = dims
            .iter()
            .enumerate()
            .filter_map(|(i, dim)| match (reduced.contains(&i), keep_dims) {
                (false, _) => Some(*dim),
                (true, true) => Some(Dim::Static(1)),
                (true, false) => None,
            })
            .collect();
        return PartialShape::Static(dims);
    }

    if keep_dims {
        return PartialShape::with_rank(rank);
    }

    // Run-time axes may repeat an axis, so their count does not fix the output rank.
    PartialShape::Dynamic
}
