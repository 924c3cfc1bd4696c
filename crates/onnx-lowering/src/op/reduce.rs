//! # Reduce Operations
//!
//! Lowering of the ONNX reduction family: ReduceSum, ReduceMean, ReduceMax,
//! ReduceMin, ReduceProd, ReduceL1, ReduceL2, ReduceLogSum, ReduceLogSumExp and
//! ReduceSumSquare.
//!
//! **ONNX Spec**: <https://onnx.ai/onnx/operators/onnx__ReduceSum.html>
//!
//! ## Attributes
//!
//! - `keepdims` (int, default 1): keep reduced dimensions with size 1.
//! - `axes` (ints): axes to reduce, only while axes are an attribute.
//! - `noop_with_empty_axes` (int, default 0): only once axes are an input. With 1, an
//!   empty axes input makes the operator an identity.
//!
//! ## Opset Versions
//!
//! - **Opset 1**: Axes as attribute. Empty means all axes.
//! - **Opset 11**: Axes values restricted to `[-r, r-1]`. Zero-rank input behavior is
//!   no longer described for most operators; it is lowered exactly as opset 1.
//! - **Opset 13**: ReduceSum gains bfloat16 and takes axes as an optional input.
//! - **Opset 18**: Every other reduction gains bfloat16 and takes axes as an optional
//!   input.

use lowering_ir::{IrGraph, ReduceKind};
use strum::Display;

use crate::OutputVector;
use crate::axes::{AxesPolicy, resolve_axes};
use crate::context::LoweringContext;
use crate::error::ConversionError;
use crate::op::identity::identity;
use crate::type_policy::{TypeSet, check_element_type};

/// Reduction operator being lowered.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Display)]
pub enum ReduceOp {
    Sum,
    Mean,
    Max,
    Min,
    Prod,
    L1,
    L2,
    /// `log(sum(x))`
    LogSum,
    /// `log(sum(exp(x)))`
    LogSumExp,
    /// `sum(x * x)`
    SumSquare,
}

/// Lower a reduction node.
///
/// The element type and the axes are validated before anything is added to `graph`.
/// Composite operators keep their evaluation order: the elementwise transform runs
/// before the reduction, the closing logarithm after it.
pub fn lower_reduce(
    ctx: &LoweringContext<'_>,
    op: ReduceOp,
    policy: AxesPolicy,
    types: TypeSet,
    graph: &mut IrGraph,
) -> Result<OutputVector, ConversionError> {
    let input = ctx.input(0)?;
    check_element_type(ctx, input, types)?;

    let keep_dims = ctx.attr("keepdims", 1i64)? != 0;
    let axes = resolve_axes(ctx, policy, graph)?;

    log::debug!(
        "Reduce{} for node {}: axes {:?}, keepdims {}",
        op,
        ctx.node().name(),
        axes,
        keep_dims
    );

    let Some(axes) = axes.into_operand(graph) else {
        return Ok(identity(input));
    };

    let output = match op {
        ReduceOp::Sum => graph.reduce(ReduceKind::Sum, input, &axes, keep_dims),
        ReduceOp::Mean => graph.reduce(ReduceKind::Mean, input, &axes, keep_dims),
        ReduceOp::Max => graph.reduce(ReduceKind::Max, input, &axes, keep_dims),
        ReduceOp::Min => graph.reduce(ReduceKind::Min, input, &axes, keep_dims),
        ReduceOp::Prod => graph.reduce(ReduceKind::Prod, input, &axes, keep_dims),
        ReduceOp::L1 => graph.reduce(ReduceKind::L1, input, &axes, keep_dims),
        ReduceOp::L2 => graph.reduce(ReduceKind::L2, input, &axes, keep_dims),
        ReduceOp::LogSum => {
            let sum = graph.reduce(ReduceKind::Sum, input, &axes, keep_dims);
            graph.log(&sum)
        }
        ReduceOp::LogSumExp => {
            let exp = graph.exp(input);
            let sum = graph.reduce(ReduceKind::Sum, &exp, &axes, keep_dims);
            graph.log(&sum)
        }
        ReduceOp::SumSquare => {
            let square = graph.multiply(input, input);
            graph.reduce(ReduceKind::Sum, &square, &axes, keep_dims)
        }
    };

    Ok(vec![output])
}
