//! Reduction axis resolution
//!
//! Decides which axes a reduction acts over. Depending on the opset the axes come
//! from the `axes` attribute or from the second input. When the axes are left out
//! and the rank of the data is not known at conversion time, a small IR expression
//! computing `range(0, rank(data))` is emitted instead.
//!
//! Every check that can fail runs before the first IR node is added, so a rejected
//! node never leaves anything behind in the graph.

use lowering_ir::{ElementType, IrGraph, OperandHandle, TensorData, normalize_axis};

use crate::context::LoweringContext;
use crate::error::{ConversionError, ErrorKind};

/// Where a reduction reads its axes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxesPolicy {
    /// `axes` attribute (ReduceSum before opset 13, the rest before opset 18).
    FromAttribute,
    /// Optional second input, honoring `noop_with_empty_axes`.
    FromInput,
}

/// Outcome of axis resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ReductionAxes {
    /// Axes known at conversion time.
    Static(Vec<i64>),
    /// Axes supplied by an input of the node.
    Runtime(OperandHandle),
    /// Axes computed at run time by an expression emitted during resolution.
    Synthesized(OperandHandle),
    /// The reduction is a no-op.
    None,
}

impl ReductionAxes {
    /// Operand to feed as the axes input of a reduce node, or `None` for a no-op.
    ///
    /// Static axes are embedded as an `i64` constant.
    pub fn into_operand(self, graph: &mut IrGraph) -> Option<OperandHandle> {
        match self {
            ReductionAxes::Static(axes) => Some(graph.constant(TensorData::i64s(axes))),
            ReductionAxes::Runtime(axes) | ReductionAxes::Synthesized(axes) => Some(axes),
            ReductionAxes::None => None,
        }
    }
}

/// Resolve the reduction axes of the node in `ctx` according to `policy`.
pub fn resolve_axes(
    ctx: &LoweringContext<'_>,
    policy: AxesPolicy,
    graph: &mut IrGraph,
) -> Result<ReductionAxes, ConversionError> {
    match policy {
        AxesPolicy::FromAttribute => axes_from_attribute(ctx, graph),
        AxesPolicy::FromInput => axes_from_input(ctx, graph),
    }
}

fn axes_from_attribute(
    ctx: &LoweringContext<'_>,
    graph: &mut IrGraph,
) -> Result<ReductionAxes, ConversionError> {
    let axes: Vec<i64> = ctx.attr("axes", Vec::new())?;
    let input = ctx.input(0)?;
    let rank = input.rank();

    if axes.is_empty() {
        return Ok(match rank {
            Some(rank) => {
                log::debug!("{}: reducing over all {} axes", ctx.node().name(), rank);
                ReductionAxes::Static((0..rank as i64).collect())
            }
            None => {
                log::debug!(
                    "{}: rank unknown, computing axes at run time",
                    ctx.node().name()
                );
                ReductionAxes::Synthesized(dynamic_all_axes(graph, input))
            }
        });
    }

    if let Some(rank) = rank {
        check_static_axes(ctx, &axes, rank)?;
    }

    Ok(ReductionAxes::Static(axes))
}

fn axes_from_input(
    ctx: &LoweringContext<'_>,
    graph: &mut IrGraph,
) -> Result<ReductionAxes, ConversionError> {
    let noop_with_empty_axes: i64 = ctx.attr("noop_with_empty_axes", 0)?;
    let input = ctx.input(0)?;

    if let Some(axes) = ctx.optional_input(1) {
        let elem_type = axes.elem_type();
        if !matches!(elem_type, ElementType::Int32 | ElementType::Int64) {
            return Err(ctx.error(ErrorKind::UnsupportedElementType { elem_type }));
        }

        let shape = axes
            .shape()
            .to_shape()
            .ok_or_else(|| ctx.error(ErrorKind::DynamicAxesShapeUnsupported))?;

        // A rank-0 or zero-length axes tensor counts as "no axes given".
        if !shape.is_empty() && shape != [0] {
            if let (Some(rank), [count]) = (input.rank(), shape.as_slice()) {
                if *count > rank {
                    return Err(ctx.error(ErrorKind::TooManyReductionAxes {
                        axes: *count,
                        rank,
                    }));
                }
            }
            return Ok(ReductionAxes::Runtime(axes.clone()));
        }
    }

    if noop_with_empty_axes != 0 {
        log::debug!("{}: empty axes with noop_with_empty_axes", ctx.node().name());
        return Ok(ReductionAxes::None);
    }

    Ok(ReductionAxes::Synthesized(dynamic_all_axes(graph, input)))
}

fn check_static_axes(
    ctx: &LoweringContext<'_>,
    axes: &[i64],
    rank: usize,
) -> Result<(), ConversionError> {
    if axes.len() > rank {
        return Err(ctx.error(ErrorKind::TooManyReductionAxes {
            axes: axes.len(),
            rank,
        }));
    }

    if let Some(axis) = axes
        .iter()
        .find(|axis| normalize_axis(**axis, rank).is_none())
    {
        return Err(ctx.error(ErrorKind::AxisOutOfRange { axis: *axis, rank }));
    }

    Ok(())
}

/// Emit `range(0, rank(input), 1)` as an `i64` tensor.
///
/// Only the shape of `input` is read, never its values, so the expression can be
/// evaluated before the data exists. For a rank-0 input it yields an empty range.
pub fn dynamic_all_axes(graph: &mut IrGraph, input: &OperandHandle) -> OperandHandle {
    let shape = graph.shape_of(input);
    let rank = graph.shape_of(&shape);
    let rank = graph.squeeze(&rank, vec![0]);
    let start = graph.constant(TensorData::scalar_i32(0));
    let step = graph.constant(TensorData::scalar_i32(1));

    graph.range(&start, &rank, &step, ElementType::Int64)
}
