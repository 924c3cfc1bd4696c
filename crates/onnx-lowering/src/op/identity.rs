//! # Identity
//!
//! Returns its input unchanged. Also used as the no-op fallback of reductions whose
//! axes resolve to nothing.

use lowering_ir::OperandHandle;

use crate::OutputVector;
use crate::context::LoweringContext;
use crate::error::ConversionError;

/// Pass `input` through without creating any IR node.
pub fn identity(input: &OperandHandle) -> OutputVector {
    vec![input.clone()]
}

/// Lowering of the `Identity` operator.
pub fn lower_identity(ctx: &LoweringContext<'_>) -> Result<OutputVector, ConversionError> {
    Ok(identity(ctx.input(0)?))
}
