//! Element types accepted by each registered lowering.

use lowering_ir::{ElementType, OperandHandle};

use crate::context::LoweringContext;
use crate::error::{ConversionError, ErrorKind};

/// Set of element types a lowering entry accepts for its primary input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSet {
    /// Every element type, including unknown ones.
    Any,
    Only(&'static [ElementType]),
}

impl TypeSet {
    pub fn contains(&self, elem_type: ElementType) -> bool {
        match self {
            TypeSet::Any => true,
            TypeSet::Only(types) => types.contains(&elem_type),
        }
    }
}

/// Numeric types of the reduction family up to opset 12.
pub const REDUCE_TYPES: TypeSet = TypeSet::Only(&[
    ElementType::Uint32,
    ElementType::Uint64,
    ElementType::Int32,
    ElementType::Int64,
    ElementType::Float16,
    ElementType::Float32,
    ElementType::Float64,
]);

/// [`REDUCE_TYPES`] plus bfloat16, from opset 13 on.
pub const REDUCE_TYPES_BF16: TypeSet = TypeSet::Only(&[
    ElementType::Uint32,
    ElementType::Uint64,
    ElementType::Int32,
    ElementType::Int64,
    ElementType::Float16,
    ElementType::Float32,
    ElementType::Float64,
    ElementType::BFloat16,
]);

/// Reject `input` if its element type is not part of `types`.
///
/// Must run before the routine creates any IR node.
pub fn check_element_type(
    ctx: &LoweringContext<'_>,
    input: &OperandHandle,
    types: TypeSet,
) -> Result<(), ConversionError> {
    let elem_type = input.elem_type();
    if types.contains(elem_type) {
        Ok(())
    } else {
        Err(ctx.error(ErrorKind::UnsupportedElementType { elem_type }))
    }
}
