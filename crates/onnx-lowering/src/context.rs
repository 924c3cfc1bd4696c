use lowering_ir::OperandHandle;

use crate::attribute::FromAttribute;
use crate::error::{ConversionError, ErrorKind};
use crate::node::SourceNode;

/// Everything a lowering routine may read about the node it lowers.
///
/// Pairs the borrowed source node with the already-lowered operands of its inputs.
/// Element type, rank and shape queries go through the [`OperandHandle`]s.
#[derive(Debug, Clone, Copy)]
pub struct LoweringContext<'a> {
    node: &'a SourceNode,
    inputs: &'a [OperandHandle],
}

impl<'a> LoweringContext<'a> {
    pub fn new(node: &'a SourceNode, inputs: &'a [OperandHandle]) -> Self {
        Self { node, inputs }
    }

    pub fn node(&self) -> &'a SourceNode {
        self.node
    }

    /// The operand at `index`, failing if the node has fewer inputs.
    pub fn input(&self, index: usize) -> Result<&'a OperandHandle, ConversionError> {
        self.inputs.get(index).ok_or_else(|| {
            self.error(ErrorKind::InvalidInputCount {
                expected: index + 1,
                actual: self.inputs.len(),
            })
        })
    }

    /// The operand at `index`, if the node has one.
    pub fn optional_input(&self, index: usize) -> Option<&'a OperandHandle> {
        self.inputs.get(index)
    }

    /// Read an attribute, falling back to `default` when it is absent.
    pub fn attr<T: FromAttribute>(&self, name: &str, default: T) -> Result<T, ConversionError> {
        self.node
            .attrs()
            .get(name, default)
            .map_err(|kind| self.error(kind))
    }

    pub fn attr_required<T: FromAttribute>(&self, name: &str) -> Result<T, ConversionError> {
        self.node
            .attrs()
            .get_required(name)
            .map_err(|kind| self.error(kind))
    }

    pub fn error(&self, kind: ErrorKind) -> ConversionError {
        self.node.error(kind)
    }
}
