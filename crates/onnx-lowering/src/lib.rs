#![warn(missing_debug_implementations)]

//! Opset-versioned lowering of ONNX operators into the [`lowering_ir`] graph.
//!
//! A [`SourceNode`] carries the operator name, the opset it was authored against and
//! its attributes. [`lower_node`] selects the lowering registered for that operator
//! and opset, validates the node, and appends the operations implementing it to an
//! [`IrGraph`]. Validation always completes before the first node is created, so a
//! failed conversion leaves the graph as it was.
//!
//! ```
//! use lowering_ir::{ElementType, IrGraph, PartialShape};
//! use onnx_lowering::{SourceNode, lower_node};
//!
//! let mut graph = IrGraph::new();
//! let data = graph.parameter(ElementType::Float32, PartialShape::from_static(&[2, 3]));
//! let node = SourceNode::builder("ReduceSum", "sum")
//!     .opset(11)
//!     .input("data")
//!     .attr_ints("axes", vec![1])
//!     .attr_int("keepdims", 0)
//!     .build();
//!
//! let outputs = lower_node(&node, &[data], &mut graph).unwrap();
//! assert_eq!(outputs[0].shape(), &PartialShape::from_static(&[2]));
//! ```

mod attribute;
mod axes;
mod context;
mod error;
mod node;
mod type_policy;

pub mod op;
pub mod registry;

pub use attribute::*;
pub use axes::*;
pub use context::*;
pub use error::*;
pub use node::*;
pub use registry::{OpsetRegistry, default_registry};
pub use type_policy::*;

use lowering_ir::{IrGraph, OperandHandle};

/// Results of lowering one node, one handle per node output.
pub type OutputVector = Vec<OperandHandle>;

/// Lower `node` with the process-wide [`default_registry`].
pub fn lower_node(
    node: &SourceNode,
    inputs: &[OperandHandle],
    graph: &mut IrGraph,
) -> Result<OutputVector, ConversionError> {
    default_registry().lower(node, inputs, graph)
}
