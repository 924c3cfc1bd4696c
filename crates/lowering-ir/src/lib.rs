#![warn(missing_debug_implementations)]

//! Hardware-independent intermediate representation produced by the ONNX lowering
//! engine.
//!
//! An [`IrGraph`] is an append-only arena of single-output operations. Lowering code
//! adds nodes through the builder methods on the graph and passes the returned
//! [`OperandHandle`]s around; handles carry the best-effort static element type and
//! [`PartialShape`] of the value they name.

mod graph;
mod operation;
mod tensor;
mod types;

pub mod eval;

pub use graph::*;
pub use operation::*;
pub use tensor::*;
pub use types::*;
