//! Opset dispatch registry
//!
//! Maps an operator name and the opset a node was authored against to the lowering
//! that implements it. Each operator has a list of entries keyed by the opset in
//! which its semantics last changed; a node is lowered with the newest entry whose
//! version does not exceed the node's opset.
//!
//! A registry is immutable once built. [`default_registry`] is created on first use
//! and shared by every conversion for the rest of the process.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use derive_new::new;
use lowering_ir::{IrGraph, OperandHandle};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::OutputVector;
use crate::axes::AxesPolicy;
use crate::context::LoweringContext;
use crate::error::{ConversionError, ErrorKind};
use crate::node::SourceNode;
use crate::op::identity::lower_identity;
use crate::op::reduce::{ReduceOp, lower_reduce};
use crate::type_policy::{REDUCE_TYPES, REDUCE_TYPES_BF16, TypeSet};

/// Operators the engine knows how to lower.
///
/// See: <https://onnx.ai/onnx/operators/index.html>
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum OpType {
    Identity,
    ReduceL1,
    ReduceL2,
    ReduceLogSum,
    ReduceLogSumExp,
    ReduceMax,
    ReduceMean,
    ReduceMin,
    ReduceProd,
    ReduceSum,
    ReduceSumSquare,
}

impl OpType {
    /// The reduction lowered for this operator, if it is one.
    pub fn reduce_op(&self) -> Option<ReduceOp> {
        match self {
            OpType::Identity => None,
            OpType::ReduceL1 => Some(ReduceOp::L1),
            OpType::ReduceL2 => Some(ReduceOp::L2),
            OpType::ReduceLogSum => Some(ReduceOp::LogSum),
            OpType::ReduceLogSumExp => Some(ReduceOp::LogSumExp),
            OpType::ReduceMax => Some(ReduceOp::Max),
            OpType::ReduceMean => Some(ReduceOp::Mean),
            OpType::ReduceMin => Some(ReduceOp::Min),
            OpType::ReduceProd => Some(ReduceOp::Prod),
            OpType::ReduceSum => Some(ReduceOp::Sum),
            OpType::ReduceSumSquare => Some(ReduceOp::SumSquare),
        }
    }
}

/// Lowering routine selected by a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lowering {
    Identity,
    Reduce { op: ReduceOp, axes: AxesPolicy },
}

impl Lowering {
    fn lower(
        &self,
        ctx: &LoweringContext<'_>,
        types: TypeSet,
        graph: &mut IrGraph,
    ) -> Result<OutputVector, ConversionError> {
        match self {
            Lowering::Identity => lower_identity(ctx),
            Lowering::Reduce { op, axes } => lower_reduce(ctx, *op, *axes, types, graph),
        }
    }
}

/// One versioned lowering of an operator.
#[derive(new, Debug, Clone, PartialEq)]
pub struct LoweringEntry {
    pub op_type: OpType,
    /// First opset in which this lowering applies.
    pub since_version: usize,
    pub lowering: Lowering,
    /// Element types accepted for the primary input.
    pub supported_types: TypeSet,
}

/// Immutable mapping from operator to its versioned lowerings.
#[derive(Debug, Clone)]
pub struct OpsetRegistry {
    entries: HashMap<OpType, Vec<LoweringEntry>>,
}

impl OpsetRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with every operator this crate implements.
    pub fn with_default_ops() -> Self {
        let mut builder = Self::builder().register(LoweringEntry::new(
            OpType::Identity,
            1,
            Lowering::Identity,
            TypeSet::Any,
        ));

        // Opset 11 brought no semantic change over opset 1 for this family, so no
        // entry is registered for it.
        for op_type in OpType::iter() {
            let Some(op) = op_type.reduce_op() else {
                continue;
            };

            builder = builder.register(LoweringEntry::new(
                op_type,
                1,
                Lowering::Reduce {
                    op,
                    axes: AxesPolicy::FromAttribute,
                },
                REDUCE_TYPES,
            ));

            let axes_as_input = if op_type == OpType::ReduceSum { 13 } else { 18 };
            builder = builder.register(LoweringEntry::new(
                op_type,
                axes_as_input,
                Lowering::Reduce {
                    op,
                    axes: AxesPolicy::FromInput,
                },
                REDUCE_TYPES_BF16,
            ));
        }

        builder.build()
    }

    /// Select the entry lowering `op_type` at `opset`.
    pub fn resolve(&self, op_type: &str, opset: usize) -> Result<&LoweringEntry, ErrorKind> {
        let entries = OpType::from_str(op_type)
            .ok()
            .and_then(|op_type| self.entries.get(&op_type))
            .filter(|entries| !entries.is_empty())
            .ok_or(ErrorKind::UnsupportedOperator)?;

        entries
            .iter()
            .rev()
            .find(|entry| entry.since_version <= opset)
            .ok_or(ErrorKind::UnsupportedOperatorVersion {
                version: opset,
                earliest: entries[0].since_version,
            })
    }

    /// Whether a node of `op_type` at `opset` can be lowered.
    pub fn supports(&self, op_type: &str, opset: usize) -> bool {
        self.resolve(op_type, opset).is_ok()
    }

    /// Registered entries of `op_type`, oldest first.
    pub fn entries(&self, op_type: OpType) -> &[LoweringEntry] {
        self.entries
            .get(&op_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Lower `node` into `graph`.
    ///
    /// `inputs` are the already lowered operands of the node's inputs, in order. On
    /// failure nothing has been added to `graph`.
    pub fn lower(
        &self,
        node: &SourceNode,
        inputs: &[OperandHandle],
        graph: &mut IrGraph,
    ) -> Result<OutputVector, ConversionError> {
        let entry = self
            .resolve(node.op_type(), node.opset_version())
            .map_err(|kind| node.error(kind))?;

        log::debug!(
            "Lowering {} node {} (opset {}) with the opset {} lowering",
            node.op_type(),
            node.name(),
            node.opset_version(),
            entry.since_version
        );

        let ctx = LoweringContext::new(node, inputs);
        entry.lowering.lower(&ctx, entry.supported_types, graph)
    }
}

/// Collects entries for an [`OpsetRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: HashMap<OpType, Vec<LoweringEntry>>,
}

impl RegistryBuilder {
    /// Add `entry`, replacing any entry of the same operator and version.
    pub fn register(mut self, entry: LoweringEntry) -> Self {
        let entries = self.entries.entry(entry.op_type).or_default();
        entries.retain(|existing| existing.since_version != entry.since_version);
        entries.push(entry);
        self
    }

    pub fn build(mut self) -> OpsetRegistry {
        for entries in self.entries.values_mut() {
            entries.sort_by_key(|entry| entry.since_version);
        }
        OpsetRegistry {
            entries: self.entries,
        }
    }
}

/// The process-wide registry of every operator implemented by this crate.
pub fn default_registry() -> &'static OpsetRegistry {
    static REGISTRY: OnceLock<OpsetRegistry> = OnceLock::new();
    REGISTRY.get_or_init(OpsetRegistry::with_default_ops)
}
