//! Source node representation
//!
//! A [`SourceNode`] is one already-parsed operator instance of the imported model.
//! Lowering only ever borrows it.

use crate::attribute::{AttributeValue, Attributes};
use crate::error::{ConversionError, ErrorKind};

/// One operator instance of the source model.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    op_type: String,
    name: String,
    opset_version: usize,
    inputs: Vec<String>,
    attrs: Attributes,
    location: String,
}

impl SourceNode {
    /// Start building a node of type `op_type` named `name`.
    pub fn builder(op_type: impl Into<String>, name: impl Into<String>) -> SourceNodeBuilder {
        SourceNodeBuilder::new(op_type, name)
    }

    /// Operator name, e.g. `ReduceSum`.
    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opset version the node was authored against.
    pub fn opset_version(&self) -> usize {
        self.opset_version
    }

    /// Names of the node inputs, in order.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Human-readable location used in diagnostics.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Wrap `kind` into an error pointing at this node.
    pub fn error(&self, kind: ErrorKind) -> ConversionError {
        ConversionError::new(&self.op_type, &self.location, kind)
    }
}

/// Builder for [`SourceNode`]s, used by parsers and tests.
#[derive(Debug, Clone)]
pub struct SourceNodeBuilder {
    op_type: String,
    name: String,
    opset_version: usize,
    inputs: Vec<String>,
    attrs: Vec<(String, AttributeValue)>,
    location: Option<String>,
}

impl SourceNodeBuilder {
    pub fn new(op_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            name: name.into(),
            opset_version: 1,
            inputs: Vec::new(),
            attrs: Vec::new(),
            location: None,
        }
    }

    pub fn opset(mut self, version: usize) -> Self {
        self.opset_version = version;
        self
    }

    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn attr_int(self, name: impl Into<String>, value: i64) -> Self {
        self.attr(name, value)
    }

    pub fn attr_ints(self, name: impl Into<String>, values: Vec<i64>) -> Self {
        self.attr(name, values)
    }

    /// Override the default `node '<name>'` location.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn build(self) -> SourceNode {
        let location = self
            .location
            .unwrap_or_else(|| format!("node '{}'", self.name));

        SourceNode {
            op_type: self.op_type,
            name: self.name,
            opset_version: self.opset_version,
            inputs: self.inputs,
            attrs: self.attrs.into_iter().collect(),
            location,
        }
    }
}
