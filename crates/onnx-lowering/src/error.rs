use lowering_ir::ElementType;

/// Reason a node could not be lowered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("missing required attribute '{name}'")]
    MissingAttribute { name: String },

    #[error("attribute '{name}' has type {actual}, expected {expected}")]
    AttributeTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("the shape of the axes input must be static")]
    DynamicAxesShapeUnsupported,

    #[error("unsupported input element type {elem_type}")]
    UnsupportedElementType { elem_type: ElementType },

    #[error("number of reduction axes ({axes}) is larger than the input tensor's rank ({rank})")]
    TooManyReductionAxes { axes: usize, rank: usize },

    #[error("reduction axis {axis} is out of range [-{rank}, {rank}) for rank {rank}")]
    AxisOutOfRange { axis: i64, rank: usize },

    #[error("expected at least {expected} inputs, got {actual}")]
    InvalidInputCount { expected: usize, actual: usize },

    #[error("operator is not supported")]
    UnsupportedOperator,

    #[error("opset {version} is not supported, the earliest registered version is {earliest}")]
    UnsupportedOperatorVersion { version: usize, earliest: usize },
}

/// Error returned when lowering a single source node fails.
///
/// Carries the operator name and the node's location so the embedding layer can
/// report which node of the model was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{op_type} ({location}): {kind}")]
pub struct ConversionError {
    pub op_type: String,
    pub location: String,
    pub kind: ErrorKind,
}

impl ConversionError {
    pub fn new(op_type: impl Into<String>, location: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            op_type: op_type.into(),
            location: location.into(),
            kind,
        }
    }
}
