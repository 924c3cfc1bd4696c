use core::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The element type of an IR value.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
pub enum ElementType {
    #[strum(serialize = "boolean")]
    Bool,
    #[strum(serialize = "bf16")]
    BFloat16,
    #[strum(serialize = "f16")]
    Float16,
    #[strum(serialize = "f32")]
    Float32,
    #[strum(serialize = "f64")]
    Float64,
    #[strum(serialize = "i8")]
    Int8,
    #[strum(serialize = "i16")]
    Int16,
    #[strum(serialize = "i32")]
    Int32,
    #[strum(serialize = "i64")]
    Int64,
    #[strum(serialize = "u8")]
    Uint8,
    #[strum(serialize = "u16")]
    Uint16,
    #[strum(serialize = "u32")]
    Uint32,
    #[strum(serialize = "u64")]
    Uint64,
    #[strum(serialize = "string")]
    String,
    /// Element type not known until the graph executes.
    #[strum(serialize = "dynamic")]
    Dynamic,
}

impl ElementType {
    /// Check if this is an integer type (signed or unsigned)
    pub fn is_int(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
        )
    }
}

/// A single dimension of a [`PartialShape`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dim {
    /// Size known at conversion time.
    Static(usize),
    /// Size only known when the graph executes.
    Dynamic,
}

impl Dim {
    pub fn as_static(&self) -> Option<usize> {
        match self {
            Dim::Static(size) => Some(*size),
            Dim::Dynamic => None,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Dim::Static(_))
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Static(size) => write!(f, "{size}"),
            Dim::Dynamic => f.write_str("?"),
        }
    }
}

/// Shape of an IR value, as far as it is known at conversion time.
///
/// `Dynamic` means even the rank is unknown. `Static` carries a known rank whose
/// individual dimensions may still be dynamic.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialShape {
    Dynamic,
    Static(Vec<Dim>),
}

impl PartialShape {
    /// A fully static shape.
    pub fn from_static(dims: &[usize]) -> Self {
        Self::Static(dims.iter().map(|d| Dim::Static(*d)).collect())
    }

    /// A shape of known rank where every dimension is dynamic.
    pub fn with_rank(rank: usize) -> Self {
        Self::Static(vec![Dim::Dynamic; rank])
    }

    /// A rank-0 shape.
    pub fn scalar() -> Self {
        Self::Static(Vec::new())
    }

    /// The rank, when it is statically known.
    pub fn rank(&self) -> Option<usize> {
        match self {
            PartialShape::Dynamic => None,
            PartialShape::Static(dims) => Some(dims.len()),
        }
    }

    pub fn dims(&self) -> Option<&[Dim]> {
        match self {
            PartialShape::Dynamic => None,
            PartialShape::Static(dims) => Some(dims),
        }
    }

    /// True when both the rank and every dimension are known.
    pub fn is_static(&self) -> bool {
        match self {
            PartialShape::Dynamic => false,
            PartialShape::Static(dims) => dims.iter().all(Dim::is_static),
        }
    }

    /// The concrete shape, if fully static.
    pub fn to_shape(&self) -> Option<Vec<usize>> {
        self.dims()?.iter().map(Dim::as_static).collect()
    }

    /// Numpy-style broadcast of two partial shapes.
    ///
    /// Returns `None` if two static dimensions are incompatible.
    pub fn broadcast(&self, other: &PartialShape) -> Option<PartialShape> {
        let (lhs, rhs) = match (self.dims(), other.dims()) {
            (Some(lhs), Some(rhs)) => (lhs, rhs),
            _ => return Some(PartialShape::Dynamic),
        };

        let rank = lhs.len().max(rhs.len());
        let mut dims = Vec::with_capacity(rank);

        for i in 0..rank {
            let l = dim_from_right(lhs, rank, i);
            let r = dim_from_right(rhs, rank, i);

            let dim = match (l, r) {
                (Dim::Static(1), d) | (d, Dim::Static(1)) => d,
                (Dim::Static(a), Dim::Static(b)) if a == b => Dim::Static(a),
                (Dim::Static(_), Dim::Static(_)) => return None,
                (Dim::Static(a), Dim::Dynamic) | (Dim::Dynamic, Dim::Static(a)) => Dim::Static(a),
                (Dim::Dynamic, Dim::Dynamic) => Dim::Dynamic,
            };
            dims.push(dim);
        }

        Some(PartialShape::Static(dims))
    }
}

fn dim_from_right(dims: &[Dim], rank: usize, i: usize) -> Dim {
    let offset = rank - dims.len();
    if i < offset {
        Dim::Static(1)
    } else {
        dims[i - offset]
    }
}

impl fmt::Display for PartialShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialShape::Dynamic => f.write_str("[...]"),
            PartialShape::Static(dims) => {
                f.write_str("[")?;
                for (i, dim) in dims.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{dim}")?;
                }
                f.write_str("]")
            }
        }
    }
}
