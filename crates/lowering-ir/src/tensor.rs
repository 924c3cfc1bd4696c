use serde::{Deserialize, Serialize};

use crate::types::ElementType;

/// Container of constant values embedded in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Data {
    Bools(Vec<bool>),
    Float32s(Vec<f32>),
    Float64s(Vec<f64>),
    Int32s(Vec<i32>),
    Int64s(Vec<i64>),
}

impl Data {
    pub fn len(&self) -> usize {
        match self {
            Data::Bools(v) => v.len(),
            Data::Float32s(v) => v.len(),
            Data::Float64s(v) => v.len(),
            Data::Int32s(v) => v.len(),
            Data::Int64s(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn elem_type(&self) -> ElementType {
        match self {
            Data::Bools(_) => ElementType::Bool,
            Data::Float32s(_) => ElementType::Float32,
            Data::Float64s(_) => ElementType::Float64,
            Data::Int32s(_) => ElementType::Int32,
            Data::Int64s(_) => ElementType::Int64,
        }
    }

    /// Widen every element to `f64`; booleans map to 0 and 1.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Data::Bools(v) => v.iter().map(|b| if *b { 1.0 } else { 0.0 }).collect(),
            Data::Float32s(v) => v.iter().map(|x| *x as f64).collect(),
            Data::Float64s(v) => v.clone(),
            Data::Int32s(v) => v.iter().map(|x| *x as f64).collect(),
            Data::Int64s(v) => v.iter().map(|x| *x as f64).collect(),
        }
    }

    /// Integer view of the data, if it holds integers.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            Data::Int32s(v) => Some(v.iter().map(|x| *x as i64).collect()),
            Data::Int64s(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Constant tensor payload: flat data plus its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    pub data: Data,
    pub shape: Vec<usize>,
}

impl TensorData {
    pub fn new(data: Data, shape: Vec<usize>) -> Self {
        Self { data, shape }
    }

    /// A rank-1 `i64` tensor.
    pub fn i64s(values: Vec<i64>) -> Self {
        let shape = vec![values.len()];
        Self::new(Data::Int64s(values), shape)
    }

    /// A rank-0 `i32` tensor.
    pub fn scalar_i32(value: i32) -> Self {
        Self::new(Data::Int32s(vec![value]), Vec::new())
    }

    pub fn elem_type(&self) -> ElementType {
        self.data.elem_type()
    }

    /// The single element of a one-element tensor, as `i64`.
    pub fn scalar_i64(&self) -> Option<i64> {
        match self.data.to_i64_vec()?.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }
}
