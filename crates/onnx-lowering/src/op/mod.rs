//! Lowering routines, one module per operator family.

pub mod identity;
pub mod reduce;
