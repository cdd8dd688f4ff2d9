// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unary math functions. Every numeric kind maps to a `f64` result.

use crate::nodes::arithmetic::Arithmetic;
use crate::operator::{OpError, UnaryNode};
use crate::value::convert;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Math function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MathOp {
    /// Square root; negative input gives NaN
    Sqrt,
    /// Sine of an angle in radians
    Sine,
}

impl MathOp {
    /// All functions
    pub const ALL: [MathOp; 2] = [Self::Sqrt, Self::Sine];

    /// Function name used in kind names
    pub fn name(self) -> &'static str {
        match self {
            Self::Sqrt => "Sqrt",
            Self::Sine => "Sine",
        }
    }

    /// Apply the function
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sqrt => x.sqrt(),
            Self::Sine => x.sin(),
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Create an `{Kind}{Op}` node, e.g. `FloatSqrt`
pub fn math<T: Arithmetic>(op: MathOp, display_name: impl Into<String>) -> Rc<UnaryNode<T, f64>> {
    let kind_name = format!("{}{}", T::KIND.type_name(), op.name());
    UnaryNode::new(kind_name, display_name, move |x: T| {
        let x = convert::<T, f64>(x).map_err(OpError::from)?;
        Ok(op.apply(x))
    })
}
