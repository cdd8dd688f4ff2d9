// SPDX-License-Identifier: MIT OR Apache-2.0
//! Comparison operators yielding `bool`.

use crate::operator::{BinaryNode, TrinaryNode};
use crate::value::PortValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use std::rc::Rc;

/// Comparison operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// `x == y`
    EqualTo,
    /// `x != y`
    NotEqualTo,
    /// `x < y`
    LessThan,
    /// `x <= y`
    LessThanEqualTo,
    /// `x > y`
    GreaterThan,
    /// `x >= y`
    GreaterThanEqualTo,
}

impl ComparisonOp {
    /// All operations
    pub const ALL: [ComparisonOp; 6] = [
        Self::EqualTo,
        Self::NotEqualTo,
        Self::LessThan,
        Self::LessThanEqualTo,
        Self::GreaterThan,
        Self::GreaterThanEqualTo,
    ];

    /// Operation name used in kind names
    pub fn name(self) -> &'static str {
        match self {
            Self::EqualTo => "EqualTo",
            Self::NotEqualTo => "NotEqualTo",
            Self::LessThan => "LessThan",
            Self::LessThanEqualTo => "LessThanEqualTo",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanEqualTo => "GreaterThanEqualTo",
        }
    }

    /// Apply the operation. Every comparison involving NaN is false except
    /// `NotEqualTo`.
    pub fn apply<T: PortValue>(self, x: T, y: T) -> bool {
        match self {
            Self::EqualTo => x == y,
            Self::NotEqualTo => x != y,
            Self::LessThan => x < y,
            Self::LessThanEqualTo => x <= y,
            Self::GreaterThan => x > y,
            Self::GreaterThanEqualTo => x >= y,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Floating-point kinds
pub trait Float: PortValue + Sub<Output = Self> {
    /// Absolute value
    fn abs(self) -> Self;
}

impl Float for f32 {
    fn abs(self) -> Self {
        f32::abs(self)
    }
}

impl Float for f64 {
    fn abs(self) -> Self {
        f64::abs(self)
    }
}

/// Create an `{Kind}{Op}` node, e.g. `IntLessThan`
pub fn comparison<T: PortValue>(op: ComparisonOp, display_name: impl Into<String>) -> Rc<BinaryNode<T, T, bool>> {
    let kind_name = format!("{}{}", T::KIND.type_name(), op.name());
    BinaryNode::new(kind_name, display_name, move |x: T, y: T| Ok(op.apply(x, y)))
}

/// Create a `{Kind}EpsilonEqualTo` node: true when `|x - y| < z`
pub fn epsilon_equal<T: Float>(display_name: impl Into<String>) -> Rc<TrinaryNode<T, T, T, bool>> {
    TrinaryNode::new(
        format!("{}EpsilonEqualTo", T::KIND.type_name()),
        display_name,
        |x: T, y: T, epsilon: T| Ok((x - y).abs() < epsilon),
    )
}

/// Create a `{Kind}EpsilonNotEqualTo` node: true when `|x - y| > z`
pub fn epsilon_not_equal<T: Float>(display_name: impl Into<String>) -> Rc<TrinaryNode<T, T, T, bool>> {
    TrinaryNode::new(
        format!("{}EpsilonNotEqualTo", T::KIND.type_name()),
        display_name,
        |x: T, y: T, epsilon: T| Ok((x - y).abs() > epsilon),
    )
}
