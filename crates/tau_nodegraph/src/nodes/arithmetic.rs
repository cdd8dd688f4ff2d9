// SPDX-License-Identifier: MIT OR Apache-2.0
//! Arithmetic operators over the numeric kinds.

use crate::operator::{BinaryNode, OpError};
use crate::value::PortValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Arithmetic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOp {
    /// `x + y`
    Add,
    /// `x - y`
    Subtract,
    /// `x * y`
    Multiply,
    /// `x / y`
    Divide,
}

impl ArithmeticOp {
    /// All operations
    pub const ALL: [ArithmeticOp; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    /// Operation name used in kind names
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Divide => "Divide",
        }
    }

    /// Apply the operation
    pub fn apply<T: Arithmetic>(self, x: T, y: T) -> Result<T, OpError> {
        match self {
            Self::Add => x.try_add(y),
            Self::Subtract => x.try_sub(y),
            Self::Multiply => x.try_mul(y),
            Self::Divide => x.try_div(y),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric kinds supporting the four arithmetic operations.
///
/// Integer operations are checked; floats follow IEEE 754.
pub trait Arithmetic: PortValue {
    /// `self + rhs`
    fn try_add(self, rhs: Self) -> Result<Self, OpError>;
    /// `self - rhs`
    fn try_sub(self, rhs: Self) -> Result<Self, OpError>;
    /// `self * rhs`
    fn try_mul(self, rhs: Self) -> Result<Self, OpError>;
    /// `self / rhs`
    fn try_div(self, rhs: Self) -> Result<Self, OpError>;
}

macro_rules! impl_integer_arithmetic {
    ($($ty:ty),*) => {
        $(
            impl Arithmetic for $ty {
                fn try_add(self, rhs: Self) -> Result<Self, OpError> {
                    self.checked_add(rhs).ok_or(OpError::Overflow)
                }

                fn try_sub(self, rhs: Self) -> Result<Self, OpError> {
                    self.checked_sub(rhs).ok_or(OpError::Overflow)
                }

                fn try_mul(self, rhs: Self) -> Result<Self, OpError> {
                    self.checked_mul(rhs).ok_or(OpError::Overflow)
                }

                fn try_div(self, rhs: Self) -> Result<Self, OpError> {
                    if rhs == 0 {
                        return Err(OpError::DivisionByZero);
                    }
                    self.checked_div(rhs).ok_or(OpError::Overflow)
                }
            }
        )*
    };
}

impl_integer_arithmetic!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_float_arithmetic {
    ($($ty:ty),*) => {
        $(
            impl Arithmetic for $ty {
                fn try_add(self, rhs: Self) -> Result<Self, OpError> {
                    Ok(self + rhs)
                }

                fn try_sub(self, rhs: Self) -> Result<Self, OpError> {
                    Ok(self - rhs)
                }

                fn try_mul(self, rhs: Self) -> Result<Self, OpError> {
                    Ok(self * rhs)
                }

                fn try_div(self, rhs: Self) -> Result<Self, OpError> {
                    Ok(self / rhs)
                }
            }
        )*
    };
}

impl_float_arithmetic!(f32, f64);

/// Create an `{Kind}{Op}` node, e.g. `IntAdd`
pub fn arithmetic<T: Arithmetic>(op: ArithmeticOp, display_name: impl Into<String>) -> Rc<BinaryNode<T, T, T>> {
    let kind_name = format!("{}{}", T::KIND.type_name(), op.name());
    BinaryNode::new(kind_name, display_name, move |x: T, y: T| op.apply(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::EvaluationError;
    use crate::node::Node;
    use crate::nodes::constant::ConstantNode;

    #[test]
    fn test_apply() {
        assert_eq!(ArithmeticOp::Subtract.apply(10u16, 4), Ok(6));
        assert_eq!(ArithmeticOp::Multiply.apply(-3i64, 7), Ok(-21));
        assert_eq!(ArithmeticOp::Divide.apply(7i32, 2), Ok(3));
        assert_eq!(ArithmeticOp::Divide.apply(7.0f64, 2.0), Ok(3.5));
        assert_eq!(ArithmeticOp::Divide.apply(1.0f32, 0.0), Ok(f32::INFINITY));
    }

    #[test]
    fn test_integer_faults() {
        assert_eq!(ArithmeticOp::Add.apply(i8::MAX, 1), Err(OpError::Overflow));
        assert_eq!(ArithmeticOp::Subtract.apply(0u32, 1), Err(OpError::Overflow));
        assert_eq!(ArithmeticOp::Divide.apply(5u8, 0), Err(OpError::DivisionByZero));
        assert_eq!(ArithmeticOp::Divide.apply(i16::MIN, -1), Err(OpError::Overflow));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(arithmetic::<i32>(ArithmeticOp::Add, "a").kind_name(), "IntAdd");
        assert_eq!(arithmetic::<u64>(ArithmeticOp::Subtract, "s").kind_name(), "ULongSubtract");
        assert_eq!(arithmetic::<f32>(ArithmeticOp::Divide, "d").kind_name(), "FloatDivide");
        assert_eq!(ArithmeticOp::Multiply.to_string(), "Multiply");
    }

    #[test]
    fn test_division_by_zero_node() {
        let ten = ConstantNode::new("ten", 10u8);
        let zero = ConstantNode::new("zero", 0u8);
        let quotient = arithmetic::<u8>(ArithmeticOp::Divide, "quotient");
        quotient.x().connect(ten.output()).unwrap();
        quotient.y().connect(zero.output()).unwrap();

        let err = quotient.compute().unwrap_err();
        assert_eq!(
            err,
            EvaluationError::Operator {
                node: quotient.id(),
                kind: "ByteDivide".to_string(),
                source: OpError::DivisionByZero,
            }
        );
        assert_eq!(err.to_string(), format!("Node {} (ByteDivide) failed: division by zero", quotient.id()));
    }
}
