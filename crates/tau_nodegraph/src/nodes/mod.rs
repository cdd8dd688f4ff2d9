// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concrete node kinds.
//!
//! Sources and the selector are dedicated node types; every primitive
//! operator is an operation tag applied to one of the templates in
//! [`crate::operator`].

pub mod arithmetic;
pub mod bitwise;
pub mod cast;
pub mod comparison;
pub mod constant;
pub mod math;
pub mod selector;

pub use arithmetic::{arithmetic, Arithmetic, ArithmeticOp};
pub use bitwise::{bitwise, not, Bitwise, BitwiseOp};
pub use cast::{cast, cast_kind_name};
pub use comparison::{comparison, epsilon_equal, epsilon_not_equal, ComparisonOp, Float};
pub use constant::ConstantNode;
pub use math::{math, MathOp};
pub use selector::SelectorNode;
