// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bitwise and logical operators over integers and `bool`.

use crate::operator::{BinaryNode, UnaryNode};
use crate::value::PortValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};
use std::rc::Rc;

/// Binary bitwise operation. On `bool` these are the logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitwiseOp {
    /// `x & y`
    And,
    /// `x | y`
    Or,
    /// `x ^ y`
    Xor,
    /// `!(x & y)`
    Nand,
    /// `!(x | y)`
    Nor,
    /// `!(x ^ y)`
    Xnor,
}

impl BitwiseOp {
    /// All operations
    pub const ALL: [BitwiseOp; 6] = [Self::And, Self::Or, Self::Xor, Self::Nand, Self::Nor, Self::Xnor];

    /// Operation name used in kind names
    pub fn name(self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Or => "Or",
            Self::Xor => "Xor",
            Self::Nand => "Nand",
            Self::Nor => "Nor",
            Self::Xnor => "Xnor",
        }
    }

    /// Apply the operation
    pub fn apply<T: Bitwise>(self, x: T, y: T) -> T {
        match self {
            Self::And => x & y,
            Self::Or => x | y,
            Self::Xor => x ^ y,
            Self::Nand => !(x & y),
            Self::Nor => !(x | y),
            Self::Xnor => !(x ^ y),
        }
    }
}

impl fmt::Display for BitwiseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kinds with bitwise operators: the integers and `bool`
pub trait Bitwise:
    PortValue + BitAnd<Output = Self> + BitOr<Output = Self> + BitXor<Output = Self> + Not<Output = Self>
{
}

impl Bitwise for bool {}
impl Bitwise for i8 {}
impl Bitwise for i16 {}
impl Bitwise for i32 {}
impl Bitwise for i64 {}
impl Bitwise for u8 {}
impl Bitwise for u16 {}
impl Bitwise for u32 {}
impl Bitwise for u64 {}

/// Create an `{Kind}{Op}` node, e.g. `IntXor`
pub fn bitwise<T: Bitwise>(op: BitwiseOp, display_name: impl Into<String>) -> Rc<BinaryNode<T, T, T>> {
    let kind_name = format!("{}{}", T::KIND.type_name(), op.name());
    BinaryNode::new(kind_name, display_name, move |x: T, y: T| Ok(op.apply(x, y)))
}

/// Create a `{Kind}Not` node
pub fn not<T: Bitwise>(display_name: impl Into<String>) -> Rc<UnaryNode<T, T>> {
    UnaryNode::new(format!("{}Not", T::KIND.type_name()), display_name, |x: T| Ok(!x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::nodes::constant::ConstantNode;

    #[test]
    fn test_apply_integers() {
        assert_eq!(BitwiseOp::And.apply(0b1100u8, 0b1010), 0b1000);
        assert_eq!(BitwiseOp::Or.apply(0b1100u8, 0b1010), 0b1110);
        assert_eq!(BitwiseOp::Xor.apply(0b1100u8, 0b1010), 0b0110);
        assert_eq!(BitwiseOp::Nand.apply(0b1100u8, 0b1010), 0b1111_0111);
        assert_eq!(BitwiseOp::Nor.apply(0i32, 0), -1);
        assert_eq!(BitwiseOp::Xnor.apply(5u16, 5), u16::MAX);
    }

    #[test]
    fn test_apply_bool_truth_table() {
        let table: Vec<_> = [(false, false), (false, true), (true, false), (true, true)]
            .into_iter()
            .map(|(x, y)| BitwiseOp::Nand.apply(x, y))
            .collect();
        assert_eq!(table, vec![true, true, true, false]);
        assert!(BitwiseOp::Xnor.apply(true, true));
        assert!(!BitwiseOp::Nor.apply(true, false));
    }

    #[test]
    fn test_not_node() {
        let flag = ConstantNode::new("flag", true);
        let inverted = not::<bool>("inverted");
        inverted.input().connect(flag.output()).unwrap();

        inverted.compute().unwrap();
        assert!(!inverted.result().value());
        assert_eq!(inverted.kind_name(), "BoolNot");
    }

    #[test]
    fn test_bitwise_node() {
        let mask = ConstantNode::new("mask", 0xF0u32);
        let bits = ConstantNode::new("bits", 0x3Cu32);
        let masked = bitwise::<u32>(BitwiseOp::And, "masked");
        masked.x().connect(bits.output()).unwrap();
        masked.y().connect(mask.output()).unwrap();

        masked.compute().unwrap();
        assert_eq!(masked.result().value(), 0x30);
        assert_eq!(masked.kind_name(), "UIntAnd");
    }
}
