// SPDX-License-Identifier: MIT OR Apache-2.0
//! Checked conversion between primitive kinds.

use crate::operator::{OpError, UnaryNode};
use crate::value::{convert, PortValue};
use std::rc::Rc;

/// Kind name of the conversion from `A` to `B`, e.g. `FloatToInt`
pub fn cast_kind_name<A: PortValue, B: PortValue>() -> String {
    format!("{}To{}", A::KIND.type_name(), B::KIND.type_name())
}

/// Create a node converting its `In` value from `A` to `B`.
///
/// The conversion is checked: a value `B` cannot represent fails the
/// evaluation with [`OpError::Conversion`] instead of wrapping.
pub fn cast<A: PortValue, B: PortValue>(display_name: impl Into<String>) -> Rc<UnaryNode<A, B>> {
    UnaryNode::new(cast_kind_name::<A, B>(), display_name, |a: A| {
        convert::<A, B>(a).map_err(OpError::from)
    })
}
