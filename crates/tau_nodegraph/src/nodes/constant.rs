// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant source node.

use crate::evaluation::{EvalPass, EvaluationError};
use crate::node::{Node, NodeHeader};
use crate::port::{Output, PortSet};
use crate::value::PortValue;
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Output of sources and the selector
pub const VALUE: &str = "Value";

/// A node without inputs that publishes a fixed value on `Value`
pub struct ConstantNode<T: PortValue> {
    header: NodeHeader,
    value: Cell<T>,
    output: Output<T>,
    ports: PortSet,
}

impl<T: PortValue> ConstantNode<T> {
    /// Create a constant; the output already holds `value` before the first
    /// compute
    pub fn new(display_name: impl Into<String>, value: T) -> Rc<Self> {
        let header = NodeHeader::new(format!("{}Constant", T::KIND.type_name()), display_name);
        Rc::new_cyclic(|node: &Weak<Self>| {
            let owner = header.port_owner(node.clone());
            let output = Output::with_value(&owner, VALUE, value);
            let ports = PortSet::new().with_output(&output);
            Self {
                header,
                value: Cell::new(value),
                output,
                ports,
            }
        })
    }

    /// The `Value` port
    pub fn output(&self) -> &Output<T> {
        &self.output
    }

    /// Currently configured value
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Replace the value published by the next compute
    pub fn set(&self, value: T) {
        self.value.set(value);
    }
}

impl<T: PortValue> Node for ConstantNode<T> {
    fn header(&self) -> &NodeHeader {
        &self.header
    }

    fn ports(&self) -> &PortSet {
        &self.ports
    }

    fn evaluate(&self, _pass: &mut EvalPass) -> Result<(), EvaluationError> {
        self.output.publish(self.value.get());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ValidationCode;
    use crate::nodes::selector::SelectorNode;

    #[test]
    fn test_constant_publishes_value() {
        let source = ConstantNode::new("pi", 3.25f64);
        assert_eq!(source.output().value(), 3.25);
        assert_eq!(source.kind_name(), "DoubleConstant");

        let select = SelectorNode::<f64>::new("select");
        select.x().connect(source.output()).unwrap();
        assert_eq!(select.x().value(), 0.0);

        source.compute().unwrap();
        assert_eq!(select.x().value(), 3.25);
    }

    #[test]
    fn test_set_applies_on_next_compute() {
        let source = ConstantNode::new("n", -4i8);
        source.set(7);
        assert_eq!(source.get(), 7);
        assert_eq!(source.output().value(), -4);

        source.compute().unwrap();
        assert_eq!(source.output().value(), 7);
    }

    #[test]
    fn test_constant_validates() {
        let source = ConstantNode::new("flag", false);
        assert_eq!(source.validate(), ValidationCode::Success);
        assert_eq!(source.ports().inputs().count(), 0);
    }
}
