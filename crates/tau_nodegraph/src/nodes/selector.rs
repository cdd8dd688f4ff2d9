// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binary selector (multiplexer).

use crate::evaluation::{EvalPass, EvaluationError};
use crate::node::{Node, NodeHeader};
use crate::nodes::constant::VALUE;
use crate::operator::{X, Y};
use crate::port::{Input, Output, PortSet};
use crate::value::PortValue;
use std::rc::{Rc, Weak};

/// Boolean input choosing the branch
pub const CONTROL: &str = "Control";

/// Routes `X` to `Value` while `Control` is true, `Y` otherwise.
///
/// Both branches are computed on every evaluation, whichever one is
/// selected.
pub struct SelectorNode<T: PortValue> {
    header: NodeHeader,
    control: Input<bool>,
    x: Input<T>,
    y: Input<T>,
    output: Output<T>,
    ports: PortSet,
}

impl<T: PortValue> SelectorNode<T> {
    /// Create an unlinked selector
    pub fn new(display_name: impl Into<String>) -> Rc<Self> {
        let header = NodeHeader::new(format!("{}SelectiveValue", T::KIND.type_name()), display_name);
        Rc::new_cyclic(|node: &Weak<Self>| {
            let owner = header.port_owner(node.clone());
            let control = Input::required(&owner, CONTROL);
            let x = Input::required(&owner, X);
            let y = Input::required(&owner, Y);
            let output = Output::new(&owner, VALUE);
            let ports = PortSet::new()
                .with_input(&control)
                .with_input(&x)
                .with_input(&y)
                .with_output(&output);
            Self {
                header,
                control,
                x,
                y,
                output,
                ports,
            }
        })
    }

    /// The `Control` port
    pub fn control(&self) -> &Input<bool> {
        &self.control
    }

    /// Branch taken while `Control` is true
    pub fn x(&self) -> &Input<T> {
        &self.x
    }

    /// Branch taken while `Control` is false
    pub fn y(&self) -> &Input<T> {
        &self.y
    }

    /// The `Value` port
    pub fn output(&self) -> &Output<T> {
        &self.output
    }
}

impl<T: PortValue> Node for SelectorNode<T> {
    fn header(&self) -> &NodeHeader {
        &self.header
    }

    fn ports(&self) -> &PortSet {
        &self.ports
    }

    fn evaluate(&self, pass: &mut EvalPass) -> Result<(), EvaluationError> {
        self.ports.ensure_required()?;
        let control = self.control.pull(pass)?;
        let x = self.x.pull(pass)?;
        let y = self.y.pull(pass)?;
        self.output.publish(if control { x } else { y });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::constant::ConstantNode;
    use crate::testing::CountingSource;
    use std::cell::RefCell;

    #[test]
    fn test_selects_by_control() {
        let flag = ConstantNode::new("flag", true);
        let x = CountingSource::new("x", 10.0f64);
        let y = CountingSource::new("y", 20.0f64);
        let select = SelectorNode::<f64>::new("select");
        select.control().connect(flag.output()).unwrap();
        select.x().connect(x.output()).unwrap();
        select.y().connect(y.output()).unwrap();

        select.compute().unwrap();
        assert_eq!(select.output().value(), 10.0);

        flag.set(false);
        select.compute().unwrap();
        assert_eq!(select.output().value(), 20.0);

        // Unselected branches are still evaluated.
        assert_eq!(x.visits(), 2);
        assert_eq!(y.visits(), 2);
    }

    #[test]
    fn test_pull_order_control_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let flag = CountingSource::logged("control", false, log.clone());
        let x = CountingSource::logged("x", 1u32, log.clone());
        let y = CountingSource::logged("y", 2u32, log.clone());
        let select = SelectorNode::<u32>::new("select");
        select.y().connect(y.output()).unwrap();
        select.x().connect(x.output()).unwrap();
        select.control().connect(flag.output()).unwrap();

        select.compute().unwrap();
        assert_eq!(select.output().value(), 2);
        assert_eq!(*log.borrow(), vec!["control", "x", "y"]);
    }

    #[test]
    fn test_unlinked_branch_is_not_ready() {
        let flag = ConstantNode::new("flag", true);
        let x = ConstantNode::new("x", 1i16);
        let select = SelectorNode::<i16>::new("select");
        select.control().connect(flag.output()).unwrap();
        select.x().connect(x.output()).unwrap();

        let err = select.compute().unwrap_err();
        assert!(matches!(err, EvaluationError::NotReady { ref port, .. } if port == Y));
        assert_eq!(select.kind_name(), "ShortSelectiveValue");
    }
}
