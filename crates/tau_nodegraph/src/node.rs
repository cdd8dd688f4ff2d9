// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::connection::{self, ConnectionError};
use crate::evaluation::{EvalPass, EvaluationError};
use crate::port::{Input, Output, PortDirection, PortOwner, PortSet};
use crate::value::PortValue;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shared handle to a node of any kind
pub type NodeRef = Rc<dyn Node>;

/// Outcome of [`Node::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationCode {
    /// All checks passed
    Success,
    /// A link points at a port that no longer exists
    NullConnectionPoint,
    /// An output feeds an input of the same node
    RecursiveConnection,
    /// Two ports were registered under one name
    DuplicateInput,
    /// The node has no ports at all
    NeitherSourceNorDestination,
    /// A required input is unlinked
    RequiredConnectionsNotFulfilled,
    /// A downstream input does not link back to this output.
    ///
    /// Links are always updated on both sides, so the port API cannot
    /// produce this state.
    InvalidDestination,
    /// The upstream output does not list this input.
    ///
    /// Unreachable through the port API, like
    /// [`ValidationCode::InvalidDestination`].
    InvalidSource,
}

impl ValidationCode {
    /// Whether validation passed
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Identity and naming shared by every node kind
#[derive(Debug)]
pub struct NodeHeader {
    id: NodeId,
    kind_name: String,
    display_name: RefCell<String>,
}

impl NodeHeader {
    /// Create a header with a fresh id
    pub fn new(kind_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            kind_name: kind_name.into(),
            display_name: RefCell::new(display_name.into()),
        }
    }

    /// Node id, fixed at construction
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node kind, e.g. `IntAdd`
    pub fn kind_name(&self) -> &str {
        &self.kind_name
    }

    /// Caller-assigned label
    pub fn display_name(&self) -> String {
        self.display_name.borrow().clone()
    }

    /// Rename the node
    pub fn set_display_name(&self, name: impl Into<String>) {
        *self.display_name.borrow_mut() = name.into();
    }

    /// Owner reference for ports created during construction
    pub fn port_owner(&self, node: Weak<dyn Node>) -> PortOwner {
        PortOwner::new(self, node)
    }
}

/// A computation unit with typed ports.
///
/// Implementors supply their header, their port registry and the
/// kind-specific [`Node::evaluate`] step. [`Node::compute`] drives the
/// demand-pull traversal: evaluating a node first computes the nodes feeding
/// its linked inputs.
pub trait Node {
    /// Identity and naming
    fn header(&self) -> &NodeHeader;

    /// The node's ports
    fn ports(&self) -> &PortSet;

    /// Pull inputs, apply the node's function and publish its outputs.
    ///
    /// Called through [`Node::compute_with`]; outputs must be left untouched
    /// when an error is returned.
    fn evaluate(&self, pass: &mut EvalPass) -> Result<(), EvaluationError>;

    /// Advisory structural check. Nothing forces a call before `compute`.
    fn validate(&self) -> ValidationCode {
        self.ports().validate()
    }

    /// Node id
    fn id(&self) -> NodeId {
        self.header().id()
    }

    /// Node kind name
    fn kind_name(&self) -> &str {
        self.header().kind_name()
    }

    /// Compute this node and everything upstream of it in a fresh,
    /// non-memoized pass
    fn compute(&self) -> Result<(), EvaluationError> {
        let mut pass = EvalPass::new();
        let result = self.compute_with(&mut pass);
        tracing::debug!(
            node = %self.header().display_name(),
            visits = pass.visits(),
            ok = result.is_ok(),
            "evaluation pass finished"
        );
        result
    }

    /// Compute this node as part of an existing pass
    fn compute_with(&self, pass: &mut EvalPass) -> Result<(), EvaluationError> {
        pass.run(self.header(), |pass| self.evaluate(pass))
    }
}

impl PartialEq for dyn Node {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for dyn Node {}

impl Hash for dyn Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("kind", &self.kind_name())
            .field("name", &self.header().display_name())
            .field("ports", &self.ports().len())
            .finish()
    }
}

/// Typed port lookup and name-based wiring for every node
pub trait NodeExt: Node {
    /// Output port `name`, only if it carries `T`
    fn find_output_port<T: PortValue>(&self, name: &str) -> Option<Output<T>> {
        self.ports().output(name)
    }

    /// Input port `name`, only if it carries `T`
    fn find_input_port<T: PortValue>(&self, name: &str) -> Option<Input<T>> {
        self.ports().input(name)
    }

    /// Link `output` to this node's input `target`
    fn connect_input<T: PortValue>(&self, output: &Output<T>, target: &str) -> Result<(), ConnectionError> {
        let port = connection::lookup(self.ports(), self.id(), target, PortDirection::Input, T::KIND)?;
        match port.as_input::<T>() {
            Some(input) => input.connect(output),
            None => Err(connection::rejected(ConnectionError::TypeMismatch {
                expected: T::KIND,
                found: port.kind(),
            })),
        }
    }

    /// Link `input` to this node's output `target`
    fn connect_output<T: PortValue>(&self, input: &Input<T>, target: &str) -> Result<(), ConnectionError> {
        let port = connection::lookup(self.ports(), self.id(), target, PortDirection::Output, T::KIND)?;
        match port.as_output::<T>() {
            Some(output) => input.connect(&output),
            None => Err(connection::rejected(ConnectionError::TypeMismatch {
                expected: T::KIND,
                found: port.kind(),
            })),
        }
    }
}

impl<N: Node + ?Sized> NodeExt for N {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::arithmetic::{arithmetic, ArithmeticOp};
    use crate::nodes::constant::ConstantNode;
    use crate::value::ValueKind;

    #[test]
    fn test_node_equality_is_identity() {
        let a: NodeRef = ConstantNode::new("same", 1i32);
        let b: NodeRef = ConstantNode::new("same", 1i32);
        let a2 = a.clone();

        assert_ne!(&*a, &*b);
        a2.header().set_display_name("renamed");
        assert_eq!(&*a, &*a2);
        assert_eq!(a.header().display_name(), "renamed");
    }

    #[test]
    fn test_find_ports_by_name_and_type() {
        let node: NodeRef = arithmetic::<i32>(ArithmeticOp::Add, "sum");

        assert!(node.find_input_port::<i32>("X").is_some());
        assert!(node.find_input_port::<f64>("X").is_none());
        assert!(node.find_output_port::<i32>("Result").is_some());
        assert!(node.find_output_port::<bool>("Result").is_none());
    }

    #[test]
    fn test_connect_input_by_name() {
        let three = ConstantNode::new("three", 3i32);
        let sum = arithmetic::<i32>(ArithmeticOp::Add, "sum");

        sum.connect_input(three.output(), "X").unwrap();
        assert!(sum.x().is_linked());

        let half = ConstantNode::new("half", 0.5f32);
        let err = sum.connect_input(half.output(), "Y").unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::TypeMismatch {
                expected: ValueKind::F32,
                found: ValueKind::I32
            }
        ));
        assert!(!sum.y().is_linked());
        assert!(!half.output().is_linked());

        let err = sum.connect_input(three.output(), "Result").unwrap_err();
        assert!(matches!(err, ConnectionError::DirectionMismatch { .. }));

        let err = sum.connect_input(three.output(), "W").unwrap_err();
        assert!(matches!(err, ConnectionError::UnknownPort { .. }));
    }

    #[test]
    fn test_connect_output_by_name() {
        let three = ConstantNode::new("three", 3i32);
        let sum = arithmetic::<i32>(ArithmeticOp::Add, "sum");

        three.connect_output(sum.y(), "Value").unwrap();
        assert_eq!(sum.y().upstream_node().map(|n| n.id()), Some(three.id()));
        assert!(three.connect_output(sum.x(), "Result").is_err());
    }

    #[test]
    fn test_validate_codes() {
        let three = ConstantNode::new("three", 3i32);
        let four = ConstantNode::new("four", 4i32);
        let sum = arithmetic::<i32>(ArithmeticOp::Add, "sum");

        assert_eq!(three.validate(), ValidationCode::Success);
        assert_eq!(sum.validate(), ValidationCode::RequiredConnectionsNotFulfilled);

        sum.x().connect(three.output()).unwrap();
        assert_eq!(sum.validate(), ValidationCode::RequiredConnectionsNotFulfilled);

        sum.y().connect(four.output()).unwrap();
        assert_eq!(sum.validate(), ValidationCode::Success);
        assert!(sum.validate().is_success());
    }

    #[test]
    fn test_validate_direct_self_loop() {
        let one = ConstantNode::new("one", 1i32);
        let sum = arithmetic::<i32>(ArithmeticOp::Add, "sum");

        sum.x().connect(one.output()).unwrap();
        sum.y().connect(sum.result()).unwrap();

        assert_eq!(sum.validate(), ValidationCode::RecursiveConnection);
    }

    #[test]
    fn test_validate_dangling_downstream() {
        let one = ConstantNode::new("one", 1i32);
        {
            let sum = arithmetic::<i32>(ArithmeticOp::Add, "sum");
            sum.x().connect(one.output()).unwrap();
        }
        assert!(!one.output().is_linked());
        assert_eq!(one.validate(), ValidationCode::NullConnectionPoint);

        one.compute().unwrap();
        assert_eq!(one.validate(), ValidationCode::Success);
    }
}
