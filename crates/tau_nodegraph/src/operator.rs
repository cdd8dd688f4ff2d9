// SPDX-License-Identifier: MIT OR Apache-2.0
//! Operator node templates.
//!
//! [`UnaryNode`], [`BinaryNode`] and [`TrinaryNode`] own the port wiring,
//! validation, upstream pull and write-back shared by every operator kind.
//! A concrete kind is nothing more than a kind name plus the pure function
//! handed to the constructor.

use crate::evaluation::{EvalPass, EvaluationError};
use crate::node::{Node, NodeHeader};
use crate::port::{Input, Output, PortSet};
use crate::value::{ConversionError, PortValue};
use std::rc::{Rc, Weak};

/// Input of a unary operator
pub const IN: &str = "In";
/// First operand
pub const X: &str = "X";
/// Second operand
pub const Y: &str = "Y";
/// Third operand
pub const Z: &str = "Z";
/// Output of every operator
pub const RESULT: &str = "Result";

/// Failure of an operator function
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpError {
    /// Integer result does not fit the type
    #[error("arithmetic overflow")]
    Overflow,

    /// Integer division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Value not representable in the output type
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

type UnaryFn<A, R> = Box<dyn Fn(A) -> Result<R, OpError>>;
type BinaryFn<X, Y, R> = Box<dyn Fn(X, Y) -> Result<R, OpError>>;
type TrinaryFn<X, Y, Z, R> = Box<dyn Fn(X, Y, Z) -> Result<R, OpError>>;

/// One input `In`, one output `Result`
pub struct UnaryNode<A: PortValue, R: PortValue> {
    header: NodeHeader,
    input: Input<A>,
    result: Output<R>,
    ports: PortSet,
    func: UnaryFn<A, R>,
}

impl<A: PortValue, R: PortValue> UnaryNode<A, R> {
    /// Create a unary operator applying `func`
    pub fn new<F>(kind_name: impl Into<String>, display_name: impl Into<String>, func: F) -> Rc<Self>
    where
        F: Fn(A) -> Result<R, OpError> + 'static,
    {
        let header = NodeHeader::new(kind_name, display_name);
        Rc::new_cyclic(|node: &Weak<Self>| {
            let owner = header.port_owner(node.clone());
            let input = Input::required(&owner, IN);
            let result = Output::new(&owner, RESULT);
            let ports = PortSet::new().with_input(&input).with_output(&result);
            Self {
                header,
                input,
                result,
                ports,
                func: Box::new(func),
            }
        })
    }

    /// The `In` port
    pub fn input(&self) -> &Input<A> {
        &self.input
    }

    /// The `Result` port
    pub fn result(&self) -> &Output<R> {
        &self.result
    }
}

impl<A: PortValue, R: PortValue> Node for UnaryNode<A, R> {
    fn header(&self) -> &NodeHeader {
        &self.header
    }

    fn ports(&self) -> &PortSet {
        &self.ports
    }

    fn evaluate(&self, pass: &mut EvalPass) -> Result<(), EvaluationError> {
        self.ports.ensure_required()?;
        let a = self.input.pull(pass)?;
        let value = (self.func)(a).map_err(|err| EvaluationError::operator(&self.header, err))?;
        self.result.publish(value);
        Ok(())
    }
}

/// Inputs `X`, `Y`, one output `Result`
pub struct BinaryNode<X: PortValue, Y: PortValue, R: PortValue> {
    header: NodeHeader,
    x: Input<X>,
    y: Input<Y>,
    result: Output<R>,
    ports: PortSet,
    func: BinaryFn<X, Y, R>,
}

impl<X: PortValue, Y: PortValue, R: PortValue> BinaryNode<X, Y, R> {
    /// Create a binary operator applying `func`
    pub fn new<F>(kind_name: impl Into<String>, display_name: impl Into<String>, func: F) -> Rc<Self>
    where
        F: Fn(X, Y) -> Result<R, OpError> + 'static,
    {
        let header = NodeHeader::new(kind_name, display_name);
        Rc::new_cyclic(|node: &Weak<Self>| {
            let owner = header.port_owner(node.clone());
            let x = Input::required(&owner, X);
            let y = Input::required(&owner, Y);
            let result = Output::new(&owner, RESULT);
            let ports = PortSet::new()
                .with_input(&x)
                .with_input(&y)
                .with_output(&result);
            Self {
                header,
                x,
                y,
                result,
                ports,
                func: Box::new(func),
            }
        })
    }

    /// The `X` port
    pub fn x(&self) -> &Input<X> {
        &self.x
    }

    /// The `Y` port
    pub fn y(&self) -> &Input<Y> {
        &self.y
    }

    /// The `Result` port
    pub fn result(&self) -> &Output<R> {
        &self.result
    }
}

impl<X: PortValue, Y: PortValue, R: PortValue> Node for BinaryNode<X, Y, R> {
    fn header(&self) -> &NodeHeader {
        &self.header
    }

    fn ports(&self) -> &PortSet {
        &self.ports
    }

    fn evaluate(&self, pass: &mut EvalPass) -> Result<(), EvaluationError> {
        self.ports.ensure_required()?;
        let x = self.x.pull(pass)?;
        let y = self.y.pull(pass)?;
        let value = (self.func)(x, y).map_err(|err| EvaluationError::operator(&self.header, err))?;
        self.result.publish(value);
        Ok(())
    }
}

/// Inputs `X`, `Y`, `Z`, one output `Result`
pub struct TrinaryNode<X: PortValue, Y: PortValue, Z: PortValue, R: PortValue> {
    header: NodeHeader,
    x: Input<X>,
    y: Input<Y>,
    z: Input<Z>,
    result: Output<R>,
    ports: PortSet,
    func: TrinaryFn<X, Y, Z, R>,
}

impl<X: PortValue, Y: PortValue, Z: PortValue, R: PortValue> TrinaryNode<X, Y, Z, R> {
    /// Create a trinary operator applying `func`
    pub fn new<F>(kind_name: impl Into<String>, display_name: impl Into<String>, func: F) -> Rc<Self>
    where
        F: Fn(X, Y, Z) -> Result<R, OpError> + 'static,
    {
        let header = NodeHeader::new(kind_name, display_name);
        Rc::new_cyclic(|node: &Weak<Self>| {
            let owner = header.port_owner(node.clone());
            let x = Input::required(&owner, X);
            let y = Input::required(&owner, Y);
            let z = Input::required(&owner, Z);
            let result = Output::new(&owner, RESULT);
            let ports = PortSet::new()
                .with_input(&x)
                .with_input(&y)
                .with_input(&z)
                .with_output(&result);
            Self {
                header,
                x,
                y,
                z,
                result,
                ports,
                func: Box::new(func),
            }
        })
    }

    /// The `X` port
    pub fn x(&self) -> &Input<X> {
        &self.x
    }

    /// The `Y` port
    pub fn y(&self) -> &Input<Y> {
        &self.y
    }

    /// The `Z` port
    pub fn z(&self) -> &Input<Z> {
        &self.z
    }

    /// The `Result` port
    pub fn result(&self) -> &Output<R> {
        &self.result
    }
}

impl<X: PortValue, Y: PortValue, Z: PortValue, R: PortValue> Node for TrinaryNode<X, Y, Z, R> {
    fn header(&self) -> &NodeHeader {
        &self.header
    }

    fn ports(&self) -> &PortSet {
        &self.ports
    }

    fn evaluate(&self, pass: &mut EvalPass) -> Result<(), EvaluationError> {
        self.ports.ensure_required()?;
        let x = self.x.pull(pass)?;
        let y = self.y.pull(pass)?;
        let z = self.z.pull(pass)?;
        let value = (self.func)(x, y, z).map_err(|err| EvaluationError::operator(&self.header, err))?;
        self.result.publish(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ValidationCode;
    use crate::nodes::constant::ConstantNode;
    use crate::testing::CountingSource;
    use std::cell::RefCell;

    #[test]
    fn test_unary_applies_function() {
        let source = ConstantNode::new("nine", 9u8);
        let double = UnaryNode::new("ByteDouble", "double", |x: u8| x.checked_mul(2).ok_or(OpError::Overflow));
        double.input().connect(source.output()).unwrap();

        double.compute().unwrap();
        assert_eq!(double.result().value(), 18);

        source.set(200);
        let err = double.compute().unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Operator {
                source: OpError::Overflow,
                ..
            }
        ));
        assert_eq!(double.result().value(), 18);
    }

    #[test]
    fn test_binary_heterogeneous_types() {
        let count = ConstantNode::new("count", 3u32);
        let scale = ConstantNode::new("scale", 0.5f64);
        let scaled = BinaryNode::new("Scale", "scaled", |n: u32, s: f64| Ok(f64::from(n) * s > 1.0));
        scaled.x().connect(count.output()).unwrap();
        scaled.y().connect(scale.output()).unwrap();

        scaled.compute().unwrap();
        assert!(scaled.result().value());
    }

    #[test]
    fn test_pull_order_is_x_then_y_then_z() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let x = CountingSource::logged("x", 1i64, log.clone());
        let y = CountingSource::logged("y", 2i64, log.clone());
        let z = CountingSource::logged("z", 3i64, log.clone());
        let sum = TrinaryNode::new("LongSum3", "sum", |x: i64, y: i64, z: i64| Ok(x + y + z));

        // Link in reverse to show declaration order wins.
        sum.z().connect(z.output()).unwrap();
        sum.y().connect(y.output()).unwrap();
        sum.x().connect(x.output()).unwrap();

        sum.compute().unwrap();
        assert_eq!(sum.result().value(), 6);
        assert_eq!(*log.borrow(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_trinary_requires_all_inputs() {
        let a = ConstantNode::new("a", 1.0f32);
        let b = ConstantNode::new("b", 1.0f32);
        let near = TrinaryNode::new("FloatNear", "near", |x: f32, y: f32, eps: f32| Ok((x - y).abs() < eps));
        near.x().connect(a.output()).unwrap();
        near.y().connect(b.output()).unwrap();

        assert_eq!(near.validate(), ValidationCode::RequiredConnectionsNotFulfilled);
        assert!(matches!(
            near.compute(),
            Err(EvaluationError::NotReady { ref port, .. }) if port == Z
        ));
    }

    #[test]
    fn test_template_port_names() {
        let node = BinaryNode::new("IntMax", "max", |x: i32, y: i32| Ok(x.max(y)));
        let names: Vec<_> = node.ports().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec![X, Y, RESULT]);
        assert_eq!(node.kind_name(), "IntMax");
        assert_eq!(node.header().display_name(), "max");
    }
}
