// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed dataflow graph runtime.
//!
//! Nodes are computation units with named, statically typed ports. Wiring an
//! output to an input of the same element type links the two nodes;
//! computing a sink pulls values through every node upstream of it.
//!
//! ## Architecture
//!
//! - [`value`]: the closed set of primitive element types
//! - [`port`]: typed inputs/outputs and the per-node port registry
//! - [`node`]: the [`Node`] trait, identity and validation
//! - [`connection`]: type-erased, name-driven linking
//! - [`evaluation`]: demand-pulled evaluation passes
//! - [`operator`]: unary/binary/trinary operator templates
//! - [`nodes`]: constants, casts, the selector and the operator family
//! - [`registry`]: node kinds by name
//!
//! ```
//! use tau_nodegraph::nodes::{arithmetic, ArithmeticOp, ConstantNode};
//! use tau_nodegraph::Node;
//!
//! let three = ConstantNode::new("three", 3i32);
//! let four = ConstantNode::new("four", 4i32);
//! let sum = arithmetic::<i32>(ArithmeticOp::Add, "sum");
//! sum.x().connect(three.output()).unwrap();
//! sum.y().connect(four.output()).unwrap();
//!
//! sum.compute().unwrap();
//! assert_eq!(sum.result().value(), 7);
//! ```
//!
//! Graphs are single-threaded: node handles are [`std::rc::Rc`] and port
//! state lives in cells.

pub mod connection;
pub mod evaluation;
pub mod node;
pub mod nodes;
pub mod operator;
pub mod port;
pub mod registry;
pub mod value;

#[cfg(test)]
mod testing;

pub use connection::{connect, connect_ports, Connection, ConnectionError};
pub use evaluation::{EvalPass, EvaluationError};
pub use node::{Node, NodeExt, NodeHeader, NodeId, NodeRef, ValidationCode};
pub use operator::{BinaryNode, OpError, TrinaryNode, UnaryNode};
pub use port::{AnyPort, Input, Output, PortDirection, PortOwner, PortSet};
pub use registry::{NodeCategory, NodeRegistry, NodeType, OperatorKind, Recipe, RegistryError};
pub use value::{convert, ConversionError, PortValue, Scalar, ValueKind};
