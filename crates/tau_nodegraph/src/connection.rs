// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) protocol between ports.
//!
//! Links are stored on the ports themselves; there is no graph container.
//! This module holds the type-erased connect entry points used by
//! graph-assembly code that only knows node handles and port names.

use crate::node::{Node, NodeId};
use crate::port::{AnyPort, PortDirection, PortSet};
use crate::value::{dispatch_kind, PortValue, ValueKind};
use serde::{Deserialize, Serialize};

/// A link between an output and an input, as seen from the input side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Source node ID
    pub from_node: NodeId,
    /// Source port name
    pub from_port: String,
    /// Target node ID
    pub to_node: NodeId,
    /// Target port name
    pub to_port: String,
}

impl Connection {
    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Check if this connection is the direct self-loop case
    pub fn is_self_loop(&self) -> bool {
        self.from_node == self.to_node
    }
}

/// Incoming links of a node, in input declaration order
pub fn incoming(node: &dyn Node) -> Vec<Connection> {
    node.ports()
        .inputs()
        .filter_map(|input| {
            let (from_node, from_port) = input.upstream_endpoint()?;
            Some(Connection {
                from_node,
                from_port,
                to_node: node.id(),
                to_port: input.name().to_string(),
            })
        })
        .collect()
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// No port with this name on the node
    #[error("Port not found: '{port}' on node {node}")]
    UnknownPort {
        /// Node searched
        node: NodeId,
        /// Requested name
        port: String,
    },

    /// Element types differ
    #[error("Incompatible port types: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type of the port being connected
        expected: ValueKind,
        /// Type of the port found
        found: ValueKind,
    },

    /// Input-to-input or output-to-output
    #[error("Port '{port}' is an {found} port, expected an {expected} port")]
    DirectionMismatch {
        /// Offending port
        port: String,
        /// Direction required by the link
        expected: PortDirection,
        /// Direction of the port found
        found: PortDirection,
    },

    /// The output's node has already been dropped
    #[error("Port '{port}' belongs to a node that no longer exists")]
    DetachedPort {
        /// Offending port
        port: String,
    },
}

pub(crate) fn rejected(err: ConnectionError) -> ConnectionError {
    tracing::warn!(error = %err, "connection rejected");
    err
}

/// Find `name` on a node and check its direction and element type
pub(crate) fn lookup<'a>(
    ports: &'a PortSet,
    node: NodeId,
    name: &str,
    direction: PortDirection,
    kind: ValueKind,
) -> Result<&'a AnyPort, ConnectionError> {
    let port = ports.get(name).ok_or_else(|| {
        rejected(ConnectionError::UnknownPort {
            node,
            port: name.to_string(),
        })
    })?;
    if port.direction() != direction {
        return Err(rejected(ConnectionError::DirectionMismatch {
            port: name.to_string(),
            expected: direction,
            found: port.direction(),
        }));
    }
    if port.kind() != kind {
        return Err(rejected(ConnectionError::TypeMismatch {
            expected: kind,
            found: port.kind(),
        }));
    }
    Ok(port)
}

fn link<T: PortValue>(a: &AnyPort, b: &AnyPort) -> Result<(), ConnectionError> {
    let (output, input) = match a.direction() {
        PortDirection::Output => (a.as_output::<T>(), b.as_input::<T>()),
        PortDirection::Input => (b.as_output::<T>(), a.as_input::<T>()),
    };
    match (output, input) {
        (Some(output), Some(input)) => input.connect(&output),
        _ => Err(rejected(ConnectionError::TypeMismatch {
            expected: a.kind(),
            found: b.kind(),
        })),
    }
}

/// Link two type-erased ports.
///
/// Fails without touching either port unless one is an input, the other an
/// output, and both carry the same element type.
pub fn connect_ports(a: &AnyPort, b: &AnyPort) -> Result<(), ConnectionError> {
    if a.kind() != b.kind() {
        return Err(rejected(ConnectionError::TypeMismatch {
            expected: a.kind(),
            found: b.kind(),
        }));
    }
    if a.direction() == b.direction() {
        let expected = match a.direction() {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        };
        return Err(rejected(ConnectionError::DirectionMismatch {
            port: b.name().to_string(),
            expected,
            found: b.direction(),
        }));
    }
    dispatch_kind!(a.kind(), T => link::<T>(a, b))
}

/// Link `source.output` to `target.input` by port names alone
pub fn connect(source: &dyn Node, output: &str, target: &dyn Node, input: &str) -> Result<(), ConnectionError> {
    let from = source.ports().get(output).ok_or_else(|| {
        rejected(ConnectionError::UnknownPort {
            node: source.id(),
            port: output.to_string(),
        })
    })?;
    if from.direction() != PortDirection::Output {
        return Err(rejected(ConnectionError::DirectionMismatch {
            port: output.to_string(),
            expected: PortDirection::Output,
            found: from.direction(),
        }));
    }
    let to = lookup(target.ports(), target.id(), input, PortDirection::Input, from.kind())?;
    connect_ports(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeExt, NodeRef};
    use crate::nodes::comparison::{comparison, ComparisonOp};
    use crate::nodes::constant::ConstantNode;
    use crate::nodes::selector::SelectorNode;

    #[test]
    fn test_connect_ports_compatible() {
        let flag = ConstantNode::new("flag", true);
        let select = SelectorNode::<f64>::new("select");

        connect_ports(&flag.output().erase(), &select.control().erase()).unwrap();
        assert!(select.control().is_linked());
        assert!(flag.output().is_linked());

        let ten = ConstantNode::new("ten", 10.0f64);
        connect_ports(&select.x().erase(), &ten.output().erase()).unwrap();
        assert_eq!(select.x().upstream(), Some(ten.output().clone()));
    }

    #[test]
    fn test_connect_ports_incompatible_leaves_ports_untouched() {
        let flag = ConstantNode::new("flag", true);
        let ten = ConstantNode::new("ten", 10.0f64);
        let select = SelectorNode::<f64>::new("select");

        let err = connect_ports(&flag.output().erase(), &select.x().erase()).unwrap_err();
        assert_eq!(
            err,
            ConnectionError::TypeMismatch {
                expected: ValueKind::Bool,
                found: ValueKind::F64
            }
        );

        let err = connect_ports(&select.x().erase(), &select.y().erase()).unwrap_err();
        assert!(matches!(err, ConnectionError::DirectionMismatch { .. }));

        let err = connect_ports(&ten.output().erase(), &select.output().erase()).unwrap_err();
        assert!(matches!(err, ConnectionError::DirectionMismatch { .. }));

        assert!(!flag.output().is_linked());
        assert!(!ten.output().is_linked());
        assert!(!select.x().is_linked());
        assert!(!select.y().is_linked());
    }

    #[test]
    fn test_connect_by_names() {
        let one: NodeRef = ConstantNode::new("one", 1u16);
        let two: NodeRef = ConstantNode::new("two", 2u16);
        let less: NodeRef = comparison::<u16>(ComparisonOp::LessThan, "less");

        connect(&*one, "Value", &*less, "X").unwrap();
        connect(&*two, "Value", &*less, "Y").unwrap();

        let links = incoming(&*less);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].from_node, one.id());
        assert_eq!(links[0].from_port, "Value");
        assert_eq!(links[1].to_port, "Y");
        assert!(links.iter().all(|c| c.involves_node(less.id())));
        assert!(!links[0].is_self_loop());

        less.compute().unwrap();
        assert!(less.find_output_port::<bool>("Result").unwrap().value());
    }

    #[test]
    fn test_connect_by_names_rejects_mismatch() {
        let one: NodeRef = ConstantNode::new("one", 1i64);
        let less: NodeRef = comparison::<u16>(ComparisonOp::LessThan, "less");

        assert!(matches!(
            connect(&*one, "Value", &*less, "X"),
            Err(ConnectionError::TypeMismatch { .. })
        ));
        assert!(matches!(
            connect(&*one, "Nope", &*less, "X"),
            Err(ConnectionError::UnknownPort { .. })
        ));
        assert!(matches!(
            connect(&*less, "X", &*one, "Value"),
            Err(ConnectionError::DirectionMismatch { .. })
        ));
        assert!(incoming(&*less).is_empty());
    }
}
