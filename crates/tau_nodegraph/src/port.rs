// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.
//!
//! A port is a typed, named terminal owned by exactly one node. [`Input`] and
//! [`Output`] are cheap handles onto the shared [`PortCell`]; cloning a handle
//! never creates a new port.
//!
//! Link ownership runs upstream only: an input keeps its upstream node alive,
//! an output merely observes the inputs it feeds. A node wired to itself
//! holds no ownership of itself.

use crate::connection::ConnectionError;
use crate::evaluation::{EvalPass, EvaluationError};
use crate::node::{Node, NodeHeader, NodeId, NodeRef, ValidationCode};
use crate::value::{PortValue, ValueKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Back-reference handed to ports while their node is being built
#[derive(Clone)]
pub struct PortOwner {
    id: NodeId,
    node: Weak<dyn Node>,
}

impl PortOwner {
    /// Create an owner reference from the node's header and its (not yet
    /// upgradable) weak self-reference
    pub fn new(header: &NodeHeader, node: Weak<dyn Node>) -> Self {
        Self {
            id: header.id(),
            node,
        }
    }

    /// Id of the owning node
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Node behind an input's upstream link
enum UpstreamNode {
    Owned(NodeRef),
    SelfLoop(Weak<dyn Node>),
}

impl UpstreamNode {
    fn get(&self) -> Option<NodeRef> {
        match self {
            Self::Owned(node) => Some(node.clone()),
            Self::SelfLoop(node) => node.upgrade(),
        }
    }
}

struct UpstreamLink<T: PortValue> {
    port: Rc<PortCell<T>>,
    node: UpstreamNode,
}

/// Shared state behind a port handle
pub struct PortCell<T: PortValue> {
    name: String,
    direction: PortDirection,
    owner: PortOwner,
    required: bool,
    value: Cell<T>,
    upstream: RefCell<Option<UpstreamLink<T>>>,
    downstream: RefCell<Vec<Weak<PortCell<T>>>>,
}

impl<T: PortValue> PortCell<T> {
    fn new(owner: &PortOwner, name: &str, direction: PortDirection, required: bool, value: T) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            direction,
            owner: owner.clone(),
            required,
            value: Cell::new(value),
            upstream: RefCell::new(None),
            downstream: RefCell::new(Vec::new()),
        })
    }

    fn is_linked(&self) -> bool {
        match self.direction {
            PortDirection::Input => self.upstream.borrow().is_some(),
            PortDirection::Output => self.downstream.borrow().iter().any(|w| w.strong_count() > 0),
        }
    }

    fn upstream_node(&self) -> Option<NodeRef> {
        self.upstream.borrow().as_ref().and_then(|link| link.node.get())
    }

    fn linked_owners(&self) -> Vec<NodeId> {
        match self.direction {
            PortDirection::Input => self
                .upstream
                .borrow()
                .as_ref()
                .map(|link| vec![link.port.owner.id])
                .unwrap_or_default(),
            PortDirection::Output => self
                .downstream
                .borrow()
                .iter()
                .filter_map(Weak::upgrade)
                .map(|input| input.owner.id)
                .collect(),
        }
    }

    fn upstream_endpoint(&self) -> Option<(NodeId, String)> {
        self.upstream
            .borrow()
            .as_ref()
            .map(|link| (link.port.owner.id, link.port.name.clone()))
    }

    /// Link an input cell to an output cell, dropping the input's old link
    fn link(input: &Rc<Self>, output: &Rc<Self>) -> Result<(), ConnectionError> {
        let node = output.owner.node.upgrade().ok_or_else(|| ConnectionError::DetachedPort {
            port: output.name.clone(),
        })?;
        let node = if output.owner.id == input.owner.id {
            UpstreamNode::SelfLoop(Rc::downgrade(&node))
        } else {
            UpstreamNode::Owned(node)
        };

        Self::unlink_input(input);
        output.downstream.borrow_mut().push(Rc::downgrade(input));
        *input.upstream.borrow_mut() = Some(UpstreamLink {
            port: output.clone(),
            node,
        });

        tracing::debug!(
            from_node = %output.owner.id,
            from_port = %output.name,
            to_node = %input.owner.id,
            to_port = %input.name,
            kind = %T::KIND,
            "linked ports"
        );
        Ok(())
    }

    fn unlink_input(input: &Rc<Self>) {
        let Some(link) = input.upstream.borrow_mut().take() else {
            return;
        };
        let this = Rc::as_ptr(input);
        link.port
            .downstream
            .borrow_mut()
            .retain(|w| w.strong_count() > 0 && w.as_ptr() != this);
        tracing::debug!(
            from_node = %link.port.owner.id,
            from_port = %link.port.name,
            to_node = %input.owner.id,
            to_port = %input.name,
            "unlinked ports"
        );
    }

    fn unlink_output(output: &Rc<Self>) {
        let inputs: Vec<_> = output
            .downstream
            .borrow_mut()
            .drain(..)
            .filter_map(|w| w.upgrade())
            .collect();
        for input in inputs {
            let linked_here = input
                .upstream
                .borrow()
                .as_ref()
                .is_some_and(|link| Rc::ptr_eq(&link.port, output));
            if linked_here {
                Self::unlink_input(&input);
            }
        }
    }

    /// Store a value and forward it into every linked input
    fn publish(&self, value: T) {
        self.value.set(value);
        self.downstream.borrow_mut().retain(|w| match w.upgrade() {
            Some(input) => {
                input.value.set(value);
                true
            }
            None => false,
        });
    }

    /// Problem with this port's links, if any
    fn link_issue(self: &Rc<Self>) -> Option<ValidationCode> {
        match self.direction {
            PortDirection::Input => {
                let upstream = self.upstream.borrow();
                let link = upstream.as_ref()?;
                if link.port.owner.id == self.owner.id {
                    return Some(ValidationCode::RecursiveConnection);
                }
                let this = Rc::as_ptr(self);
                let mirrored = link.port.downstream.borrow().iter().any(|w| w.as_ptr() == this);
                (!mirrored).then_some(ValidationCode::InvalidSource)
            }
            PortDirection::Output => {
                let mut issue = None;
                for weak in self.downstream.borrow().iter() {
                    let Some(input) = weak.upgrade() else {
                        issue = issue.or(Some(ValidationCode::NullConnectionPoint));
                        continue;
                    };
                    if input.owner.id == self.owner.id {
                        return Some(ValidationCode::RecursiveConnection);
                    }
                    let mirrored = input
                        .upstream
                        .borrow()
                        .as_ref()
                        .is_some_and(|link| Rc::ptr_eq(&link.port, self));
                    if !mirrored {
                        issue = issue.or(Some(ValidationCode::InvalidDestination));
                    }
                }
                issue
            }
        }
    }
}

impl<T: PortValue> fmt::Debug for PortCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortCell")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("kind", &T::KIND)
            .field("owner", &self.owner.id)
            .field("value", &self.value.get())
            .field("linked", &self.is_linked())
            .finish()
    }
}

/// A typed input port
pub struct Input<T: PortValue> {
    cell: Rc<PortCell<T>>,
}

impl<T: PortValue> Input<T> {
    /// Create a required input port
    pub fn required(owner: &PortOwner, name: &str) -> Self {
        Self {
            cell: PortCell::new(owner, name, PortDirection::Input, true, T::default()),
        }
    }

    /// Create an optional input port that reads `default` while unlinked
    pub fn optional(owner: &PortOwner, name: &str, default: T) -> Self {
        Self {
            cell: PortCell::new(owner, name, PortDirection::Input, false, default),
        }
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Id of the owning node
    pub fn owner_id(&self) -> NodeId {
        self.cell.owner.id
    }

    /// Whether the owning node cannot compute while this port is unlinked
    pub fn is_required(&self) -> bool {
        self.cell.required
    }

    /// Last value received from upstream (or assigned)
    pub fn value(&self) -> T {
        self.cell.value.get()
    }

    /// Assign the value read while unlinked
    pub fn set_value(&self, value: T) {
        self.cell.value.set(value);
    }

    /// Whether an upstream output is linked
    pub fn is_linked(&self) -> bool {
        self.cell.is_linked()
    }

    /// Node owning the linked upstream output
    pub fn upstream_node(&self) -> Option<NodeRef> {
        self.cell.upstream_node()
    }

    /// The linked upstream output
    pub fn upstream(&self) -> Option<Output<T>> {
        self.cell
            .upstream
            .borrow()
            .as_ref()
            .map(|link| Output { cell: link.port.clone() })
    }

    /// Link this input to `output`, replacing any previous link
    pub fn connect(&self, output: &Output<T>) -> Result<(), ConnectionError> {
        PortCell::link(&self.cell, &output.cell)
    }

    /// Remove the upstream link on both sides
    pub fn disconnect(&self) {
        PortCell::unlink_input(&self.cell);
    }

    /// Compute the upstream node and return the value it delivered.
    ///
    /// An unlinked optional input yields its current value; an unlinked
    /// required input is [`EvaluationError::NotReady`].
    pub fn pull(&self, pass: &mut EvalPass) -> Result<T, EvaluationError> {
        match self.upstream_node() {
            Some(node) => {
                node.compute_with(pass)?;
                Ok(self.value())
            }
            None if self.cell.required => Err(EvaluationError::NotReady {
                node: self.cell.owner.id,
                port: self.cell.name.clone(),
            }),
            None => Ok(self.value()),
        }
    }

    /// Type-erased handle
    pub fn erase(&self) -> AnyPort {
        T::wrap(self.cell.clone())
    }
}

impl<T: PortValue> Clone for Input<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: PortValue> fmt::Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cell.fmt(f)
    }
}

impl<T: PortValue> PartialEq for Input<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cell.name == other.cell.name && self.cell.owner.id == other.cell.owner.id
    }
}

impl<T: PortValue> Eq for Input<T> {}

/// A typed output port
pub struct Output<T: PortValue> {
    cell: Rc<PortCell<T>>,
}

impl<T: PortValue> Output<T> {
    /// Create an output port holding `T::default()`
    pub fn new(owner: &PortOwner, name: &str) -> Self {
        Self::with_value(owner, name, T::default())
    }

    /// Create an output port holding `value`
    pub fn with_value(owner: &PortOwner, name: &str, value: T) -> Self {
        Self {
            cell: PortCell::new(owner, name, PortDirection::Output, false, value),
        }
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Id of the owning node
    pub fn owner_id(&self) -> NodeId {
        self.cell.owner.id
    }

    /// Last value produced by the owning node
    pub fn value(&self) -> T {
        self.cell.value.get()
    }

    /// Store `value` and forward it into every linked input.
    ///
    /// Only the owning node should call this.
    pub fn publish(&self, value: T) {
        self.cell.publish(value);
    }

    /// Whether at least one input is linked
    pub fn is_linked(&self) -> bool {
        self.cell.is_linked()
    }

    /// Inputs currently fed by this output
    pub fn downstream(&self) -> Vec<Input<T>> {
        self.cell
            .downstream
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|cell| Input { cell })
            .collect()
    }

    /// Link `input` to this output, replacing the input's previous link
    pub fn connect(&self, input: &Input<T>) -> Result<(), ConnectionError> {
        PortCell::link(&input.cell, &self.cell)
    }

    /// Remove every downstream link on both sides
    pub fn disconnect(&self) {
        PortCell::unlink_output(&self.cell);
    }

    /// Type-erased handle
    pub fn erase(&self) -> AnyPort {
        T::wrap(self.cell.clone())
    }
}

impl<T: PortValue> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: PortValue> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cell.fmt(f)
    }
}

impl<T: PortValue> PartialEq for Output<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cell.name == other.cell.name && self.cell.owner.id == other.cell.owner.id
    }
}

impl<T: PortValue> Eq for Output<T> {}

/// A port of any element type, tagged by its [`ValueKind`]
#[derive(Clone)]
#[allow(missing_docs)]
pub enum AnyPort {
    Bool(Rc<PortCell<bool>>),
    I8(Rc<PortCell<i8>>),
    I16(Rc<PortCell<i16>>),
    I32(Rc<PortCell<i32>>),
    I64(Rc<PortCell<i64>>),
    U8(Rc<PortCell<u8>>),
    U16(Rc<PortCell<u16>>),
    U32(Rc<PortCell<u32>>),
    U64(Rc<PortCell<u64>>),
    F32(Rc<PortCell<f32>>),
    F64(Rc<PortCell<f64>>),
}

macro_rules! with_cell {
    ($port:expr, $cell:ident => $body:expr) => {
        match $port {
            AnyPort::Bool($cell) => $body,
            AnyPort::I8($cell) => $body,
            AnyPort::I16($cell) => $body,
            AnyPort::I32($cell) => $body,
            AnyPort::I64($cell) => $body,
            AnyPort::U8($cell) => $body,
            AnyPort::U16($cell) => $body,
            AnyPort::U32($cell) => $body,
            AnyPort::U64($cell) => $body,
            AnyPort::F32($cell) => $body,
            AnyPort::F64($cell) => $body,
        }
    };
}

impl AnyPort {
    /// Element type tag
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::I8(_) => ValueKind::I8,
            Self::I16(_) => ValueKind::I16,
            Self::I32(_) => ValueKind::I32,
            Self::I64(_) => ValueKind::I64,
            Self::U8(_) => ValueKind::U8,
            Self::U16(_) => ValueKind::U16,
            Self::U32(_) => ValueKind::U32,
            Self::U64(_) => ValueKind::U64,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
        }
    }

    /// Port name
    pub fn name(&self) -> &str {
        with_cell!(self, cell => &cell.name)
    }

    /// Port direction
    pub fn direction(&self) -> PortDirection {
        with_cell!(self, cell => cell.direction)
    }

    /// Id of the owning node
    pub fn owner_id(&self) -> NodeId {
        with_cell!(self, cell => cell.owner.id)
    }

    /// Whether this is a required input
    pub fn is_required(&self) -> bool {
        with_cell!(self, cell => cell.required)
    }

    /// Whether the port has at least one live link
    pub fn is_linked(&self) -> bool {
        with_cell!(self, cell => cell.is_linked())
    }

    /// Ids of the nodes on the other side of this port's links
    pub fn linked_owners(&self) -> Vec<NodeId> {
        with_cell!(self, cell => cell.linked_owners())
    }

    /// Owner id and port name of the linked upstream output
    pub fn upstream_endpoint(&self) -> Option<(NodeId, String)> {
        with_cell!(self, cell => cell.upstream_endpoint())
    }

    /// Current value rendered for display
    pub fn value_string(&self) -> String {
        with_cell!(self, cell => cell.value.get().to_string())
    }

    /// Recover the typed input handle
    pub fn as_input<T: PortValue>(&self) -> Option<Input<T>> {
        T::unwrap(self)
            .filter(|cell| cell.direction == PortDirection::Input)
            .map(|cell| Input { cell: cell.clone() })
    }

    /// Recover the typed output handle
    pub fn as_output<T: PortValue>(&self) -> Option<Output<T>> {
        T::unwrap(self)
            .filter(|cell| cell.direction == PortDirection::Output)
            .map(|cell| Output { cell: cell.clone() })
    }

    /// Remove every link of this port
    pub fn disconnect(&self) {
        with_cell!(self, cell => match cell.direction {
            PortDirection::Input => PortCell::unlink_input(cell),
            PortDirection::Output => PortCell::unlink_output(cell),
        });
    }

    fn link_issue(&self) -> Option<ValidationCode> {
        with_cell!(self, cell => cell.link_issue())
    }
}

impl fmt::Debug for AnyPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_cell!(self, cell => cell.fmt(f))
    }
}

impl PartialEq for AnyPort {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.owner_id() == other.owner_id()
    }
}

impl Eq for AnyPort {}

/// Name-indexed registry of a node's ports
#[derive(Debug, Default)]
pub struct PortSet {
    ports: IndexMap<String, AnyPort>,
    duplicates: Vec<String>,
}

impl PortSet {
    /// Create an empty port set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input port
    pub fn with_input<T: PortValue>(mut self, input: &Input<T>) -> Self {
        self.insert(input.erase());
        self
    }

    /// Register an output port
    pub fn with_output<T: PortValue>(mut self, output: &Output<T>) -> Self {
        self.insert(output.erase());
        self
    }

    /// Register a port. A name clash keeps the first port and is reported
    /// by [`PortSet::validate`].
    pub fn insert(&mut self, port: AnyPort) {
        let name = port.name().to_string();
        if self.ports.contains_key(&name) {
            tracing::warn!(port = %name, "duplicate port name");
            self.duplicates.push(name);
            return;
        }
        self.ports.insert(name, port);
    }

    /// Look up a port of either direction
    pub fn get(&self, name: &str) -> Option<&AnyPort> {
        self.ports.get(name)
    }

    /// All ports in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &AnyPort> {
        self.ports.values()
    }

    /// Input ports in declaration order
    pub fn inputs(&self) -> impl Iterator<Item = &AnyPort> {
        self.iter().filter(|p| p.direction() == PortDirection::Input)
    }

    /// Output ports in declaration order
    pub fn outputs(&self) -> impl Iterator<Item = &AnyPort> {
        self.iter().filter(|p| p.direction() == PortDirection::Output)
    }

    /// Number of ports
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Whether the node has no ports
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Typed input lookup; `None` on unknown name, other direction or
    /// other element type
    pub fn input<T: PortValue>(&self, name: &str) -> Option<Input<T>> {
        self.get(name)?.as_input()
    }

    /// Typed output lookup; `None` on unknown name, other direction or
    /// other element type
    pub fn output<T: PortValue>(&self, name: &str) -> Option<Output<T>> {
        self.get(name)?.as_output()
    }

    /// Fail with [`EvaluationError::NotReady`] on the first unlinked required
    /// input
    pub fn ensure_required(&self) -> Result<(), EvaluationError> {
        match self.inputs().find(|p| p.is_required() && !p.is_linked()) {
            Some(port) => Err(EvaluationError::NotReady {
                node: port.owner_id(),
                port: port.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Structural check of the ports and their links.
    ///
    /// Only a link between two ports of the same node is reported as
    /// recursive; longer cycles are not detected here.
    pub fn validate(&self) -> ValidationCode {
        if self.ports.is_empty() {
            return ValidationCode::NeitherSourceNorDestination;
        }
        if !self.duplicates.is_empty() {
            return ValidationCode::DuplicateInput;
        }
        if self.inputs().any(|p| p.is_required() && !p.is_linked()) {
            return ValidationCode::RequiredConnectionsNotFulfilled;
        }

        let mut issue = None;
        for port in self.ports.values() {
            match port.link_issue() {
                Some(ValidationCode::RecursiveConnection) => {
                    return ValidationCode::RecursiveConnection;
                }
                Some(other) => issue = issue.or(Some(other)),
                None => {}
            }
        }
        issue.unwrap_or(ValidationCode::Success)
    }
}
