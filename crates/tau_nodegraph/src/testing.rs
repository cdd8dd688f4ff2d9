// SPDX-License-Identifier: MIT OR Apache-2.0
//! Instrumented source node for evaluation tests.

use crate::evaluation::{EvalPass, EvaluationError};
use crate::node::{Node, NodeHeader};
use crate::nodes::constant::VALUE;
use crate::port::{Output, PortSet};
use crate::value::PortValue;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Shared record of which sources ran, in order
pub type ComputeLog = Rc<RefCell<Vec<String>>>;

/// A constant source that counts how often it is computed
pub struct CountingSource<T: PortValue> {
    header: NodeHeader,
    output: Output<T>,
    ports: PortSet,
    value: T,
    visits: Cell<usize>,
    log: Option<ComputeLog>,
}

impl<T: PortValue> CountingSource<T> {
    pub fn new(name: &str, value: T) -> Rc<Self> {
        Self::build(name, value, None)
    }

    /// Like [`CountingSource::new`], also appending `name` to `log` on
    /// every compute
    pub fn logged(name: &str, value: T, log: ComputeLog) -> Rc<Self> {
        Self::build(name, value, Some(log))
    }

    fn build(name: &str, value: T, log: Option<ComputeLog>) -> Rc<Self> {
        let header = NodeHeader::new(format!("{}Counter", T::KIND.type_name()), name);
        Rc::new_cyclic(|node: &Weak<Self>| {
            let owner = header.port_owner(node.clone());
            let output = Output::new(&owner, VALUE);
            let ports = PortSet::new().with_output(&output);
            Self {
                header,
                output,
                ports,
                value,
                visits: Cell::new(0),
                log,
            }
        })
    }

    pub fn output(&self) -> &Output<T> {
        &self.output
    }

    pub fn visits(&self) -> usize {
        self.visits.get()
    }
}

impl<T: PortValue> Node for CountingSource<T> {
    fn header(&self) -> &NodeHeader {
        &self.header
    }

    fn ports(&self) -> &PortSet {
        &self.ports
    }

    fn evaluate(&self, _pass: &mut EvalPass) -> Result<(), EvaluationError> {
        self.visits.set(self.visits.get() + 1);
        if let Some(log) = &self.log {
            log.borrow_mut().push(self.header.display_name());
        }
        self.output.publish(self.value);
        Ok(())
    }
}
