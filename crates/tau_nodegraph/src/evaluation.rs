// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation and execution.
//!
//! Evaluation is demand-pulled: computing a sink recursively computes the
//! nodes feeding its inputs, depth-first, in input declaration order. Each
//! top-level [`Node::compute`](crate::Node::compute) call runs one
//! [`EvalPass`].

use crate::node::{NodeHeader, NodeId};
use crate::operator::OpError;
use std::collections::{HashMap, HashSet};

/// Bookkeeping for one evaluation pass.
///
/// By default every demand recomputes the upstream subgraph, so a node
/// reachable through two paths runs twice. A memoized pass computes each
/// node at most once.
#[derive(Debug, Default)]
pub struct EvalPass {
    memoize: bool,
    in_progress: HashSet<NodeId>,
    completed: HashSet<NodeId>,
    visits: HashMap<NodeId, usize>,
}

impl EvalPass {
    /// Create a non-memoized pass
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pass that computes each node at most once
    pub fn memoized() -> Self {
        Self {
            memoize: true,
            ..Self::default()
        }
    }

    /// Whether this pass reuses results computed earlier in the pass
    pub fn is_memoized(&self) -> bool {
        self.memoize
    }

    /// Total node evaluations so far
    pub fn visits(&self) -> usize {
        self.visits.values().sum()
    }

    /// Evaluations of one node so far
    pub fn visits_of(&self, node: NodeId) -> usize {
        self.visits.get(&node).copied().unwrap_or(0)
    }

    /// Run `evaluate` for the node described by `header`.
    ///
    /// Re-entering a node that is still being computed means the links form
    /// a cycle; that is reported instead of recursing forever.
    pub fn run<F>(&mut self, header: &NodeHeader, evaluate: F) -> Result<(), EvaluationError>
    where
        F: FnOnce(&mut Self) -> Result<(), EvaluationError>,
    {
        let id = header.id();
        if self.in_progress.contains(&id) {
            tracing::warn!(node = %header.display_name(), kind = header.kind_name(), "cycle detected");
            return Err(EvaluationError::Cycle { node: id });
        }
        if self.memoize && self.completed.contains(&id) {
            tracing::trace!(node = %header.display_name(), "reusing result");
            return Ok(());
        }

        tracing::trace!(node = %header.display_name(), kind = header.kind_name(), "computing node");
        self.in_progress.insert(id);
        *self.visits.entry(id).or_default() += 1;
        let result = evaluate(self);
        self.in_progress.remove(&id);

        match &result {
            Ok(()) => {
                self.completed.insert(id);
            }
            Err(err) => {
                tracing::trace!(node = %header.display_name(), error = %err, "node not computed");
            }
        }
        result
    }
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// A required input is unlinked; the node's outputs were left as they were
    #[error("Missing required input '{port}' on node {node}")]
    NotReady {
        /// Node that could not compute
        node: NodeId,
        /// Unlinked input
        port: String,
    },

    /// Links form a cycle through this node
    #[error("Graph contains a cycle through node {node}")]
    Cycle {
        /// Node entered twice
        node: NodeId,
    },

    /// The node's function failed
    #[error("Node {node} ({kind}) failed: {source}")]
    Operator {
        /// Failing node
        node: NodeId,
        /// Its kind name
        kind: String,
        /// What went wrong
        #[source]
        source: OpError,
    },
}

impl EvaluationError {
    /// Wrap a function failure with the node it happened in
    pub fn operator(header: &NodeHeader, source: OpError) -> Self {
        Self::Operator {
            node: header.id(),
            kind: header.kind_name().to_string(),
            source,
        }
    }

    /// Node the error originated in
    pub fn node(&self) -> NodeId {
        match self {
            Self::NotReady { node, .. } | Self::Cycle { node } | Self::Operator { node, .. } => *node,
        }
    }
}
