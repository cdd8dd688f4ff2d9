// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sample graphs.
//!
//! Sources are typed constants; every other node is created from the
//! registry by kind name and wired by port name.

use crate::config::{AddScenario, CastChainScenario, DemoConfig, DiamondScenario, SelectorScenario};
use std::fmt;
use tau_nodegraph::{
    connect, ConnectionError, EvalPass, EvaluationError, Node, NodeExt, NodeRef, NodeRegistry, PortValue,
    RegistryError,
};
use tau_nodegraph::nodes::ConstantNode;

/// Error while building or running a sample graph
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Unknown kind name
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Wiring failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Evaluation failed
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The sink has no output of the expected name and type
    #[error("Node '{node}' has no output '{port}'")]
    MissingOutput {
        /// Sink display name
        node: String,
        /// Requested output
        port: String,
    },
}

/// Outcome of one sample graph
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Scenario name
    pub name: &'static str,
    /// Sink value, rendered
    pub result: String,
    /// Node evaluations in the pass
    pub visits: usize,
    /// Evaluations of the node shared by two paths, where there is one
    pub shared_visits: Option<usize>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} = {:<20} ({} evaluations", self.name, self.result, self.visits)?;
        if let Some(shared) = self.shared_visits {
            write!(f, ", shared node {shared}")?;
        }
        f.write_str(")")
    }
}

/// Builds and runs the sample graphs
pub struct Runner {
    registry: NodeRegistry,
    memoize: bool,
}

impl Runner {
    /// Create a runner; `memoize` selects the evaluation pass flavour
    pub fn new(memoize: bool) -> Self {
        Self {
            registry: NodeRegistry::with_operators(),
            memoize,
        }
    }

    /// Run every sample graph in `config`
    pub fn run_all(&self, config: &DemoConfig) -> Result<Vec<Report>, ScenarioError> {
        Ok(vec![
            self.add(&config.add)?,
            self.selector(&config.selector)?,
            self.cast_chain(&config.cast_chain)?,
            self.diamond(&config.diamond)?,
        ])
    }

    fn pass(&self) -> EvalPass {
        if self.memoize {
            EvalPass::memoized()
        } else {
            EvalPass::new()
        }
    }

    fn create(&self, kind_name: &str, display_name: &str) -> Result<NodeRef, ScenarioError> {
        Ok(self.registry.create(kind_name, display_name)?)
    }

    fn evaluate<T: PortValue>(
        &self,
        name: &'static str,
        sink: &NodeRef,
        output: &str,
    ) -> Result<(Report, EvalPass), ScenarioError> {
        let mut pass = self.pass();
        sink.compute_with(&mut pass)?;
        let port = sink
            .find_output_port::<T>(output)
            .ok_or_else(|| ScenarioError::MissingOutput {
                node: sink.header().display_name(),
                port: output.to_string(),
            })?;
        tracing::info!(scenario = name, result = %port.value(), visits = pass.visits(), "scenario evaluated");
        let report = Report {
            name,
            result: port.value().to_string(),
            visits: pass.visits(),
            shared_visits: None,
        };
        Ok((report, pass))
    }

    /// `x + y` over `i32`
    pub fn add(&self, scenario: &AddScenario) -> Result<Report, ScenarioError> {
        let x: NodeRef = ConstantNode::new("x", scenario.x);
        let y: NodeRef = ConstantNode::new("y", scenario.y);
        let sum = self.create("IntAdd", "sum")?;
        connect(&*x, "Value", &*sum, "X")?;
        connect(&*y, "Value", &*sum, "Y")?;

        Ok(self.evaluate::<i32>("add", &sum, "Result")?.0)
    }

    /// `control ? x : y` over `f64`
    pub fn selector(&self, scenario: &SelectorScenario) -> Result<Report, ScenarioError> {
        let control: NodeRef = ConstantNode::new("control", scenario.control);
        let x: NodeRef = ConstantNode::new("x", scenario.x);
        let y: NodeRef = ConstantNode::new("y", scenario.y);
        let select = self.create("DoubleSelectiveValue", "select")?;
        connect(&*control, "Value", &*select, "Control")?;
        connect(&*x, "Value", &*select, "X")?;
        connect(&*y, "Value", &*select, "Y")?;

        Ok(self.evaluate::<f64>("selector", &select, "Value")?.0)
    }

    /// `sqrt(f32(i32(input) + offset) / divisor)`
    pub fn cast_chain(&self, scenario: &CastChainScenario) -> Result<Report, ScenarioError> {
        let input: NodeRef = ConstantNode::new("input", scenario.input);
        let offset: NodeRef = ConstantNode::new("offset", scenario.offset);
        let divisor: NodeRef = ConstantNode::new("divisor", scenario.divisor);

        let to_int = self.create("FloatToInt", "to int")?;
        let sum = self.create("IntAdd", "sum")?;
        let to_float = self.create("IntToFloat", "to float")?;
        let quotient = self.create("FloatDivide", "quotient")?;
        let root = self.create("FloatSqrt", "root")?;

        connect(&*input, "Value", &*to_int, "In")?;
        connect(&*to_int, "Result", &*sum, "X")?;
        connect(&*offset, "Value", &*sum, "Y")?;
        connect(&*sum, "Result", &*to_float, "In")?;
        connect(&*to_float, "Result", &*quotient, "X")?;
        connect(&*divisor, "Value", &*quotient, "Y")?;
        connect(&*quotient, "Result", &*root, "In")?;

        Ok(self.evaluate::<f64>("cast chain", &root, "Result")?.0)
    }

    /// `(shared + 1) + (shared * 2)` over `i64`
    pub fn diamond(&self, scenario: &DiamondScenario) -> Result<Report, ScenarioError> {
        let shared: NodeRef = ConstantNode::new("shared", scenario.shared);
        let one: NodeRef = ConstantNode::new("one", 1i64);
        let two: NodeRef = ConstantNode::new("two", 2i64);

        let left = self.create("LongAdd", "left")?;
        let right = self.create("LongMultiply", "right")?;
        let sink = self.create("LongAdd", "sink")?;

        connect(&*shared, "Value", &*left, "X")?;
        connect(&*one, "Value", &*left, "Y")?;
        connect(&*shared, "Value", &*right, "X")?;
        connect(&*two, "Value", &*right, "Y")?;
        connect(&*left, "Result", &*sink, "X")?;
        connect(&*right, "Result", &*sink, "Y")?;

        let (mut report, pass) = self.evaluate::<i64>("diamond", &sink, "Result")?;
        report.shared_visits = Some(pass.visits_of(shared.id()));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let report = Runner::new(false).add(&AddScenario::default()).unwrap();
        assert_eq!(report.result, "7");
        assert_eq!(report.visits, 3);
    }

    #[test]
    fn test_selector_branches() {
        let runner = Runner::new(false);
        let mut scenario = SelectorScenario::default();
        assert_eq!(runner.selector(&scenario).unwrap().result, "10");

        scenario.control = false;
        let report = runner.selector(&scenario).unwrap();
        assert_eq!(report.result, "20");
        assert_eq!(report.visits, 4);
    }

    #[test]
    fn test_cast_chain() {
        let report = Runner::new(false).cast_chain(&CastChainScenario::default()).unwrap();
        // i32(10.75) = 10, + 5 = 15, / 4 = 3.75
        assert_eq!(report.result, f64::from(3.75f32).sqrt().to_string());
    }

    #[test]
    fn test_cast_chain_overflow_is_reported() {
        let scenario = CastChainScenario {
            input: 1e12,
            ..CastChainScenario::default()
        };
        let err = Runner::new(false).cast_chain(&scenario).unwrap_err();
        assert!(matches!(err, ScenarioError::Evaluation(EvaluationError::Operator { .. })));
    }

    #[test]
    fn test_diamond_visits() {
        let plain = Runner::new(false).diamond(&DiamondScenario::default()).unwrap();
        assert_eq!(plain.result, "16");
        assert_eq!(plain.shared_visits, Some(2));
        assert_eq!(plain.visits, 7);

        let memoized = Runner::new(true).diamond(&DiamondScenario::default()).unwrap();
        assert_eq!(memoized.result, "16");
        assert_eq!(memoized.shared_visits, Some(1));
        assert_eq!(memoized.visits, 6);
    }

    #[test]
    fn test_run_all() {
        let reports = Runner::new(false).run_all(&DemoConfig::default()).unwrap();
        let names: Vec<_> = reports.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["add", "selector", "cast chain", "diamond"]);
        assert!(reports[3].to_string().contains("shared node 2"));
    }
}
