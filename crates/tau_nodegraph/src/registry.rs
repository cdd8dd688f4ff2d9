// SPDX-License-Identifier: MIT OR Apache-2.0
//! Catalog of node kinds by kind name.
//!
//! Every built-in node is described by a [`Recipe`]: plain data naming the
//! node family and its value kinds. The registry maps kind names such as
//! `IntAdd` or `DoubleToFloat` to recipes and builds nodes from them, so
//! graphs can be assembled from names alone.

use crate::node::NodeRef;
use crate::nodes::{
    arithmetic, bitwise, cast, comparison, epsilon_equal, epsilon_not_equal, math, not, ArithmeticOp, BitwiseOp,
    ComparisonOp, ConstantNode, MathOp, SelectorNode,
};
use crate::value::{dispatch_kind, ConversionError, PortValue, Scalar, ValueKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node kind category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Constant sources
    Input,
    /// Arithmetic and math functions
    Math,
    /// Bitwise operators and the selector
    Logic,
    /// Comparisons
    Comparison,
    /// Casts
    Conversion,
}

/// A primitive operation, independent of the kind it is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    /// Numeric kinds
    Arithmetic(ArithmeticOp),
    /// Integers and `bool`
    Bitwise(BitwiseOp),
    /// Unary complement; integers and `bool`
    Not,
    /// Numeric kinds
    Comparison(ComparisonOp),
    /// `|x - y| < z`; float kinds
    EpsilonEqualTo,
    /// `|x - y| > z`; float kinds
    EpsilonNotEqualTo,
    /// Numeric kinds, `f64` result
    Math(MathOp),
}

impl OperatorKind {
    /// Every operation
    pub fn all() -> impl Iterator<Item = OperatorKind> {
        ArithmeticOp::ALL
            .into_iter()
            .map(Self::Arithmetic)
            .chain(BitwiseOp::ALL.into_iter().map(Self::Bitwise))
            .chain([Self::Not])
            .chain(ComparisonOp::ALL.into_iter().map(Self::Comparison))
            .chain([Self::EpsilonEqualTo, Self::EpsilonNotEqualTo])
            .chain(MathOp::ALL.into_iter().map(Self::Math))
    }

    /// Operation name used in kind names
    pub fn name(self) -> &'static str {
        match self {
            Self::Arithmetic(op) => op.name(),
            Self::Bitwise(op) => op.name(),
            Self::Not => "Not",
            Self::Comparison(op) => op.name(),
            Self::EpsilonEqualTo => "EpsilonEqualTo",
            Self::EpsilonNotEqualTo => "EpsilonNotEqualTo",
            Self::Math(op) => op.name(),
        }
    }

    /// Whether the operation is defined for `kind`
    pub fn supports(self, kind: ValueKind) -> bool {
        match self {
            Self::Arithmetic(_) | Self::Comparison(_) | Self::Math(_) => kind.is_numeric(),
            Self::Bitwise(_) | Self::Not => kind.is_bitwise(),
            Self::EpsilonEqualTo | Self::EpsilonNotEqualTo => kind.is_float(),
        }
    }

    fn category(self) -> NodeCategory {
        match self {
            Self::Arithmetic(_) | Self::Math(_) => NodeCategory::Math,
            Self::Bitwise(_) | Self::Not => NodeCategory::Logic,
            Self::Comparison(_) | Self::EpsilonEqualTo | Self::EpsilonNotEqualTo => NodeCategory::Comparison,
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How to build one node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipe {
    /// [`ConstantNode`] holding the kind's default value; see
    /// [`NodeRegistry::create_with_value`] for other values
    Constant(ValueKind),
    /// [`SelectorNode`] over the kind
    Selector(ValueKind),
    /// Checked conversion
    Cast {
        /// Input kind
        from: ValueKind,
        /// Output kind
        to: ValueKind,
    },
    /// Primitive operator
    Operator {
        /// Operation
        op: OperatorKind,
        /// Operand kind
        kind: ValueKind,
    },
}

impl Recipe {
    /// Kind name of the nodes this recipe builds
    pub fn kind_name(&self) -> String {
        match *self {
            Self::Constant(kind) => format!("{}Constant", kind.type_name()),
            Self::Selector(kind) => format!("{}SelectiveValue", kind.type_name()),
            Self::Cast { from, to } => format!("{}To{}", from.type_name(), to.type_name()),
            Self::Operator { op, kind } => format!("{}{}", kind.type_name(), op.name()),
        }
    }

    /// Category of the nodes this recipe builds
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Constant(_) => NodeCategory::Input,
            Self::Selector(_) => NodeCategory::Logic,
            Self::Cast { .. } => NodeCategory::Conversion,
            Self::Operator { op, .. } => op.category(),
        }
    }

    /// Build a node
    pub fn build(&self, display_name: &str) -> Result<NodeRef, RegistryError> {
        match *self {
            Self::Constant(kind) => Ok(create_constant(kind, display_name)),
            Self::Selector(kind) => Ok(create_selector(kind, display_name)),
            Self::Cast { from, to } => Ok(create_cast(from, to, display_name)),
            Self::Operator { op, kind } => create_operator(op, kind, display_name),
        }
    }
}

/// Registered node kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Kind name, e.g. `IntAdd`
    pub id: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// How to build it
    pub recipe: Recipe,
}

impl NodeType {
    /// Describe the node kind built by `recipe`
    pub fn from_recipe(recipe: Recipe) -> Self {
        let description = match recipe {
            Recipe::Constant(kind) => format!("Constant {kind} source"),
            Recipe::Selector(kind) => format!("Selects one of two {kind} values"),
            Recipe::Cast { from, to } => format!("Checked conversion from {from} to {to}"),
            Recipe::Operator { op, kind } => format!("{op} over {kind}"),
        };
        Self {
            id: recipe.kind_name(),
            category: recipe.category(),
            description,
            recipe,
        }
    }
}

/// Error when building a node from the registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// No node kind registered under this name
    #[error("Unknown node kind: '{0}'")]
    UnknownKind(String),

    /// Only constants take an initial value
    #[error("Node kind '{0}' is not a constant")]
    NotAConstant(String),

    /// The initial value does not fit the constant's kind
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The operation is not defined for the value kind
    #[error("{op} is not defined for {kind}")]
    Unsupported {
        /// Requested operation
        op: OperatorKind,
        /// Requested value kind
        kind: ValueKind,
    },
}

/// Registry of available node types
#[derive(Debug, Default)]
pub struct NodeRegistry {
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in kind: constants, selectors, casts
    /// between distinct kinds and each operation over each kind it supports
    pub fn with_operators() -> Self {
        let mut registry = Self::new();
        for kind in ValueKind::ALL {
            registry.register(NodeType::from_recipe(Recipe::Constant(kind)));
            registry.register(NodeType::from_recipe(Recipe::Selector(kind)));
        }
        for from in ValueKind::ALL {
            for to in ValueKind::ALL.into_iter().filter(|&to| to != from) {
                registry.register(NodeType::from_recipe(Recipe::Cast { from, to }));
            }
        }
        for op in OperatorKind::all() {
            for kind in ValueKind::ALL.into_iter().filter(|&kind| op.supports(kind)) {
                registry.register(NodeType::from_recipe(Recipe::Operator { op, kind }));
            }
        }
        tracing::debug!(kinds = registry.len(), "registered built-in node kinds");
        registry
    }

    /// Register a node type, replacing any type with the same id
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Get a node type by kind name
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// All registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Types in one category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Build a node of kind `kind_name`
    pub fn create(&self, kind_name: &str, display_name: &str) -> Result<NodeRef, RegistryError> {
        let node_type = self.get(kind_name).ok_or_else(|| {
            tracing::warn!(kind = kind_name, "unknown node kind");
            RegistryError::UnknownKind(kind_name.to_string())
        })?;
        node_type.recipe.build(display_name)
    }

    /// Build a constant of kind `kind_name` holding `value`, converted with
    /// the same checks as a cast
    pub fn create_with_value(
        &self,
        kind_name: &str,
        display_name: &str,
        value: Scalar,
    ) -> Result<NodeRef, RegistryError> {
        match self.get(kind_name).map(|t| t.recipe) {
            Some(Recipe::Constant(kind)) => Ok(create_constant_with(kind, value, display_name)?),
            Some(_) => Err(RegistryError::NotAConstant(kind_name.to_string())),
            None => Err(RegistryError::UnknownKind(kind_name.to_string())),
        }
    }
}

/// Constant of `kind` holding its default value
pub fn create_constant(kind: ValueKind, display_name: &str) -> NodeRef {
    dispatch_kind!(kind, T => ConstantNode::new(display_name, T::default()) as NodeRef)
}

/// Constant of `kind` holding `value`
pub fn create_constant_with(
    kind: ValueKind,
    value: Scalar,
    display_name: &str,
) -> Result<NodeRef, ConversionError> {
    dispatch_kind!(kind, T => Ok(ConstantNode::new(display_name, T::from_scalar(value)?) as NodeRef))
}

/// Selector over `kind`
pub fn create_selector(kind: ValueKind, display_name: &str) -> NodeRef {
    dispatch_kind!(kind, T => SelectorNode::<T>::new(display_name) as NodeRef)
}

/// Checked conversion from `from` to `to`
pub fn create_cast(from: ValueKind, to: ValueKind, display_name: &str) -> NodeRef {
    dispatch_kind!(from, A => dispatch_kind!(to, B => cast::<A, B>(display_name) as NodeRef))
}

/// Apply `op` to operands of `kind`
pub fn create_operator(op: OperatorKind, kind: ValueKind, display_name: &str) -> Result<NodeRef, RegistryError> {
    let unsupported = || RegistryError::Unsupported { op, kind };
    match op {
        OperatorKind::Arithmetic(op) => dispatch_kind!(@numeric kind,
            T => Ok(arithmetic::<T>(op, display_name) as NodeRef),
            else Err(unsupported())),
        OperatorKind::Bitwise(op) => dispatch_kind!(@bitwise kind,
            T => Ok(bitwise::<T>(op, display_name) as NodeRef),
            else Err(unsupported())),
        OperatorKind::Not => dispatch_kind!(@bitwise kind,
            T => Ok(not::<T>(display_name) as NodeRef),
            else Err(unsupported())),
        OperatorKind::Comparison(op) => dispatch_kind!(@numeric kind,
            T => Ok(comparison::<T>(op, display_name) as NodeRef),
            else Err(unsupported())),
        OperatorKind::EpsilonEqualTo => dispatch_kind!(@float kind,
            T => Ok(epsilon_equal::<T>(display_name) as NodeRef),
            else Err(unsupported())),
        OperatorKind::EpsilonNotEqualTo => dispatch_kind!(@float kind,
            T => Ok(epsilon_not_equal::<T>(display_name) as NodeRef),
            else Err(unsupported())),
        OperatorKind::Math(op) => dispatch_kind!(@numeric kind,
            T => Ok(math::<T>(op, display_name) as NodeRef),
            else Err(unsupported())),
    }
}
