//! Compile a behavior graph into an LTL formula and, end to end, into a reward automaton.
//!
//! A behavior graph is a tree of predicate nodes rooted at a single output node. Temporal and
//! boolean flow nodes become the corresponding LTL operators. Every other node is a user
//! predicate: it is abstracted into a fresh atomic proposition `p<k>` whose kind and parameter
//! bindings are recorded at index `k` of the proposition list, which is what the indices in the
//! guards of the converted automaton refer to.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;
#[cfg(feature = "parser")]
use tracing::info;

use crate::automaton::AutomatonBuildError;
#[cfg(feature = "parser")]
use crate::automaton::{RewardAutomaton, RewardConfig};
#[cfg(feature = "parser")]
use crate::blackboard::Blackboard;
#[cfg(feature = "parser")]
use crate::converter::AutomatonConverter;
use crate::converter::ConversionError;
use crate::formula::LtlFormula;
#[cfg(feature = "parser")]
use crate::parser::{parse_automaton, AutomatonParseError};
#[cfg(feature = "parser")]
use crate::registry::PredicateRegistry;
use crate::registry::{InputBinding, PropositionBinding};

pub const THEN: &str = "Flow/Then";
pub const ALWAYS: &str = "Flow/Always";
pub const EVENTUALLY: &str = "Flow/Eventually";
pub const UNTIL: &str = "Flow/Until";
pub const NEXT: &str = "Flow/Next";
pub const AND: &str = "Flow/And";
pub const OR: &str = "Flow/Or";
pub const NOT: &str = "Transformations/Not";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormulaBuildError {
    #[error("Behavior graph has no root node")]
    MissingRoot,

    #[error("Reference to unknown node \"{0}\"")]
    UnknownNode(String),

    #[error("Input \"{input}\" of node \"{node}\" is not connected")]
    UnconnectedInput { node: String, input: String },

    #[error("Node \"{0}\" is part of a cycle")]
    Cycle(String),
}

/// A node of a behavior graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredicateNode {
    pub id: String,
    pub kind: String,
    /// Predicate-typed inputs, as `(input name, source node id)`.
    pub connections: Vec<(String, String)>,
    /// Value inputs, bound to blackboard entries.
    pub inputs: Vec<InputBinding>,
}

impl PredicateNode {
    pub fn new<I: Into<String>, K: Into<String>>(id: I, kind: K) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            connections: Vec::new(),
            inputs: Vec::new(),
        }
    }

    pub fn connect<I: Into<String>, N: Into<String>>(mut self, input: I, node: N) -> Self {
        self.connections.push((input.into(), node.into()));
        self
    }

    pub fn bind<P: Into<String>, E: Into<String>>(mut self, param: P, entry: E) -> Self {
        self.inputs.push(InputBinding::new(param, entry));
        self
    }

    fn connection(&self, input: &str) -> Result<&str, FormulaBuildError> {
        self.connections
            .iter()
            .find(|(name, _)| name == input)
            .map(|(_, node)| node.as_str())
            .ok_or_else(|| FormulaBuildError::UnconnectedInput {
                node: self.id.clone(),
                input: input.to_string(),
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PredicateGraph {
    nodes: Vec<PredicateNode>,
    root: Option<String>,
}

impl PredicateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: PredicateNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Connect the output of the graph to `node`.
    pub fn set_root<S: Into<String>>(&mut self, node: S) -> &mut Self {
        self.root = Some(node.into());
        self
    }

    pub fn node(&self, id: &str) -> Option<&PredicateNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn nodes(&self) -> &[PredicateNode] {
        &self.nodes
    }
}

/// Formula of a behavior graph and the bindings of its atomic propositions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledFormula {
    pub formula: LtlFormula,
    pub propositions: Vec<PropositionBinding>,
}

struct FormulaBuilder<'a> {
    graph: &'a PredicateGraph,
    visiting: HashSet<&'a str>,
    propositions: Vec<PropositionBinding>,
}

impl<'a> FormulaBuilder<'a> {
    fn input(
        &mut self,
        node: &'a PredicateNode,
        name: &str,
    ) -> Result<LtlFormula, FormulaBuildError> {
        let source = node.connection(name)?;
        self.visit(source)
    }

    fn binary<F>(
        &mut self,
        node: &'a PredicateNode,
        inputs: (&str, &str),
        combine: F,
    ) -> Result<LtlFormula, FormulaBuildError>
    where
        F: FnOnce(LtlFormula, LtlFormula) -> LtlFormula,
    {
        let left = self.input(node, inputs.0)?;
        let right = self.input(node, inputs.1)?;

        Ok(combine(left, right))
    }

    fn visit(&mut self, id: &str) -> Result<LtlFormula, FormulaBuildError> {
        let graph = self.graph;
        let node = graph
            .node(id)
            .ok_or_else(|| FormulaBuildError::UnknownNode(id.to_string()))?;

        if !self.visiting.insert(node.id.as_str()) {
            return Err(FormulaBuildError::Cycle(node.id.clone()));
        }

        let formula = match node.kind.as_str() {
            THEN => self.binary(node, ("A", "B"), LtlFormula::implies)?,
            AND => self.binary(node, ("A", "B"), LtlFormula::and)?,
            OR => self.binary(node, ("A", "B"), LtlFormula::or)?,
            UNTIL => self.binary(node, ("P", "Q"), LtlFormula::until)?,
            ALWAYS => LtlFormula::globally(self.input(node, "X")?),
            EVENTUALLY => LtlFormula::eventually(self.input(node, "X")?),
            NEXT => LtlFormula::next(self.input(node, "X")?),
            NOT => LtlFormula::not(self.input(node, "X")?),
            kind => {
                let id = format!("p{}", self.propositions.len());
                self.propositions.push(PropositionBinding::new(kind, node.inputs.clone()));
                LtlFormula::atom(id)
            }
        };

        self.visiting.remove(node.id.as_str());
        Ok(formula)
    }
}

/// Build the LTL formula rooted at the output of `graph`.
///
/// Each visit of a user predicate node yields a new proposition, so a node reachable along two
/// paths is bound twice.
pub fn compile_formula(graph: &PredicateGraph) -> Result<CompiledFormula, FormulaBuildError> {
    let root = graph.root.as_deref().ok_or(FormulaBuildError::MissingRoot)?;
    let mut builder = FormulaBuilder {
        graph,
        visiting: HashSet::new(),
        propositions: Vec::new(),
    };

    let formula = builder.visit(root)?;
    debug!(%formula, propositions = builder.propositions.len(), "Compiled behavior formula");

    Ok(CompiledFormula {
        formula,
        propositions: builder.propositions,
    })
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Formula(#[from] FormulaBuildError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[cfg(feature = "parser")]
    #[error(transparent)]
    Parse(#[from] AutomatonParseError),

    #[error(transparent)]
    Build(#[from] AutomatonBuildError),
}

/// Run the whole pipeline: graph to formula, formula to automaton text through `converter`, text
/// to automaton description, and description to a reward automaton bound to `blackboard`.
#[cfg(feature = "parser")]
pub fn compile_behavior<C>(
    graph: &PredicateGraph,
    converter: &C,
    registry: &PredicateRegistry,
    blackboard: &Blackboard,
    config: RewardConfig,
) -> Result<RewardAutomaton, CompileError>
where
    C: AutomatonConverter + ?Sized,
{
    let compiled = compile_formula(graph)?;
    let text = converter.convert(&compiled.formula)?;
    let description = parse_automaton(&text)?;

    info!(
        formula = %compiled.formula,
        states = description.states.len(),
        transitions = description.transition_count(),
        "Converted behavior into automaton"
    );

    let automaton = RewardAutomaton::build(
        &description,
        &compiled.propositions,
        registry,
        blackboard,
        config,
    )?;
    Ok(automaton)
}
