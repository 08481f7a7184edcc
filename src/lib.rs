#![deny(clippy::all)]

//! Dense rewards from temporal logic behavior specifications.
//!
//! A behavior is written as an LTL formula over atomic propositions, converted into a Rabin
//! automaton by an external tool, and bound to robustness predicates. Ticking the resulting
//! [`RewardAutomaton`] follows the most robust enabled transition and rewards progress towards
//! the accepting transitions.

pub mod automaton;
pub mod blackboard;
pub mod compile;
pub mod conditions;
pub mod converter;
pub mod expressions;
pub mod formula;
pub mod operators;
#[cfg(feature = "parser")]
pub mod parser;
pub mod predicate;
pub mod registry;

pub use crate::automaton::{AutomatonDescription, Distance, RewardAutomaton, RewardConfig, Status};
pub use crate::blackboard::{Blackboard, Value};
#[cfg(feature = "parser")]
pub use crate::compile::compile_behavior;
pub use crate::compile::{compile_formula, PredicateGraph, PredicateNode};
pub use crate::converter::{AutomatonConverter, ProcessConverter};
pub use crate::expressions::GuardExpression;
pub use crate::formula::LtlFormula;
pub use crate::predicate::{Predicate, PredicateHandle};
pub use crate::registry::PredicateRegistry;
