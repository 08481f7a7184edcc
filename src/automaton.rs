//! Rabin automata driven tick by tick to produce a reward signal.
//!
//! The text parser produces an [`AutomatonDescription`], which only records guards symbolically.
//! Materializing a description binds every guard to runtime predicates and yields a
//! [`RewardAutomaton`], which can then be ticked once per simulation step.
//!
//! States refer to their successors by index into the state array of the automaton that owns
//! them, so the state graph may contain arbitrary cycles without shared ownership.

use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};

use thiserror::Error;

use crate::expressions::GuardExpression;
use crate::predicate::{Predicate, PredicateHandle};
use crate::registry::PredicateResolutionError;

mod build;
mod distance;
mod reward;

pub use distance::Distance;
pub use reward::RewardAutomaton;

/// Rabin acceptance pair over transition tokens.
///
/// A run is accepted by the pair when it visits `inf_tokens` infinitely often and `fin_tokens` only
/// finitely often.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AcceptancePair {
    pub fin_tokens: BTreeSet<String>,
    pub inf_tokens: BTreeSet<String>,
}

impl AcceptancePair {
    pub fn new<F, I>(fin_tokens: F, inf_tokens: I) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            fin_tokens: fin_tokens.into_iter().map(Into::into).collect(),
            inf_tokens: inf_tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a transition carrying `tokens` counts as an accepting visit for this pair.
    pub fn accepts(&self, tokens: &BTreeSet<String>) -> bool {
        !self.inf_tokens.is_disjoint(tokens) && self.fin_tokens.is_disjoint(tokens)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionDescription {
    pub guard: GuardExpression,
    pub destination: usize,
    pub tokens: BTreeSet<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateDescription {
    pub label: String,
    pub transitions: Vec<TransitionDescription>,
}

/// Automaton read from text, with guards not yet bound to predicates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutomatonDescription {
    pub initial_state: usize,
    pub acceptance_pairs: Vec<AcceptancePair>,
    pub states: Vec<StateDescription>,
}

impl AutomatonDescription {
    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|state| state.transitions.len()).sum()
    }
}

/// Outgoing transition of a materialized state.
#[derive(Clone)]
pub struct AutomatonEdge {
    pub predicate: PredicateHandle,
    pub end_state: usize,
    pub tokens: BTreeSet<String>,
}

impl AutomatonEdge {
    pub fn new<I>(predicate: PredicateHandle, end_state: usize, tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            predicate,
            end_state,
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

impl Debug for AutomatonEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomatonEdge")
            .field("predicate", &self.predicate.identity())
            .field("end_state", &self.end_state)
            .field("tokens", &self.tokens)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct AutomatonState {
    pub label: String,
    pub transitions: Vec<AutomatonEdge>,
}

impl AutomatonState {
    pub fn new<S: Into<String>>(label: S, transitions: Vec<AutomatonEdge>) -> Self {
        Self {
            label: label.into(),
            transitions,
        }
    }
}

pub fn is_accepting_transition(pairs: &[AcceptancePair], edge: &AutomatonEdge) -> bool {
    pairs.iter().any(|pair| pair.accepts(&edge.tokens))
}

/// A state is accepting when at least one of its outgoing transitions is.
pub fn is_accepting_state(pairs: &[AcceptancePair], state: &AutomatonState) -> bool {
    state
        .transitions
        .iter()
        .any(|edge| is_accepting_transition(pairs, edge))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Running,
    WordAccepted,
    WordRejected,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::WordAccepted => "accepted",
            Self::WordRejected => "rejected",
        };

        f.write_str(name)
    }
}

/// Runtime options of a [`RewardAutomaton`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardConfig {
    /// Halt on the first accepting or rejecting verdict. When unset the automaton keeps ticking
    /// and adds the robustness of the accepting transition to the reward.
    pub stop_on_acceptance: bool,

    /// Clamp the robustness of the best improving transition that was not taken to `[-1, 0]`
    /// before it contributes to the reward.
    pub clamp_near_miss: bool,
}

impl RewardConfig {
    pub fn stop_on_acceptance(mut self, value: bool) -> Self {
        self.stop_on_acceptance = value;
        self
    }

    pub fn clamp_near_miss(mut self, value: bool) -> Self {
        self.clamp_near_miss = value;
        self
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            stop_on_acceptance: true,
            clamp_near_miss: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutomatonBuildError {
    #[error("Automaton has no states")]
    NoStates,

    #[error("Initial state {index} is out of range for {count} states")]
    InitialStateOutOfRange { index: usize, count: usize },

    #[error("Transition of state {state} leads to state {destination}, only {count} states exist")]
    DestinationOutOfRange {
        state: usize,
        destination: usize,
        count: usize,
    },

    #[error("No state is a positive finite distance away from acceptance")]
    NoProgressMetric,

    #[error("Could not resolve predicate: {0}")]
    Resolution(#[from] PredicateResolutionError),
}
