//! Boolean guard expressions labelling automaton transitions.
//!
//! A guard refers to atomic propositions by their index in the ordered proposition list produced
//! when the behavior formula was compiled. [`GuardExpression::to_predicate`] turns the tree into a
//! composite runtime predicate that shares the proposition predicates it references.

use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::operators::{And, Not, Or, True};
use crate::predicate::PredicateHandle;
use crate::registry::PredicateResolutionError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardExpression {
    Boolean(bool),
    IntRef(u32),
    Negation(Box<GuardExpression>),
    And(Box<GuardExpression>, Box<GuardExpression>),
    Or(Box<GuardExpression>, Box<GuardExpression>),
}

impl GuardExpression {
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Self) -> Self {
        Self::Negation(Box::new(inner))
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Indices of the atomic propositions the guard references, ascending and without duplicates.
    pub fn propositions(&self) -> Vec<u32> {
        fn collect(expression: &GuardExpression, indices: &mut Vec<u32>) {
            match expression {
                GuardExpression::Boolean(_) => {}
                GuardExpression::IntRef(index) => indices.push(*index),
                GuardExpression::Negation(inner) => collect(inner, indices),
                GuardExpression::And(left, right) | GuardExpression::Or(left, right) => {
                    collect(left, indices);
                    collect(right, indices);
                }
            }
        }

        let mut indices = Vec::new();
        collect(self, &mut indices);
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Build the runtime predicate for this guard.
    ///
    /// `t` evaluates to constant robustness `1`, `f` to `-1`. Index references resolve to clones of
    /// the corresponding handle in `propositions`, so a proposition shared by several guards is a
    /// single predicate instance.
    pub fn to_predicate(
        &self,
        propositions: &[PredicateHandle],
    ) -> Result<PredicateHandle, PredicateResolutionError> {
        let predicate: PredicateHandle = match self {
            Self::Boolean(true) => Rc::new(True),
            Self::Boolean(false) => Rc::new(Not::new(Rc::new(True) as PredicateHandle)),
            Self::IntRef(index) => {
                return propositions.get(*index as usize).cloned().ok_or(
                    PredicateResolutionError::UnknownProposition {
                        index: *index,
                        count: propositions.len(),
                    },
                )
            }
            Self::Negation(inner) => Rc::new(Not::new(inner.to_predicate(propositions)?)),
            Self::And(left, right) => Rc::new(And::new(
                left.to_predicate(propositions)?,
                right.to_predicate(propositions)?,
            )),
            Self::Or(left, right) => Rc::new(Or::new(
                left.to_predicate(propositions)?,
                right.to_predicate(propositions)?,
            )),
        };

        Ok(predicate)
    }
}

/// Renders the guard in the grammar accepted by the guard parser, fully parenthesized.
impl Display for GuardExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(true) => write!(f, "t"),
            Self::Boolean(false) => write!(f, "f"),
            Self::IntRef(index) => write!(f, "{}", index),
            Self::Negation(inner) => write!(f, "!{}", inner),
            Self::And(left, right) => write!(f, "({}&{})", left, right),
            Self::Or(left, right) => write!(f, "({}|{})", left, right),
        }
    }
}
