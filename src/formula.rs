//! Syntactic model of Linear Temporal Logic formulas.
//!
//! An [`LtlFormula`] only identifies *which* predicates a behavior is composed of and how they are
//! combined in time. It carries no numeric semantics of its own; the robustness of each atomic
//! proposition is computed at runtime by the reward automaton the formula is compiled into.
//!
//! Two formulas are equal when their canonical printed forms are equal. Formulas that are
//! semantically equivalent but print differently are *not* equal, which is what the atomic
//! proposition bookkeeping of the compile pipeline relies on.
//!
//! # Examples
//!
//! ```rust
//! use tltl_reward::formula::LtlFormula;
//!
//! let phi = LtlFormula::not(LtlFormula::eventually(LtlFormula::atom("p0")));
//!
//! assert_eq!(phi.to_string(), "!(F(p0))");
//! assert_eq!(phi.to_nnf().to_string(), "(F) R (!(p0))");
//! ```

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

mod closure;
mod nnf;

pub use closure::all_subsets;

/// Linear Temporal Logic formula.
#[derive(Clone, Debug)]
pub enum LtlFormula {
    AtomicProposition(String),
    Negation(Box<LtlFormula>),
    Conjunction(Box<LtlFormula>, Box<LtlFormula>),
    Disjunction(Box<LtlFormula>, Box<LtlFormula>),
    Next(Box<LtlFormula>),
    Until(Box<LtlFormula>, Box<LtlFormula>),
    Release(Box<LtlFormula>, Box<LtlFormula>),
    Globally(Box<LtlFormula>),
    Eventually(Box<LtlFormula>),
    True,
    False,
}

impl LtlFormula {
    pub fn atom<S: Into<String>>(id: S) -> Self {
        Self::AtomicProposition(id.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Self) -> Self {
        Self::Negation(Box::new(inner))
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::Conjunction(Box::new(left), Box::new(right))
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::Disjunction(Box::new(left), Box::new(right))
    }

    /// Material implication, expressed as `!left | right`.
    pub fn implies(left: Self, right: Self) -> Self {
        Self::or(Self::not(left), right)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(inner: Self) -> Self {
        Self::Next(Box::new(inner))
    }

    pub fn until(left: Self, right: Self) -> Self {
        Self::Until(Box::new(left), Box::new(right))
    }

    pub fn release(left: Self, right: Self) -> Self {
        Self::Release(Box::new(left), Box::new(right))
    }

    pub fn globally(inner: Self) -> Self {
        Self::Globally(Box::new(inner))
    }

    pub fn eventually(inner: Self) -> Self {
        Self::Eventually(Box::new(inner))
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Self::AtomicProposition(_))
    }

    /// Immediate subformulas, left operand first.
    pub fn children(&self) -> Vec<&LtlFormula> {
        match self {
            Self::AtomicProposition(_) | Self::True | Self::False => Vec::new(),
            Self::Negation(inner)
            | Self::Next(inner)
            | Self::Globally(inner)
            | Self::Eventually(inner) => vec![inner.as_ref()],
            Self::Conjunction(left, right)
            | Self::Disjunction(left, right)
            | Self::Until(left, right)
            | Self::Release(left, right) => vec![left.as_ref(), right.as_ref()],
        }
    }

    /// Identifiers of every atomic proposition in the formula, in first-occurrence order.
    pub fn atomic_propositions(&self) -> Vec<&str> {
        fn collect<'a>(formula: &'a LtlFormula, ids: &mut Vec<&'a str>) {
            if let LtlFormula::AtomicProposition(id) = formula {
                if !ids.contains(&id.as_str()) {
                    ids.push(id);
                }
            }

            for child in formula.children() {
                collect(child, ids);
            }
        }

        let mut ids = Vec::new();
        collect(self, &mut ids);
        ids
    }
}

impl Display for LtlFormula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtomicProposition(id) => write!(f, "{}", id),
            Self::Negation(inner) => write!(f, "!({})", inner),
            Self::Conjunction(left, right) => write!(f, "({}) & ({})", left, right),
            Self::Disjunction(left, right) => write!(f, "({}) | ({})", left, right),
            Self::Next(inner) => write!(f, "X({})", inner),
            Self::Until(left, right) => write!(f, "({}) U ({})", left, right),
            Self::Release(left, right) => write!(f, "({}) R ({})", left, right),
            Self::Globally(inner) => write!(f, "G({})", inner),
            Self::Eventually(inner) => write!(f, "F({})", inner),
            Self::True => write!(f, "T"),
            Self::False => write!(f, "F"),
        }
    }
}

impl PartialEq for LtlFormula {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for LtlFormula {}

impl Hash for LtlFormula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state)
    }
}
