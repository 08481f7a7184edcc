//! Explicit registry of the predicate kinds a behavior may reference.
//!
//! Every user predicate in a behavior graph names a kind and binds each of the kind's declared
//! parameters to a blackboard entry. The registry resolves those bindings into live [`Param`]
//! handles and hands them to the kind's factory.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use thiserror::Error;

use crate::blackboard::{Blackboard, Param, ValueKind};
use crate::conditions::{BooleanCondition, LessThan};
use crate::operators::True;
use crate::predicate::PredicateHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredicateResolutionError {
    #[error("Unknown predicate kind \"{0}\"")]
    UnknownKind(String),

    #[error("Predicate kind \"{kind}\" requires parameter \"{param}\" but it is not bound")]
    MissingParameter { kind: String, param: String },

    #[error("Parameter \"{param}\" is bound to missing blackboard entry \"{entry}\"")]
    MissingEntry { param: String, entry: String },

    #[error("Parameter \"{param}\" expects a {expected} value, entry \"{entry}\" holds a {found}")]
    TypeMismatch {
        param: String,
        entry: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Guard references atomic proposition {index} but only {count} are defined")]
    UnknownProposition { index: u32, count: usize },
}

/// Binds a declared predicate parameter to a blackboard entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputBinding {
    pub param: String,
    pub entry: String,
}

impl InputBinding {
    pub fn new<P: Into<String>, E: Into<String>>(param: P, entry: E) -> Self {
        Self {
            param: param.into(),
            entry: entry.into(),
        }
    }
}

/// Predicate kind and parameter bindings of one atomic proposition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropositionBinding {
    pub kind: String,
    pub inputs: Vec<InputBinding>,
}

impl PropositionBinding {
    pub fn new<S: Into<String>>(kind: S, inputs: Vec<InputBinding>) -> Self {
        Self {
            kind: kind.into(),
            inputs,
        }
    }
}

/// Parameters resolved for a single predicate instantiation.
#[derive(Debug)]
pub struct BoundParams {
    kind: String,
    params: HashMap<String, Param>,
}

impl BoundParams {
    pub fn get(&self, name: &str) -> Result<Param, PredicateResolutionError> {
        self.params
            .get(name)
            .cloned()
            .ok_or_else(|| PredicateResolutionError::MissingParameter {
                kind: self.kind.clone(),
                param: name.to_string(),
            })
    }
}

pub type PredicateFactory =
    Box<dyn Fn(&BoundParams) -> Result<PredicateHandle, PredicateResolutionError>>;

/// A named predicate kind with its declared parameters.
pub struct PredicateKind {
    name: String,
    params: Vec<(String, ValueKind)>,
    factory: PredicateFactory,
}

impl PredicateKind {
    pub fn new<S, F>(name: S, factory: F) -> Self
    where
        S: Into<String>,
        F: Fn(&BoundParams) -> Result<PredicateHandle, PredicateResolutionError> + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// Declare a parameter. `Float` parameters also accept integer entries.
    pub fn param<S: Into<String>>(mut self, name: S, kind: ValueKind) -> Self {
        self.params.push((name.into(), kind));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, ValueKind)> {
        self.params.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

impl Debug for PredicateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateKind")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn accepts(expected: ValueKind, found: ValueKind) -> bool {
    expected == found || (expected == ValueKind::Float && found == ValueKind::Int)
}

#[derive(Debug, Default)]
pub struct PredicateRegistry {
    kinds: HashMap<String, PredicateKind>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in condition predicates.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(PredicateKind::new(True::KIND, |_| Ok(Rc::new(True))));
        registry.register(BooleanCondition::kind());
        registry.register(LessThan::kind());
        registry
    }

    /// Add a kind, replacing any kind previously registered under the same name.
    pub fn register(&mut self, kind: PredicateKind) -> &mut Self {
        self.kinds.insert(kind.name.clone(), kind);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PredicateKind> {
        self.kinds.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Resolve every declared parameter of `kind` through `inputs` and build a new predicate.
    pub fn instantiate(
        &self,
        kind: &str,
        inputs: &[InputBinding],
        blackboard: &Blackboard,
    ) -> Result<PredicateHandle, PredicateResolutionError> {
        let predicate_kind = self
            .kinds
            .get(kind)
            .ok_or_else(|| PredicateResolutionError::UnknownKind(kind.to_string()))?;

        let mut params = HashMap::new();

        for (name, expected) in predicate_kind.params() {
            let binding = inputs.iter().find(|binding| binding.param == name).ok_or_else(|| {
                PredicateResolutionError::MissingParameter {
                    kind: kind.to_string(),
                    param: name.to_string(),
                }
            })?;

            let param = blackboard
                .get(&binding.entry)
                .ok_or_else(|| PredicateResolutionError::MissingEntry {
                    param: name.to_string(),
                    entry: binding.entry.clone(),
                })?;

            if !accepts(expected, param.kind()) {
                return Err(PredicateResolutionError::TypeMismatch {
                    param: name.to_string(),
                    entry: binding.entry.clone(),
                    expected,
                    found: param.kind(),
                });
            }

            params.insert(name.to_string(), param);
        }

        let bound = BoundParams {
            kind: kind.to_string(),
            params,
        };

        (predicate_kind.factory)(&bound)
    }

    /// Instantiate one predicate per proposition, preserving order.
    pub fn instantiate_all(
        &self,
        propositions: &[PropositionBinding],
        blackboard: &Blackboard,
    ) -> Result<Vec<PredicateHandle>, PredicateResolutionError> {
        propositions
            .iter()
            .map(|proposition| self.instantiate(&proposition.kind, &proposition.inputs, blackboard))
            .collect()
    }
}
