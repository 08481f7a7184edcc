//! Built-in leaf predicates reading their inputs from the blackboard.

use std::rc::Rc;

use crate::blackboard::{Param, ValueKind};
use crate::predicate::Predicate;
use crate::registry::PredicateKind;

/// Robustness `1` when the bound flag is set, `-1` otherwise.
#[derive(Clone, Debug)]
pub struct BooleanCondition {
    value: Param,
}

impl BooleanCondition {
    pub const KIND: &'static str = "Conditions/Boolean Condition";

    pub fn new(value: Param) -> Self {
        Self { value }
    }

    /// Registry entry declaring the `Value` parameter.
    pub fn kind() -> PredicateKind {
        PredicateKind::new(Self::KIND, |params| Ok(Rc::new(Self::new(params.get("Value")?))))
            .param("Value", ValueKind::Bool)
    }
}

impl Predicate for BooleanCondition {
    fn evaluate_robustness(&self) -> f32 {
        match self.value.as_bool() {
            Some(true) => 1.0,
            _ => -1.0,
        }
    }
}

/// Satisfied while `A < B`, with robustness `B - A`.
#[derive(Clone, Debug)]
pub struct LessThan {
    a: Param,
    b: Param,
}

impl LessThan {
    pub const KIND: &'static str = "Conditions/Less Than";

    pub fn new(a: Param, b: Param) -> Self {
        Self { a, b }
    }

    pub fn kind() -> PredicateKind {
        PredicateKind::new(Self::KIND, |params| {
            Ok(Rc::new(Self::new(params.get("A")?, params.get("B")?)))
        })
        .param("A", ValueKind::Float)
        .param("B", ValueKind::Float)
    }
}

impl Predicate for LessThan {
    fn evaluate_robustness(&self) -> f32 {
        let a = self.a.as_float().unwrap_or(f32::NAN);
        let b = self.b.as_float().unwrap_or(f32::NAN);

        b - a
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{BooleanCondition, LessThan};
    use crate::blackboard::{Blackboard, BlackboardError};
    use crate::predicate::Predicate;

    #[test]
    fn boolean_condition() -> Result<(), BlackboardError> {
        let mut blackboard = Blackboard::new();
        let flag = blackboard.set("door_open", false)?;
        let condition = BooleanCondition::new(flag.clone());

        assert_eq!(condition.evaluate_robustness(), -1.0);

        flag.set(true)?;
        assert_eq!(condition.evaluate_robustness(), 1.0);

        Ok(())
    }

    #[test]
    fn less_than() -> Result<(), BlackboardError> {
        let mut blackboard = Blackboard::new();
        let a = blackboard.set("a", 0.25f32)?;
        let b = blackboard.set("b", 1i64)?;
        let condition = LessThan::new(a.clone(), b);

        assert_relative_eq!(condition.evaluate_robustness(), 0.75);

        a.set(3.0f32)?;
        assert_relative_eq!(condition.evaluate_robustness(), -2.0);

        Ok(())
    }
}
