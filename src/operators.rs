//! Composite predicates used to materialize transition guards.
//!
//! The boolean structure of a guard is evaluated quantitatively: conjunction takes the minimum of
//! its operands, disjunction the maximum, and negation flips the sign of the robustness.

#[cfg(test)]
use crate::predicate::Predicate;

#[cfg(test)]
struct Const(f32);

#[cfg(test)]
impl Predicate for Const {
    fn evaluate_robustness(&self) -> f32 {
        self.0
    }
}

mod and;
mod binary;
mod implies;
mod not;
mod or;
mod truth;

pub use and::And;
pub use implies::Implies;
pub use not::Not;
pub use or::Or;
pub use truth::True;
