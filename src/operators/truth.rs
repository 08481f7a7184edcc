use crate::predicate::Predicate;

/// Predicate that always holds with unit robustness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct True;

impl True {
    /// Registry name of the constant predicate.
    pub const KIND: &'static str = "Conditions/True";
}

impl Predicate for True {
    fn evaluate_robustness(&self) -> f32 {
        1.0
    }
}
