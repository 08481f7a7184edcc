use super::binary::BinaryOperator;
use crate::predicate::Predicate;

/// Material implication, evaluated as `!antecedent | consequent`.
#[derive(Clone, Debug)]
pub struct Implies<A, C>(BinaryOperator<A, C>);

impl<A, C> Implies<A, C> {
    pub fn new(antecedent: A, consequent: C) -> Self {
        Self(BinaryOperator {
            left: antecedent,
            right: consequent,
        })
    }
}

impl<A, C> Predicate for Implies<A, C>
where
    A: Predicate,
    C: Predicate,
{
    fn evaluate_robustness(&self) -> f32 {
        self.0.apply(|ante, cons| f32::max(-ante, cons))
    }

    fn subpredicates(&self) -> Vec<&dyn Predicate> {
        self.0.operands()
    }
}
