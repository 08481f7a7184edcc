use crate::predicate::Predicate;

/// Operands of a binary predicate operator.
#[derive(Clone, Debug)]
pub struct BinaryOperator<L, R> {
    pub left: L,
    pub right: R,
}

impl<L, R> BinaryOperator<L, R>
where
    L: Predicate,
    R: Predicate,
{
    /// Evaluate both operands and combine their robustness values.
    pub fn apply<F>(&self, combine: F) -> f32
    where
        F: Fn(f32, f32) -> f32,
    {
        let left = self.left.evaluate_robustness();
        let right = self.right.evaluate_robustness();

        combine(left, right)
    }

    pub fn operands(&self) -> Vec<&dyn Predicate> {
        vec![&self.left as &dyn Predicate, &self.right]
    }
}
