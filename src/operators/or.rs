use super::binary::BinaryOperator;
use crate::predicate::Predicate;

#[derive(Clone, Debug)]
pub struct Or<L, R>(BinaryOperator<L, R>);

impl<L, R> Or<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self(BinaryOperator { left, right })
    }

    pub fn left(&self) -> &L {
        &self.0.left
    }

    pub fn right(&self) -> &R {
        &self.0.right
    }
}

impl<L, R> Predicate for Or<L, R>
where
    L: Predicate,
    R: Predicate,
{
    fn evaluate_robustness(&self) -> f32 {
        self.0.apply(f32::max)
    }

    fn subpredicates(&self) -> Vec<&dyn Predicate> {
        self.0.operands()
    }
}
