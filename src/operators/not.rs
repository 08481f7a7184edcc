use crate::predicate::Predicate;

#[derive(Clone, Debug)]
pub struct Not<P>(P);

impl<P> Not<P> {
    pub fn new(subpredicate: P) -> Self {
        Self(subpredicate)
    }

    pub fn subpredicate(&self) -> &P {
        &self.0
    }
}

impl<P> Predicate for Not<P>
where
    P: Predicate,
{
    fn evaluate_robustness(&self) -> f32 {
        -self.0.evaluate_robustness()
    }

    fn subpredicates(&self) -> Vec<&dyn Predicate> {
        vec![&self.0 as &dyn Predicate]
    }
}
