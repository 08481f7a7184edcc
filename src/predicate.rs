//! The capability every atomic proposition and guard operator resolves to at runtime.
//!
//! A [`Predicate`] produces a robustness value each time it is evaluated. By convention a
//! robustness `>= 0` means the predicate is satisfied, `< 0` means it is violated, and the
//! magnitude is the degree of satisfaction or violation. The reward automaton never knows the
//! concrete type of a predicate, it only evaluates and resets them.
//!
//! Predicates are shared: every guard that references the same atomic proposition holds a clone of
//! the same [`PredicateHandle`]. Shared handles are identified by the address of their allocation,
//! see [`Predicate::identity`] and [`reachable_predicates`]. Operands stored inline in a composite
//! have no identity and are visited every time their parent is.

use std::collections::HashSet;
use std::rc::Rc;

/// A real-valued satisfaction measure over the current state of the host system.
pub trait Predicate {
    /// Compute the robustness of the predicate for the current state.
    fn evaluate_robustness(&self) -> f32;

    /// Clear any state accumulated across evaluations. Bound parameters are left untouched.
    fn reset(&self) {}

    /// Predicates this one is composed of, if any.
    fn subpredicates(&self) -> Vec<&dyn Predicate> {
        Vec::new()
    }

    /// Address of the shared allocation holding this predicate, if it lives behind an `Rc`.
    ///
    /// Two clones of the same handle share an identity. A predicate owned by value has none: its
    /// address may coincide with that of the composite it is stored in.
    fn identity(&self) -> Option<*const ()> {
        None
    }
}

pub type PredicateHandle = Rc<dyn Predicate>;

impl<T> Predicate for &T
where
    T: Predicate + ?Sized,
{
    fn evaluate_robustness(&self) -> f32 {
        (**self).evaluate_robustness()
    }

    fn reset(&self) {
        (**self).reset()
    }

    fn subpredicates(&self) -> Vec<&dyn Predicate> {
        (**self).subpredicates()
    }

    fn identity(&self) -> Option<*const ()> {
        (**self).identity()
    }
}

impl<T> Predicate for Box<T>
where
    T: Predicate + ?Sized,
{
    fn evaluate_robustness(&self) -> f32 {
        (**self).evaluate_robustness()
    }

    fn reset(&self) {
        (**self).reset()
    }

    fn subpredicates(&self) -> Vec<&dyn Predicate> {
        (**self).subpredicates()
    }

    fn identity(&self) -> Option<*const ()> {
        (**self).identity()
    }
}

impl<T> Predicate for Rc<T>
where
    T: Predicate + ?Sized,
{
    fn evaluate_robustness(&self) -> f32 {
        (**self).evaluate_robustness()
    }

    fn reset(&self) {
        (**self).reset()
    }

    fn subpredicates(&self) -> Vec<&dyn Predicate> {
        (**self).subpredicates()
    }

    fn identity(&self) -> Option<*const ()> {
        Some(Rc::as_ptr(self) as *const ())
    }
}

/// Visit every predicate reachable from `roots` in depth-first order.
///
/// A shared handle is visited once however many paths lead to it. Predicates without an identity
/// are visited along every path.
pub fn visit_predicates<'a, I, F>(roots: I, mut visit: F)
where
    I: IntoIterator<Item = &'a dyn Predicate>,
    F: FnMut(&dyn Predicate),
{
    let mut seen = HashSet::new();
    let mut stack: Vec<&dyn Predicate> = roots.into_iter().collect();
    stack.reverse();

    while let Some(predicate) = stack.pop() {
        if let Some(identity) = predicate.identity() {
            if !seen.insert(identity) {
                continue;
            }
        }

        visit(predicate);

        let mut children = predicate.subpredicates();
        children.reverse();
        stack.extend(children);
    }
}

/// Number of predicates reachable from `roots`, counting each shared handle once.
pub fn reachable_predicates<'a, I>(roots: I) -> usize
where
    I: IntoIterator<Item = &'a dyn Predicate>,
{
    let mut count = 0;
    visit_predicates(roots, |_| count += 1);
    count
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;

    use super::Predicate;

    /// Predicate with a settable robustness that counts how often it was reset.
    #[derive(Debug, Default)]
    pub struct Probe {
        pub robustness: Cell<f32>,
        pub resets: Cell<usize>,
    }

    impl Probe {
        pub fn new(robustness: f32) -> Self {
            Self {
                robustness: Cell::new(robustness),
                resets: Cell::new(0),
            }
        }

        pub fn set(&self, robustness: f32) {
            self.robustness.set(robustness)
        }
    }

    impl Predicate for Probe {
        fn evaluate_robustness(&self) -> f32 {
            self.robustness.get()
        }

        fn reset(&self) {
            self.resets.set(self.resets.get() + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::testing::Probe;
    use super::{reachable_predicates, visit_predicates, Predicate, PredicateHandle};
    use crate::operators::{And, Not};

    #[test]
    fn handles_share_identity() {
        let probe: PredicateHandle = Rc::new(Probe::new(1.0));
        let other = Rc::clone(&probe);

        assert!(probe.identity().is_some());
        assert_eq!(probe.identity(), other.identity());
        assert_eq!(Probe::new(1.0).identity(), None);
    }

    #[test]
    fn inline_operands_are_reset() {
        let not = Not::new(Probe::new(0.5));
        let and = And::new(Probe::new(0.5), Probe::new(-0.5));

        let mut visited = 0;
        visit_predicates([&not as &dyn Predicate, &and], |predicate| {
            predicate.reset();
            visited += 1;
        });

        assert_eq!(visited, 5);
        assert_eq!(not.subpredicate().resets.get(), 1);
        assert_eq!(and.left().resets.get(), 1);
        assert_eq!(and.right().resets.get(), 1);
    }

    #[test]
    fn inline_operands_behind_a_handle_are_reset() {
        let shared = Rc::new(Not::new(Probe::new(1.0)));
        let handle: PredicateHandle = shared.clone();
        let roots = [&handle as &dyn Predicate, &handle];

        assert_eq!(reachable_predicates(roots), 2);

        visit_predicates(roots, |predicate| predicate.reset());
        assert_eq!(shared.subpredicate().resets.get(), 1);
    }

    #[test]
    fn shared_predicates_are_visited_once() {
        let probe = Rc::new(Probe::new(0.5));
        let shared: PredicateHandle = probe.clone();
        let left: PredicateHandle = Rc::new(Not::new(shared.clone()));
        let right: PredicateHandle = Rc::new(And::new(shared.clone(), left.clone()));
        let roots: Vec<&dyn Predicate> = vec![&left as &dyn Predicate, &right, &shared];

        let mut visited = 0;
        visit_predicates(roots.clone(), |predicate| {
            predicate.reset();
            visited += 1;
        });

        assert_eq!(visited, 3);
        assert_eq!(reachable_predicates(roots), 3);
        assert_eq!(probe.resets.get(), 1);
    }
}
