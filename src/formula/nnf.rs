use super::LtlFormula;

impl LtlFormula {
    /// Rewrite the formula into negation normal form.
    ///
    /// Negations are pushed down until they sit directly above atomic propositions, and the
    /// derived operators are eliminated: `G(x)` becomes `(F) R (x)` and `F(x)` becomes `(T) U (x)`.
    pub fn to_nnf(&self) -> LtlFormula {
        match self {
            Self::True | Self::False | Self::AtomicProposition(_) => self.clone(),
            Self::Negation(inner) => negate(inner),
            Self::Conjunction(left, right) => Self::and(left.to_nnf(), right.to_nnf()),
            Self::Disjunction(left, right) => Self::or(left.to_nnf(), right.to_nnf()),
            Self::Next(inner) => Self::next(inner.to_nnf()),
            Self::Until(left, right) => Self::until(left.to_nnf(), right.to_nnf()),
            Self::Release(left, right) => Self::release(left.to_nnf(), right.to_nnf()),
            Self::Globally(inner) => Self::release(Self::False, inner.to_nnf()),
            Self::Eventually(inner) => Self::until(Self::True, inner.to_nnf()),
        }
    }

    /// Check whether every negation in the formula is applied to an atomic proposition and no
    /// `G`/`F` operators remain.
    pub fn is_nnf(&self) -> bool {
        match self {
            Self::Negation(inner) => inner.is_atomic(),
            Self::Globally(_) | Self::Eventually(_) => false,
            _ => self.children().into_iter().all(LtlFormula::is_nnf),
        }
    }
}

/// Negation normal form of `!inner`.
fn negate(inner: &LtlFormula) -> LtlFormula {
    use LtlFormula::*;

    match inner {
        True => False,
        False => True,
        AtomicProposition(_) => LtlFormula::not(inner.clone()),
        Negation(x) => x.to_nnf(),
        // G and F have to be eliminated before the negation can be pushed through them.
        Globally(_) | Eventually(_) => negate(&inner.to_nnf()),
        Conjunction(a, b) => LtlFormula::or(negate(&a.to_nnf()), negate(&b.to_nnf())),
        Disjunction(a, b) => LtlFormula::and(negate(&a.to_nnf()), negate(&b.to_nnf())),
        Until(a, b) => {
            LtlFormula::release(LtlFormula::not(*a.clone()), LtlFormula::not(*b.clone())).to_nnf()
        }
        Release(a, b) => {
            LtlFormula::until(LtlFormula::not(*a.clone()), LtlFormula::not(*b.clone())).to_nnf()
        }
        Next(x) => LtlFormula::next(negate(x)),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::LtlFormula;

    fn p(id: &str) -> LtlFormula {
        LtlFormula::atom(id)
    }

    #[test]
    fn constants() {
        assert_eq!(LtlFormula::not(LtlFormula::True).to_nnf(), LtlFormula::False);
        assert_eq!(LtlFormula::not(LtlFormula::False).to_nnf(), LtlFormula::True);
        assert_eq!(LtlFormula::True.to_nnf(), LtlFormula::True);
    }

    #[test]
    fn negated_atom_is_unchanged() {
        let phi = LtlFormula::not(p("p0"));
        assert_eq!(phi.to_nnf().to_string(), "!(p0)");
    }

    #[test]
    fn double_negation() {
        let phi = LtlFormula::not(LtlFormula::not(LtlFormula::globally(p("p0"))));
        assert_eq!(phi.to_nnf().to_string(), "(F) R (p0)");
    }

    #[test]
    fn derived_operators() {
        assert_eq!(LtlFormula::globally(p("a")).to_nnf().to_string(), "(F) R (a)");
        assert_eq!(LtlFormula::eventually(p("a")).to_nnf().to_string(), "(T) U (a)");
    }

    #[test]
    fn negated_globally() {
        let phi = LtlFormula::not(LtlFormula::globally(p("a")));
        assert_eq!(phi.to_nnf().to_string(), "(T) U (!(a))");
    }

    #[test]
    fn de_morgan() {
        let conj = LtlFormula::not(LtlFormula::and(p("a"), p("b")));
        let disj = LtlFormula::not(LtlFormula::or(p("a"), p("b")));

        assert_eq!(conj.to_nnf().to_string(), "(!(a)) | (!(b))");
        assert_eq!(disj.to_nnf().to_string(), "(!(a)) & (!(b))");
    }

    #[test]
    fn de_morgan_pushes_into_operands() {
        let phi = LtlFormula::not(LtlFormula::and(LtlFormula::globally(p("a")), p("b")));
        assert_eq!(phi.to_nnf().to_string(), "((T) U (!(a))) | (!(b))");
    }

    #[test]
    fn until_release_duality() {
        let until = LtlFormula::not(LtlFormula::until(p("a"), p("b")));
        let release = LtlFormula::not(LtlFormula::release(p("a"), p("b")));

        assert_eq!(until.to_nnf().to_string(), "(!(a)) R (!(b))");
        assert_eq!(release.to_nnf().to_string(), "(!(a)) U (!(b))");
    }

    #[test]
    fn negated_next() {
        let phi = LtlFormula::not(LtlFormula::next(LtlFormula::not(p("a"))));
        assert_eq!(phi.to_nnf().to_string(), "X(a)");
    }

    #[test]
    fn behavior_formula() {
        // G(p0 -> F p1)
        let phi =
            LtlFormula::globally(LtlFormula::implies(p("p0"), LtlFormula::eventually(p("p1"))));
        let nnf = phi.to_nnf();

        assert_eq!(nnf.to_string(), "(F) R ((!(p0)) | ((T) U (p1)))");
        assert!(nnf.is_nnf());
        assert!(!phi.is_nnf());
    }

    fn arb_formula() -> impl Strategy<Value = LtlFormula> {
        let leaf = prop_oneof![
            Just(LtlFormula::True),
            Just(LtlFormula::False),
            (0u8..4).prop_map(|i| LtlFormula::atom(format!("p{}", i))),
        ];

        leaf.prop_recursive(5, 48, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(LtlFormula::not),
                inner.clone().prop_map(LtlFormula::next),
                inner.clone().prop_map(LtlFormula::globally),
                inner.clone().prop_map(LtlFormula::eventually),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| LtlFormula::and(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| LtlFormula::or(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| LtlFormula::until(a, b)),
                (inner.clone(), inner).prop_map(|(a, b)| LtlFormula::release(a, b)),
            ]
        })
    }

    proptest! {
        #[test]
        fn nnf_is_idempotent(phi in arb_formula()) {
            let once = phi.to_nnf();
            let twice = once.to_nnf();

            prop_assert_eq!(once.to_string(), twice.to_string());
        }

        #[test]
        fn nnf_has_only_atomic_negations(phi in arb_formula()) {
            prop_assert!(phi.to_nnf().is_nnf());
        }

        #[test]
        fn nnf_keeps_atomic_propositions(phi in arb_formula()) {
            let nnf = phi.to_nnf();

            for id in nnf.atomic_propositions() {
                prop_assert!(phi.atomic_propositions().contains(&id));
            }
        }
    }
}
