use std::collections::HashSet;

use super::LtlFormula;

impl LtlFormula {
    /// Fischer-Ladner style closure of the formula.
    ///
    /// The closure contains the formula itself and, recursively, the operands of negations,
    /// `X`, conjunctions, disjunctions, `U` and `R`. Entries are unique under printed equality and
    /// appear in pre-order.
    pub fn closure(&self) -> Vec<LtlFormula> {
        fn visit(formula: &LtlFormula, seen: &mut HashSet<String>, closure: &mut Vec<LtlFormula>) {
            if seen.insert(formula.to_string()) {
                closure.push(formula.clone());
            }

            match formula {
                LtlFormula::Negation(inner) | LtlFormula::Next(inner) => {
                    visit(inner, seen, closure)
                }
                LtlFormula::Conjunction(left, right)
                | LtlFormula::Disjunction(left, right)
                | LtlFormula::Until(left, right)
                | LtlFormula::Release(left, right) => {
                    visit(left, seen, closure);
                    visit(right, seen, closure);
                }
                _ => {}
            }
        }

        let mut closure = Vec::new();
        visit(self, &mut HashSet::new(), &mut closure);
        closure
    }

    /// Every `U` subformula, outermost first.
    pub fn until_subformulas(&self) -> Vec<&LtlFormula> {
        let mut untils = Vec::new();

        if let Self::Until(..) = self {
            untils.push(self);
        }

        match self {
            Self::Negation(inner) | Self::Next(inner) => untils.extend(inner.until_subformulas()),
            Self::Conjunction(left, right)
            | Self::Disjunction(left, right)
            | Self::Release(left, right)
            | Self::Until(left, right) => {
                untils.extend(left.until_subformulas());
                untils.extend(right.until_subformulas());
            }
            _ => {}
        }

        untils
    }
}

/// Enumerate the powerset of a set of formulas.
///
/// Subsets are produced by the usual recursive generation, so for `[a, b]` the order is
/// `{}`, `{a}`, `{a, b}`, `{b}`. The output has `2^n` entries; callers are expected to keep the
/// input small.
pub fn all_subsets(formulas: &[LtlFormula]) -> Vec<Vec<LtlFormula>> {
    fn generate(
        formulas: &[LtlFormula],
        current: &mut Vec<LtlFormula>,
        index: usize,
        subsets: &mut Vec<Vec<LtlFormula>>,
    ) {
        subsets.push(current.clone());

        for (i, formula) in formulas.iter().enumerate().skip(index) {
            current.push(formula.clone());
            generate(formulas, current, i + 1, subsets);
            current.pop();
        }
    }

    let mut subsets = Vec::with_capacity(1 << formulas.len().min(16));
    generate(formulas, &mut Vec::new(), 0, &mut subsets);
    subsets
}

#[cfg(test)]
mod tests {
    use super::{all_subsets, LtlFormula};

    fn p(id: &str) -> LtlFormula {
        LtlFormula::atom(id)
    }

    #[test]
    fn closure_contains_formula() {
        let phi = LtlFormula::until(LtlFormula::not(p("a")), LtlFormula::next(p("b")));
        let closure = phi.closure();

        assert_eq!(closure[0], phi);
        assert_eq!(
            closure.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["(!(a)) U (X(b))", "!(a)", "a", "X(b)", "b"]
        );
    }

    #[test]
    fn closure_deduplicates() {
        let phi = LtlFormula::and(p("a"), LtlFormula::or(p("a"), LtlFormula::True));
        let closure = phi.closure();

        assert_eq!(closure.len(), 4);
        assert!(closure.contains(&p("a")));
        assert!(closure.contains(&LtlFormula::True));
    }

    #[test]
    fn closure_of_atom() {
        assert_eq!(p("a").closure(), vec![p("a")]);
    }

    #[test]
    fn untils() {
        let inner = LtlFormula::until(p("b"), p("c"));
        let outer = LtlFormula::until(p("a"), inner.clone());
        let phi = LtlFormula::not(LtlFormula::and(
            outer.clone(),
            LtlFormula::release(p("d"), inner.clone()),
        ));

        assert_eq!(phi.until_subformulas(), vec![&outer, &inner, &inner]);
    }

    #[test]
    fn subsets() {
        let subsets = all_subsets(&[p("a"), p("b"), p("c")]);
        let printed: Vec<Vec<String>> = subsets
            .iter()
            .map(|subset| subset.iter().map(ToString::to_string).collect())
            .collect();

        assert_eq!(subsets.len(), 8);
        assert_eq!(printed[0], Vec::<String>::new());
        assert_eq!(printed[1], vec!["a"]);
        assert_eq!(printed[2], vec!["a", "b"]);
        assert_eq!(printed[3], vec!["a", "b", "c"]);
        assert_eq!(printed[7], vec!["c"]);
    }

    #[test]
    fn subsets_of_empty_set() {
        assert_eq!(all_subsets(&[]), vec![Vec::<LtlFormula>::new()]);
    }
}
