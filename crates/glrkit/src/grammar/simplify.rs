//! Grammar cleanup passes.
//!
//! [`Grammar::simplify`] removes rules that can never take part in a
//! derivation of a terminal string from the initial symbol.
//! [`Grammar::minimize`] folds structurally equivalent nonterminals together.

use crate::grammar::{Grammar, GrammarError, NonTerminal, SentenceForm, Symbol, Terminal};
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;

type Set<T> = HashSet<T, ahash::RandomState>;
type Map<K, V> = HashMap<K, V, ahash::RandomState>;

impl Grammar {
    /// Remove self-recursive unit rules (`A -> A`), nonterminals that derive
    /// no finite terminal string together with every rule mentioning them,
    /// and nonterminals unreachable from the initial symbol.
    ///
    /// Nonterminals used but never defined count as unproductive, so rules
    /// mentioning them disappear as well.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::EmptyLanguage`] if the initial symbol has no
    /// rules left.
    pub fn simplify(&mut self) -> Result<(), GrammarError> {
        self.simplify_with(|_| false)
    }

    /// Like [`simplify`](Self::simplify), but undefined non-temporary
    /// nonterminals are assumed to be defined elsewhere and productive.
    pub(crate) fn simplify_open(&mut self) -> Result<(), GrammarError> {
        self.simplify_with(|nt| !nt.is_temporary())
    }

    fn simplify_with(&mut self, external: impl Fn(&NonTerminal) -> bool) -> Result<(), GrammarError> {
        self.retain_rules(|lhs, rhs| !is_self_unit(lhs, rhs));

        let mut productive = self.productive(&external);
        let defined: Set<NonTerminal> = productive.clone();
        productive.extend(self.undefined_nonterminals().into_iter().filter(|nt| external(nt)));
        self.retain_rules(|lhs, rhs| {
            defined.contains(lhs) && rhs.nonterminals().all(|nt| productive.contains(nt))
        });

        if !self.is_defined(self.initial()) {
            return Err(GrammarError::EmptyLanguage(self.initial().clone()));
        }

        let reachable = self.reachable();
        self.retain_rules(|lhs, _| reachable.contains(lhs));
        Ok(())
    }

    fn productive(&self, external: &impl Fn(&NonTerminal) -> bool) -> Set<NonTerminal> {
        let mut productive: Set<NonTerminal> = Set::default();
        let mut changed = true;
        while changed {
            changed = false;
            for (lhs, rhs) in self.rules() {
                if productive.contains(lhs) {
                    continue;
                }
                let derives = rhs.nonterminals().all(|nt| {
                    productive.contains(nt) || (!self.is_defined(nt) && external(nt))
                });
                if derives {
                    productive.insert(lhs.clone());
                    changed = true;
                }
            }
        }
        productive
    }

    fn reachable(&self) -> Set<NonTerminal> {
        let mut reachable: Set<NonTerminal> = Set::default();
        let mut queue = VecDeque::new();
        reachable.insert(self.initial().clone());
        queue.push_back(self.initial().clone());
        while let Some(nt) = queue.pop_front() {
            for rhs in self.alternatives(&nt) {
                for next in rhs.nonterminals() {
                    if reachable.insert(next.clone()) {
                        queue.push_back(next.clone());
                    }
                }
            }
        }
        reachable
    }

    /// Merge nonterminals whose rule sets coincide up to a consistent renaming
    /// of nonterminals.
    ///
    /// Only temporary nonterminals are folded away. Each equivalence class
    /// keeps its first non-temporary member (or, failing that, its first
    /// member) as representative; other non-temporary members stay as they
    /// are, since their names are visible in syntax trees.
    ///
    /// Returns the number of nonterminals removed.
    pub fn minimize(&mut self) -> usize {
        let classes = self.equivalence_classes();

        let mut rename: Map<NonTerminal, NonTerminal> = Map::default();
        for class in classes {
            if class.len() < 2 {
                continue;
            }
            let representative = class
                .iter()
                .find(|nt| *nt == self.initial())
                .or_else(|| class.iter().find(|nt| !nt.is_temporary()))
                .unwrap_or(&class[0])
                .clone();
            for member in class {
                if member != representative && member.is_temporary() {
                    rename.insert(member, representative.clone());
                }
            }
        }

        for folded in rename.keys() {
            self.remove_nonterminal(folded);
        }
        self.rename_symbols(&rename);
        self.retain_rules(|lhs, rhs| !is_self_unit(lhs, rhs));
        rename.len()
    }

    /// Coarsest partition of the defined nonterminals such that members of a
    /// block have the same rule set once every nonterminal is replaced by its
    /// block. Classes and their members follow insertion order.
    fn equivalence_classes(&self) -> Vec<Vec<NonTerminal>> {
        let nonterminals: Vec<&NonTerminal> = self.nonterminals().collect();
        let mut block: Map<&NonTerminal, usize> =
            nonterminals.iter().map(|nt| (*nt, 0)).collect();
        let mut block_count = 1;

        loop {
            let mut ids: Map<(usize, Vec<Vec<ShapeSymbol>>), usize> = Map::default();
            let mut next: Map<&NonTerminal, usize> = Map::default();
            for nt in &nonterminals {
                let key = (block[*nt], self.shape(nt, &block));
                let fresh = ids.len();
                let id = *ids.entry(key).or_insert(fresh);
                next.insert(*nt, id);
            }
            block = next;
            if ids.len() == block_count {
                break;
            }
            block_count = ids.len();
        }

        let mut classes: Vec<Vec<NonTerminal>> = vec![Vec::new(); block_count];
        let mut class_order = Vec::new();
        for nt in nonterminals {
            let id = block[nt];
            if classes[id].is_empty() {
                class_order.push(id);
            }
            classes[id].push(nt.clone());
        }
        class_order
            .into_iter()
            .map(|id| std::mem::take(&mut classes[id]))
            .collect()
    }

    /// Rule set of `nt` with nonterminals replaced by block ids, sorted.
    fn shape(&self, nt: &NonTerminal, block: &Map<&NonTerminal, usize>) -> Vec<Vec<ShapeSymbol>> {
        let mut shape: Vec<Vec<ShapeSymbol>> = self
            .alternatives(nt)
            .iter()
            .map(|rhs| {
                rhs.iter()
                    .map(|symbol| match symbol {
                        Symbol::Terminal(t) => ShapeSymbol::Terminal(t.clone()),
                        Symbol::NonTerminal(n) => match block.get(n) {
                            Some(id) => ShapeSymbol::Block(*id),
                            None => ShapeSymbol::External(n.clone()),
                        },
                    })
                    .collect()
            })
            .collect();
        shape.sort();
        shape.dedup();
        shape
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum ShapeSymbol {
    Terminal(Terminal),
    Block(usize),
    External(NonTerminal),
}

fn is_self_unit(lhs: &NonTerminal, rhs: &SentenceForm) -> bool {
    matches!(rhs.symbols(), [Symbol::NonTerminal(nt)] if nt == lhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence;

    fn nt(name: &str) -> NonTerminal {
        NonTerminal::new(name)
    }

    #[test]
    fn test_removes_self_unit_rules() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_alternatives(nt("S"), [sentence![S], sentence!['a']]);
        grammar.simplify().unwrap();
        assert_eq!(grammar.alternatives(&nt("S")), [sentence!['a']]);
    }

    #[test]
    fn test_removes_unproductive_and_unreachable() {
        // S -> a | L ; L -> L x (never terminates) ; U -> u (unreachable)
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_alternatives(nt("S"), [sentence!['a'], sentence![L]]);
        grammar.add_rule(nt("L"), sentence![L, 'x']);
        grammar.add_rule(nt("U"), sentence!['u']);
        grammar.simplify().unwrap();

        assert_eq!(grammar.to_string(), "S -> a\n");
    }

    #[test]
    fn test_undefined_nonterminal_is_unproductive() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_alternatives(nt("S"), [sentence![Missing], sentence!['a']]);
        grammar.simplify().unwrap();
        assert_eq!(grammar.rule_count(), 1);
    }

    #[test]
    fn test_empty_language() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(nt("S"), sentence!['a', S]);
        assert!(matches!(
            grammar.simplify(),
            Err(GrammarError::EmptyLanguage(n)) if n == nt("S")
        ));
    }

    #[test]
    fn test_minimize_folds_temporaries_only() {
        let t1 = NonTerminal::temporary("T");
        let t2 = NonTerminal::temporary("T");
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(
            nt("S"),
            SentenceForm::new([
                Symbol::NonTerminal(t1.clone()),
                Symbol::NonTerminal(t2.clone()),
                Symbol::NonTerminal(nt("A")),
                Symbol::NonTerminal(nt("B")),
            ]),
        );
        grammar.add_alternatives(t1.clone(), [sentence!['x'], sentence!['y']]);
        grammar.add_alternatives(t2.clone(), [sentence!['y'], sentence!['x']]);
        grammar.add_rule(nt("A"), sentence!['z']);
        grammar.add_rule(nt("B"), sentence!['z']);

        assert_eq!(grammar.minimize(), 1);
        assert!(grammar.is_defined(&t1));
        assert!(!grammar.is_defined(&t2));
        // distinct named nonterminals survive even though equivalent
        assert!(grammar.is_defined(&nt("A")));
        assert!(grammar.is_defined(&nt("B")));
        assert_eq!(
            grammar.alternatives(&nt("S"))[0].symbols()[1],
            Symbol::NonTerminal(t1)
        );
    }

    #[test]
    fn test_minimize_prefers_named_representative() {
        let t = NonTerminal::temporary("T");
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(
            nt("S"),
            SentenceForm::new([Symbol::NonTerminal(t.clone()), Symbol::NonTerminal(nt("A"))]),
        );
        grammar.add_rule(t.clone(), sentence!['a']);
        grammar.add_rule(nt("A"), sentence!['a']);

        assert_eq!(grammar.minimize(), 1);
        assert_eq!(grammar.alternatives(&nt("S")), [sentence![A, A]]);
    }

    #[test]
    fn test_minimize_respects_recursive_structure() {
        // T1 -> a T1 | b and T2 -> a T2 | b are equivalent; T3 -> a T3 | c is not
        let [t1, t2, t3] = [(); 3].map(|()| NonTerminal::temporary("T"));
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(
            nt("S"),
            SentenceForm::new([t1.clone(), t2.clone(), t3.clone()].map(Symbol::NonTerminal)),
        );
        for (t, last) in [(&t1, "b"), (&t2, "b"), (&t3, "c")] {
            grammar.add_alternatives(
                t.clone(),
                [
                    SentenceForm::new([Symbol::Terminal(Terminal::kind("a")), Symbol::NonTerminal(t.clone())]),
                    SentenceForm::terminal(Terminal::kind(last)),
                ],
            );
        }
        assert_eq!(grammar.minimize(), 1);
        assert!(grammar.is_defined(&t3));
        assert!(!grammar.is_defined(&t2));
    }
}
