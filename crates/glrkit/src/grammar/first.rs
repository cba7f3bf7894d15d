//! FIRST-set analysis.

use crate::grammar::{Grammar, GrammarError, NonTerminal, Symbol, Terminal};
use hashbrown::{HashMap, HashSet};
use std::collections::BTreeSet;

/// Terminals that can begin a derivation, plus whether the empty string can
/// be derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: BTreeSet<Terminal>,
    pub nullable: bool,
}

impl FirstSet {
    #[must_use]
    pub fn contains(&self, terminal: &Terminal) -> bool {
        self.terminals.contains(terminal)
    }
}

/// FIRST sets of every nonterminal of a grammar.
#[derive(Debug, Clone)]
pub struct FirstSets {
    emptiable: HashSet<NonTerminal, ahash::RandomState>,
    first: HashMap<NonTerminal, FirstSet, ahash::RandomState>,
}

impl FirstSets {
    /// Analyse `grammar`.
    ///
    /// # Errors
    ///
    /// - [`GrammarError::UndefinedNonTerminal`] if a right-hand side names a
    ///   nonterminal without rules.
    /// - [`GrammarError::UnresolvableRecursion`] if some nonterminal depends
    ///   only on itself and can neither start with a terminal nor derive ε.
    pub fn compute(grammar: &Grammar) -> Result<Self, GrammarError> {
        if let Some(undefined) = grammar.undefined_nonterminals().into_iter().next() {
            return Err(GrammarError::UndefinedNonTerminal(undefined));
        }

        let emptiable = emptiable_nonterminals(grammar);
        let mut first: HashMap<NonTerminal, FirstSet, ahash::RandomState> = grammar
            .nonterminals()
            .map(|nt| {
                let set = FirstSet {
                    terminals: BTreeSet::new(),
                    nullable: emptiable.contains(nt),
                };
                (nt.clone(), set)
            })
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for (lhs, rhs) in grammar.rules() {
                let mut gained = Vec::new();
                for symbol in rhs {
                    match symbol {
                        Symbol::Terminal(t) => {
                            gained.push(t.clone());
                            break;
                        }
                        Symbol::NonTerminal(nt) => {
                            if let Some(set) = first.get(nt) {
                                gained.extend(set.terminals.iter().cloned());
                            }
                            if !emptiable.contains(nt) {
                                break;
                            }
                        }
                    }
                }
                if let Some(set) = first.get_mut(lhs) {
                    for terminal in gained {
                        changed |= set.terminals.insert(terminal);
                    }
                }
            }
        }

        for nt in grammar.nonterminals() {
            if let Some(set) = first.get(nt)
                && set.terminals.is_empty()
                && !set.nullable
            {
                return Err(GrammarError::UnresolvableRecursion(nt.clone()));
            }
        }

        Ok(Self { emptiable, first })
    }

    #[must_use]
    pub fn of(&self, nonterminal: &NonTerminal) -> Option<&FirstSet> {
        self.first.get(nonterminal)
    }

    /// Whether `nonterminal` derives the empty string.
    #[must_use]
    pub fn is_emptiable(&self, nonterminal: &NonTerminal) -> bool {
        self.emptiable.contains(nonterminal)
    }

    /// FIRST of a symbol sequence.
    #[must_use]
    pub fn first_of(&self, symbols: &[Symbol]) -> FirstSet {
        let mut result = FirstSet::default();
        for symbol in symbols {
            match symbol {
                Symbol::Terminal(t) => {
                    result.terminals.insert(t.clone());
                    return result;
                }
                Symbol::NonTerminal(nt) => {
                    if let Some(set) = self.first.get(nt) {
                        result.terminals.extend(set.terminals.iter().cloned());
                    }
                    if !self.is_emptiable(nt) {
                        return result;
                    }
                }
            }
        }
        result.nullable = true;
        result
    }

    /// FIRST(`symbols` `lookahead`): the terminals that can follow the marker
    /// of an LR(1) item.
    #[must_use]
    pub fn first_with_lookahead(&self, symbols: &[Symbol], lookahead: &Terminal) -> BTreeSet<Terminal> {
        let FirstSet {
            mut terminals,
            nullable,
        } = self.first_of(symbols);
        if nullable {
            terminals.insert(lookahead.clone());
        }
        terminals
    }
}

/// Fixed point: seeded by nonterminals with an ε rule, grown through rules
/// whose right-hand side consists of emptiable nonterminals only.
fn emptiable_nonterminals(grammar: &Grammar) -> HashSet<NonTerminal, ahash::RandomState> {
    let mut emptiable = HashSet::with_hasher(ahash::RandomState::new());
    let mut changed = true;
    while changed {
        changed = false;
        for (lhs, rhs) in grammar.rules() {
            if emptiable.contains(lhs) {
                continue;
            }
            let empty = rhs.iter().all(|symbol| match symbol {
                Symbol::Terminal(_) => false,
                Symbol::NonTerminal(nt) => emptiable.contains(nt),
            });
            if empty {
                emptiable.insert(lhs.clone());
                changed = true;
            }
        }
    }
    emptiable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence;

    fn nt(name: &str) -> NonTerminal {
        NonTerminal::new(name)
    }

    fn kinds(set: &FirstSet) -> Vec<String> {
        set.terminals.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_first_through_emptiable_prefix() {
        // S -> A B c ; A -> a | ε ; B -> b | ε
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(nt("S"), sentence![A, B, 'c']);
        grammar.add_alternatives(nt("A"), [sentence!['a'], sentence![]]);
        grammar.add_alternatives(nt("B"), [sentence!['b'], sentence![]]);

        let first = FirstSets::compute(&grammar).unwrap();
        assert_eq!(kinds(first.of(&nt("S")).unwrap()), ["a", "b", "c"]);
        assert!(!first.of(&nt("S")).unwrap().nullable);
        assert!(first.is_emptiable(&nt("A")));
        assert!(first.of(&nt("B")).unwrap().nullable);
    }

    #[test]
    fn test_left_recursion_resolves() {
        // E -> E + n | n
        let mut grammar = Grammar::new(nt("E"));
        grammar.add_alternatives(nt("E"), [sentence![E, '+', 'n'], sentence!['n']]);
        let first = FirstSets::compute(&grammar).unwrap();
        assert_eq!(kinds(first.of(&nt("E")).unwrap()), ["n"]);
    }

    #[test]
    fn test_unresolvable_recursion() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_alternatives(nt("S"), [sentence![L], sentence!['s']]);
        grammar.add_rule(nt("L"), sentence![L, 'x']);
        assert!(matches!(
            FirstSets::compute(&grammar),
            Err(GrammarError::UnresolvableRecursion(n)) if n == nt("L")
        ));
    }

    #[test]
    fn test_undefined_nonterminal() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(nt("S"), sentence![Nope]);
        assert!(matches!(
            FirstSets::compute(&grammar),
            Err(GrammarError::UndefinedNonTerminal(n)) if n == nt("Nope")
        ));
    }

    #[test]
    fn test_first_with_lookahead() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_alternatives(nt("A"), [sentence!['a'], sentence![]]);
        grammar.add_rule(nt("S"), sentence![A]);
        let first = FirstSets::compute(&grammar).unwrap();

        let la = first.first_with_lookahead(sentence![A].symbols(), &Terminal::Terminator);
        assert!(la.contains(&Terminal::kind("a")));
        assert!(la.contains(&Terminal::Terminator));

        let la = first.first_with_lookahead(sentence![A, 'b'].symbols(), &Terminal::Terminator);
        assert!(!la.contains(&Terminal::Terminator));
        assert!(la.contains(&Terminal::kind("b")));
    }
}
