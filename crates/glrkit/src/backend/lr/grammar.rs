use crate::backend::{RuleShape, SymbolTable};
use crate::grammar::{FirstSets, Grammar, GrammarError, NonTerminal, Symbol, Terminal};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::fmt;

/// Index of [`Terminal::Terminator`] in every symbol table.
pub const TERMINATOR: u32 = 0;
/// Index of the augmented start nonterminal `S'`.
pub const AUGMENTED_START: u32 = 0;
/// Index of the augmented rule `S' -> S`.
pub const AUGMENTED_RULE: u32 = 0;

/// A grammar symbol by table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolRef {
    Terminal(u32),
    NonTerminal(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRule {
    pub lhs: u32,
    pub rhs: Vec<SymbolRef>,
}

/// A grammar augmented with `S' -> S` and flattened to indices, with FIRST
/// sets precomputed per nonterminal.
///
/// Terminal 0 is the terminator, nonterminal 0 the augmented start symbol
/// and rule 0 the augmented rule. The remaining symbols and rules follow the
/// grammar's insertion order.
#[derive(Debug, Clone)]
pub struct IndexedGrammar {
    terminals: Vec<Terminal>,
    nonterminals: Vec<NonTerminal>,
    rules: Vec<IndexedRule>,
    rules_by_lhs: Vec<Vec<u32>>,
    first: Vec<Vec<u32>>,
    nullable: Vec<bool>,
}

impl IndexedGrammar {
    /// Index `grammar`, which should already be simplified.
    ///
    /// # Errors
    ///
    /// Propagates FIRST-set analysis errors: undefined nonterminals and
    /// unresolvable recursion.
    pub fn new(grammar: &Grammar) -> Result<Self, GrammarError> {
        let first_sets = FirstSets::compute(grammar)?;
        if !grammar.is_defined(grammar.initial()) {
            return Err(GrammarError::EmptyLanguage(grammar.initial().clone()));
        }

        let augmented = NonTerminal::try_temporary(format!("{}'", grammar.initial().name()))?;
        let mut terminals = vec![Terminal::Terminator];
        terminals.extend(grammar.terminals());
        let mut nonterminals = vec![augmented];
        nonterminals.extend(grammar.nonterminals().cloned());

        let terminal_ids: HashMap<Terminal, u32, ahash::RandomState> =
            terminals.iter().cloned().zip(0..).collect();
        let nonterminal_ids: HashMap<NonTerminal, u32, ahash::RandomState> =
            nonterminals.iter().cloned().zip(0..).collect();
        let index_of = |symbol: &Symbol| match symbol {
            Symbol::Terminal(t) => SymbolRef::Terminal(terminal_ids[t]),
            Symbol::NonTerminal(n) => SymbolRef::NonTerminal(nonterminal_ids[n]),
        };

        let mut rules = vec![IndexedRule {
            lhs: AUGMENTED_START,
            rhs: vec![SymbolRef::NonTerminal(nonterminal_ids[grammar.initial()])],
        }];
        for (lhs, rhs) in grammar.rules() {
            rules.push(IndexedRule {
                lhs: nonterminal_ids[lhs],
                rhs: rhs.iter().map(&index_of).collect(),
            });
        }

        let mut rules_by_lhs = vec![Vec::new(); nonterminals.len()];
        for (id, rule) in (0u32..).zip(&rules) {
            rules_by_lhs[rule.lhs as usize].push(id);
        }

        let mut first = Vec::with_capacity(nonterminals.len());
        let mut nullable = Vec::with_capacity(nonterminals.len());
        for (index, nt) in nonterminals.iter().enumerate() {
            // S' shares FIRST with the initial symbol
            let source = if index == AUGMENTED_START as usize {
                grammar.initial()
            } else {
                nt
            };
            let set = first_sets.of(source);
            first.push(
                set.map(|s| s.terminals.iter().map(|t| terminal_ids[t]).collect::<Vec<_>>())
                    .map(|mut ids| {
                        ids.sort_unstable();
                        ids
                    })
                    .unwrap_or_default(),
            );
            nullable.push(set.is_some_and(|s| s.nullable));
        }

        Ok(Self {
            terminals,
            nonterminals,
            rules,
            rules_by_lhs,
            first,
            nullable,
        })
    }

    #[must_use]
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    #[must_use]
    pub fn nonterminals(&self) -> &[NonTerminal] {
        &self.nonterminals
    }

    #[must_use]
    pub fn rules(&self) -> &[IndexedRule] {
        &self.rules
    }

    #[must_use]
    pub fn rule(&self, id: u32) -> &IndexedRule {
        &self.rules[id as usize]
    }

    #[must_use]
    pub fn rules_of(&self, nonterminal: u32) -> &[u32] {
        &self.rules_by_lhs[nonterminal as usize]
    }

    /// FIRST(`rest` `lookahead`) as sorted terminal ids.
    #[must_use]
    pub fn first_with_lookahead(&self, rest: &[SymbolRef], lookahead: u32) -> SmallVec<[u32; 8]> {
        let mut result: SmallVec<[u32; 8]> = SmallVec::new();
        let mut nullable = true;
        for symbol in rest {
            match *symbol {
                SymbolRef::Terminal(t) => {
                    result.push(t);
                    nullable = false;
                }
                SymbolRef::NonTerminal(n) => {
                    result.extend_from_slice(&self.first[n as usize]);
                    nullable = self.nullable[n as usize];
                }
            }
            if !nullable {
                break;
            }
        }
        if nullable {
            result.push(lookahead);
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// The symbol table a runtime needs: symbols plus rule shapes.
    #[must_use]
    pub fn symbol_table(&self) -> SymbolTable {
        let shapes = self
            .rules
            .iter()
            .map(|rule| RuleShape {
                lhs: rule.lhs,
                len: u32::try_from(rule.rhs.len()).unwrap_or(u32::MAX),
            })
            .collect();
        SymbolTable::new(self.terminals.clone(), self.nonterminals.clone(), shapes)
    }

    /// `A -> x y` rendering of rule `id`.
    #[must_use]
    pub fn display_rule(&self, id: u32) -> RuleDisplay<'_> {
        RuleDisplay {
            grammar: self,
            rule: id,
            marker: None,
        }
    }

    pub(crate) fn display_symbol(&self, symbol: SymbolRef, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match symbol {
            SymbolRef::Terminal(t) => write!(f, "{}", self.terminals[t as usize]),
            SymbolRef::NonTerminal(n) => write!(f, "{}", self.nonterminals[n as usize]),
        }
    }
}

/// Displays a rule, optionally with an item marker.
pub struct RuleDisplay<'a> {
    pub(crate) grammar: &'a IndexedGrammar,
    pub(crate) rule: u32,
    pub(crate) marker: Option<u32>,
}

impl fmt::Display for RuleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.grammar.rule(self.rule);
        write!(f, "{} ->", self.grammar.nonterminals[rule.lhs as usize])?;
        for (position, symbol) in rule.rhs.iter().enumerate() {
            if self.marker == Some(position as u32) {
                f.write_str(" •")?;
            }
            f.write_str(" ")?;
            self.grammar.display_symbol(*symbol, f)?;
        }
        if self.marker == Some(rule.rhs.len() as u32) {
            f.write_str(" •")?;
        } else if rule.rhs.is_empty() && self.marker.is_none() {
            f.write_str(" ε")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence;

    #[test]
    fn test_augmented_layout() {
        let mut grammar = Grammar::new(NonTerminal::new("S"));
        grammar.add_rule(NonTerminal::new("S"), sentence![B, B]);
        grammar.add_alternatives(NonTerminal::new("B"), [sentence!['b'], sentence!['a', B]]);

        let indexed = IndexedGrammar::new(&grammar).unwrap();
        assert_eq!(indexed.terminals()[TERMINATOR as usize], Terminal::Terminator);
        assert!(indexed.nonterminals()[AUGMENTED_START as usize].is_temporary());
        assert_eq!(indexed.rules().len(), 4);
        assert_eq!(indexed.display_rule(AUGMENTED_RULE).to_string().split_once(" -> ").unwrap().1, "S");
        assert_eq!(indexed.display_rule(3).to_string(), "B -> a B");
        assert_eq!(indexed.rules_of(2), [2, 3]);
    }

    #[test]
    fn test_symbol_ids_index_the_tables() {
        let grammar = crate::testing::sample_grammar();
        let indexed = IndexedGrammar::new(&grammar).unwrap();
        let source: Vec<_> = grammar.rules().collect();
        assert_eq!(indexed.rules().len(), source.len() + 1);
        for ((lhs, rhs), rule) in source.into_iter().zip(&indexed.rules()[1..]) {
            assert_eq!(&indexed.nonterminals()[rule.lhs as usize], lhs);
            for (symbol, id) in rhs.iter().zip(&rule.rhs) {
                match (symbol, *id) {
                    (Symbol::Terminal(t), SymbolRef::Terminal(i)) => assert_eq!(&indexed.terminals()[i as usize], t),
                    (Symbol::NonTerminal(n), SymbolRef::NonTerminal(i)) => {
                        assert_eq!(&indexed.nonterminals()[i as usize], n);
                    }
                    other => panic!("symbol kind changed: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_first_with_lookahead() {
        // S -> A b ; A -> a | ε
        let mut grammar = Grammar::new(NonTerminal::new("S"));
        grammar.add_rule(NonTerminal::new("S"), sentence![A, 'b']);
        grammar.add_alternatives(NonTerminal::new("A"), [sentence!['a'], sentence![]]);
        let indexed = IndexedGrammar::new(&grammar).unwrap();

        // terminals: $, b, a
        let a_then = indexed.first_with_lookahead(&[SymbolRef::NonTerminal(2)], TERMINATOR);
        assert_eq!(a_then.as_slice(), [0, 2]);
        let rhs = &indexed.rule(1).rhs;
        assert_eq!(indexed.first_with_lookahead(rhs, TERMINATOR).as_slice(), [1, 2]);
    }
}
