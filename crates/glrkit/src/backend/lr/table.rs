use crate::backend::lr::automaton::Automaton;
use crate::backend::lr::grammar::{AUGMENTED_RULE, IndexedGrammar, SymbolRef, TERMINATOR};
use crate::backend::{Action, ParseTable, StateId, SymbolTable, TableBackend, TableFlavor};
use crate::error::{Conflict, TableError};
use crate::grammar::Grammar;
use smallvec::SmallVec;

/// One cell write produced while walking the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableEntry {
    Action {
        state: StateId,
        terminal: u32,
        action: Action,
    },
    Goto {
        state: StateId,
        nonterminal: u32,
        target: StateId,
    },
}

/// Simplify a copy of `grammar` and build its canonical LR(1) automaton.
pub(crate) fn build_automaton(grammar: &Grammar) -> Result<Automaton, TableError> {
    let mut grammar = grammar.clone();
    grammar.simplify()?;
    let indexed = IndexedGrammar::new(&grammar)?;
    Ok(Automaton::build(indexed))
}

/// Walk every item of every state and report the cell it fills:
///
/// - `S' -> S •, $` accepts on the terminator
/// - any other complete item reduces on its lookahead
/// - a terminal after the marker shifts to `Go(state, terminal)`
/// - a nonterminal after the marker is a goto to `Go(state, nonterminal)`
///
/// Entries come in state order, then item order. The same entry may be
/// reported more than once.
pub(crate) fn for_each_entry<E>(
    automaton: &Automaton,
    mut visit: impl FnMut(TableEntry) -> Result<(), E>,
) -> Result<(), E> {
    let grammar = automaton.grammar();
    for (state, items) in (0..).zip(automaton.states()) {
        for item in items.iter() {
            if item.is_complete(grammar) {
                let action = if item.rule == AUGMENTED_RULE && item.lookahead == TERMINATOR {
                    Action::Accept
                } else {
                    Action::Reduce(item.rule)
                };
                visit(TableEntry::Action {
                    state,
                    terminal: item.lookahead,
                    action,
                })?;
                continue;
            }
            let symbol = item.next_symbol(grammar);
            let Some(target) = automaton.transition(state, symbol) else {
                continue;
            };
            let entry = match symbol {
                SymbolRef::Terminal(terminal) => TableEntry::Action {
                    state,
                    terminal,
                    action: Action::Shift(target),
                },
                SymbolRef::NonTerminal(nonterminal) => TableEntry::Goto {
                    state,
                    nonterminal,
                    target,
                },
            };
            visit(entry)?;
        }
    }
    Ok(())
}

/// Canonical LR(1) table: each (state, terminal) cell holds at most one
/// action.
///
/// # Example
///
/// ```rust
/// use glrkit::backend::lr::CanonicalTable;
/// use glrkit::backend::{ParseTable, TableBackend};
/// use glrkit::testing::sample_grammar;
///
/// let table = CanonicalTable::build(&sample_grammar())?;
/// assert_eq!(table.state_count(), 10);
/// # Ok::<(), glrkit::error::TableError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    automaton: Automaton,
    symbols: SymbolTable,
    actions: Vec<Option<Action>>,
    gotos: Vec<Option<StateId>>,
}

impl CanonicalTable {
    /// Build from an already constructed automaton.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Conflict`] on the first cell that would need two
    /// different actions. No partial table is returned.
    pub fn from_automaton(automaton: Automaton) -> Result<Self, TableError> {
        let symbols = automaton.grammar().symbol_table();
        let terminals = symbols.terminal_count() as usize;
        let nonterminals = symbols.nonterminal_count() as usize;
        let states = automaton.state_count();
        let mut actions: Vec<Option<Action>> = vec![None; states * terminals];
        let mut gotos: Vec<Option<StateId>> = vec![None; states * nonterminals];

        for_each_entry(&automaton, |entry| {
            match entry {
                TableEntry::Action {
                    state,
                    terminal,
                    action,
                } => {
                    let cell = &mut actions[state as usize * terminals + terminal as usize];
                    match *cell {
                        None => *cell = Some(action),
                        Some(existing) if existing == action => {}
                        Some(existing) => {
                            return Err(TableError::Conflict(Box::new(Conflict {
                                state,
                                terminal: symbols.terminals()[terminal as usize].clone(),
                                existing,
                                incoming: action,
                            })));
                        }
                    }
                }
                TableEntry::Goto {
                    state,
                    nonterminal,
                    target,
                } => {
                    gotos[state as usize * nonterminals + nonterminal as usize] = Some(target);
                }
            }
            Ok(())
        })?;

        Ok(Self {
            automaton,
            symbols,
            actions,
            gotos,
        })
    }

    /// The single action for (`state`, `terminal`), if any.
    #[must_use]
    pub fn action(&self, state: StateId, terminal: u32) -> Option<Action> {
        let terminals = self.symbols.terminal_count();
        if terminal >= terminals {
            return None;
        }
        self.actions
            .get(state as usize * terminals as usize + terminal as usize)
            .copied()
            .flatten()
    }

    #[must_use]
    pub const fn automaton(&self) -> &Automaton {
        &self.automaton
    }
}

impl ParseTable for CanonicalTable {
    fn flavor(&self) -> TableFlavor {
        TableFlavor::Canonical
    }

    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn state_count(&self) -> usize {
        self.automaton.state_count()
    }

    fn actions(&self, state: StateId, terminal: u32) -> SmallVec<[Action; 2]> {
        self.action(state, terminal).into_iter().collect()
    }

    fn goto(&self, state: StateId, nonterminal: u32) -> Option<StateId> {
        let nonterminals = self.symbols.nonterminal_count();
        if nonterminal >= nonterminals {
            return None;
        }
        self.gotos
            .get(state as usize * nonterminals as usize + nonterminal as usize)
            .copied()
            .flatten()
    }
}

impl TableBackend for CanonicalTable {
    fn build(grammar: &Grammar) -> Result<Self, TableError> {
        Self::from_automaton(build_automaton(grammar)?)
    }
}
