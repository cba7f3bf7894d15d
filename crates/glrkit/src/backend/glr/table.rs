use crate::backend::lr::{Automaton, TableEntry, build_automaton, for_each_entry};
use crate::backend::{Action, ParseTable, StateId, SymbolTable, TableBackend, TableFlavor};
use crate::error::TableError;
use crate::grammar::Grammar;
use smallvec::SmallVec;
use std::convert::Infallible;

/// Generalized LR(1) table: cells hold every applicable action.
///
/// Built from the same canonical automaton as
/// [`CanonicalTable`](crate::backend::lr::CanonicalTable), but a second action
/// in a cell is appended instead of rejected (duplicates are dropped). The
/// build never fails on ambiguity.
#[derive(Debug, Clone)]
pub struct GlrTable {
    automaton: Automaton,
    symbols: SymbolTable,
    actions: Vec<SmallVec<[Action; 1]>>,
    gotos: Vec<Option<StateId>>,
}

impl GlrTable {
    #[must_use]
    pub fn from_automaton(automaton: Automaton) -> Self {
        let symbols = automaton.grammar().symbol_table();
        let terminals = symbols.terminal_count() as usize;
        let nonterminals = symbols.nonterminal_count() as usize;
        let states = automaton.state_count();
        let mut actions: Vec<SmallVec<[Action; 1]>> = vec![SmallVec::new(); states * terminals];
        let mut gotos: Vec<Option<StateId>> = vec![None; states * nonterminals];

        let walked: Result<(), Infallible> = for_each_entry(&automaton, |entry| {
            match entry {
                TableEntry::Action {
                    state,
                    terminal,
                    action,
                } => {
                    let cell = &mut actions[state as usize * terminals + terminal as usize];
                    if !cell.contains(&action) {
                        cell.push(action);
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
        });
        let Ok(()) = walked;

        Self {
            automaton,
            symbols,
            actions,
            gotos,
        }
    }

    #[must_use]
    pub const fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// The action list of (`state`, `terminal`) without copying.
    #[must_use]
    pub fn cell(&self, state: StateId, terminal: u32) -> &[Action] {
        let terminals = self.symbols.terminal_count();
        if terminal >= terminals {
            return &[];
        }
        self.actions
            .get(state as usize * terminals as usize + terminal as usize)
            .map_or(&[], SmallVec::as_slice)
    }
}

impl ParseTable for GlrTable {
    fn flavor(&self) -> TableFlavor {
        TableFlavor::Generalized
    }

    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn state_count(&self) -> usize {
        self.automaton.state_count()
    }

    fn actions(&self, state: StateId, terminal: u32) -> SmallVec<[Action; 2]> {
        SmallVec::from_slice(self.cell(state, terminal))
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

impl TableBackend for GlrTable {
    fn build(grammar: &Grammar) -> Result<Self, TableError> {
        Ok(Self::from_automaton(build_automaton(grammar)?))
    }
}
