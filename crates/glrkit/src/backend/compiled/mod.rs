//! # Compiled Tables
//!
//! A dense snapshot of a built table that can be saved and loaded instead of
//! rebuilt.
//!
//! ## Layout
//!
//! Cells are addressed by (state, symbol), where symbols `0..T` are the
//! terminals and `T..T+N` the nonterminals. Each cell holds a list of packed
//! actions (`index << 2 | kind`, see [`pack_action`]); canonical tables have
//! at most one entry per cell, and goto cells hold a single packed shift to
//! the target state. The initial state is always state 0.
//!
//! Rules keep only their left-hand side and length: that is all a
//! reduction needs.
//!
//! ## Persistence
//!
//! ```rust
//! use glrkit::backend::compiled::CompiledTable;
//! use glrkit::backend::glr::GlrTable;
//! use glrkit::backend::{ParseTable, TableBackend};
//! use glrkit::testing::sample_grammar;
//!
//! let table = GlrTable::build(&sample_grammar())?;
//! let compiled = CompiledTable::from_table(&table);
//! let text = compiled.to_text();
//! let loaded = CompiledTable::from_text(&text)?;
//! assert_eq!(loaded, compiled);
//! assert_eq!(loaded.to_text(), text);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod format;

use crate::backend::{Action, ParseTable, StateId, SymbolTable, TableFlavor};
use smallvec::SmallVec;

const KIND_SHIFT: u64 = 1;
const KIND_REDUCE: u64 = 2;
const KIND_ACCEPT: u64 = 3;

/// Pack an action as `index << 2 | kind`; never 0.
#[must_use]
pub const fn pack_action(action: Action) -> u64 {
    match action {
        Action::Shift(state) => ((state as u64) << 2) | KIND_SHIFT,
        Action::Reduce(rule) => ((rule as u64) << 2) | KIND_REDUCE,
        Action::Accept => KIND_ACCEPT,
    }
}

/// Inverse of [`pack_action`]. `None` for 0, an unknown kind or an index
/// that does not fit a `u32`.
#[must_use]
pub fn unpack_action(code: u64) -> Option<Action> {
    let index = u32::try_from(code >> 2).ok()?;
    match code & 0b11 {
        KIND_SHIFT => Some(Action::Shift(index)),
        KIND_REDUCE => Some(Action::Reduce(index)),
        KIND_ACCEPT if index == 0 => Some(Action::Accept),
        _ => None,
    }
}

/// A table flattened into a dense cell matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTable {
    flavor: TableFlavor,
    symbols: SymbolTable,
    states: usize,
    cells: Vec<SmallVec<[u64; 1]>>,
}

impl CompiledTable {
    /// Snapshot `table`, renumbering its initial state to 0.
    #[must_use]
    pub fn from_table<T: ParseTable + ?Sized>(table: &T) -> Self {
        let symbols = table.symbols().clone();
        let terminals = symbols.terminal_count();
        let nonterminals = symbols.nonterminal_count();
        let states = table.state_count();
        let initial = table.initial_state();
        // swap the initial state with state 0
        let renumber = |state: StateId| match state {
            s if s == initial => 0,
            0 => initial,
            s => s,
        };
        let renumber_action = |action: Action| match action {
            Action::Shift(target) => Action::Shift(renumber(target)),
            other => other,
        };

        let width = (terminals + nonterminals) as usize;
        let mut cells = vec![SmallVec::new(); states * width];
        for row in 0..states {
            let row = StateId::try_from(row).unwrap_or(StateId::MAX);
            let source = renumber(row);
            let base = row as usize * width;
            for terminal in 0..terminals {
                cells[base + terminal as usize] = table
                    .actions(source, terminal)
                    .into_iter()
                    .map(|action| pack_action(renumber_action(action)))
                    .collect();
            }
            for nonterminal in 0..nonterminals {
                if let Some(target) = table.goto(source, nonterminal) {
                    cells[base + (terminals + nonterminal) as usize]
                        .push(pack_action(Action::Shift(renumber(target))));
                }
            }
        }

        Self {
            flavor: table.flavor(),
            symbols,
            states,
            cells,
        }
    }

    /// Packed entries of cell (`state`, `symbol`); empty when out of range.
    #[must_use]
    pub fn cell(&self, state: StateId, symbol: u32) -> &[u64] {
        let width = self.width();
        if symbol as usize >= width {
            return &[];
        }
        self.cells
            .get(state as usize * width + symbol as usize)
            .map_or(&[], SmallVec::as_slice)
    }

    fn width(&self) -> usize {
        (self.symbols.terminal_count() + self.symbols.nonterminal_count()) as usize
    }
}

impl ParseTable for CompiledTable {
    fn flavor(&self) -> TableFlavor {
        self.flavor
    }

    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn state_count(&self) -> usize {
        self.states
    }

    fn actions(&self, state: StateId, terminal: u32) -> SmallVec<[Action; 2]> {
        if terminal >= self.symbols.terminal_count() {
            return SmallVec::new();
        }
        self.cell(state, terminal)
            .iter()
            .filter_map(|&code| unpack_action(code))
            .collect()
    }

    fn goto(&self, state: StateId, nonterminal: u32) -> Option<StateId> {
        let symbol = self.symbols.terminal_count().checked_add(nonterminal)?;
        match self.cell(state, symbol).first().copied().and_then(unpack_action) {
            Some(Action::Shift(target)) => Some(target),
            _ => None,
        }
    }
}
