//! Table summaries for `glrkit inspect`

use glrkit::ParseTable;
use glrkit::backend::StateId;
use serde::Serialize;
use std::fmt::Write;

/// A cell holding more than one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictCell {
    pub state: StateId,
    pub terminal: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub flavor: String,
    pub states: usize,
    pub terminals: usize,
    pub nonterminals: usize,
    pub rules: usize,
    pub actions: usize,
    pub gotos: usize,
    pub conflicts: Vec<ConflictCell>,
}

impl TableReport {
    #[must_use]
    pub fn from_table<T: ParseTable + ?Sized>(table: &T) -> Self {
        let stats = table.stats();
        let symbols = table.symbols();
        let mut conflicts = Vec::new();
        for state in 0..StateId::try_from(stats.states).unwrap_or(StateId::MAX) {
            for (terminal, name) in (0u32..).zip(symbols.terminals()) {
                let actions = table.actions(state, terminal);
                if actions.len() > 1 {
                    conflicts.push(ConflictCell {
                        state,
                        terminal: name.to_string(),
                        actions: actions.iter().map(ToString::to_string).collect(),
                    });
                }
            }
        }
        Self {
            flavor: stats.flavor.to_string(),
            states: stats.states,
            terminals: stats.terminals,
            nonterminals: stats.nonterminals,
            rules: stats.rules,
            actions: stats.actions,
            gotos: stats.gotos,
            conflicts,
        }
    }

    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(out, "flavor:        {}", self.flavor);
        let _ = writeln!(out, "states:        {}", self.states);
        let _ = writeln!(out, "terminals:     {}", self.terminals);
        let _ = writeln!(out, "nonterminals:  {}", self.nonterminals);
        let _ = writeln!(out, "rules:         {}", self.rules);
        let _ = writeln!(out, "actions:       {}", self.actions);
        let _ = writeln!(out, "gotos:         {}", self.gotos);
        let _ = writeln!(out, "ambiguous:     {}", self.conflicts.len());
        for conflict in &self.conflicts {
            let _ = writeln!(
                out,
                "  state {} on `{}`: {}",
                conflict.state,
                conflict.terminal,
                conflict.actions.join(" | ")
            );
        }
        out
    }
}
