//! Automaton visualization
//!
//! Renders the states of a table as a Graphviz digraph. Edges are shifts
//! (solid, labelled with the terminal) and gotos (dashed, labelled with the
//! nonterminal); states that reduce or accept list those actions in their
//! label.

use glrkit::backend::StateId;
use glrkit::{Action, ParseTable};
use std::fmt::Write;

/// Generate a DOT/Graphviz representation of the automaton behind `table`.
///
/// # Example
///
/// ```rust
/// use glrkit::testing::sample_grammar;
/// use glrkit::{CanonicalTable, TableBackend};
/// use glrkit_tools::generate_dot;
///
/// let table = CanonicalTable::build(&sample_grammar()).unwrap();
/// let dot = generate_dot(&table);
/// assert!(dot.starts_with("digraph Automaton {"));
/// ```
#[must_use]
pub fn generate_dot<T: ParseTable + ?Sized>(table: &T) -> String {
    let symbols = table.symbols();
    let states = StateId::try_from(table.state_count()).unwrap_or(StateId::MAX);
    let mut output = String::new();

    // writing into a String cannot fail
    let _ = writeln!(output, "digraph Automaton {{");
    let _ = writeln!(output, "  rankdir=LR;");
    let _ = writeln!(output, "  node [shape=box];");
    let _ = writeln!(output);

    for state in 0..states {
        let mut label = format!("{state}");
        for (terminal, name) in (0u32..).zip(symbols.terminals()) {
            for action in table.actions(state, terminal) {
                match action {
                    Action::Reduce(rule) => {
                        let _ = write!(label, "\\n{name}: reduce {rule}");
                    }
                    Action::Accept => label.push_str("\\naccept"),
                    Action::Shift(_) => {}
                }
            }
        }
        let shape = if state == table.initial_state() {
            ", style=bold"
        } else {
            ""
        };
        let _ = writeln!(output, "  s{state} [label=\"{}\"{shape}];", escape(&label));
    }
    let _ = writeln!(output);

    for state in 0..states {
        for (terminal, name) in (0u32..).zip(symbols.terminals()) {
            for action in table.actions(state, terminal) {
                if let Action::Shift(target) = action {
                    let _ = writeln!(
                        output,
                        "  s{state} -> s{target} [label=\"{}\"];",
                        escape(&name.to_string())
                    );
                }
            }
        }
        for (nonterminal, name) in (0u32..).zip(symbols.nonterminals()) {
            if let Some(target) = table.goto(state, nonterminal) {
                let _ = writeln!(
                    output,
                    "  s{state} -> s{target} [label=\"{}\", style=dashed];",
                    escape(&name.to_string())
                );
            }
        }
    }

    let _ = writeln!(output, "}}");
    output
}

/// Escape double quotes for a DOT label; `\n` sequences are kept.
fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glrkit::testing::sample_grammar;
    use glrkit::{CanonicalTable, TableBackend};

    #[test]
    fn test_dot_edges() {
        let table = CanonicalTable::build(&sample_grammar()).unwrap();
        let dot = generate_dot(&table);
        let shifts = dot.lines().filter(|l| l.contains("->") && !l.contains("dashed")).count();
        let gotos = dot.lines().filter(|l| l.contains("dashed")).count();
        assert_eq!(gotos, table.stats().gotos);
        assert!(shifts > 0);
        assert!(dot.contains("accept"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
