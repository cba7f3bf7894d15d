//! Canonical and GLR tables built from the same automaton

use glrkit::backend::glr::{GlrConfig, GlrParser, GlrTable};
use glrkit::backend::lr::CanonicalTable;
use glrkit::backend::{ParseTable, TableBackend, TableFlavor};
use glrkit::error::{ConflictKind, TableError};
use glrkit::grammar::{Grammar, NonTerminal};
use glrkit::sentence;
use glrkit::testing::{
    ambiguous_sum_grammar, char_tokens, expression_grammar, sample_grammar, sentences,
    terminal_tokens,
};
use proptest::prelude::*;

/// LR(1) but not LALR(1): merging the `e` states would collide.
fn lr1_only_grammar() -> Grammar {
    let mut grammar = Grammar::new(NonTerminal::new("S"));
    grammar.add_alternatives(
        NonTerminal::new("S"),
        [
            sentence!['a', E, 'c'],
            sentence!['a', F, 'd'],
            sentence!['b', F, 'c'],
            sentence!['b', E, 'd'],
        ],
    );
    grammar.add_rule(NonTerminal::new("E"), sentence!['e']);
    grammar.add_rule(NonTerminal::new("F"), sentence!['e']);
    grammar
}

fn dangling_else_grammar() -> Grammar {
    let mut grammar = Grammar::new(NonTerminal::new("S"));
    grammar.add_alternatives(
        NonTerminal::new("S"),
        [sentence!['i', S], sentence!['i', S, 'e', S], sentence!['x']],
    );
    grammar
}

#[test]
fn test_canonical_accepts_lr1_grammar() {
    let table = CanonicalTable::build(&lr1_only_grammar()).unwrap();
    assert_eq!(table.flavor(), TableFlavor::Canonical);
    let parser = GlrParser::new(&table, GlrConfig::default());
    for (input, middle) in [("aec", "E"), ("aed", "F"), ("bec", "F"), ("bed", "E")] {
        let root = parser.parse(char_tokens(input)).unwrap().root;
        assert_eq!(root.text(), input);
        let child = root.children()[1].nonterminal().map(NonTerminal::name);
        assert_eq!(child, Some(middle));
    }
}

#[test]
fn test_canonical_rejects_conflicts() {
    let err = CanonicalTable::build(&dangling_else_grammar()).unwrap_err();
    let TableError::Conflict(conflict) = err else {
        panic!("expected a conflict, got {err:?}");
    };
    assert_eq!(conflict.kind(), ConflictKind::ShiftReduce);
    assert_eq!(conflict.terminal.to_string(), "e");

    let err = CanonicalTable::build(&ambiguous_sum_grammar()).unwrap_err();
    assert!(matches!(err, TableError::Conflict(_)));
}

#[test]
fn test_glr_keeps_conflicts() {
    let table = GlrTable::build(&dangling_else_grammar()).unwrap();
    let stats = table.stats();
    assert_eq!(stats.flavor, TableFlavor::Generalized);
    assert!(stats.conflicted_cells >= 1);

    let parser = GlrParser::new(&table, GlrConfig::default());
    let outcome = parser.parse(char_tokens("iixex")).unwrap();
    assert_eq!(outcome.root.text(), "iixex");
    assert!(outcome.metrics.forks >= 1);
}

#[test]
fn test_flavors_agree_without_conflicts() {
    for grammar in [sample_grammar(), expression_grammar(), lr1_only_grammar()] {
        let canonical = CanonicalTable::build(&grammar).unwrap();
        let glr = GlrTable::build(&grammar).unwrap();
        assert_eq!(glr.stats().conflicted_cells, 0);
        assert_eq!(canonical.state_count(), glr.state_count());
        assert_eq!(canonical.symbols(), glr.symbols());
        for state in 0..canonical.state_count() as u32 {
            for terminal in 0..canonical.symbols().terminal_count() {
                assert_eq!(canonical.actions(state, terminal), glr.actions(state, terminal));
            }
            for nonterminal in 0..canonical.symbols().nonterminal_count() {
                assert_eq!(canonical.goto(state, nonterminal), glr.goto(state, nonterminal));
            }
        }
    }
}

#[test]
fn test_every_short_sentence_accepted() {
    let grammar = expression_grammar();
    let table = GlrTable::build(&grammar).unwrap();
    let parser = GlrParser::new(&table, GlrConfig::default());
    let found = sentences(&grammar, 5);
    assert!(found.len() > 10);
    for sentence in found {
        let tokens = terminal_tokens(&sentence);
        let spelled: String = tokens.iter().map(|t| t.text.as_str()).collect();
        let outcome = parser.parse(tokens).unwrap();
        assert_eq!(outcome.root.text(), spelled);
        assert_eq!(outcome.metrics.forks, 0);
    }
}

#[test]
fn test_expected_terminals() {
    let table = CanonicalTable::build(&sample_grammar()).unwrap();
    let mut expected: Vec<String> = table
        .expected_terminals(table.initial_state())
        .into_iter()
        .filter_map(|t| table.symbols().terminal(t))
        .map(ToString::to_string)
        .collect();
    expected.sort();
    assert_eq!(expected, ["a", "b"]);
}

proptest! {
    #[test]
    fn canonical_and_glr_parse_alike(input in "[n+*()]{0,12}") {
        let grammar = expression_grammar();
        let canonical = CanonicalTable::build(&grammar).unwrap();
        let glr = GlrTable::build(&grammar).unwrap();
        let config = GlrConfig::default();

        let left = GlrParser::new(&canonical, config.clone()).parse(char_tokens(&input));
        let right = GlrParser::new(&glr, config).parse(char_tokens(&input));
        match (left, right) {
            (Ok(left), Ok(right)) => prop_assert_eq!(left.root, right.root),
            (Err(left), Err(right)) => prop_assert_eq!(left.position(), right.position()),
            (left, right) => prop_assert!(false, "outcomes differ: {:?} vs {:?}", left.is_ok(), right.is_ok()),
        }
    }
}
