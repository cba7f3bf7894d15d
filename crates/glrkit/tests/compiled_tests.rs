//! Compiled tables: persistence and behavioral equivalence with their source

use glrkit::backend::compiled::CompiledTable;
use glrkit::backend::glr::{GlrConfig, GlrParser, GlrTable};
use glrkit::backend::lr::CanonicalTable;
use glrkit::backend::{ParseTable, TableBackend};
use glrkit::error::FormatError;
use glrkit::grammar::{Grammar, NonTerminal, SentenceForm, Symbol, Terminal};
use glrkit::testing::{
    ambiguous_sum_grammar, char_tokens, expression_grammar, list_grammar, sample_grammar,
    sentences, terminal_tokens,
};
use tempfile::tempdir;

fn keyword_grammar() -> Grammar {
    // Stmt -> "let" ident = num | ident = num
    let stmt = NonTerminal::new("Stmt");
    let ident = || Terminal::kind("ident");
    let mut grammar = Grammar::new(stmt.clone());
    grammar.add_alternatives(
        stmt,
        [
            SentenceForm::new(
                [Terminal::literal("ident", "let"), ident(), Terminal::kind("="), Terminal::kind("num")]
                    .map(Symbol::from),
            ),
            SentenceForm::new([ident(), Terminal::kind("="), Terminal::kind("num")].map(Symbol::from)),
        ],
    );
    grammar
}

fn corpus() -> Vec<Grammar> {
    vec![
        sample_grammar(),
        ambiguous_sum_grammar(),
        expression_grammar(),
        list_grammar().unwrap(),
        keyword_grammar(),
    ]
}

fn assert_same_parses(original: &impl ParseTable, compiled: &CompiledTable, grammar: &Grammar) {
    let config = GlrConfig::default();
    let left = GlrParser::new(original, config.clone());
    let right = GlrParser::new(compiled, config);
    for sentence in sentences(grammar, 5) {
        let expected = left.parse(terminal_tokens(&sentence)).unwrap();
        let actual = right.parse(terminal_tokens(&sentence)).unwrap();
        assert_eq!(expected.root, actual.root);
        assert_eq!(expected.metrics.reductions, actual.metrics.reductions);
    }
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("expr.table");
    let grammar = expression_grammar();
    let table = GlrTable::build(&grammar).unwrap();
    let compiled = CompiledTable::from_table(&table);

    compiled.save(&path).unwrap();
    let loaded = CompiledTable::load(&path).unwrap();
    assert_eq!(loaded, compiled);
    assert_same_parses(&table, &loaded, &grammar);
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let err = CompiledTable::load(dir.path().join("absent.table")).unwrap_err();
    assert!(matches!(err, FormatError::Io(_)));
}

#[test]
fn test_writer_and_reader() {
    let table = CanonicalTable::build(&sample_grammar()).unwrap();
    let compiled = CompiledTable::from_table(&table);
    let mut buffer = Vec::new();
    compiled.write_to(&mut buffer).unwrap();
    let loaded = CompiledTable::read_from(buffer.as_slice()).unwrap();
    assert_eq!(loaded, compiled);
    assert_eq!(loaded.stats(), compiled.stats());
}

#[test]
fn test_corpus_behaves_identically() {
    for grammar in corpus() {
        let glr = GlrTable::build(&grammar).unwrap();
        let loaded = CompiledTable::from_text(&CompiledTable::from_table(&glr).to_text()).unwrap();
        assert_eq!(loaded.stats().conflicted_cells, glr.stats().conflicted_cells);
        assert_same_parses(&glr, &loaded, &grammar);

        if let Ok(canonical) = CanonicalTable::build(&grammar) {
            let loaded =
                CompiledTable::from_text(&CompiledTable::from_table(&canonical).to_text()).unwrap();
            assert_same_parses(&canonical, &loaded, &grammar);
        }
    }
}

#[test]
fn test_compiled_rejects_like_source() {
    let table = GlrTable::build(&sample_grammar()).unwrap();
    let compiled = CompiledTable::from_table(&table);
    let config = GlrConfig::default();
    for input in ["", "a", "ba", "bbb", "abab"] {
        let expected = GlrParser::new(&table, config.clone()).parse(char_tokens(input));
        let actual = GlrParser::new(&compiled, config.clone()).parse(char_tokens(input));
        match (expected, actual) {
            (Ok(expected), Ok(actual)) => assert_eq!(expected.root, actual.root),
            (Err(expected), Err(actual)) => assert_eq!(expected.position(), actual.position()),
            _ => panic!("outcomes differ on {input:?}"),
        }
    }
}

#[test]
fn test_oversized_header_is_an_error() {
    let err = CompiledTable::from_text("glrkit-table,1,canonical,0,18446744073709551615,1,0,0\n[lexemes]\n")
        .unwrap_err();
    assert!(matches!(err, FormatError::Malformed { line: 1, .. }));

    let err = CompiledTable::from_text("glrkit-table,1,glr,4294967296,0,1,4294967296,0\n").unwrap_err();
    assert!(matches!(err, FormatError::Malformed { line: 1, .. }));

    // counts in range but far beyond what the body holds
    let table = CompiledTable::from_table(&CanonicalTable::build(&sample_grammar()).unwrap());
    let text = table.to_text().replacen(",10,", ",4000000000,", 1);
    let err = CompiledTable::from_text(&text).unwrap_err();
    assert!(matches!(err, FormatError::Malformed { .. }));
}
