#![no_main]
use glrkit::backend::TableBackend;
use glrkit::backend::compiled::CompiledTable;
use glrkit::backend::glr::{GlrConfig, GlrParser, GlrTable};
use glrkit::testing::{ambiguous_sum_grammar, char_tokens, expression_grammar};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // The expression grammar is deterministic: the built and compiled tables
    // must agree on every input.
    let Ok(table) = GlrTable::build(&expression_grammar()) else {
        return;
    };
    let compiled = CompiledTable::from_table(&table);
    let config = GlrConfig::default();
    let built = GlrParser::new(&table, config.clone()).parse(char_tokens(input));
    let loaded = GlrParser::new(&compiled, config).parse(char_tokens(input));
    match (built, loaded) {
        (Ok(built), Ok(loaded)) => {
            assert_eq!(built.root, loaded.root);
            assert_eq!(built.root.text(), input.split_whitespace().collect::<String>());
        }
        (Err(built), Err(loaded)) => assert_eq!(built.position(), loaded.position()),
        _ => panic!("built and compiled tables disagree"),
    }

    // Ambiguous input must end in a parse or a limit error, never hang.
    let Ok(table) = GlrTable::build(&ambiguous_sum_grammar()) else {
        return;
    };
    let config = GlrConfig {
        max_branches: 64,
        max_reductions_per_token: 4096,
        ..GlrConfig::default()
    };
    if let Ok(outcome) = GlrParser::new(&table, config).parse(char_tokens(input)) {
        assert!(outcome.root.is_clean());
    }
});
