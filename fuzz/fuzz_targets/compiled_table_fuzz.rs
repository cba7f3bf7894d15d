#![no_main]
use glrkit::backend::ParseTable;
use glrkit::backend::compiled::CompiledTable;
use glrkit::backend::glr::{GlrConfig, GlrParser};
use glrkit::testing::char_tokens;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(table) = CompiledTable::from_text(text) else {
        return;
    };

    // Whatever loads must render back to something that loads identically.
    let rendered = table.to_text();
    let reloaded = CompiledTable::from_text(&rendered).expect("rendered table must load");
    assert_eq!(reloaded, table);
    let _ = table.stats();

    // A loaded table may be nonsense; the runtime must fail cleanly.
    let config = GlrConfig {
        max_branches: 64,
        max_reductions_per_token: 1024,
        ..GlrConfig::default()
    };
    let _ = GlrParser::new(&table, config).parse(char_tokens("abc()+*n"));
});
