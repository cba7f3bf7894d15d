use criterion::{Criterion, criterion_group, criterion_main};
use glrkit::backend::TableBackend;
use glrkit::backend::compiled::CompiledTable;
use glrkit::backend::glr::{GlrConfig, GlrParser, GlrTable, TreeStack};
use glrkit::backend::lr::CanonicalTable;
use glrkit::grammar::FirstSets;
use glrkit::testing::{ambiguous_sum_grammar, char_tokens, expression_grammar, list_grammar};
use std::hint::black_box;

fn long_expression(terms: usize) -> String {
    let mut input = String::from("(n+n)");
    for i in 0..terms {
        input.push(if i % 2 == 0 { '*' } else { '+' });
        input.push('n');
    }
    input
}

fn bench_table_construction(c: &mut Criterion) {
    let grammar = expression_grammar();

    c.bench_function("first_sets_expression", |b| {
        b.iter(|| black_box(FirstSets::compute(black_box(&grammar))));
    });
    c.bench_function("canonical_table_expression", |b| {
        b.iter(|| black_box(CanonicalTable::build(black_box(&grammar))));
    });
    c.bench_function("glr_table_expression", |b| {
        b.iter(|| black_box(GlrTable::build(black_box(&grammar))));
    });
}

fn bench_glr_parse(c: &mut Criterion) {
    let table = GlrTable::build(&expression_grammar()).unwrap();
    let parser = GlrParser::new(&table, GlrConfig::default());
    let tokens = char_tokens(&long_expression(200));

    c.bench_function("glr_parse_expression_200", |b| {
        b.iter(|| black_box(parser.parse(black_box(tokens.clone()))));
    });

    let table = GlrTable::build(&list_grammar().unwrap()).unwrap();
    let parser = GlrParser::new(&table, GlrConfig::default());
    let mut list = String::from("[x");
    for _ in 0..200 {
        list.push_str(",x");
    }
    list.push(']');
    let tokens = char_tokens(&list);

    c.bench_function("glr_parse_list_200_cleaned", |b| {
        b.iter(|| black_box(parser.parse(black_box(tokens.clone()))));
    });
}

fn bench_ambiguous_parse(c: &mut Criterion) {
    let table = GlrTable::build(&ambiguous_sum_grammar()).unwrap();
    let parser = GlrParser::new(&table, GlrConfig::default());
    let tokens = char_tokens("n+n+n+n+n+n+n+n");

    c.bench_function("glr_parse_ambiguous_8_terms", |b| {
        b.iter(|| black_box(parser.parse(black_box(tokens.clone()))));
    });
}

fn bench_compiled_tables(c: &mut Criterion) {
    let table = GlrTable::build(&expression_grammar()).unwrap();
    let compiled = CompiledTable::from_table(&table);
    let text = compiled.to_text();

    c.bench_function("compiled_table_load", |b| {
        b.iter(|| black_box(CompiledTable::from_text(black_box(&text))));
    });

    let parser = GlrParser::new(&compiled, GlrConfig::default());
    let tokens = char_tokens(&long_expression(200));
    c.bench_function("compiled_parse_expression_200", |b| {
        b.iter(|| black_box(parser.parse(black_box(tokens.clone()))));
    });
}

fn bench_tree_stack(c: &mut Criterion) {
    c.bench_function("tree_stack_fork_pop", |b| {
        b.iter(|| {
            let mut stack = TreeStack::new();
            let root = stack.create();
            for value in 0..64u32 {
                stack.push(&root, value);
            }
            let mut branches = stack.fork(root, 4);
            for branch in &branches {
                black_box(stack.pop(branch, 8));
                stack.push(branch, 128);
            }
            while branches.len() > 1 {
                if let Some(branch) = branches.pop() {
                    stack.delete(branch);
                }
            }
            black_box(stack.segment_count());
        });
    });
}

criterion_group!(
    benches,
    bench_table_construction,
    bench_glr_parse,
    bench_ambiguous_parse,
    bench_compiled_tables,
    bench_tree_stack
);
criterion_main!(benches);
