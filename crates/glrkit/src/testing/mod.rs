//! # Testing Utilities
//!
//! Fixtures shared by unit tests, integration tests, benchmarks and fuzz
//! targets:
//!
//! - [`char_tokens`]: a trivial tokenizer, one token per character
//! - sample grammars over single-character lexeme kinds
//! - [`sentences`]: brute-force enumeration of a grammar's short sentences,
//!   the reference for property tests

use crate::grammar::{Grammar, GrammarError, NonTerminal, Refinement, RegularForm, SentenceForm, Symbol, Terminal};
use crate::lexer::Token;
use crate::sentence;
use crate::syntax::{TextRange, TextSize};
use std::collections::{BTreeSet, VecDeque};

/// One token per non-whitespace character; the lexeme kind is the character
/// itself. Ranges are byte offsets into `input`.
///
/// ```rust
/// use glrkit::testing::char_tokens;
///
/// let tokens = char_tokens("a b");
/// assert_eq!(tokens.len(), 2);
/// assert_eq!(tokens[1].kind.as_str(), "b");
/// assert_eq!(tokens[1].range.start().get(), 2);
/// ```
#[must_use]
pub fn char_tokens(input: &str) -> Vec<Token> {
    input
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .map(|(offset, c)| {
            let text = c.to_string();
            let start = TextSize::new(u32::try_from(offset).unwrap_or(u32::MAX));
            let range = TextRange::at(start, TextSize::of(&text));
            Token::new(text.as_str(), text.as_str(), range)
        })
        .collect()
}

/// Tokens spelling `terminals`: a literal's text, or else the lexeme kind.
/// Terminators are skipped.
#[must_use]
pub fn terminal_tokens(terminals: &[Terminal]) -> Vec<Token> {
    let mut offset = TextSize::zero();
    let mut tokens = Vec::with_capacity(terminals.len());
    for terminal in terminals {
        let Some(kind) = terminal.lexeme_kind() else {
            continue;
        };
        let text = match terminal.refinement() {
            Some(Refinement::Literal(text)) => text.as_str(),
            _ => kind.as_str(),
        };
        let range = TextRange::at(offset, TextSize::of(text));
        offset = range.end();
        tokens.push(Token::new(kind.clone(), text, range));
    }
    tokens
}

/// `S -> B B ; B -> b | a B`, the textbook canonical LR(1) grammar.
#[must_use]
pub fn sample_grammar() -> Grammar {
    let mut grammar = Grammar::new(NonTerminal::new("S"));
    grammar.add_rule(NonTerminal::new("S"), sentence![B, B]);
    grammar.add_alternatives(NonTerminal::new("B"), [sentence!['b'], sentence!['a', B]]);
    grammar
}

/// `E -> E + E | n`: every sum of three or more terms is ambiguous.
#[must_use]
pub fn ambiguous_sum_grammar() -> Grammar {
    let mut grammar = Grammar::new(NonTerminal::new("E"));
    grammar.add_alternatives(NonTerminal::new("E"), [sentence![E, '+', E], sentence!['n']]);
    grammar
}

/// Unambiguous arithmetic over `n`, `+`, `*` and parentheses:
///
/// ```text
/// E -> E + T | T
/// T -> T * F | F
/// F -> ( E ) | n
/// ```
#[must_use]
pub fn expression_grammar() -> Grammar {
    let mut grammar = Grammar::new(NonTerminal::new("E"));
    grammar.add_alternatives(NonTerminal::new("E"), [sentence![E, '+', T], sentence![T]]);
    grammar.add_alternatives(NonTerminal::new("T"), [sentence![T, '*', F], sentence![F]]);
    grammar.add_alternatives(NonTerminal::new("F"), [sentence!['(', E, ')'], sentence!['n']]);
    grammar
}

/// A bracketed, comma separated list built from a regular form:
/// `L -> [ (x (, x)*)? ]`.
///
/// # Errors
///
/// Only if no fresh temporary nonterminal ids are left.
pub fn list_grammar() -> Result<Grammar, GrammarError> {
    let item = RegularForm::from(sentence!['x']);
    let rest = RegularForm::star(sentence![',', 'x']);
    let form = RegularForm::concat([
        RegularForm::from(sentence!['[']),
        RegularForm::optional(RegularForm::concat([item, rest])),
        RegularForm::from(sentence![']']),
    ]);
    let mut grammar = Grammar::new(NonTerminal::new("L"));
    grammar.add_regular(NonTerminal::new("L"), &form)?;
    Ok(grammar)
}

/// Every terminal string of at most `max_len` terminals derivable from the
/// initial nonterminal, found by breadth-first leftmost derivation.
///
/// Sentential forms longer than `2 * max_len + 4` symbols are abandoned, so
/// for grammars with many empty rules the result may be incomplete.
#[must_use]
pub fn sentences(grammar: &Grammar, max_len: usize) -> BTreeSet<Vec<Terminal>> {
    sentences_from(grammar, &SentenceForm::nonterminal(grammar.initial().clone()), max_len)
}

/// [`sentences`] starting from an arbitrary sentential form.
#[must_use]
pub fn sentences_from(grammar: &Grammar, start: &SentenceForm, max_len: usize) -> BTreeSet<Vec<Terminal>> {
    let form_limit = 2 * max_len + 4;
    let mut found = BTreeSet::new();
    let mut seen: BTreeSet<Vec<Symbol>> = BTreeSet::new();
    let mut queue: VecDeque<Vec<Symbol>> = VecDeque::new();
    queue.push_back(start.symbols().to_vec());

    while let Some(form) = queue.pop_front() {
        if !seen.insert(form.clone()) {
            continue;
        }
        let terminals = form.iter().filter(|s| s.is_terminal()).count();
        if terminals > max_len || form.len() > form_limit {
            continue;
        }
        let Some(at) = form.iter().position(|s| !s.is_terminal()) else {
            found.insert(form.iter().filter_map(Symbol::as_terminal).cloned().collect());
            continue;
        };
        let Some(nonterminal) = form[at].as_nonterminal() else {
            continue;
        };
        for rhs in grammar.alternatives(nonterminal) {
            let mut next = Vec::with_capacity(form.len() + rhs.len());
            next.extend_from_slice(&form[..at]);
            next.extend(rhs.iter().cloned());
            next.extend_from_slice(&form[at + 1..]);
            queue.push_back(next);
        }
    }
    found
}
