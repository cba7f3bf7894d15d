//! EBNF-style regular forms and their expansion into production rules.
//!
//! A [`RegularForm`] is a tree of concatenation, alternation and bounded or
//! unbounded repetition over sentence forms. Expansion introduces a fresh
//! temporary nonterminal for every operand that is not already a plain
//! sentence form, then contracts single-use helpers, merges equivalent ones
//! and simplifies the result.

use crate::grammar::{Grammar, GrammarError, NonTerminal, SentenceForm, Symbol, Terminal};
use hashbrown::HashMap;

/// A regular expression over grammar symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegularForm {
    Sentence(SentenceForm),
    Concat(Vec<RegularForm>),
    Or(Vec<RegularForm>),
    /// `inner` repeated between `min` and `max` times inclusive; no `max`
    /// means unbounded
    Repeat {
        inner: Box<RegularForm>,
        min: usize,
        max: Option<usize>,
    },
}

impl RegularForm {
    #[must_use]
    pub fn concat(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::Concat(parts.into_iter().collect())
    }

    #[must_use]
    pub fn or(alternatives: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(alternatives.into_iter().collect())
    }

    #[must_use]
    pub fn repeat(inner: impl Into<Self>, min: usize, max: Option<usize>) -> Self {
        Self::Repeat {
            inner: Box::new(inner.into()),
            min,
            max,
        }
    }

    /// Zero or one
    #[must_use]
    pub fn optional(inner: impl Into<Self>) -> Self {
        Self::repeat(inner, 0, Some(1))
    }

    /// Zero or more
    #[must_use]
    pub fn star(inner: impl Into<Self>) -> Self {
        Self::repeat(inner, 0, None)
    }

    /// One or more
    #[must_use]
    pub fn plus(inner: impl Into<Self>) -> Self {
        Self::repeat(inner, 1, None)
    }

    /// Expand into a grammar rooted at `lhs`.
    ///
    /// Nonterminals referenced by the form but defined elsewhere are left
    /// untouched and assumed productive.
    ///
    /// # Errors
    ///
    /// [`GrammarError::InvalidRepetition`] if some repetition has
    /// `min > max`; [`GrammarError::EmptyLanguage`] if `lhs` ends up with no
    /// rules (an empty alternation, for instance).
    pub fn expand(&self, lhs: NonTerminal) -> Result<Grammar, GrammarError> {
        let mut expansion = Expansion {
            grammar: Grammar::new(lhs.clone()),
            hint: lhs.name().into(),
        };
        expansion.emit(&lhs, self)?;

        let mut grammar = expansion.grammar;
        contract_concatenations(&mut grammar);
        contract_alternations(&mut grammar);
        grammar.minimize();
        grammar.simplify_open()?;
        Ok(grammar)
    }
}

impl From<SentenceForm> for RegularForm {
    fn from(form: SentenceForm) -> Self {
        Self::Sentence(form)
    }
}

impl From<Symbol> for RegularForm {
    fn from(symbol: Symbol) -> Self {
        Self::Sentence(symbol.into())
    }
}

impl From<Terminal> for RegularForm {
    fn from(terminal: Terminal) -> Self {
        Self::Sentence(terminal.into())
    }
}

impl From<NonTerminal> for RegularForm {
    fn from(nonterminal: NonTerminal) -> Self {
        Self::Sentence(nonterminal.into())
    }
}

impl Grammar {
    /// Add the rules of `form` expanded under `lhs`.
    ///
    /// # Errors
    ///
    /// See [`RegularForm::expand`].
    pub fn add_regular(&mut self, lhs: NonTerminal, form: &RegularForm) -> Result<(), GrammarError> {
        let expanded = form.expand(lhs)?;
        self.extend(expanded);
        Ok(())
    }
}

struct Expansion {
    grammar: Grammar,
    hint: compact_str::CompactString,
}

impl Expansion {
    fn emit(&mut self, lhs: &NonTerminal, form: &RegularForm) -> Result<(), GrammarError> {
        match form {
            RegularForm::Sentence(sentence) => {
                self.grammar.add_rule(lhs.clone(), sentence.clone());
            }
            RegularForm::Concat(parts) => {
                let mut rhs = SentenceForm::empty();
                for part in parts {
                    rhs = rhs + self.operand(part)?;
                }
                self.grammar.add_rule(lhs.clone(), rhs);
            }
            RegularForm::Or(alternatives) => {
                for alternative in alternatives {
                    let rhs = self.operand(alternative)?;
                    self.grammar.add_rule(lhs.clone(), rhs);
                }
            }
            RegularForm::Repeat { inner, min, max } => {
                let (min, max) = (*min, *max);
                if let Some(max) = max
                    && min > max
                {
                    return Err(GrammarError::InvalidRepetition { min, max });
                }
                let item = self.operand(inner)?;
                match max {
                    Some(max) => {
                        for count in min..=max {
                            self.grammar.add_rule(lhs.clone(), item.repeat(count));
                        }
                    }
                    None => {
                        // R -> item | R item
                        let rest = NonTerminal::try_temporary(self.hint.clone())?;
                        self.grammar.add_rule(rest.clone(), item.clone());
                        self.grammar.add_rule(
                            rest.clone(),
                            SentenceForm::nonterminal(rest.clone()) + item.clone(),
                        );
                        let prefix = item.repeat(min);
                        self.grammar.add_rule(lhs.clone(), prefix.clone());
                        self.grammar
                            .add_rule(lhs.clone(), prefix + SentenceForm::nonterminal(rest));
                    }
                }
            }
        }
        Ok(())
    }

    /// A sentence form standing for `form`: the form itself when it is a
    /// plain sentence, otherwise a fresh temporary deriving it.
    fn operand(&mut self, form: &RegularForm) -> Result<SentenceForm, GrammarError> {
        if let RegularForm::Sentence(sentence) = form {
            return Ok(sentence.clone());
        }
        let temporary = NonTerminal::try_temporary(self.hint.clone())?;
        self.emit(&temporary, form)?;
        Ok(SentenceForm::nonterminal(temporary))
    }
}

/// Number of occurrences of each temporary on right-hand sides.
fn temporary_uses(grammar: &Grammar) -> HashMap<NonTerminal, usize, ahash::RandomState> {
    let mut uses = HashMap::with_hasher(ahash::RandomState::new());
    for (_, rhs) in grammar.rules() {
        for nt in rhs.nonterminals().filter(|nt| nt.is_temporary()) {
            *uses.entry(nt.clone()).or_insert(0) += 1;
        }
    }
    uses
}

fn is_recursive(grammar: &Grammar, nt: &NonTerminal) -> bool {
    grammar
        .alternatives(nt)
        .iter()
        .any(|rhs| rhs.nonterminals().any(|n| n == nt))
}

/// Inline temporaries that have a single rule and a single use into the rule
/// that uses them.
fn contract_concatenations(grammar: &mut Grammar) {
    loop {
        let uses = temporary_uses(grammar);
        let candidate = grammar.nonterminals().find(|nt| {
            nt.is_temporary()
                && nt != &grammar.initial()
                && uses.get(*nt) == Some(&1)
                && grammar.alternatives(nt).len() == 1
                && !is_recursive(grammar, nt)
        });
        let Some(temporary) = candidate.cloned() else {
            return;
        };
        let body = grammar.alternatives(&temporary)[0].clone();
        grammar.remove_nonterminal(&temporary);

        let callers: Vec<NonTerminal> = grammar.nonterminals().cloned().collect();
        for caller in callers {
            if let Some(forms) = grammar.alternatives_mut(&caller)
                && let Some(rhs) = forms
                    .iter_mut()
                    .find(|rhs| rhs.nonterminals().any(|n| n == &temporary))
            {
                *rhs = rhs
                    .iter()
                    .fold(SentenceForm::empty(), |acc, symbol| match symbol {
                        Symbol::NonTerminal(n) if n == &temporary => acc + body.clone(),
                        _ => acc + SentenceForm::from(symbol.clone()),
                    });
                dedup_forms(forms);
                break;
            }
        }
    }
}

/// Replace `A -> T`, the only use of temporary `T`, by `T`'s alternatives.
fn contract_alternations(grammar: &mut Grammar) {
    loop {
        let uses = temporary_uses(grammar);
        let mut site = None;
        'search: for caller in grammar.nonterminals() {
            for (index, rhs) in grammar.alternatives(caller).iter().enumerate() {
                if let [Symbol::NonTerminal(t)] = rhs.symbols()
                    && t.is_temporary()
                    && t != caller
                    && uses.get(t) == Some(&1)
                    && !is_recursive(grammar, t)
                {
                    site = Some((caller.clone(), index, t.clone()));
                    break 'search;
                }
            }
        }
        let Some((caller, index, temporary)) = site else {
            return;
        };
        let body = grammar.alternatives(&temporary).to_vec();
        grammar.remove_nonterminal(&temporary);
        if let Some(forms) = grammar.alternatives_mut(&caller) {
            forms.remove(index);
            for (offset, form) in body.into_iter().enumerate() {
                forms.insert(index + offset, form);
            }
            dedup_forms(forms);
        }
    }
}

fn dedup_forms(forms: &mut Vec<SentenceForm>) {
    let mut kept: Vec<SentenceForm> = Vec::with_capacity(forms.len());
    for form in forms.drain(..) {
        if !kept.contains(&form) {
            kept.push(form);
        }
    }
    *forms = kept;
}
