use crate::grammar::{NonTerminal, Symbol, Terminal};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Add;

/// An ordered sequence of symbols: the right-hand side of a rule.
///
/// The empty form is the single representation of ε.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SentenceForm(SmallVec<[Symbol; 4]>);

impl SentenceForm {
    #[must_use]
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self(symbols.into_iter().collect())
    }

    /// The empty sentence ε.
    #[must_use]
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    #[must_use]
    pub fn terminal(terminal: Terminal) -> Self {
        Self::new([Symbol::Terminal(terminal)])
    }

    #[must_use]
    pub fn nonterminal(nonterminal: NonTerminal) -> Self {
        Self::new([Symbol::NonTerminal(nonterminal)])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.0.iter()
    }

    /// `self` followed by `other`.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let mut symbols = self.0.clone();
        symbols.extend(other.0.iter().cloned());
        Self(symbols)
    }

    /// `self` repeated `count` times; zero repetitions give ε.
    #[must_use]
    pub fn repeat(&self, count: usize) -> Self {
        let mut symbols = SmallVec::with_capacity(self.0.len() * count);
        for _ in 0..count {
            symbols.extend(self.0.iter().cloned());
        }
        Self(symbols)
    }

    pub fn push(&mut self, symbol: impl Into<Symbol>) {
        self.0.push(symbol.into());
    }

    /// Nonterminals appearing in this form, in order, with repeats.
    pub fn nonterminals(&self) -> impl Iterator<Item = &NonTerminal> {
        self.0.iter().filter_map(Symbol::as_nonterminal)
    }
}

impl Add for SentenceForm {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.0.extend(rhs.0);
        self
    }
}

impl From<Symbol> for SentenceForm {
    fn from(symbol: Symbol) -> Self {
        Self::new([symbol])
    }
}

impl From<Terminal> for SentenceForm {
    fn from(terminal: Terminal) -> Self {
        Self::terminal(terminal)
    }
}

impl From<NonTerminal> for SentenceForm {
    fn from(nonterminal: NonTerminal) -> Self {
        Self::nonterminal(nonterminal)
    }
}

impl FromIterator<Symbol> for SentenceForm {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a SentenceForm {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for SentenceForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("ε");
        }
        for (i, symbol) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

/// "`lhs` derives `rhs`"
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionRule {
    pub lhs: NonTerminal,
    pub rhs: SentenceForm,
}

impl ProductionRule {
    #[must_use]
    pub const fn new(lhs: NonTerminal, rhs: SentenceForm) -> Self {
        Self { lhs, rhs }
    }
}

impl fmt::Display for ProductionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs)
    }
}

/// Build a [`SentenceForm`] from terminal kinds (written `'kind'`) and
/// nonterminal names.
///
/// ```
/// use glrkit::sentence;
///
/// let form = sentence!['a', B, 'c'];
/// assert_eq!(form.to_string(), "a B c");
/// ```
#[macro_export]
macro_rules! sentence {
    () => { $crate::grammar::SentenceForm::empty() };
    ($($item:tt),+ $(,)?) => {
        $crate::grammar::SentenceForm::new([$($crate::__sentence_symbol!($item)),+])
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sentence_symbol {
    ($kind:literal) => {
        $crate::grammar::Symbol::Terminal($crate::grammar::Terminal::kind(
            ::std::string::ToString::to_string(&$kind),
        ))
    };
    ($name:ident) => {
        $crate::grammar::Symbol::NonTerminal($crate::grammar::NonTerminal::new(stringify!($name)))
    };
}
