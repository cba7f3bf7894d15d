use crate::grammar::{NonTerminal, ProductionRule, SentenceForm, Symbol, Terminal};
use hashbrown::{HashMap, HashSet};
use std::fmt;

/// A context-free grammar: production rules indexed by left-hand side, plus
/// the initial nonterminal.
///
/// Rules of one nonterminal form a set; adding a duplicate is a no-op. All
/// iteration (nonterminals, rules, terminals) follows insertion order so that
/// everything derived from a grammar, down to state numbering, is
/// reproducible.
///
/// # Example
///
/// ```rust
/// use glrkit::grammar::{Grammar, NonTerminal};
/// use glrkit::sentence;
///
/// // S -> B B ; B -> b | a B
/// let mut grammar = Grammar::new(NonTerminal::new("S"));
/// grammar.add_rule(NonTerminal::new("S"), sentence![B, B]);
/// grammar.add_alternatives(NonTerminal::new("B"), [sentence!['b'], sentence!['a', B]]);
///
/// assert_eq!(grammar.rule_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Grammar {
    initial: NonTerminal,
    rules: HashMap<NonTerminal, Vec<SentenceForm>, ahash::RandomState>,
    order: Vec<NonTerminal>,
}

impl Grammar {
    #[must_use]
    pub fn new(initial: NonTerminal) -> Self {
        Self {
            initial,
            rules: HashMap::with_hasher(ahash::RandomState::new()),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub const fn initial(&self) -> &NonTerminal {
        &self.initial
    }

    pub fn set_initial(&mut self, initial: NonTerminal) {
        self.initial = initial;
    }

    /// Add `lhs -> rhs`. Returns `false` if the rule was already present.
    pub fn add_rule(&mut self, lhs: NonTerminal, rhs: SentenceForm) -> bool {
        match self.rules.get_mut(&lhs) {
            Some(forms) => {
                if forms.contains(&rhs) {
                    return false;
                }
                forms.push(rhs);
            }
            None => {
                self.order.push(lhs.clone());
                self.rules.insert(lhs, vec![rhs]);
            }
        }
        true
    }

    pub fn add_production(&mut self, rule: ProductionRule) -> bool {
        self.add_rule(rule.lhs, rule.rhs)
    }

    /// Add one rule `lhs -> form` per alternative.
    pub fn add_alternatives(
        &mut self,
        lhs: NonTerminal,
        alternatives: impl IntoIterator<Item = SentenceForm>,
    ) {
        for rhs in alternatives {
            self.add_rule(lhs.clone(), rhs);
        }
    }

    /// Add every rule of `other`. Its initial symbol is ignored.
    pub fn extend(&mut self, other: Self) {
        let Self {
            mut rules, order, ..
        } = other;
        for lhs in order {
            if let Some(forms) = rules.remove(&lhs) {
                self.add_alternatives(lhs, forms);
            }
        }
    }

    /// Right-hand sides of `nonterminal`, empty if it has no rules.
    #[must_use]
    pub fn alternatives(&self, nonterminal: &NonTerminal) -> &[SentenceForm] {
        self.rules.get(nonterminal).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_defined(&self, nonterminal: &NonTerminal) -> bool {
        self.rules.contains_key(nonterminal)
    }

    /// Nonterminals with at least one rule, in insertion order.
    pub fn nonterminals(&self) -> impl Iterator<Item = &NonTerminal> {
        self.order.iter()
    }

    /// Every rule as `(lhs, rhs)`, grouped by nonterminal in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = (&NonTerminal, &SentenceForm)> {
        self.order.iter().flat_map(move |lhs| {
            self.alternatives(lhs).iter().map(move |rhs| (lhs, rhs))
        })
    }

    #[must_use]
    pub fn productions(&self) -> Vec<ProductionRule> {
        self.rules()
            .map(|(lhs, rhs)| ProductionRule::new(lhs.clone(), rhs.clone()))
            .collect()
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Distinct terminals in order of first appearance.
    #[must_use]
    pub fn terminals(&self) -> Vec<Terminal> {
        let mut seen = HashSet::with_hasher(ahash::RandomState::new());
        let mut terminals = Vec::new();
        for (_, rhs) in self.rules() {
            for symbol in rhs {
                if let Symbol::Terminal(t) = symbol
                    && seen.insert(t)
                {
                    terminals.push(t.clone());
                }
            }
        }
        terminals
    }

    /// Nonterminals referenced on some right-hand side without rules of
    /// their own.
    #[must_use]
    pub fn undefined_nonterminals(&self) -> Vec<NonTerminal> {
        let mut seen = HashSet::with_hasher(ahash::RandomState::new());
        let mut undefined = Vec::new();
        for (_, rhs) in self.rules() {
            for nt in rhs.nonterminals() {
                if !self.is_defined(nt) && seen.insert(nt) {
                    undefined.push(nt.clone());
                }
            }
        }
        undefined
    }

    /// Keep only the rules for which `keep` returns `true`; nonterminals left
    /// without rules are dropped.
    pub(crate) fn retain_rules(&mut self, mut keep: impl FnMut(&NonTerminal, &SentenceForm) -> bool) {
        for lhs in &self.order {
            if let Some(forms) = self.rules.get_mut(lhs) {
                forms.retain(|rhs| keep(lhs, rhs));
            }
        }
        self.rules.retain(|_, forms| !forms.is_empty());
        let rules = &self.rules;
        self.order.retain(|lhs| rules.contains_key(lhs));
    }

    pub(crate) fn alternatives_mut(&mut self, nonterminal: &NonTerminal) -> Option<&mut Vec<SentenceForm>> {
        self.rules.get_mut(nonterminal)
    }

    /// Drop `nonterminal` and all of its rules. Rules referring to it stay.
    pub(crate) fn remove_nonterminal(&mut self, nonterminal: &NonTerminal) {
        if self.rules.remove(nonterminal).is_some() {
            self.order.retain(|lhs| lhs != nonterminal);
        }
    }

    /// Rewrite every right-hand side through `rename`, then drop rules that
    /// became duplicates.
    pub(crate) fn rename_symbols(&mut self, rename: &HashMap<NonTerminal, NonTerminal, ahash::RandomState>) {
        if rename.is_empty() {
            return;
        }
        for forms in self.rules.values_mut() {
            let mut renamed: Vec<SentenceForm> = Vec::with_capacity(forms.len());
            for rhs in forms.drain(..) {
                let rhs: SentenceForm = rhs
                    .iter()
                    .map(|symbol| match symbol {
                        Symbol::NonTerminal(nt) => {
                            Symbol::NonTerminal(rename.get(nt).unwrap_or(nt).clone())
                        }
                        Symbol::Terminal(_) => symbol.clone(),
                    })
                    .collect();
                if !renamed.contains(&rhs) {
                    renamed.push(rhs);
                }
            }
            *forms = renamed;
        }
        if let Some(initial) = rename.get(&self.initial) {
            self.initial = initial.clone();
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (lhs, rhs) in self.rules() {
            writeln!(f, "{lhs} -> {rhs}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence;

    fn nt(name: &str) -> NonTerminal {
        NonTerminal::new(name)
    }

    #[test]
    fn test_rules_are_a_set() {
        let mut grammar = Grammar::new(nt("S"));
        assert!(grammar.add_rule(nt("S"), sentence!['a']));
        assert!(!grammar.add_rule(nt("S"), sentence!['a']));
        assert_eq!(grammar.rule_count(), 1);
    }

    #[test]
    fn test_iteration_order() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(nt("S"), sentence![B, 'c']);
        grammar.add_rule(nt("B"), sentence!['b']);
        grammar.add_rule(nt("S"), sentence!['a']);

        let names: Vec<_> = grammar.nonterminals().map(NonTerminal::name).collect();
        assert_eq!(names, ["S", "B"]);
        assert_eq!(
            grammar.to_string(),
            "S -> B c\nS -> a\nB -> b\n"
        );
        assert_eq!(
            grammar.terminals(),
            [Terminal::kind("c"), Terminal::kind("a"), Terminal::kind("b")]
        );
    }

    #[test]
    fn test_undefined_nonterminals() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(nt("S"), sentence![X, Y]);
        grammar.add_rule(nt("Y"), sentence!['y']);
        assert_eq!(grammar.undefined_nonterminals(), [nt("X")]);
    }

    #[test]
    fn test_retain_drops_empty_nonterminals() {
        let mut grammar = Grammar::new(nt("S"));
        grammar.add_rule(nt("S"), sentence![B]);
        grammar.add_rule(nt("B"), sentence!['b']);
        grammar.retain_rules(|lhs, _| lhs.name() != "B");
        assert!(!grammar.is_defined(&nt("B")));
        assert_eq!(grammar.nonterminals().count(), 1);
    }
}
