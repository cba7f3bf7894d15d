use crate::backend::lr::grammar::{IndexedGrammar, RuleDisplay, SymbolRef, TERMINATOR};
use std::fmt;

/// LR(1) item: a rule, a marker position within its right-hand side and a
/// lookahead terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub rule: u32,
    pub marker: u32,
    pub lookahead: u32,
}

impl Item {
    #[must_use]
    pub const fn new(rule: u32, marker: u32, lookahead: u32) -> Self {
        Self {
            rule,
            marker,
            lookahead,
        }
    }

    /// Whether the marker sits after the last symbol.
    #[must_use]
    pub fn is_complete(&self, grammar: &IndexedGrammar) -> bool {
        self.marker as usize >= grammar.rule(self.rule).rhs.len()
    }

    /// The symbol right after the marker, or the terminator when the marker
    /// is at the end.
    #[must_use]
    pub fn next_symbol(&self, grammar: &IndexedGrammar) -> SymbolRef {
        grammar
            .rule(self.rule)
            .rhs
            .get(self.marker as usize)
            .copied()
            .unwrap_or(SymbolRef::Terminal(TERMINATOR))
    }

    /// Symbols after the one following the marker.
    #[must_use]
    pub fn rest<'g>(&self, grammar: &'g IndexedGrammar) -> &'g [SymbolRef] {
        let rhs = &grammar.rule(self.rule).rhs;
        rhs.get(self.marker as usize + 1..).unwrap_or(&[])
    }

    /// The same item with the marker moved one symbol to the right.
    #[must_use]
    pub const fn advance(self) -> Self {
        Self {
            marker: self.marker + 1,
            ..self
        }
    }

    #[must_use]
    pub const fn display<'g>(&self, grammar: &'g IndexedGrammar) -> ItemDisplay<'g> {
        ItemDisplay {
            grammar,
            item: *self,
        }
    }
}

/// `A -> a • B, $`
pub struct ItemDisplay<'g> {
    grammar: &'g IndexedGrammar,
    item: Item,
}

impl fmt::Display for ItemDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = RuleDisplay {
            grammar: self.grammar,
            rule: self.item.rule,
            marker: Some(self.item.marker),
        };
        write!(f, "{rule}, ")?;
        self.grammar
            .display_symbol(SymbolRef::Terminal(self.item.lookahead), f)
    }
}

/// A set of items: one automaton state.
///
/// Items are kept sorted and deduplicated, so equality and hashing are
/// structural and independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut items: Vec<Item> = items.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    #[must_use]
    pub fn contains(&self, item: &Item) -> bool {
        self.items.binary_search(item).is_ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn display<'g>(&'g self, grammar: &'g IndexedGrammar) -> ItemSetDisplay<'g> {
        ItemSetDisplay { grammar, set: self }
    }
}

/// One item per line.
pub struct ItemSetDisplay<'g> {
    grammar: &'g IndexedGrammar,
    set: &'g ItemSet,
}

impl fmt::Display for ItemSetDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.set.items {
            writeln!(f, "{}", item.display(self.grammar))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, NonTerminal};
    use crate::sentence;

    fn grammar() -> IndexedGrammar {
        let mut grammar = Grammar::new(NonTerminal::new("S"));
        grammar.add_rule(NonTerminal::new("S"), sentence!['a', B]);
        grammar.add_rule(NonTerminal::new("B"), sentence!['b']);
        IndexedGrammar::new(&grammar).unwrap()
    }

    #[test]
    fn test_item_set_is_structural() {
        let a = ItemSet::new([Item::new(1, 0, 0), Item::new(2, 1, 0)]);
        let b = ItemSet::new([Item::new(2, 1, 0), Item::new(1, 0, 0), Item::new(1, 0, 0)]);
        assert_eq!(a, b);
        assert_eq!(b.len(), 2);
        assert!(a.contains(&Item::new(2, 1, 0)));
    }

    #[test]
    fn test_next_symbol() {
        let grammar = grammar();
        let item = Item::new(1, 1, TERMINATOR);
        assert_eq!(item.next_symbol(&grammar), SymbolRef::NonTerminal(2));
        let done = item.advance();
        assert!(done.is_complete(&grammar));
        assert_eq!(done.next_symbol(&grammar), SymbolRef::Terminal(TERMINATOR));
        assert!(done.rest(&grammar).is_empty());
    }

    #[test]
    fn test_item_display() {
        let grammar = grammar();
        assert_eq!(
            Item::new(1, 1, TERMINATOR).display(&grammar).to_string(),
            "S -> a • B, $"
        );
        assert_eq!(
            Item::new(2, 1, TERMINATOR).display(&grammar).to_string(),
            "B -> b •, $"
        );
    }
}
