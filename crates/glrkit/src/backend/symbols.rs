use crate::grammar::{LexemeKind, NonTerminal, Refinement, Terminal};
use crate::lexer::Token;
use hashbrown::HashMap;

/// Shape of a rule as the runtime sees it: what to push, how much to pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleShape {
    pub lhs: u32,
    pub len: u32,
}

/// Index-ordered symbols and rule shapes of a table, plus token matching.
///
/// Terminal 0 is always [`Terminal::Terminator`].
#[derive(Debug, Clone)]
pub struct SymbolTable {
    lexemes: Vec<LexemeKind>,
    terminals: Vec<Terminal>,
    nonterminals: Vec<NonTerminal>,
    rules: Vec<RuleShape>,
    /// Candidate terminals per lexeme kind: literals, then patterns, then the
    /// unrefined terminal
    candidates: HashMap<LexemeKind, Vec<u32>, ahash::RandomState>,
}

impl SymbolTable {
    #[must_use]
    pub fn new(terminals: Vec<Terminal>, nonterminals: Vec<NonTerminal>, rules: Vec<RuleShape>) -> Self {
        let mut lexemes: Vec<LexemeKind> = Vec::new();
        for kind in terminals.iter().filter_map(Terminal::lexeme_kind) {
            if !lexemes.contains(kind) {
                lexemes.push(kind.clone());
            }
        }

        let mut candidates: HashMap<LexemeKind, Vec<u32>, ahash::RandomState> = HashMap::default();
        for (id, terminal) in (0u32..).zip(&terminals) {
            if let Some(kind) = terminal.lexeme_kind() {
                candidates.entry(kind.clone()).or_default().push(id);
            }
        }
        for ids in candidates.values_mut() {
            ids.sort_by_key(|&id| {
                let priority = match terminals[id as usize].refinement() {
                    Some(Refinement::Literal(_)) => 0,
                    Some(Refinement::Pattern(_)) => 1,
                    None => 2,
                };
                (priority, id)
            });
        }

        Self {
            lexemes,
            terminals,
            nonterminals,
            rules,
            candidates,
        }
    }

    /// Distinct lexeme kinds in order of first use by a terminal.
    #[must_use]
    pub fn lexemes(&self) -> &[LexemeKind] {
        &self.lexemes
    }

    #[must_use]
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    #[must_use]
    pub fn nonterminals(&self) -> &[NonTerminal] {
        &self.nonterminals
    }

    #[must_use]
    pub fn rules(&self) -> &[RuleShape] {
        &self.rules
    }

    #[must_use]
    pub fn terminal(&self, id: u32) -> Option<&Terminal> {
        self.terminals.get(id as usize)
    }

    #[must_use]
    pub fn nonterminal(&self, id: u32) -> Option<&NonTerminal> {
        self.nonterminals.get(id as usize)
    }

    #[must_use]
    pub fn rule(&self, id: u32) -> Option<RuleShape> {
        self.rules.get(id as usize).copied()
    }

    #[must_use]
    pub fn terminal_count(&self) -> u32 {
        u32::try_from(self.terminals.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn nonterminal_count(&self) -> u32 {
        u32::try_from(self.nonterminals.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn lexeme_index(&self, kind: &LexemeKind) -> Option<u32> {
        self.lexemes
            .iter()
            .position(|k| k == kind)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// The terminal `token` satisfies: an exact literal first, then a
    /// pattern, then the plain lexeme kind. `None` if nothing matches.
    #[must_use]
    pub fn match_token(&self, token: &Token) -> Option<u32> {
        self.candidates
            .get(&token.kind)?
            .iter()
            .copied()
            .find(|&id| self.terminals[id as usize].matches(token))
    }
}

impl PartialEq for SymbolTable {
    fn eq(&self, other: &Self) -> bool {
        self.terminals == other.terminals
            && self.nonterminals == other.nonterminals
            && self.rules == other.rules
    }
}

impl Eq for SymbolTable {}
