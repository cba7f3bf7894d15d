//! Canonical LR(1) collection of item sets.

use crate::backend::StateId;
use crate::backend::lr::grammar::{AUGMENTED_RULE, IndexedGrammar, SymbolRef, TERMINATOR};
use crate::backend::lr::item::{Item, ItemSet};
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;

/// The LR(1) automaton: states are item sets, edges are `Go` transitions.
///
/// Built by [`Automaton::initialize`], which explores breadth-first from the
/// closure of `S' -> • S, $`. State 0 is always that initial state. The
/// closure memo, keyed by seed items, is dropped once exploration finishes.
#[derive(Debug, Clone)]
pub struct Automaton {
    grammar: IndexedGrammar,
    states: Vec<ItemSet>,
    transitions: Vec<Vec<(SymbolRef, StateId)>>,
    by_kernel: HashMap<Vec<Item>, StateId, ahash::RandomState>,
    by_items: HashMap<ItemSet, StateId, ahash::RandomState>,
}

impl Automaton {
    #[must_use]
    pub fn new(grammar: IndexedGrammar) -> Self {
        Self {
            grammar,
            states: Vec::new(),
            transitions: Vec::new(),
            by_kernel: HashMap::with_hasher(ahash::RandomState::new()),
            by_items: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Build the full canonical collection for `grammar`.
    #[must_use]
    pub fn build(grammar: IndexedGrammar) -> Self {
        let mut automaton = Self::new(grammar);
        automaton.initialize();
        automaton
    }

    #[must_use]
    pub const fn grammar(&self) -> &IndexedGrammar {
        &self.grammar
    }

    #[must_use]
    pub fn states(&self) -> &[ItemSet] {
        &self.states
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &ItemSet {
        &self.states[id as usize]
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Outgoing edges of `state` in discovery order.
    #[must_use]
    pub fn transitions(&self, state: StateId) -> &[(SymbolRef, StateId)] {
        self.transitions
            .get(state as usize)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn transition(&self, state: StateId, symbol: SymbolRef) -> Option<StateId> {
        self.transitions(state)
            .iter()
            .find_map(|(s, target)| (*s == symbol).then_some(*target))
    }

    /// Saturate `seed` and return the state it denotes, creating it if no
    /// equal item set exists yet.
    ///
    /// For every item `A -> α • B β, a` an item `B -> • γ, b` is added for
    /// each rule of `B` and each `b` in FIRST(β a).
    pub fn closure(&mut self, seed: impl IntoIterator<Item = Item>) -> StateId {
        let mut kernel: Vec<Item> = seed.into_iter().collect();
        kernel.sort_unstable();
        kernel.dedup();
        if let Some(&id) = self.by_kernel.get(&kernel) {
            return id;
        }

        let mut items: HashSet<Item, ahash::RandomState> = kernel.iter().copied().collect();
        let mut work = kernel.clone();
        while let Some(item) = work.pop() {
            if item.is_complete(&self.grammar) {
                continue;
            }
            let SymbolRef::NonTerminal(nt) = item.next_symbol(&self.grammar) else {
                continue;
            };
            let lookaheads = self
                .grammar
                .first_with_lookahead(item.rest(&self.grammar), item.lookahead);
            for &rule in self.grammar.rules_of(nt) {
                for &lookahead in &lookaheads {
                    let expanded = Item::new(rule, 0, lookahead);
                    if items.insert(expanded) {
                        work.push(expanded);
                    }
                }
            }
        }

        let set = ItemSet::new(items);
        let id = match self.by_items.get(&set) {
            Some(&id) => id,
            None => {
                let id = StateId::try_from(self.states.len()).unwrap_or(StateId::MAX);
                self.states.push(set.clone());
                self.transitions.push(Vec::new());
                self.by_items.insert(set, id);
                id
            }
        };
        self.by_kernel.insert(kernel, id);
        id
    }

    /// Advance the marker over `symbol` in every item of `state` that allows
    /// it, and close the result. `None` if no item of `state` expects
    /// `symbol`.
    pub fn go(&mut self, state: StateId, symbol: SymbolRef) -> Option<StateId> {
        let grammar = &self.grammar;
        let seed: Vec<Item> = self.states[state as usize]
            .iter()
            .filter(|item| !item.is_complete(grammar) && item.next_symbol(grammar) == symbol)
            .map(|item| item.advance())
            .collect();
        if seed.is_empty() {
            return None;
        }
        Some(self.closure(seed))
    }

    /// Discover every reachable state breadth-first from the initial item
    /// set, recording each `Go` edge.
    pub fn initialize(&mut self) {
        if !self.states.is_empty() {
            return;
        }
        let initial = self.closure([Item::new(AUGMENTED_RULE, 0, TERMINATOR)]);
        let mut queue = VecDeque::from([initial]);
        let mut visited: HashSet<StateId, ahash::RandomState> = HashSet::default();
        visited.insert(initial);

        while let Some(state) = queue.pop_front() {
            let mut symbols: Vec<SymbolRef> = Vec::new();
            for item in self.states[state as usize].iter() {
                if !item.is_complete(&self.grammar) {
                    let symbol = item.next_symbol(&self.grammar);
                    if !symbols.contains(&symbol) {
                        symbols.push(symbol);
                    }
                }
            }
            for symbol in symbols {
                let Some(target) = self.go(state, symbol) else {
                    continue;
                };
                self.transitions[state as usize].push((symbol, target));
                if visited.insert(target) {
                    queue.push_back(target);
                }
            }
        }

        self.by_kernel = HashMap::default();
    }
}
