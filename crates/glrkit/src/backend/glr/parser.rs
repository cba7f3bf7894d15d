//! GLR runtime over a tree of shared-prefix stacks

use crate::backend::glr::GlrConfig;
use crate::backend::glr::stack::{Branch, TreeStack};
use crate::backend::lr::TERMINATOR;
use crate::backend::{Action, ParseTable, StateId};
use crate::error::ParseError;
use crate::lexer::Token;
use crate::parser::{NullEventHandler, ParseEvent, ParseEventHandler, ParseMetrics};
use crate::syntax::{SyntaxNode, TextRange};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Instant;

/// One stack entry: the state entered and the node that entered it. The
/// bottom entry holds the initial state and no node.
#[derive(Debug, Clone)]
struct Frame {
    state: StateId,
    node: Option<Arc<SyntaxNode>>,
}

/// A successful parse.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub root: Arc<SyntaxNode>,
    pub metrics: ParseMetrics,
}

/// Executes any [`ParseTable`] against a token stream.
///
/// Cells with several actions fork the current branch; the first branch to
/// accept, in processing order, determines the tree. Within a token, branches
/// are processed depth-first: a branch runs all its reductions before the
/// next one starts, and the children of a fork run in table order.
///
/// A branch that shifts into exactly the state stack of a branch that shifted
/// earlier in the same token is dropped: from there on both would act alike,
/// and the earlier one would always win. This keeps the branch count of
/// ambiguous input bounded by the number of distinct stacks.
///
/// # Example
///
/// ```rust
/// use glrkit::backend::glr::{GlrConfig, GlrParser, GlrTable};
/// use glrkit::backend::TableBackend;
/// use glrkit::error::ParseError;
/// use glrkit::testing::{char_tokens, sample_grammar};
///
/// let table = GlrTable::build(&sample_grammar())?;
/// let parser = GlrParser::new(&table, GlrConfig::default());
///
/// let outcome = parser.parse(char_tokens("abab"))?;
/// assert_eq!(outcome.root.children().len(), 2);
///
/// let err = parser.parse(char_tokens("aba")).unwrap_err();
/// assert!(matches!(err, ParseError::Rejected { position: 3, .. }));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct GlrParser<'t, T: ParseTable + ?Sized> {
    table: &'t T,
    config: GlrConfig,
}

enum Phase {
    Shifted(Vec<Branch>),
    Accepted(Arc<SyntaxNode>),
}

struct Run<'r, T: ParseTable + ?Sized, H: ParseEventHandler + ?Sized> {
    table: &'r T,
    config: &'r GlrConfig,
    stack: TreeStack<Frame>,
    metrics: ParseMetrics,
    handler: &'r mut H,
}

impl<'t, T: ParseTable + ?Sized> GlrParser<'t, T> {
    #[must_use]
    pub const fn new(table: &'t T, config: GlrConfig) -> Self {
        Self { table, config }
    }

    #[must_use]
    pub const fn config(&self) -> &GlrConfig {
        &self.config
    }

    /// Parse `tokens`, consuming them one at a time.
    ///
    /// # Errors
    ///
    /// - [`ParseError::UnmatchedToken`] if a token satisfies no terminal
    /// - [`ParseError::Rejected`] if every branch dies
    /// - [`ParseError::BranchLimit`] / [`ParseError::ReductionLimit`] if a
    ///   [`GlrConfig`] limit is exceeded
    /// - [`ParseError::MalformedTable`] if the table is inconsistent
    /// - [`ParseError::Tree`] if the accepted root is temporary and cleaning
    ///   is enabled
    pub fn parse(&self, tokens: impl IntoIterator<Item = Token>) -> Result<ParseOutcome, ParseError> {
        self.parse_with_handler(tokens, &mut NullEventHandler)
    }

    /// Like [`parse`](Self::parse), reporting every step to `handler`.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_with_handler<H: ParseEventHandler + ?Sized>(
        &self,
        tokens: impl IntoIterator<Item = Token>,
        handler: &mut H,
    ) -> Result<ParseOutcome, ParseError> {
        let started = Instant::now();
        let mut run = Run {
            table: self.table,
            config: &self.config,
            stack: TreeStack::new(),
            metrics: ParseMetrics::default(),
            handler,
        };
        let symbols = self.table.symbols();

        let initial = run.stack.create();
        run.stack.push(
            &initial,
            Frame {
                state: self.table.initial_state(),
                node: None,
            },
        );
        run.metrics.peak_branches = 1;

        let mut live = vec![initial];
        let mut tokens = tokens.into_iter();
        let mut last_end = TextRange::default();
        let mut position = 0;
        loop {
            let token = tokens.next();
            let (terminal, range) = match &token {
                Some(token) => {
                    let Some(terminal) = symbols.match_token(token) else {
                        return Err(ParseError::UnmatchedToken {
                            token: token.clone(),
                            position,
                            range: token.range,
                        });
                    };
                    (terminal, token.range)
                }
                None => (TERMINATOR, last_end),
            };

            match run.phase(live, terminal, token.as_ref(), position)? {
                Phase::Accepted(root) => {
                    let mut metrics = run.metrics;
                    metrics.parse_time = started.elapsed();
                    return Ok(ParseOutcome { root, metrics });
                }
                Phase::Shifted(branches) if branches.is_empty() => {
                    return Err(ParseError::Rejected { position, range });
                }
                Phase::Shifted(_) if token.is_none() => {
                    return Err(ParseError::MalformedTable {
                        message: "the end of input was shifted".into(),
                    });
                }
                Phase::Shifted(branches) => {
                    live = branches;
                    run.metrics.tokens_consumed += 1;
                    last_end = TextRange::empty(range.end());
                }
            }
            position += 1;
        }
    }
}

impl<T: ParseTable + ?Sized, H: ParseEventHandler + ?Sized> Run<'_, T, H> {
    /// Drive every branch in `live` until it shifts `terminal`, dies or
    /// accepts.
    fn phase(
        &mut self,
        live: Vec<Branch>,
        terminal: u32,
        token: Option<&Token>,
        position: usize,
    ) -> Result<Phase, ParseError> {
        let mut pending: Vec<(Branch, Option<Action>)> =
            live.into_iter().rev().map(|branch| (branch, None)).collect();
        let mut shifted: Vec<Branch> = Vec::new();
        // (depth, top state) -> indices into `shifted`
        let mut shapes: HashMap<(usize, StateId), SmallVec<[usize; 1]>, ahash::RandomState> =
            HashMap::with_hasher(ahash::RandomState::new());
        let mut reductions = 0usize;

        while let Some((branch, action)) = pending.pop() {
            let action = match action {
                Some(action) => action,
                None => {
                    let state = self.top_state(&branch)?;
                    let actions = self.table.actions(state, terminal);
                    match actions.len() {
                        0 => {
                            self.kill(branch, position);
                            continue;
                        }
                        1 => actions[0],
                        _ => {
                            self.handler.handle(ParseEvent::Fork {
                                branch: branch.id(),
                                position,
                                count: actions.len(),
                            });
                            let children = self.stack.fork(branch, actions.len());
                            self.metrics.forks += 1;
                            let live = self.stack.branch_count();
                            self.metrics.peak_branches = self.metrics.peak_branches.max(live);
                            if live > self.config.max_branches {
                                return Err(ParseError::BranchLimit {
                                    limit: self.config.max_branches,
                                    position,
                                });
                            }
                            pending.extend(
                                children
                                    .into_iter()
                                    .zip(actions)
                                    .rev()
                                    .map(|(child, action)| (child, Some(action))),
                            );
                            continue;
                        }
                    }
                }
            };

            match action {
                Action::Shift(target) => {
                    let Some(token) = token else {
                        return Err(malformed("shift on the end of input"));
                    };
                    self.stack.push(
                        &branch,
                        Frame {
                            state: target,
                            node: Some(SyntaxNode::leaf(token.clone())),
                        },
                    );
                    self.handler.handle(ParseEvent::Shift {
                        branch: branch.id(),
                        position,
                        state: target,
                    });
                    let candidates = shapes.entry((self.stack.depth(&branch), target)).or_default();
                    let duplicate = candidates
                        .iter()
                        .find(|&&index| self.same_states(&shifted[index], &branch))
                        .map(|&index| shifted[index].id());
                    match duplicate {
                        Some(into) => {
                            self.handler.handle(ParseEvent::Merged {
                                branch: branch.id(),
                                into,
                                position,
                            });
                            self.stack.delete(branch);
                            self.metrics.branches_merged += 1;
                        }
                        None => {
                            candidates.push(shifted.len());
                            shifted.push(branch);
                        }
                    }
                }
                Action::Reduce(rule) => {
                    reductions += 1;
                    if reductions > self.config.max_reductions_per_token {
                        return Err(ParseError::ReductionLimit {
                            limit: self.config.max_reductions_per_token,
                            position,
                        });
                    }
                    self.metrics.reductions += 1;
                    match self.reduce(&branch, rule)? {
                        Some(state) => {
                            self.handler.handle(ParseEvent::Reduce {
                                branch: branch.id(),
                                position,
                                rule,
                                state,
                            });
                            pending.push((branch, None));
                        }
                        None => self.kill(branch, position),
                    }
                }
                Action::Accept => {
                    let Some(node) = self.stack.top(&branch).and_then(|f| f.node.clone()) else {
                        return Err(malformed("accept with no tree on the stack"));
                    };
                    self.handler.handle(ParseEvent::Accept {
                        branch: branch.id(),
                        position,
                    });
                    let root = if self.config.clean_tree {
                        node.clean()?
                    } else {
                        node
                    };
                    return Ok(Phase::Accepted(root));
                }
            }
        }
        Ok(Phase::Shifted(shifted))
    }

    /// Reduce `branch` by `rule`; `None` if the exposed state has no goto.
    fn reduce(&mut self, branch: &Branch, rule: u32) -> Result<Option<StateId>, ParseError> {
        let symbols = self.table.symbols();
        let shape = symbols
            .rule(rule)
            .ok_or_else(|| malformed(format!("unknown rule {rule}")))?;
        let nonterminal = symbols
            .nonterminal(shape.lhs)
            .ok_or_else(|| malformed(format!("rule {rule} has unknown lhs {}", shape.lhs)))?
            .clone();
        // the bottom frame is never popped
        if self.stack.depth(branch) <= shape.len as usize {
            return Err(malformed(format!("stack underflow reducing rule {rule}")));
        }
        let frames = self
            .stack
            .pop(branch, shape.len as usize)
            .ok_or_else(|| malformed(format!("stack underflow reducing rule {rule}")))?;
        let exposed = self.top_state(branch)?;
        let Some(target) = self.table.goto(exposed, shape.lhs) else {
            return Ok(None);
        };
        let children = frames.into_iter().filter_map(|frame| frame.node).collect();
        self.stack.push(
            branch,
            Frame {
                state: target,
                node: Some(SyntaxNode::interior(nonterminal, children)),
            },
        );
        Ok(Some(target))
    }

    /// Whether both branches hold the same sequence of states.
    fn same_states(&self, a: &Branch, b: &Branch) -> bool {
        let a = self.stack.history(a);
        let b = self.stack.history(b);
        a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.state == y.state)
    }

    fn top_state(&self, branch: &Branch) -> Result<StateId, ParseError> {
        self.stack
            .top(branch)
            .map(|frame| frame.state)
            .ok_or_else(|| malformed("empty branch stack"))
    }

    fn kill(&mut self, branch: Branch, position: usize) {
        self.handler.handle(ParseEvent::BranchDied {
            branch: branch.id(),
            position,
        });
        self.stack.delete(branch);
        self.metrics.branches_died += 1;
    }
}

fn malformed(message: impl Into<String>) -> ParseError {
    ParseError::MalformedTable {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TableBackend;
    use crate::backend::glr::GlrTable;
    use crate::backend::lr::CanonicalTable;
    use crate::parser::RecordingHandler;
    use crate::syntax::PrettyConfig;
    use crate::syntax::render_tagged;
    use crate::testing::{ambiguous_sum_grammar, char_tokens, sample_grammar};

    #[test]
    fn test_sample_accepts() {
        let table = GlrTable::build(&sample_grammar()).unwrap();
        let outcome = GlrParser::new(&table, GlrConfig::default())
            .parse(char_tokens("abab"))
            .unwrap();
        let root = &outcome.root;
        assert_eq!(root.nonterminal().unwrap().name(), "S");
        let texts: Vec<String> = root.children().iter().map(|c| c.text()).collect();
        assert_eq!(texts, ["ab", "ab"]);
        assert_eq!(outcome.metrics.tokens_consumed, 4);
        assert_eq!(outcome.metrics.forks, 0);
    }

    #[test]
    fn test_incomplete_input_rejected() {
        let table = GlrTable::build(&sample_grammar()).unwrap();
        let err = GlrParser::new(&table, GlrConfig::default())
            .parse(char_tokens("aba"))
            .unwrap_err();
        assert!(matches!(err, ParseError::Rejected { position: 3, .. }));
    }

    #[test]
    fn test_unknown_token() {
        let table = GlrTable::build(&sample_grammar()).unwrap();
        let err = GlrParser::new(&table, GlrConfig::default())
            .parse(char_tokens("ac"))
            .unwrap_err();
        let ParseError::UnmatchedToken { token, position, .. } = err else {
            panic!("expected unmatched token, got {err}");
        };
        assert_eq!(position, 1);
        assert_eq!(token.text, "c");
    }

    #[test]
    fn test_canonical_table_runs() {
        let table = CanonicalTable::build(&sample_grammar()).unwrap();
        let outcome = GlrParser::new(&table, GlrConfig::default())
            .parse(char_tokens("bab"))
            .unwrap();
        assert_eq!(outcome.root.text(), "bab");
    }

    #[test]
    fn test_ambiguity_first_branch_wins() {
        let table = GlrTable::build(&ambiguous_sum_grammar()).unwrap();
        let parser = GlrParser::new(&table, GlrConfig::default());
        let mut handler = RecordingHandler::new();
        let outcome = parser
            .parse_with_handler(char_tokens("n+n+n"), &mut handler)
            .unwrap();

        assert!(outcome.metrics.forks > 0);
        assert!(handler.count(|e| matches!(e, ParseEvent::Fork { .. })) > 0);
        assert_eq!(handler.count(|e| matches!(e, ParseEvent::Accept { .. })), 1);

        // shift precedes reduce in the cell, so the right-nested parse wins
        let rendered = render_tagged(&outcome.root, &PrettyConfig::compact());
        assert_eq!(
            rendered,
            "E\n  E\n    n \"n\"\n  + \"+\"\n  E\n    E\n      n \"n\"\n    + \"+\"\n    E\n      n \"n\"\n"
        );
    }

    #[test]
    fn test_duplicate_stacks_are_merged() {
        let table = GlrTable::build(&ambiguous_sum_grammar()).unwrap();
        let parser = GlrParser::new(&table, GlrConfig::default());
        let input = vec!["n"; 20].join("+");
        let mut handler = RecordingHandler::new();
        let outcome = parser.parse_with_handler(char_tokens(&input), &mut handler).unwrap();

        assert_eq!(outcome.root.text(), input);
        assert!(outcome.metrics.branches_merged > 0);
        assert_eq!(
            handler.count(|e| matches!(e, ParseEvent::Merged { .. })),
            outcome.metrics.branches_merged
        );
        // distinct stacks grow with the number of pending `E +` prefixes
        assert!(outcome.metrics.peak_branches <= 100, "{:?}", outcome.metrics);
    }

    #[test]
    fn test_merging_keeps_first_branch() {
        let table = GlrTable::build(&ambiguous_sum_grammar()).unwrap();
        let parser = GlrParser::new(&table, GlrConfig::default());
        let input = "n+n+n+n";
        let outcome = parser.parse(char_tokens(input)).unwrap();
        // shift wins every conflict: n + (n + (n + n))
        let mut node = Arc::clone(&outcome.root);
        for _ in 0..3 {
            assert_eq!(node.children().len(), 3);
            assert_eq!(node.children()[0].text(), "n");
            node = Arc::clone(&node.children()[2]);
        }
        assert_eq!(node.text(), "n");
    }

    #[test]
    fn test_branch_limit() {
        let table = GlrTable::build(&ambiguous_sum_grammar()).unwrap();
        let config = GlrConfig {
            max_branches: 1,
            ..GlrConfig::default()
        };
        let err = GlrParser::new(&table, config)
            .parse(char_tokens("n+n+n"))
            .unwrap_err();
        assert!(matches!(err, ParseError::BranchLimit { limit: 1, .. }));
    }

    #[test]
    fn test_events_trace() {
        let table = GlrTable::build(&sample_grammar()).unwrap();
        let mut handler = RecordingHandler::new();
        GlrParser::new(&table, GlrConfig::default())
            .parse_with_handler(char_tokens("bb"), &mut handler)
            .unwrap();
        assert_eq!(handler.count(|e| matches!(e, ParseEvent::Shift { .. })), 2);
        // B -> b twice, then S -> B B
        assert_eq!(handler.count(|e| matches!(e, ParseEvent::Reduce { .. })), 3);
        assert!(matches!(handler.events.last(), Some(ParseEvent::Accept { position: 2, .. })));
    }
}
