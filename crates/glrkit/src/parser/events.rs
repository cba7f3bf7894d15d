use crate::backend::StateId;
use std::time::Duration;

/// A step taken by the GLR runtime, for debugging and tracing.
///
/// `branch` is the arena id of the branch's leaf; ids of dead branches are
/// reused. `position` is the index of the token being processed, equal to
/// the token count while processing the end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseEvent {
    /// A branch consumed the current token and entered `state`
    Shift {
        branch: usize,
        position: usize,
        state: StateId,
    },
    /// A branch reduced by `rule` and went to `state`
    Reduce {
        branch: usize,
        position: usize,
        rule: u32,
        state: StateId,
    },
    /// A branch split to follow `count` actions
    Fork {
        branch: usize,
        position: usize,
        count: usize,
    },
    /// A branch had no action, or no goto after a reduction
    BranchDied { branch: usize, position: usize },
    /// A branch shifted into the same state stack as the earlier branch
    /// `into` and was dropped in its favor
    Merged {
        branch: usize,
        into: usize,
        position: usize,
    },
    /// A branch accepted the input
    Accept { branch: usize, position: usize },
}

/// Receives [`ParseEvent`]s while a parse runs.
pub trait ParseEventHandler {
    fn handle(&mut self, event: ParseEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventHandler;

impl ParseEventHandler for NullEventHandler {
    fn handle(&mut self, _event: ParseEvent) {}
}

/// Keeps every event in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    pub events: Vec<ParseEvent>,
}

impl RecordingHandler {
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&ParseEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

impl ParseEventHandler for RecordingHandler {
    fn handle(&mut self, event: ParseEvent) {
        self.events.push(event);
    }
}

/// Counters collected over one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseMetrics {
    /// Tokens shifted by at least one branch, the end of input excluded
    pub tokens_consumed: usize,
    pub reductions: usize,
    /// Fork operations (not branches created)
    pub forks: usize,
    pub branches_died: usize,
    /// Branches dropped as duplicates of an earlier branch's stack
    pub branches_merged: usize,
    /// Largest number of simultaneously live branches
    pub peak_branches: usize,
    pub parse_time: Duration,
}

impl ParseMetrics {
    /// Merge counters from another parse.
    pub fn merge(&mut self, other: &Self) {
        self.tokens_consumed += other.tokens_consumed;
        self.reductions += other.reductions;
        self.forks += other.forks;
        self.branches_died += other.branches_died;
        self.branches_merged += other.branches_merged;
        self.peak_branches = self.peak_branches.max(other.peak_branches);
        self.parse_time += other.parse_time;
    }
}
