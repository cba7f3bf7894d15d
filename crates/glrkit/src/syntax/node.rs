use crate::error::SyntaxError;
use crate::grammar::NonTerminal;
use crate::lexer::Token;
use crate::syntax::TextRange;
use crate::syntax::pretty::{PrettyConfig, render_tagged};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A node of the syntax tree produced by the GLR runtime.
///
/// Nodes are immutable and shared through [`Arc`], so subtrees built on a
/// stack prefix common to several branches are never copied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum SyntaxNode {
    /// A shifted token
    Leaf(Token),
    /// A reduced rule, children in source order
    Interior {
        nonterminal: NonTerminal,
        children: Vec<Arc<SyntaxNode>>,
    },
}

impl SyntaxNode {
    #[must_use]
    pub fn leaf(token: Token) -> Arc<Self> {
        Arc::new(Self::Leaf(token))
    }

    #[must_use]
    pub fn interior(nonterminal: NonTerminal, children: Vec<Arc<Self>>) -> Arc<Self> {
        Arc::new(Self::Interior {
            nonterminal,
            children,
        })
    }

    #[inline]
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    #[must_use]
    pub const fn token(&self) -> Option<&Token> {
        match self {
            Self::Leaf(token) => Some(token),
            Self::Interior { .. } => None,
        }
    }

    #[must_use]
    pub const fn nonterminal(&self) -> Option<&NonTerminal> {
        match self {
            Self::Leaf(_) => None,
            Self::Interior { nonterminal, .. } => Some(nonterminal),
        }
    }

    #[must_use]
    pub fn children(&self) -> &[Arc<Self>] {
        match self {
            Self::Leaf(_) => &[],
            Self::Interior { children, .. } => children,
        }
    }

    /// Whether this is an interior node of a temporary nonterminal.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.nonterminal().is_some_and(NonTerminal::is_temporary)
    }

    /// Tokens under this node, left to right.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Token> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf(token) => leaves.push(token),
                Self::Interior { children, .. } => {
                    stack.extend(children.iter().rev().map(AsRef::as_ref));
                }
            }
        }
        leaves
    }

    /// Range covering every token under this node; `None` for a node that
    /// derived the empty string.
    #[must_use]
    pub fn span(&self) -> Option<TextRange> {
        self.leaves()
            .into_iter()
            .map(|token| token.range)
            .reduce(TextRange::cover)
    }

    /// Concatenated text of the tokens under this node.
    ///
    /// Text between tokens that the tokenizer dropped (whitespace, comments)
    /// is not included; see [`source_text`](Self::source_text).
    #[must_use]
    pub fn text(&self) -> String {
        self.leaves().into_iter().map(|token| token.text.as_str()).collect()
    }

    /// The slice of `source` this node spans, including anything between
    /// its tokens.
    #[must_use]
    pub fn source_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        self.span()?.slice(source)
    }

    /// Whether no node in this subtree is temporary.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_temporary() {
                return false;
            }
            stack.extend(node.children().iter().map(AsRef::as_ref));
        }
        true
    }

    /// Splice out every temporary node below `self`, promoting its children
    /// into its parent's child list at the same position.
    ///
    /// Untouched subtrees are shared with the input. Cleaning a clean tree
    /// returns it unchanged. Runs in one pass with an explicit stack, so
    /// arbitrarily deep trees are fine.
    ///
    /// # Errors
    ///
    /// [`SyntaxError::TemporaryRoot`] if `self` is itself temporary: it has no
    /// parent to splice into.
    pub fn clean(self: &Arc<Self>) -> Result<Arc<Self>, SyntaxError> {
        if let Self::Interior { nonterminal, .. } = self.as_ref()
            && nonterminal.is_temporary()
        {
            return Err(SyntaxError::TemporaryRoot(nonterminal.clone()));
        }

        let mut stack = vec![CleanFrame::new(self)];
        loop {
            let Some(frame) = stack.last_mut() else {
                return Ok(Arc::clone(self));
            };
            match frame.next_child() {
                Some(child) if child.is_temporary() => {
                    frame.changed = true;
                    frame.cursors.push(child.children().iter());
                }
                Some(child) if child.is_leaf() => frame.out.push(Arc::clone(child)),
                Some(child) => stack.push(CleanFrame::new(child)),
                None => {
                    let Some(done) = stack.pop() else {
                        return Ok(Arc::clone(self));
                    };
                    let (node, changed) = done.finish();
                    match stack.last_mut() {
                        Some(parent) => {
                            parent.changed |= changed;
                            parent.out.push(node);
                        }
                        None => return Ok(node),
                    }
                }
            }
        }
    }
}

/// A non-temporary interior node being rebuilt by [`SyntaxNode::clean`].
/// `cursors` holds its own child list plus those of spliced temporaries.
struct CleanFrame<'a> {
    node: &'a Arc<SyntaxNode>,
    cursors: Vec<std::slice::Iter<'a, Arc<SyntaxNode>>>,
    out: Vec<Arc<SyntaxNode>>,
    changed: bool,
}

impl<'a> CleanFrame<'a> {
    fn new(node: &'a Arc<SyntaxNode>) -> Self {
        let children = node.children();
        Self {
            node,
            cursors: vec![children.iter()],
            out: Vec::with_capacity(children.len()),
            changed: false,
        }
    }

    fn next_child(&mut self) -> Option<&'a Arc<SyntaxNode>> {
        loop {
            let cursor = self.cursors.last_mut()?;
            match cursor.next() {
                Some(child) => return Some(child),
                None => {
                    self.cursors.pop();
                }
            }
        }
    }

    fn finish(self) -> (Arc<SyntaxNode>, bool) {
        match self.node.as_ref() {
            SyntaxNode::Interior { nonterminal, .. } if self.changed => {
                (SyntaxNode::interior(nonterminal.clone(), self.out), true)
            }
            _ => (Arc::clone(self.node), false),
        }
    }
}

impl Drop for SyntaxNode {
    // unlinks children onto a heap stack so deep trees do not recurse
    fn drop(&mut self) {
        let Self::Interior { children, .. } = self else {
            return;
        };
        let mut stack = std::mem::take(children);
        while let Some(node) = stack.pop() {
            if let Some(mut node) = Arc::into_inner(node)
                && let Self::Interior { children, .. } = &mut node
            {
                stack.append(children);
            }
        }
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_tagged(self, &PrettyConfig::default()))
    }
}
