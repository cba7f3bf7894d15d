//! Tree of shared-prefix stacks for GLR branches.
//!
//! Every live branch is a leaf of a tree of segments stored in an arena and
//! linked by index. A branch's stack is the concatenation of the segments on
//! the path from its root down to its leaf, so forked branches share their
//! common history without copying it.
//!
//! Invariants maintained by every operation:
//!
//! - branches are exactly the leaves;
//! - every interior segment has at least two children (a segment left with a
//!   single child is merged into it).

use smallvec::SmallVec;

/// Handle to one live branch.
///
/// Not `Clone`: [`TreeStack::fork`] and [`TreeStack::delete`] consume it, so a
/// handle never outlives its branch.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Branch(usize);

impl Branch {
    /// Arena index of the branch's leaf segment.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Segment<V> {
    parent: Option<usize>,
    children: SmallVec<[usize; 2]>,
    values: Vec<V>,
    live: bool,
}

impl<V> Segment<V> {
    fn empty(parent: Option<usize>) -> Self {
        Self {
            parent,
            children: SmallVec::new(),
            values: Vec::new(),
            live: true,
        }
    }
}

/// A forest of stacks sharing common prefixes.
///
/// # Example
///
/// ```
/// use glrkit::backend::glr::TreeStack;
///
/// let mut stack = TreeStack::new();
/// let root = stack.create();
/// stack.push(&root, 1);
/// stack.push(&root, 2);
///
/// let mut branches = stack.fork(root, 2);
/// let right = branches.pop().unwrap();
/// let left = branches.pop().unwrap();
/// stack.push(&left, 3);
/// assert_eq!(stack.pop(&right, 1), Some(vec![2]));
///
/// assert_eq!(stack.history(&left), [&1, &2, &3]);
/// assert_eq!(stack.history(&right), [&1]);
/// assert_eq!(stack.branch_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TreeStack<V> {
    segments: Vec<Segment<V>>,
    free: Vec<usize>,
    branches: usize,
}

impl<V> Default for TreeStack<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TreeStack<V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
            free: Vec::new(),
            branches: 0,
        }
    }

    /// Start a new, empty stack with no shared history.
    pub fn create(&mut self) -> Branch {
        self.branches += 1;
        Branch(self.allocate(None))
    }

    /// Number of live branches.
    #[must_use]
    pub const fn branch_count(&self) -> usize {
        self.branches
    }

    /// Number of live segments without children, computed from the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.live && s.children.is_empty())
            .count()
    }

    /// Number of live segments, interior ones included.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.iter().filter(|s| s.live).count()
    }

    pub fn push(&mut self, branch: &Branch, value: V) {
        self.segments[branch.0].values.push(value);
    }

    /// The most recently pushed value of `branch`.
    #[must_use]
    pub fn top(&self, branch: &Branch) -> Option<&V> {
        let mut cursor = Some(branch.0);
        while let Some(id) = cursor {
            let segment = &self.segments[id];
            if let Some(value) = segment.values.last() {
                return Some(value);
            }
            cursor = segment.parent;
        }
        None
    }

    /// Number of values on `branch`'s stack.
    #[must_use]
    pub fn depth(&self, branch: &Branch) -> usize {
        self.path(branch.0)
            .map(|id| self.segments[id].values.len())
            .sum()
    }

    /// All values of `branch`, oldest first.
    #[must_use]
    pub fn history(&self, branch: &Branch) -> Vec<&V> {
        let mut path: Vec<usize> = self.path(branch.0).collect();
        path.reverse();
        path.into_iter()
            .flat_map(|id| self.segments[id].values.iter())
            .collect()
    }

    /// Split `branch` into `count` branches sharing its history.
    ///
    /// A count of 1 returns the branch itself; a count of 0 deletes it.
    pub fn fork(&mut self, branch: Branch, count: usize) -> Vec<Branch> {
        match count {
            0 => {
                self.delete(branch);
                Vec::new()
            }
            1 => vec![branch],
            _ => {
                let parent = branch.0;
                let children: Vec<Branch> = (0..count)
                    .map(|_| Branch(self.allocate(Some(parent))))
                    .collect();
                self.segments[parent].children = children.iter().map(|b| b.0).collect();
                self.branches += count - 1;
                children
            }
        }
    }

    /// Remove `branch`, releasing every segment only it was using.
    pub fn delete(&mut self, branch: Branch) {
        self.branches -= 1;
        let mut dead = branch.0;
        loop {
            let parent = self.segments[dead].parent;
            self.release(dead);
            let Some(parent) = parent else {
                return;
            };
            self.segments[parent].children.retain(|c| *c != dead);
            match self.segments[parent].children.len() {
                0 => dead = parent,
                1 => {
                    self.collapse(parent);
                    return;
                }
                _ => return,
            }
        }
    }

    fn path(&self, leaf: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(leaf), |id| self.segments[*id].parent)
    }

    fn allocate(&mut self, parent: Option<usize>) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.segments[id] = Segment::empty(parent);
                id
            }
            None => {
                self.segments.push(Segment::empty(parent));
                self.segments.len() - 1
            }
        }
    }

    fn release(&mut self, id: usize) {
        let segment = &mut self.segments[id];
        segment.live = false;
        segment.values = Vec::new();
        segment.children.clear();
        segment.parent = None;
        self.free.push(id);
    }

    /// Merge `id`, which has exactly one child, into that child.
    fn collapse(&mut self, id: usize) {
        let child = self.segments[id].children[0];
        let grandparent = self.segments[id].parent;
        let mut values = std::mem::take(&mut self.segments[id].values);
        values.append(&mut self.segments[child].values);
        self.segments[child].values = values;
        self.segments[child].parent = grandparent;
        if let Some(grandparent) = grandparent {
            for slot in &mut self.segments[grandparent].children {
                if *slot == id {
                    *slot = child;
                }
            }
        }
        self.release(id);
    }

    fn attach(&mut self, leaf: usize, parent: Option<usize>) {
        self.segments[leaf].parent = parent;
        if let Some(parent) = parent {
            self.segments[parent].children.push(leaf);
        }
    }
}

impl<V: Clone> TreeStack<V> {
    /// Pop the top `count` values of `branch`, oldest first.
    ///
    /// Values held in shared ancestors are cloned; the branch is re-rooted
    /// below the remaining prefix, splitting an ancestor segment when the pop
    /// ends inside it so that siblings keep their full history. Returns
    /// `None`, leaving the stack untouched, if the branch holds fewer than
    /// `count` values.
    pub fn pop(&mut self, branch: &Branch, count: usize) -> Option<Vec<V>> {
        if self.depth(branch) < count {
            return None;
        }
        let leaf = branch.0;
        let own = self.segments[leaf].values.len().min(count);
        let at = self.segments[leaf].values.len() - own;
        let mut popped: Vec<V> = self.segments[leaf].values.split_off(at);
        let mut remaining = count - own;
        if remaining == 0 {
            return Some(popped);
        }

        // Walk up, copying whole ancestors, until the pop ends inside one.
        let mut chunks: Vec<Vec<V>> = Vec::new();
        let mut cursor = self.segments[leaf].parent;
        let mut anchor = None;
        while let Some(id) = cursor {
            let values = &self.segments[id].values;
            if values.len() >= remaining {
                let split = values.len() - remaining;
                chunks.push(values[split..].to_vec());
                anchor = Some((id, split));
                break;
            }
            chunks.push(values.clone());
            remaining -= values.len();
            cursor = self.segments[id].parent;
        }
        let Some((ancestor, split)) = anchor else {
            // unreachable given the depth check
            return None;
        };

        let old_parent = self.segments[leaf].parent.take();
        if let Some(old_parent) = old_parent {
            self.segments[old_parent].children.retain(|c| *c != leaf);
        }

        let new_parent = if split == 0 {
            self.segments[ancestor].parent
        } else {
            Some(self.split(ancestor, split))
        };
        self.attach(leaf, new_parent);

        if let Some(old_parent) = old_parent
            && self.segments[old_parent].live
            && self.segments[old_parent].children.len() == 1
        {
            self.collapse(old_parent);
        }

        let mut values: Vec<V> = chunks.into_iter().rev().flatten().collect();
        values.append(&mut popped);
        Some(values)
    }

    /// Split segment `id` after its first `at` values. `id` keeps the tail
    /// and its children; the returned new segment holds the head and becomes
    /// `id`'s parent.
    fn split(&mut self, id: usize, at: usize) -> usize {
        let grandparent = self.segments[id].parent;
        let head = self.allocate(grandparent);
        let tail_values = self.segments[id].values.split_off(at);
        let head_values = std::mem::replace(&mut self.segments[id].values, tail_values);
        self.segments[head].values = head_values;
        self.segments[head].children.push(id);
        self.segments[id].parent = Some(head);
        if let Some(grandparent) = grandparent {
            for slot in &mut self.segments[grandparent].children {
                if *slot == id {
                    *slot = head;
                }
            }
        }
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(stack: &TreeStack<u32>, branch: &Branch) -> Vec<u32> {
        stack.history(branch).into_iter().copied().collect()
    }

    #[test]
    fn test_push_pop_single_branch() {
        let mut stack = TreeStack::new();
        let b = stack.create();
        for v in 1..=4 {
            stack.push(&b, v);
        }
        assert_eq!(stack.top(&b), Some(&4));
        assert_eq!(stack.pop(&b, 2), Some(vec![3, 4]));
        assert_eq!(stack.depth(&b), 2);
        assert_eq!(stack.pop(&b, 3), None);
        assert_eq!(values(&stack, &b), [1, 2]);
    }

    #[test]
    fn test_pop_splits_shared_ancestor() {
        let mut stack = TreeStack::new();
        let root = stack.create();
        for v in 1..=4 {
            stack.push(&root, v);
        }
        let mut forks = stack.fork(root, 2);
        let b = forks.pop().unwrap();
        let a = forks.pop().unwrap();
        stack.push(&a, 10);

        assert_eq!(stack.pop(&a, 3), Some(vec![3, 4, 10]));
        assert_eq!(values(&stack, &a), [1, 2]);
        assert_eq!(values(&stack, &b), [1, 2, 3, 4]);
        stack.push(&a, 20);
        assert_eq!(values(&stack, &a), [1, 2, 20]);
        assert_eq!(stack.leaf_count(), 2);
    }

    #[test]
    fn test_pop_across_several_segments() {
        let mut stack = TreeStack::new();
        let root = stack.create();
        stack.push(&root, 1);
        stack.push(&root, 2);
        let mut first = stack.fork(root, 2);
        let keep = first.pop().unwrap();
        let mid = first.pop().unwrap();
        stack.push(&mid, 3);
        let mut second = stack.fork(mid, 2);
        let deep = second.pop().unwrap();
        let other = second.pop().unwrap();
        stack.push(&deep, 4);

        assert_eq!(stack.pop(&deep, 3), Some(vec![2, 3, 4]));
        assert_eq!(values(&stack, &deep), [1]);
        assert_eq!(values(&stack, &other), [1, 2, 3]);
        assert_eq!(values(&stack, &keep), [1, 2]);
        assert_eq!(stack.branch_count(), 3);
        assert_eq!(stack.leaf_count(), 3);
    }

    #[test]
    fn test_pop_entire_ancestor() {
        let mut stack = TreeStack::new();
        let root = stack.create();
        stack.push(&root, 1);
        let mut forks = stack.fork(root, 2);
        let b = forks.pop().unwrap();
        let a = forks.pop().unwrap();
        stack.push(&a, 2);

        assert_eq!(stack.pop(&a, 2), Some(vec![1, 2]));
        assert_eq!(stack.depth(&a), 0);
        assert_eq!(stack.top(&a), None);
        assert_eq!(values(&stack, &b), [1]);
    }

    #[test]
    fn test_delete_merges_parent() {
        let mut stack = TreeStack::new();
        let root = stack.create();
        stack.push(&root, 1);
        let mut forks = stack.fork(root, 2);
        let b = forks.pop().unwrap();
        let a = forks.pop().unwrap();
        stack.push(&a, 2);
        stack.push(&b, 3);

        stack.delete(a);
        assert_eq!(stack.branch_count(), 1);
        assert_eq!(stack.segment_count(), 1);
        assert_eq!(values(&stack, &b), [1, 3]);
    }

    #[test]
    fn test_fork_counts() {
        let mut stack: TreeStack<u32> = TreeStack::new();
        let root = stack.create();
        let one = stack.fork(root, 1);
        assert_eq!(one.len(), 1);
        let mut three = stack.fork(one.into_iter().next().unwrap(), 3);
        assert_eq!(stack.branch_count(), 3);
        let last = three.pop().unwrap();
        assert!(stack.fork(last, 0).is_empty());
        assert_eq!(stack.branch_count(), 2);
        assert_eq!(stack.leaf_count(), 2);
    }

    #[test]
    fn test_segments_are_reused() {
        let mut stack = TreeStack::new();
        let root = stack.create();
        stack.push(&root, 0);
        let mut branch = root;
        for round in 0..50 {
            let mut forks = stack.fork(branch, 2);
            let dead = forks.pop().unwrap();
            branch = forks.pop().unwrap();
            stack.push(&branch, round);
            stack.delete(dead);
        }
        assert_eq!(stack.segment_count(), 1);
        assert_eq!(stack.depth(&branch), 51);
    }
}
