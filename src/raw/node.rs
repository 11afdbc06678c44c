use core::borrow::Borrow;

use smallvec::SmallVec;

use super::handle::Handle;

/// Inline capacity for node entry vectors. Trees configured with a small
/// `max_order` stay entirely inline; larger orders spill to the heap once.
const INLINE: usize = 8;

type KeyVec<K> = SmallVec<[K; INLINE]>;
type HandleVec = SmallVec<[Handle; INLINE]>;

/// Fan-out bounds, consulted by the tree during split and merge decisions.
///
/// `max_entries` is the configured order: the most keys a leaf (or
/// separators an internal node) may hold. A node exceeding it must split;
/// a non-root node below `min_entries` must borrow or merge.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Capacity {
    max_entries: usize,
    min_entries: usize,
}

impl Capacity {
    /// Callers validate `max_order` (even, at least 4) before building this.
    pub(crate) const fn new(max_order: usize) -> Self {
        Self {
            max_entries: max_order,
            min_entries: max_order.div_ceil(2),
        }
    }

    pub(crate) const fn max_entries(self) -> usize {
        self.max_entries
    }

    pub(crate) const fn min_entries(self) -> usize {
        self.min_entries
    }
}

/// A tree node: either a routing (internal) node or a data-bearing leaf.
pub(crate) enum Node<K> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K>),
}

/// Internal nodes hold `k` separator keys and `k + 1` child handles, with
/// `child[i] keys < separator[i] <= child[i+1] keys`. A separator need not
/// itself be present in any leaf once its source entry is removed.
pub(crate) struct InternalNode<K> {
    keys: KeyVec<K>,
    children: HandleVec,
}

/// Leaf nodes hold sorted keys alongside handles into the value arena, plus
/// the link to the next leaf in ascending key order.
pub(crate) struct LeafNode<K> {
    next: Option<Handle>,
    keys: KeyVec<K>,
    values: HandleVec,
}

/// Result of a key search within a leaf.
pub(crate) enum SearchResult {
    /// Key present at this index.
    Found(usize),
    /// Key absent; this is where it would be inserted.
    NotFound(usize),
}

impl<K> Node<K> {
    pub(crate) fn as_leaf(&self) -> &LeafNode<K> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node kind mismatch: expected leaf"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node kind mismatch: expected leaf"),
        }
    }

    pub(crate) fn as_internal(&self) -> &InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("node kind mismatch: expected internal"),
        }
    }

    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("node kind mismatch: expected internal"),
        }
    }
}

impl<K> InternalNode<K> {
    /// Builds the replacement root after the previous root split.
    pub(crate) fn new_root(left: Handle, separator: K, right: Handle) -> Self {
        let mut keys = KeyVec::new();
        keys.push(separator);
        let mut children = HandleVec::new();
        children.push(left);
        children.push(right);
        Self { keys, children }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn is_underfull(&self, cap: Capacity) -> bool {
        self.keys.len() < cap.min_entries()
    }

    pub(crate) fn can_lend(&self, cap: Capacity) -> bool {
        self.keys.len() > cap.min_entries()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn set_key(&mut self, index: usize, key: K) {
        self.keys[index] = key;
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    /// Index of the child to descend into for `key`.
    ///
    /// A key equal to a separator routes to the right child: separators are
    /// exclusive upper bounds for their left subtree and inclusive lower
    /// bounds for their right subtree. Insert, lookup, and removal all
    /// descend through here, so the tie-break cannot drift between them.
    #[inline]
    pub(crate) fn search_child<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }

    /// Records a split of `children[index]`: the separator lands at `index`
    /// and the new right half becomes `children[index + 1]`.
    pub(crate) fn insert_child(&mut self, index: usize, separator: K, right: Handle) {
        self.keys.insert(index, separator);
        self.children.insert(index + 1, right);
    }

    /// Drops `separator[index]` and the child to its right (used after that
    /// child was merged into its left sibling).
    pub(crate) fn remove_child(&mut self, index: usize) -> (K, Handle) {
        let separator = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (separator, child)
    }

    /// Appends a separator and child (borrow from the right sibling).
    pub(crate) fn push(&mut self, separator: K, child: Handle) {
        self.keys.push(separator);
        self.children.push(child);
    }

    /// Prepends a separator and child (borrow from the left sibling).
    pub(crate) fn push_front(&mut self, separator: K, child: Handle) {
        self.keys.insert(0, separator);
        self.children.insert(0, child);
    }

    /// Removes the last separator together with the last child.
    pub(crate) fn pop(&mut self) -> Option<(K, Handle)> {
        let separator = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((separator, child))
    }

    /// Removes the first separator together with the first child.
    pub(crate) fn pop_front(&mut self) -> Option<(K, Handle)> {
        if self.keys.is_empty() {
            return None;
        }
        let separator = self.keys.remove(0);
        let child = self.children.remove(0);
        Some((separator, child))
    }

    /// Splits an overfull node in half. The median separator is promoted to
    /// the parent and belongs to neither half afterwards; the returned node
    /// carries everything to the median's right.
    pub(crate) fn split(&mut self) -> (K, InternalNode<K>) {
        let mid = self.keys.len() / 2;

        let right = InternalNode {
            keys: self.keys.drain(mid + 1..).collect(),
            children: self.children.drain(mid + 1..).collect(),
        };

        let median = match self.keys.pop() {
            Some(key) => key,
            // mid < keys.len(), so the left half is never empty here.
            None => unreachable!(),
        };

        (median, right)
    }

    /// Absorbs the right sibling, re-interposing the parent separator that
    /// used to divide the two.
    pub(crate) fn merge_with_right(&mut self, separator: K, mut right: InternalNode<K>) {
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
    }
}

impl<K> LeafNode<K> {
    pub(crate) fn new() -> Self {
        Self {
            next: None,
            keys: KeyVec::new(),
            values: HandleVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_underfull(&self, cap: Capacity) -> bool {
        self.keys.len() < cap.min_entries()
    }

    pub(crate) fn can_lend(&self, cap: Capacity) -> bool {
        self.keys.len() > cap.min_entries()
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> Handle {
        self.values[index]
    }

    pub(crate) fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(index) => SearchResult::Found(index),
            Err(index) => SearchResult::NotFound(index),
        }
    }

    pub(crate) fn insert(&mut self, index: usize, key: K, value: Handle) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, Handle) {
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        (key, value)
    }

    pub(crate) fn push(&mut self, key: K, value: Handle) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn push_front(&mut self, key: K, value: Handle) {
        self.keys.insert(0, key);
        self.values.insert(0, value);
    }

    pub(crate) fn pop(&mut self) -> Option<(K, Handle)> {
        let key = self.keys.pop()?;
        let value = self.values.pop()?;
        Some((key, value))
    }

    pub(crate) fn pop_front(&mut self) -> Option<(K, Handle)> {
        if self.keys.is_empty() {
            return None;
        }
        let key = self.keys.remove(0);
        let value = self.values.remove(0);
        Some((key, value))
    }

    /// Empties the leaf, handing its keys and value handles to the caller.
    pub(crate) fn take_all(&mut self) -> (KeyVec<K>, HandleVec) {
        (core::mem::take(&mut self.keys), core::mem::take(&mut self.values))
    }

    /// Splits an overfull leaf in half. The returned right sibling keeps
    /// `keys[mid..]`; its first key is cloned upward as the separator but
    /// stays in the leaf, so range scans never chase a key that only exists
    /// in the index layer.
    pub(crate) fn split(&mut self) -> (K, LeafNode<K>)
    where
        K: Clone,
    {
        let mid = self.keys.len() / 2;

        let right = LeafNode {
            next: None,
            keys: self.keys.drain(mid..).collect(),
            values: self.values.drain(mid..).collect(),
        };

        let separator = match right.keys.first() {
            Some(key) => key.clone(),
            // Splits only happen on overfull leaves, never empty ones.
            None => unreachable!(),
        };

        (separator, right)
    }

    /// Absorbs the right sibling and inherits its chain link.
    pub(crate) fn merge_with_right(&mut self, mut right: LeafNode<K>) {
        self.keys.append(&mut right.keys);
        self.values.append(&mut right.values);
        self.next = right.next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_with(keys: &[i32]) -> LeafNode<i32> {
        let mut leaf = LeafNode::new();
        for (i, &k) in keys.iter().enumerate() {
            leaf.push(k, Handle::from_index(i));
        }
        leaf
    }

    #[test]
    fn equal_key_routes_right_of_separator() {
        let left = Handle::from_index(0);
        let right = Handle::from_index(1);
        let node = InternalNode::new_root(left, 10, right);

        assert_eq!(node.search_child(&9), 0);
        assert_eq!(node.search_child(&10), 1);
        assert_eq!(node.search_child(&11), 1);
    }

    #[test]
    fn leaf_split_promotes_and_retains_first_right_key() {
        let mut leaf = leaf_with(&[1, 2, 3, 4, 5]);
        let (separator, right) = leaf.split();

        assert_eq!(separator, 3);
        assert_eq!(leaf.keys.as_slice(), [1, 2]);
        // The promoted key stays in the right leaf.
        assert_eq!(right.keys.as_slice(), [3, 4, 5]);
    }

    #[test]
    fn internal_split_promotes_median_exclusively() {
        let children: alloc::vec::Vec<Handle> = (0..6).map(Handle::from_index).collect();
        let mut node = InternalNode::new_root(children[0], 10, children[1]);
        for (i, key) in [20, 30, 40, 50].iter().enumerate() {
            node.push(*key, children[i + 2]);
        }

        let (median, right) = node.split();

        assert_eq!(median, 30);
        assert_eq!(node.keys.as_slice(), [10, 20]);
        assert_eq!(right.keys.as_slice(), [40, 50]);
        assert_eq!(node.child_count(), 3);
        assert_eq!(right.child_count(), 3);
    }

    #[test]
    fn leaf_merge_inherits_chain_link() {
        let mut left = leaf_with(&[1, 2]);
        let mut right = leaf_with(&[3, 4]);
        let tail = Handle::from_index(7);
        right.set_next(Some(tail));

        left.merge_with_right(right);

        assert_eq!(left.keys.as_slice(), [1, 2, 3, 4]);
        assert_eq!(left.next(), Some(tail));
    }

    #[test]
    fn capacity_minimum_is_half_rounded_up() {
        assert_eq!(Capacity::new(4).min_entries(), 2);
        assert_eq!(Capacity::new(6).min_entries(), 3);
        assert_eq!(Capacity::new(32).min_entries(), 16);
    }
}
