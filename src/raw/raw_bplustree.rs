use alloc::vec::Vec;
use core::borrow::Borrow;

use log::debug;
use smallvec::SmallVec;

use crate::bplustree_map::DuplicatePolicy;
use crate::error::TreeError;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Capacity, InternalNode, LeafNode, Node, SearchResult};

/// The core B+Tree backing `BPlusTreeMap`.
///
/// Values live in their own arena so leaves stay key-dense; a leaf stores
/// value handles, not values. Writers rebalance bottom-up along the descent
/// path, so a single top-level operation touches at most one node per level.
pub(crate) struct RawBPlusTree<K, V> {
    /// All tree nodes, addressed by handle.
    nodes: Arena<Node<K>>,
    /// All values, addressed by the handles stored in leaves.
    values: Arena<V>,
    /// The root node, absent only when the tree is empty.
    root: Option<Handle>,
    /// Leftmost leaf, where ordered iteration starts.
    first_leaf: Option<Handle>,
    /// Cached element count.
    len: usize,
    /// Cached level count, 0 for the empty tree. Every leaf sits at depth
    /// `height - 1`.
    height: usize,
    /// Fan-out bounds from the validated configuration.
    cap: Capacity,
    /// Duplicate-key behavior from the configuration.
    on_duplicate: DuplicatePolicy,
}

/// One step of the root-to-leaf descent, recorded so that splits and merges
/// can walk back up without parent pointers in the nodes themselves.
#[derive(Clone, Copy)]
struct PathElement {
    node: Handle,
    child_index: usize,
}

type Path = SmallVec<[PathElement; 16]>;

impl<K, V> RawBPlusTree<K, V> {
    pub(crate) const fn new(cap: Capacity, on_duplicate: DuplicatePolicy) -> Self {
        Self {
            nodes: Arena::new(),
            values: Arena::new(),
            root: None,
            first_leaf: None,
            len: 0,
            height: 0,
            cap,
            on_duplicate,
        }
    }

    pub(crate) fn with_capacity(capacity: usize, cap: Capacity, on_duplicate: DuplicatePolicy) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity.div_ceil(cap.max_entries())),
            values: Arena::with_capacity(capacity),
            root: None,
            first_leaf: None,
            len: 0,
            height: 0,
            cap,
            on_duplicate,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn value_capacity(&self) -> usize {
        self.values.capacity()
    }

    pub(crate) const fn capacity_policy(&self) -> Capacity {
        self.cap
    }

    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) const fn first_leaf(&self) -> Option<Handle> {
        self.first_leaf
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    pub(crate) fn value(&self, handle: Handle) -> &V {
        self.values.get(handle)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.values.clear();
        self.root = None;
        self.first_leaf = None;
        self.len = 0;
        self.height = 0;
    }

    /// Empties the tree into a sorted vector by walking the leaf chain,
    /// skipping all rebalancing.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, V)> {
        let mut drained = Vec::with_capacity(self.len);
        let mut current = self.first_leaf;

        while let Some(handle) = current {
            let leaf = self.nodes.get_mut(handle).as_leaf_mut();
            current = leaf.next();
            let (keys, value_handles) = leaf.take_all();
            for (key, value_handle) in keys.into_iter().zip(value_handles) {
                drained.push((key, self.values.take(value_handle)));
            }
        }

        self.clear();
        drained
    }
}

impl<K: Clone + Ord, V> RawBPlusTree<K, V> {
    /// Walks from `root` to the leaf responsible for `key`, recording the
    /// child index taken at every internal node.
    fn descend<Q>(&self, root: Handle, key: &Q) -> (Handle, Path)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut path = Path::new();
        let mut current = root;

        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => {
                    let child_index = internal.search_child(key);
                    path.push(PathElement {
                        node: current,
                        child_index,
                    });
                    current = internal.child(child_index);
                }
                Node::Leaf(_) => return (current, path),
            }
        }
    }

    /// Walks to the leftmost or rightmost leaf, recording the path.
    fn descend_extreme(&self, root: Handle, rightmost: bool) -> (Handle, Path) {
        let mut path = Path::new();
        let mut current = root;

        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => {
                    let child_index = if rightmost { internal.child_count() - 1 } else { 0 };
                    path.push(PathElement {
                        node: current,
                        child_index,
                    });
                    current = internal.child(child_index);
                }
                Node::Leaf(_) => return (current, path),
            }
        }
    }

    /// Finds `key`'s leaf position, if present.
    fn search<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let root = self.root?;
        let (leaf_handle, _) = self.descend(root, key);
        match self.nodes.get(leaf_handle).as_leaf().search(key) {
            SearchResult::Found(index) => Some((leaf_handle, index)),
            SearchResult::NotFound(_) => None,
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, index) = self.search(key)?;
        let leaf = self.nodes.get(leaf_handle).as_leaf();
        Some(self.values.get(leaf.value(index)))
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, index) = self.search(key)?;
        let value_handle = self.nodes.get(leaf_handle).as_leaf().value(index);
        Some(self.values.get_mut(value_handle))
    }

    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, index) = self.search(key)?;
        let leaf = self.nodes.get(leaf_handle).as_leaf();
        Some((leaf.key(index), self.values.get(leaf.value(index))))
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).is_some()
    }

    pub(crate) fn first_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.nodes.get(self.first_leaf?).as_leaf();
        let key = leaf.first_key()?;
        Some((key, self.values.get(leaf.value(0))))
    }

    pub(crate) fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut current = self.root?;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => current = internal.child(internal.child_count() - 1),
                Node::Leaf(leaf) => {
                    let index = leaf.key_count().checked_sub(1)?;
                    return Some((leaf.key(index), self.values.get(leaf.value(index))));
                }
            }
        }
    }

    /// First position holding a key `>= key`, as `(leaf, index)`.
    pub(crate) fn lower_bound<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.seek(key, false)
    }

    /// First position holding a key `> key`, as `(leaf, index)`.
    pub(crate) fn upper_bound<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.seek(key, true)
    }

    fn seek<Q>(&self, key: &Q, exclusive: bool) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let root = self.root?;
        let (leaf_handle, _) = self.descend(root, key);
        let leaf = self.nodes.get(leaf_handle).as_leaf();

        let index = match leaf.search(key) {
            SearchResult::Found(index) if exclusive => index + 1,
            SearchResult::Found(index) | SearchResult::NotFound(index) => index,
        };

        if index < leaf.key_count() {
            return Some((leaf_handle, index));
        }
        // Every chained leaf holds at least one key, so one hop suffices.
        leaf.next().map(|next| (next, 0))
    }

    /// Inserts respecting the configured duplicate policy.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TreeError> {
        self.insert_with(key, value, self.on_duplicate)
    }

    /// Inserts with unconditional replace semantics (`Clone`, `Extend`).
    pub(crate) fn insert_replace(&mut self, key: K, value: V) -> Option<V> {
        // `Replace` never produces an error.
        self.insert_with(key, value, DuplicatePolicy::Replace).unwrap_or_default()
    }

    fn insert_with(&mut self, key: K, value: V, policy: DuplicatePolicy) -> Result<Option<V>, TreeError> {
        let Some(root) = self.root else {
            let value_handle = self.values.alloc(value);
            let mut leaf = LeafNode::new();
            leaf.push(key, value_handle);
            let leaf_handle = self.nodes.alloc(Node::Leaf(leaf));
            self.root = Some(leaf_handle);
            self.first_leaf = Some(leaf_handle);
            self.len = 1;
            self.height = 1;
            debug!("allocated root leaf, height now 1");
            return Ok(None);
        };

        let (leaf_handle, mut path) = self.descend(root, &key);
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();

        match leaf.search(&key) {
            SearchResult::Found(index) => match policy {
                DuplicatePolicy::Reject => Err(TreeError::DuplicateKeyRejected),
                DuplicatePolicy::Replace => {
                    let value_handle = leaf.value(index);
                    Ok(Some(core::mem::replace(self.values.get_mut(value_handle), value)))
                }
            },
            SearchResult::NotFound(index) => {
                let value_handle = self.values.alloc(value);
                let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
                leaf.insert(index, key, value_handle);
                self.len += 1;

                if leaf.key_count() > self.cap.max_entries() {
                    self.split_leaf(leaf_handle, &mut path, root);
                }
                Ok(None)
            }
        }
    }

    /// Splits an overfull leaf and pushes the promoted separator upward.
    fn split_leaf(&mut self, leaf_handle: Handle, path: &mut Path, root: Handle) {
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let (separator, mut right) = leaf.split();
        right.set_next(leaf.next());

        let right_handle = self.nodes.alloc(Node::Leaf(right));
        self.nodes.get_mut(leaf_handle).as_leaf_mut().set_next(Some(right_handle));

        self.propagate_split(path, separator, right_handle, root);
    }

    /// Inserts a promoted separator into each ancestor in turn, splitting
    /// ancestors that overflow. The loop (rather than recursion) bounds the
    /// work by tree height.
    fn propagate_split(&mut self, path: &mut Path, mut separator: K, mut right_handle: Handle, root: Handle) {
        while let Some(step) = path.pop() {
            let parent = self.nodes.get_mut(step.node).as_internal_mut();
            parent.insert_child(step.child_index, separator, right_handle);

            if parent.key_count() <= self.cap.max_entries() {
                return;
            }

            let (median, right) = parent.split();
            separator = median;
            right_handle = self.nodes.alloc(Node::Internal(right));
        }

        // The root itself split: grow the tree by one level.
        let new_root = InternalNode::new_root(root, separator, right_handle);
        self.root = Some(self.nodes.alloc(Node::Internal(new_root)));
        self.height += 1;
        debug!("root split, height now {}", self.height);
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    pub(crate) fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let root = self.root?;
        let (leaf_handle, mut path) = self.descend(root, key);

        let index = match self.nodes.get(leaf_handle).as_leaf().search(key) {
            SearchResult::Found(index) => index,
            SearchResult::NotFound(_) => return None,
        };

        Some(self.remove_at(leaf_handle, index, &mut path))
    }

    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        let root = self.root?;
        let (leaf_handle, mut path) = self.descend_extreme(root, false);
        Some(self.remove_at(leaf_handle, 0, &mut path))
    }

    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        let root = self.root?;
        let (leaf_handle, mut path) = self.descend_extreme(root, true);
        let index = self.nodes.get(leaf_handle).as_leaf().key_count() - 1;
        Some(self.remove_at(leaf_handle, index, &mut path))
    }

    /// Removes the entry at a known leaf position and rebalances.
    ///
    /// Separators are lower bounds of their right subtree, not copies of
    /// live keys, so removal never needs to rewrite ancestor separators
    /// unless a borrow or merge moves entries between siblings.
    fn remove_at(&mut self, leaf_handle: Handle, index: usize, path: &mut Path) -> (K, V) {
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let (removed_key, value_handle) = leaf.remove(index);
        let removed_value = self.values.take(value_handle);
        self.len -= 1;

        if self.len == 0 {
            self.clear();
            debug!("removed final entry, height now 0");
            return (removed_key, removed_value);
        }

        // The root is exempt from the occupancy minimum.
        if self.nodes.get(leaf_handle).as_leaf().is_underfull(self.cap)
            && let Some(&step) = path.last()
        {
            self.rebalance_leaf(leaf_handle, step, path);
        }

        (removed_key, removed_value)
    }

    /// Restores an underfull leaf: borrow from a sibling that can spare an
    /// entry, otherwise merge with one.
    fn rebalance_leaf(&mut self, leaf_handle: Handle, step: PathElement, path: &mut Path) {
        let parent = self.nodes.get(step.node).as_internal();

        if step.child_index > 0 {
            let left_handle = parent.child(step.child_index - 1);
            if self.nodes.get(left_handle).as_leaf().can_lend(self.cap) {
                self.borrow_leaf_from_left(leaf_handle, left_handle, step);
                return;
            }
        }

        if step.child_index + 1 < parent.child_count() {
            let right_handle = parent.child(step.child_index + 1);
            if self.nodes.get(right_handle).as_leaf().can_lend(self.cap) {
                self.borrow_leaf_from_right(leaf_handle, right_handle, step);
                return;
            }
        }

        if step.child_index > 0 {
            let left_handle = parent.child(step.child_index - 1);
            self.merge_leaves(left_handle, leaf_handle, path, step.child_index - 1);
        } else {
            let right_handle = parent.child(step.child_index + 1);
            self.merge_leaves(leaf_handle, right_handle, path, step.child_index);
        }
    }

    fn borrow_leaf_from_left(&mut self, leaf_handle: Handle, left_handle: Handle, step: PathElement) {
        let left = self.nodes.get_mut(left_handle).as_leaf_mut();
        let (key, value) = left.pop().expect("lendable sibling is not empty");

        // The moved key becomes the leaf's smallest, hence the new separator.
        let separator = key.clone();
        self.nodes.get_mut(leaf_handle).as_leaf_mut().push_front(key, value);
        self.nodes.get_mut(step.node).as_internal_mut().set_key(step.child_index - 1, separator);
    }

    fn borrow_leaf_from_right(&mut self, leaf_handle: Handle, right_handle: Handle, step: PathElement) {
        let right = self.nodes.get_mut(right_handle).as_leaf_mut();
        let (key, value) = right.pop_front().expect("lendable sibling is not empty");
        let separator = right.first_key().expect("lendable sibling keeps at least one key").clone();

        self.nodes.get_mut(leaf_handle).as_leaf_mut().push(key, value);
        self.nodes.get_mut(step.node).as_internal_mut().set_key(step.child_index, separator);
    }

    fn merge_leaves(&mut self, left_handle: Handle, right_handle: Handle, path: &mut Path, separator_index: usize) {
        let right = match self.nodes.take(right_handle) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node kind mismatch: expected leaf"),
        };
        self.nodes.get_mut(left_handle).as_leaf_mut().merge_with_right(right);

        self.remove_separator(path, separator_index);
    }

    /// Removes the separator made redundant by a merge and rebalances the
    /// parent, cascading toward the root. A root internal node reduced to a
    /// single child collapses, shrinking the tree by one level.
    fn remove_separator(&mut self, path: &mut Path, separator_index: usize) {
        let step = path.pop().expect("merged node has a parent");
        let parent = self.nodes.get_mut(step.node).as_internal_mut();
        // The merged-away child was already taken from the arena.
        let _ = parent.remove_child(separator_index);

        if path.is_empty() {
            let parent = self.nodes.get(step.node).as_internal();
            if parent.child_count() == 1 {
                let new_root = parent.child(0);
                self.nodes.free(step.node);
                self.root = Some(new_root);
                self.height -= 1;
                debug!("root collapsed, height now {}", self.height);
            }
            return;
        }

        if self.nodes.get(step.node).as_internal().is_underfull(self.cap)
            && let Some(&parent_step) = path.last()
        {
            self.rebalance_internal(step.node, parent_step, path);
        }
    }

    /// Internal-node counterpart of [`Self::rebalance_leaf`].
    fn rebalance_internal(&mut self, node_handle: Handle, step: PathElement, path: &mut Path) {
        let parent = self.nodes.get(step.node).as_internal();

        if step.child_index > 0 {
            let left_handle = parent.child(step.child_index - 1);
            if self.nodes.get(left_handle).as_internal().can_lend(self.cap) {
                self.borrow_internal_from_left(node_handle, left_handle, step);
                return;
            }
        }

        if step.child_index + 1 < parent.child_count() {
            let right_handle = parent.child(step.child_index + 1);
            if self.nodes.get(right_handle).as_internal().can_lend(self.cap) {
                self.borrow_internal_from_right(node_handle, right_handle, step);
                return;
            }
        }

        if step.child_index > 0 {
            let left_handle = parent.child(step.child_index - 1);
            self.merge_internals(left_handle, node_handle, step, path, step.child_index - 1);
        } else {
            let right_handle = parent.child(step.child_index + 1);
            self.merge_internals(node_handle, right_handle, step, path, step.child_index);
        }
    }

    /// Rotates one entry through the parent: the parent separator moves
    /// down into this node, the sibling's adjacent separator moves up.
    fn borrow_internal_from_left(&mut self, node_handle: Handle, left_handle: Handle, step: PathElement) {
        let stitched = self.nodes.get(step.node).as_internal().key(step.child_index - 1).clone();

        let left = self.nodes.get_mut(left_handle).as_internal_mut();
        let (promoted, child) = left.pop().expect("lendable sibling is not empty");

        self.nodes.get_mut(node_handle).as_internal_mut().push_front(stitched, child);
        self.nodes.get_mut(step.node).as_internal_mut().set_key(step.child_index - 1, promoted);
    }

    fn borrow_internal_from_right(&mut self, node_handle: Handle, right_handle: Handle, step: PathElement) {
        let stitched = self.nodes.get(step.node).as_internal().key(step.child_index).clone();

        let right = self.nodes.get_mut(right_handle).as_internal_mut();
        let (promoted, child) = right.pop_front().expect("lendable sibling is not empty");

        self.nodes.get_mut(node_handle).as_internal_mut().push(stitched, child);
        self.nodes.get_mut(step.node).as_internal_mut().set_key(step.child_index, promoted);
    }

    fn merge_internals(
        &mut self,
        left_handle: Handle,
        right_handle: Handle,
        step: PathElement,
        path: &mut Path,
        separator_index: usize,
    ) {
        let separator = self.nodes.get(step.node).as_internal().key(separator_index).clone();

        let right = match self.nodes.take(right_handle) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("node kind mismatch: expected internal"),
        };
        self.nodes.get_mut(left_handle).as_internal_mut().merge_with_right(separator, right);

        self.remove_separator(path, separator_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn tree(max_order: usize) -> RawBPlusTree<i32, i32> {
        RawBPlusTree::new(Capacity::new(max_order), DuplicatePolicy::Replace)
    }

    fn assert_valid(tree: &RawBPlusTree<i32, i32>) {
        if let Err(violation) = tree.validate() {
            panic!("tree invariant violated: {violation}");
        }
    }

    #[test]
    fn grows_and_shrinks_across_heights() {
        let mut tree = tree(4);
        assert_eq!(tree.height(), 0);

        for key in 0..64 {
            tree.insert(key, key * 10).expect("replace policy never fails");
            assert_valid(&tree);
        }
        assert!(tree.height() >= 3, "64 keys at order 4 need several levels");

        for key in 0..64 {
            assert_eq!(tree.remove(&key), Some(key * 10));
            assert_valid(&tree);
        }
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn reject_policy_preserves_existing_entry() {
        let mut tree: RawBPlusTree<i32, i32> = RawBPlusTree::new(Capacity::new(4), DuplicatePolicy::Reject);
        tree.insert(1, 100).expect("fresh key");
        assert_eq!(tree.insert(1, 200), Err(TreeError::DuplicateKeyRejected));
        assert_eq!(tree.get(&1), Some(&100));
        assert_eq!(tree.len(), 1);
        assert_valid(&tree);
    }

    #[test]
    fn removing_absent_key_is_a_no_op() {
        let mut tree = tree(4);
        for key in [5, 3, 8, 1] {
            tree.insert(key, key).expect("replace policy never fails");
        }
        assert_eq!(tree.remove(&42), None);
        assert_eq!(tree.len(), 4);
        assert_valid(&tree);
    }

    #[test]
    fn bounds_skip_to_the_next_leaf() {
        let mut tree = tree(4);
        for key in [10, 20, 30, 40, 50, 60] {
            tree.insert(key, key).expect("replace policy never fails");
        }
        assert_valid(&tree);

        let positions: Vec<i32> = [15, 20, 60, 61]
            .iter()
            .filter_map(|key| tree.lower_bound(key))
            .map(|(leaf, index)| *tree.node(leaf).as_leaf().key(index))
            .collect();
        assert_eq!(positions, [20, 20, 60]);

        let (leaf, index) = tree.upper_bound(&20).expect("30 follows 20");
        assert_eq!(*tree.node(leaf).as_leaf().key(index), 30);
        assert_eq!(tree.upper_bound(&60), None);
    }

    #[test]
    fn pop_walks_both_edges() {
        let mut tree = tree(4);
        for key in 0..20 {
            tree.insert(key, key).expect("replace policy never fails");
        }

        assert_eq!(tree.pop_first(), Some((0, 0)));
        assert_eq!(tree.pop_last(), Some((19, 19)));
        assert_valid(&tree);
        assert_eq!(tree.len(), 18);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32, i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..400, any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => (0i32..400).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        /// Every mutation leaves the tree structurally valid and agreeing
        /// with `BTreeMap`, at the smallest legal order and a larger one.
        #[test]
        fn invariants_hold_under_random_workload(
            ops in prop::collection::vec(op_strategy(), 0..400),
            max_order in prop::sample::select(alloc::vec![4usize, 6, 16]),
        ) {
            let mut tree: RawBPlusTree<i32, i32> =
                RawBPlusTree::new(Capacity::new(max_order), DuplicatePolicy::Replace);
            let mut model: BTreeMap<i32, i32> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key, value) => {
                        let previous = tree.insert(key, value).expect("replace policy never fails");
                        prop_assert_eq!(previous, model.insert(key, value));
                    }
                    Op::Remove(key) => {
                        prop_assert_eq!(tree.remove(&key), model.remove(&key));
                    }
                }
                prop_assert_eq!(tree.len(), model.len());
                let check = tree.validate();
                prop_assert!(check.is_ok(), "tree invariant violated: {:?}", check);
            }

            let drained = tree.drain_to_vec();
            let expected: Vec<(i32, i32)> = model.into_iter().collect();
            prop_assert_eq!(drained, expected);
        }
    }
}
