use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::TreeError;

use super::handle::Handle;
use super::node::Node;
use super::raw_bplustree::RawBPlusTree;

fn violation(depth: usize, detail: String) -> TreeError {
    TreeError::InvariantViolation { depth, detail }
}

impl<K: Clone + Ord + Debug, V> RawBPlusTree<K, V> {
    /// Walks the whole tree and verifies every structural invariant:
    /// uniform leaf depth, occupancy bounds, strict key ordering, separator
    /// consistency, leaf chain linkage, and the cached element count.
    ///
    /// Read-only and linear in the tree size; meant for tests and fuzzing
    /// rather than production paths. The first violation found is returned
    /// with the depth and keys involved.
    pub(crate) fn validate(&self) -> Result<(), TreeError> {
        let Some(root) = self.root() else {
            if self.len() != 0 {
                return Err(violation(0, format!("empty tree caches len {}", self.len())));
            }
            if self.height() != 0 {
                return Err(violation(0, format!("empty tree caches height {}", self.height())));
            }
            if self.first_leaf().is_some() {
                return Err(violation(0, String::from("empty tree holds a first-leaf link")));
            }
            return Ok(());
        };

        if self.height() == 0 {
            return Err(violation(0, String::from("non-empty tree caches height 0")));
        }

        let mut leaves = Vec::new();
        self.check_node(root, 0, None, None, &mut leaves)?;
        self.check_leaf_chain(&leaves)?;

        let counted: usize = leaves.iter().map(|&handle| self.node(handle).as_leaf().key_count()).sum();
        if counted != self.len() {
            return Err(violation(
                0,
                format!("cached len {} but leaves hold {counted} entries", self.len()),
            ));
        }

        Ok(())
    }

    /// Checks one node and its subtree. `low` (inclusive) and `high`
    /// (exclusive) bound every key the subtree may contain, per the
    /// separator convention.
    fn check_node(
        &self,
        handle: Handle,
        depth: usize,
        low: Option<&K>,
        high: Option<&K>,
        leaves: &mut Vec<Handle>,
    ) -> Result<(), TreeError> {
        let max = self.capacity_policy().max_entries();
        let min = self.capacity_policy().min_entries();
        let is_root = depth == 0;

        match self.node(handle) {
            Node::Leaf(leaf) => {
                if depth + 1 != self.height() {
                    return Err(violation(
                        depth,
                        format!("leaf at depth {depth} but cached height is {}", self.height()),
                    ));
                }

                let count = leaf.key_count();
                if count > max {
                    return Err(violation(depth, format!("leaf holds {count} entries, maximum is {max}")));
                }
                if is_root {
                    if count == 0 {
                        return Err(violation(depth, String::from("non-empty tree has an empty root leaf")));
                    }
                } else if count < min {
                    return Err(violation(depth, format!("leaf holds {count} entries, minimum is {min}")));
                }

                for index in 0..count {
                    let key = leaf.key(index);
                    if index > 0 && leaf.key(index - 1) >= key {
                        return Err(violation(
                            depth,
                            format!("leaf keys out of order: {:?} precedes {key:?}", leaf.key(index - 1)),
                        ));
                    }
                    if let Some(low) = low
                        && key < low
                    {
                        return Err(violation(depth, format!("leaf key {key:?} below subtree bound {low:?}")));
                    }
                    if let Some(high) = high
                        && key >= high
                    {
                        return Err(violation(depth, format!("leaf key {key:?} at or above subtree bound {high:?}")));
                    }
                }

                leaves.push(handle);
                Ok(())
            }
            Node::Internal(internal) => {
                let count = internal.key_count();
                if internal.child_count() != count + 1 {
                    return Err(violation(
                        depth,
                        format!("internal node has {count} separators but {} children", internal.child_count()),
                    ));
                }
                if count > max {
                    return Err(violation(depth, format!("internal node holds {count} separators, maximum is {max}")));
                }
                if is_root {
                    if count == 0 {
                        return Err(violation(depth, String::from("internal root has no separator")));
                    }
                } else if count < min {
                    return Err(violation(
                        depth,
                        format!("internal node holds {count} separators, minimum is {min}"),
                    ));
                }

                for index in 1..count {
                    if internal.key(index - 1) >= internal.key(index) {
                        return Err(violation(
                            depth,
                            format!(
                                "separators out of order: {:?} precedes {:?}",
                                internal.key(index - 1),
                                internal.key(index)
                            ),
                        ));
                    }
                }

                // child[i] keys < separator[i] <= child[i+1] keys.
                for index in 0..internal.child_count() {
                    let child_low = if index == 0 { low } else { Some(internal.key(index - 1)) };
                    let child_high = if index == count { high } else { Some(internal.key(index)) };
                    self.check_node(internal.child(index), depth + 1, child_low, child_high, leaves)?;
                }
                Ok(())
            }
        }
    }

    /// The chain from `first_leaf` must visit exactly the in-order leaves.
    fn check_leaf_chain(&self, leaves: &[Handle]) -> Result<(), TreeError> {
        let leaf_depth = self.height() - 1;

        let mut chained = Vec::with_capacity(leaves.len());
        let mut current = self.first_leaf();
        while let Some(handle) = current {
            chained.push(handle);
            if chained.len() > leaves.len() {
                return Err(violation(leaf_depth, String::from("leaf chain is longer than the in-order traversal")));
            }
            current = self.node(handle).as_leaf().next();
        }

        if chained != leaves {
            return Err(violation(
                leaf_depth,
                String::from("leaf chain does not match the in-order leaf sequence"),
            ));
        }
        Ok(())
    }
}
