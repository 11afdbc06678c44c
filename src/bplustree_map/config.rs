use alloc::format;

use crate::error::TreeError;
use crate::raw::Capacity;

/// Default `max_order` used by [`BPlusTreeMap::new`](crate::BPlusTreeMap::new).
pub const DEFAULT_MAX_ORDER: usize = 32;

/// What [`BPlusTreeMap::insert`](crate::BPlusTreeMap::insert) does when the
/// key is already present.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DuplicatePolicy {
    /// Overwrite the stored value and return the previous one.
    #[default]
    Replace,
    /// Leave the tree untouched and return
    /// [`TreeError::DuplicateKeyRejected`].
    Reject,
}

/// Tree construction parameters, consumed by
/// [`BPlusTreeMap::with_config`](crate::BPlusTreeMap::with_config).
///
/// ```
/// use bplustree_map::{BPlusTreeMap, Config, DuplicatePolicy};
///
/// let config = Config::new(8).on_duplicate(DuplicatePolicy::Reject);
/// let map: BPlusTreeMap<u64, &str> = BPlusTreeMap::with_config(config).unwrap();
/// assert_eq!(map.config().max_order(), 8);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    max_order: usize,
    on_duplicate: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ORDER)
    }
}

impl Config {
    /// A configuration with the given `max_order` and the default
    /// [`DuplicatePolicy::Replace`]. The order is validated when the tree is
    /// built: it must be even and at least 4.
    pub const fn new(max_order: usize) -> Self {
        Self {
            max_order,
            on_duplicate: DuplicatePolicy::Replace,
        }
    }

    /// Sets the duplicate-key policy.
    #[must_use]
    pub const fn on_duplicate(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate = policy;
        self
    }

    pub const fn max_order(&self) -> usize {
        self.max_order
    }

    pub const fn duplicate_policy(&self) -> DuplicatePolicy {
        self.on_duplicate
    }

    /// Validates `max_order` and converts it into node fan-out bounds.
    ///
    /// Orders below 4 cannot satisfy the occupancy minimum after a split,
    /// and odd orders would leave the two halves unbalanced, so both are
    /// rejected here rather than becoming undefined rebalancing behavior.
    pub(crate) fn capacity(&self) -> Result<Capacity, TreeError> {
        if self.max_order < 4 {
            return Err(TreeError::InvalidConfiguration {
                reason: format!("max_order must be at least 4, got {}", self.max_order),
            });
        }
        if self.max_order % 2 != 0 {
            return Err(TreeError::InvalidConfiguration {
                reason: format!("max_order must be even, got {}", self.max_order),
            });
        }
        Ok(Capacity::new(self.max_order))
    }
}
