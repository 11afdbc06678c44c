//! The public ordered-map API over the raw B+Tree.

mod config;

use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::ops::{Bound, Index, RangeBounds};

use crate::error::TreeError;
use crate::raw::{Capacity, Handle, RawBPlusTree};

pub use config::{Config, DuplicatePolicy, DEFAULT_MAX_ORDER};

/// An ordered map backed by a B+Tree with a runtime-configurable fan-out.
///
/// All entries live in leaves; internal nodes only route. Leaves are chained
/// in ascending key order, so [`iter`](Self::iter) and
/// [`range`](Self::range) walk the chain without re-descending the tree.
///
/// Iterators borrow the map, so the borrow checker guarantees the structure
/// cannot change underneath them; a live iterator always observes the map as
/// it was when the iterator was created.
///
/// ```
/// use bplustree_map::BPlusTreeMap;
///
/// let mut population = BPlusTreeMap::new();
/// population.insert("amsterdam", 930_000).unwrap();
/// population.insert("berlin", 3_700_000).unwrap();
/// population.insert("zagreb", 810_000).unwrap();
///
/// assert_eq!(population.first_key_value(), Some((&"amsterdam", &930_000)));
/// assert_eq!(population.range("b".."c").count(), 1);
/// ```
pub struct BPlusTreeMap<K, V> {
    raw: RawBPlusTree<K, V>,
    config: Config,
}

impl<K, V> BPlusTreeMap<K, V> {
    /// An empty map with the default configuration
    /// ([`DEFAULT_MAX_ORDER`], [`DuplicatePolicy::Replace`]).
    #[must_use]
    pub fn new() -> Self {
        let config = Config::default();
        Self {
            raw: RawBPlusTree::new(Capacity::new(config.max_order()), config.duplicate_policy()),
            config,
        }
    }

    /// An empty map with the given configuration.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidConfiguration`] if `max_order` is odd or below 4.
    pub fn with_config(config: Config) -> Result<Self, TreeError> {
        let cap = config.capacity()?;
        Ok(Self {
            raw: RawBPlusTree::new(cap, config.duplicate_policy()),
            config,
        })
    }

    /// An empty map with the default configuration and room for `capacity`
    /// entries before the arenas reallocate.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let config = Config::default();
        Self {
            raw: RawBPlusTree::with_capacity(capacity, Capacity::new(config.max_order()), config.duplicate_policy()),
            config,
        }
    }

    /// The configuration this map was built with.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of levels, 0 for the empty map and 1 for a lone root leaf.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.raw.height()
    }

    /// Entries the value arena can hold before reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.value_capacity()
    }

    /// Removes every entry, keeping the configuration.
    pub fn clear(&mut self) {
        self.raw.clear();
    }
}

impl<K: Clone + Ord, V> BPlusTreeMap<K, V> {
    /// Inserts `key` with `value`.
    ///
    /// Under [`DuplicatePolicy::Replace`] an existing entry is overwritten
    /// and its previous value returned. Under [`DuplicatePolicy::Reject`] an
    /// existing entry is left untouched.
    ///
    /// # Errors
    ///
    /// [`TreeError::DuplicateKeyRejected`] when the key is present and the
    /// map was configured to reject duplicates.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TreeError> {
        self.raw.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_key_value(key)
    }

    /// Like [`get`](Self::get), for callers that treat absence as a fault.
    ///
    /// # Errors
    ///
    /// [`TreeError::KeyNotFound`] when the key is absent.
    pub fn must_get<Q>(&self, key: &Q) -> Result<&V, TreeError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).ok_or(TreeError::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.contains_key(key)
    }

    /// Removes `key`, returning its value. Absence is not an error.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove_entry(key)
    }

    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.raw.pop_first()
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.raw.pop_last()
    }

    /// Ordered iterator over all entries.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            raw: &self.raw,
            position: self.raw.first_leaf().map(|leaf| (leaf, 0)),
            remaining: self.raw.len(),
        }
    }

    /// Ordered iterator over all keys.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterator over all values, in ascending key order.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Ordered iterator over the entries whose keys fall within `range`.
    ///
    /// The endpoints are located with two tree descents; the scan itself
    /// walks the leaf chain.
    ///
    /// # Panics
    ///
    /// Panics if the range's start is greater than its end, or if both
    /// endpoints are the same excluded key.
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
        R: RangeBounds<Q>,
    {
        match (range.start_bound(), range.end_bound()) {
            (Bound::Included(start) | Bound::Excluded(start), Bound::Included(end) | Bound::Excluded(end))
                if start > end =>
            {
                panic!("range start is greater than range end")
            }
            (Bound::Excluded(start), Bound::Excluded(end)) if start == end => {
                panic!("range start and end are equal and excluded")
            }
            _ => {}
        }

        let position = match range.start_bound() {
            Bound::Unbounded => self.raw.first_leaf().map(|leaf| (leaf, 0)),
            Bound::Included(key) => self.raw.lower_bound(key),
            Bound::Excluded(key) => self.raw.upper_bound(key),
        };
        // `None` means "run to the end of the leaf chain".
        let stop = match range.end_bound() {
            Bound::Unbounded => None,
            Bound::Included(key) => self.raw.upper_bound(key),
            Bound::Excluded(key) => self.raw.lower_bound(key),
        };

        Range {
            raw: &self.raw,
            position,
            stop,
        }
    }
}

impl<K: Clone + Ord + fmt::Debug, V> BPlusTreeMap<K, V> {
    /// Checks every structural invariant of the tree.
    ///
    /// Intended for test harnesses and fuzzing; linear in the map size. A
    /// violation indicates a defect in this crate, never a caller error.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvariantViolation`] describing the first violation
    /// found.
    pub fn validate(&self) -> Result<(), TreeError> {
        self.raw.validate()
    }
}

impl<K, V> Default for BPlusTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Ord, V: Clone> Clone for BPlusTreeMap<K, V> {
    fn clone(&self) -> Self {
        let mut clone = Self {
            raw: RawBPlusTree::with_capacity(
                self.len(),
                Capacity::new(self.config.max_order()),
                self.config.duplicate_policy(),
            ),
            config: self.config,
        };
        for (key, value) in self {
            clone.raw.insert_replace(key.clone(), value.clone());
        }
        clone
    }
}

impl<K: Clone + Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for BPlusTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Content equality: same entries in the same order, regardless of the
/// configured fan-out.
impl<K: Clone + Ord, V: PartialEq> PartialEq for BPlusTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Clone + Ord, V: Eq> Eq for BPlusTreeMap<K, V> {}

impl<K: Clone + Ord + Hash, V: Hash> Hash for BPlusTreeMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for entry in self {
            entry.hash(state);
        }
    }
}

impl<K: Clone + Ord, V> FromIterator<(K, V)> for BPlusTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Later occurrences of a key overwrite earlier ones, independent of the
/// configured duplicate policy.
impl<K: Clone + Ord, V> Extend<(K, V)> for BPlusTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.raw.insert_replace(key, value);
        }
    }
}

impl<'a, K: Ord + Copy, V: Copy> Extend<(&'a K, &'a V)> for BPlusTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&key, &value)| (key, value)));
    }
}

impl<K, V, Q> Index<&Q> for BPlusTreeMap<K, V>
where
    K: Clone + Ord + Borrow<Q>,
    Q: ?Sized + Ord,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is absent.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<'a, K: Clone + Ord, V> IntoIterator for &'a BPlusTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V> IntoIterator for BPlusTreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.raw.drain_to_vec().into_iter(),
        }
    }
}

impl<K, V> BPlusTreeMap<K, V> {
    /// Consumes the map, yielding its keys in ascending order.
    #[must_use]
    pub fn into_keys(self) -> IntoKeys<K, V> {
        IntoKeys {
            inner: self.into_iter(),
        }
    }

    /// Consumes the map, yielding its values in ascending key order.
    #[must_use]
    pub fn into_values(self) -> IntoValues<K, V> {
        IntoValues {
            inner: self.into_iter(),
        }
    }
}

/// Advances a leaf-chain position by one entry.
fn step<K, V>(raw: &RawBPlusTree<K, V>, leaf_handle: Handle, index: usize) -> Option<(Handle, usize)> {
    let leaf = raw.node(leaf_handle).as_leaf();
    if index + 1 < leaf.key_count() {
        Some((leaf_handle, index + 1))
    } else {
        leaf.next().map(|next| (next, 0))
    }
}

/// Borrowing iterator over all entries in ascending key order.
pub struct Iter<'a, K, V> {
    raw: &'a RawBPlusTree<K, V>,
    position: Option<(Handle, usize)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        let (leaf_handle, index) = self.position?;
        let leaf = self.raw.node(leaf_handle).as_leaf();
        let entry = (leaf.key(index), self.raw.value(leaf.value(index)));

        self.position = step(self.raw, leaf_handle, index);
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw,
            position: self.position,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Borrowing iterator over all keys in ascending order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Borrowing iterator over all values in ascending key order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Borrowing iterator over a key range, created by
/// [`BPlusTreeMap::range`].
pub struct Range<'a, K, V> {
    raw: &'a RawBPlusTree<K, V>,
    position: Option<(Handle, usize)>,
    /// First position past the range, or `None` for the chain's end.
    stop: Option<(Handle, usize)>,
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        if self.position.is_none() || self.position == self.stop {
            self.position = None;
            return None;
        }
        let (leaf_handle, index) = self.position?;

        let leaf = self.raw.node(leaf_handle).as_leaf();
        let entry = (leaf.key(index), self.raw.value(leaf.value(index)));
        self.position = step(self.raw, leaf_handle, index);
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.raw.len()))
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw,
            position: self.position,
            stop: self.stop,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Range<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Owning iterator over all entries in ascending key order.
///
/// Draining walks the leaf chain once up front, so this iterator also runs
/// backwards.
pub struct IntoIter<K, V> {
    inner: alloc::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

/// Owning iterator over keys, created by [`BPlusTreeMap::into_keys`].
pub struct IntoKeys<K, V> {
    inner: IntoIter<K, V>,
}

impl<K, V> Iterator for IntoKeys<K, V> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoKeys<K, V> {
    fn next_back(&mut self) -> Option<K> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for IntoKeys<K, V> {}
impl<K, V> FusedIterator for IntoKeys<K, V> {}

impl<K: fmt::Debug, V> fmt::Debug for IntoKeys<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.inner.as_slice().iter().map(|(key, _)| key)).finish()
    }
}

/// Owning iterator over values, created by [`BPlusTreeMap::into_values`].
pub struct IntoValues<K, V> {
    inner: IntoIter<K, V>,
}

impl<K, V> Iterator for IntoValues<K, V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoValues<K, V> {
    fn next_back(&mut self) -> Option<V> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for IntoValues<K, V> {}
impl<K, V> FusedIterator for IntoValues<K, V> {}

impl<K, V: fmt::Debug> fmt::Debug for IntoValues<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.inner.as_slice().iter().map(|(_, value)| value)).finish()
    }
}
