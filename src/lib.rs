//! An ordered key-value map backed by a B+Tree with a configurable fan-out.
//!
//! This crate provides [`BPlusTreeMap`], an in-memory ordered map in the
//! spirit of the standard library's `BTreeMap`, with two differences that
//! matter in practice:
//!
//! - The node fan-out (`max_order`) is chosen at construction time via
//!   [`Config`], instead of being baked into the type.
//! - Duplicate-key insertion is a policy: [`DuplicatePolicy::Replace`]
//!   overwrites the stored value (the `BTreeMap` behavior), while
//!   [`DuplicatePolicy::Reject`] reports [`TreeError::DuplicateKeyRejected`]
//!   and leaves the map untouched.
//!
//! All data lives in leaves. Leaves form a singly-linked ascending chain, so
//! ordered iteration and [`range`](BPlusTreeMap::range) scans walk the chain
//! at amortized constant cost per item instead of re-descending the tree.
//!
//! # Example
//!
//! ```
//! use bplustree_map::BPlusTreeMap;
//!
//! let mut map = BPlusTreeMap::new();
//! map.insert(3, "three").unwrap();
//! map.insert(1, "one").unwrap();
//! map.insert(2, "two").unwrap();
//!
//! assert_eq!(map.get(&2), Some(&"two"));
//! assert_eq!(map.len(), 3);
//!
//! // Keys come back in sorted order.
//! let keys: Vec<_> = map.keys().copied().collect();
//! assert_eq!(keys, [1, 2, 3]);
//! ```
//!
//! # Structural validation
//!
//! [`BPlusTreeMap::validate`] walks the whole tree and checks every
//! structural invariant (balance, occupancy, ordering, leaf linkage, size).
//! It is meant for test harnesses and fuzzing, not for hot paths; a
//! violation indicates a defect in this crate, never a caller error.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]

extern crate alloc;

mod error;
mod raw;

pub mod bplustree_map;

pub use bplustree_map::{BPlusTreeMap, Config, DuplicatePolicy};
pub use error::TreeError;
