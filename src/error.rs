use alloc::string::String;

use thiserror::Error;

/// Errors reported by [`BPlusTreeMap`](crate::BPlusTreeMap) operations.
///
/// Absence of a key is not an error for `get`/`remove`; those return
/// `Option`. Only operations that require presence (`must_get`) or that are
/// configured to reject duplicates surface the corresponding variants.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TreeError {
    /// The supplied [`Config`](crate::Config) cannot produce a valid tree.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// The key was required to be present but is not.
    #[error("key not found")]
    KeyNotFound,

    /// The key is already present and the map was configured with
    /// [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject).
    #[error("duplicate key rejected")]
    DuplicateKeyRejected,

    /// A structural invariant does not hold. Reported only by
    /// [`validate`](crate::BPlusTreeMap::validate); its occurrence indicates
    /// a defect in this crate.
    #[error("invariant violation at depth {depth}: {detail}")]
    InvariantViolation {
        /// Depth of the offending node, root being depth 0.
        depth: usize,
        /// Human-readable description of the violation.
        detail: String,
    },
}
