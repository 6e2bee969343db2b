//! # Ignore List
//!
//! Per-session set of public keys whose messages and events are suppressed.
//!
//! The list is keyed by public key, not peer id, and lives independently of
//! roster membership: an ignored peer who exits and rejoins under a new peer
//! id is re-silenced automatically when the join handler consults this set.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::PublicKey;

/// A session's set of ignored public keys.
///
/// Expected to stay small, so membership checks are linear scans and
/// removal is swap-with-last; the set's order carries no meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IgnoreList {
    keys: Vec<PublicKey>,
}

impl IgnoreList {
    /// Create an empty ignore list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `key` is in the set.
    pub fn contains(&self, key: &PublicKey) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Add `key` to the set. Adding a key already present is a no-op.
    ///
    /// Fails only when growing the backing storage fails; the set is left
    /// unchanged in that case.
    pub(crate) fn add(&mut self, key: PublicKey) -> Result<()> {
        if self.contains(&key) {
            return Ok(());
        }
        self.keys
            .try_reserve(1)
            .map_err(|_| Error::AllocationFailed)?;
        self.keys.push(key);
        Ok(())
    }

    /// Remove `key` from the set, swapping the last entry into its place.
    ///
    /// Returns false if the key was not present.
    pub(crate) fn remove(&mut self, key: &PublicKey) -> bool {
        match self.keys.iter().position(|k| k == key) {
            Some(idx) => {
                self.keys.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Number of ignored keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The ignored keys, in no meaningful order.
    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> PublicKey {
        [byte; 32]
    }

    #[test]
    fn test_add_remove_sequence() {
        let mut list = IgnoreList::new();
        assert!(list.is_empty());

        list.add(key(1)).unwrap();
        assert_eq!(list.len(), 1);

        list.add(key(2)).unwrap();
        assert_eq!(list.len(), 2);

        assert!(list.remove(&key(1)));
        assert_eq!(list.len(), 1);
        assert!(list.contains(&key(2)));
        assert!(!list.contains(&key(1)));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut list = IgnoreList::new();
        list.add(key(7)).unwrap();
        list.add(key(7)).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_missing_key() {
        let mut list = IgnoreList::new();
        list.add(key(1)).unwrap();
        assert!(!list.remove(&key(9)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_swap_remove_keeps_all_survivors() {
        let mut list = IgnoreList::new();
        for b in 1..=4 {
            list.add(key(b)).unwrap();
        }

        assert!(list.remove(&key(2)));
        assert_eq!(list.len(), 3);
        for b in [1, 3, 4] {
            assert!(list.contains(&key(b)), "key {} should survive", b);
        }
    }
}
