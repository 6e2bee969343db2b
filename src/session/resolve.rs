//! # Identifier Resolver
//!
//! Maps a user-supplied string — nickname or public-key hex — to a peer id.
//!
//! Public keys are tried first because they are collision-free: a nickname
//! that happens to look like a key string must never shadow the peer who
//! actually owns that key.

use crate::error::{Error, Result};
use crate::protocol::{PublicKey, PUBLIC_KEY_SIZE};

use super::roster::NickLookup;
use super::Session;

impl Session {
    /// Resolve `identifier` to a peer id.
    ///
    /// Attempts an exact-length public-key-hex parse and key lookup first,
    /// then falls back to an exact nickname match. A nick shared by more
    /// than one active peer resolves to [`Error::AmbiguousNick`], which
    /// carries guidance to retry with the public key.
    pub fn resolve_identifier(&self, identifier: &str) -> Result<u32> {
        if identifier.len() == PUBLIC_KEY_SIZE * 2 {
            if let Some(key) = parse_public_key(identifier) {
                if let Some(peer) = self.find_by_public_key(&key) {
                    return Ok(peer.peer_id);
                }
            }
        }

        match self.find_by_nick(identifier) {
            NickLookup::Found(peer_id) => Ok(peer_id),
            NickLookup::NotFound => Err(Error::PeerNotFound),
            NickLookup::Ambiguous => Err(Error::AmbiguousNick(identifier.to_string())),
        }
    }
}

/// Parse a 64-character hex string into a public key.
fn parse_public_key(s: &str) -> Option<PublicKey> {
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::roster::{PeerRole, PeerStatus};

    fn key(byte: u8) -> PublicKey {
        [byte; 32]
    }

    fn session_with(peers: &[(u32, &str, u8)]) -> Session {
        let mut s = Session::new(0, [0; 32]);
        for (id, name, kb) in peers {
            s.add_peer(*id, name, key(*kb), PeerStatus::None, PeerRole::User)
                .unwrap();
        }
        s
    }

    #[test]
    fn test_resolve_by_nick() {
        let s = session_with(&[(1, "alice", 1), (2, "bob", 2)]);
        assert_eq!(s.resolve_identifier("bob").unwrap(), 2);
    }

    #[test]
    fn test_resolve_by_key_hex() {
        let s = session_with(&[(1, "alice", 1)]);
        let hex_key = hex::encode(key(1));
        assert_eq!(s.resolve_identifier(&hex_key).unwrap(), 1);
    }

    #[test]
    fn test_key_wins_over_identical_nickname() {
        // One peer's nickname is literally the hex of another peer's key.
        let mut s = session_with(&[(1, "alice", 1)]);
        let hex_key = hex::encode(key(1));
        s.add_peer(2, &hex_key, key(2), PeerStatus::None, PeerRole::User)
            .unwrap();

        // The key owner wins, not the peer named after the key.
        assert_eq!(s.resolve_identifier(&hex_key).unwrap(), 1);
    }

    #[test]
    fn test_unknown_key_falls_back_to_nick() {
        let hex_of_unknown = hex::encode(key(9));
        let mut s = session_with(&[]);
        s.add_peer(3, &hex_of_unknown, key(3), PeerStatus::None, PeerRole::User)
            .unwrap();

        // No peer owns key 9, but a peer is named after it.
        assert_eq!(s.resolve_identifier(&hex_of_unknown).unwrap(), 3);
    }

    #[test]
    fn test_ambiguous_nick() {
        let s = session_with(&[(1, "dup", 1), (2, "dup", 2)]);
        let err = s.resolve_identifier("dup").unwrap_err();
        assert!(matches!(err, Error::AmbiguousNick(_)));
    }

    #[test]
    fn test_not_found() {
        let s = session_with(&[(1, "alice", 1)]);
        let err = s.resolve_identifier("ghost").unwrap_err();
        assert!(matches!(err, Error::PeerNotFound));
    }

    #[test]
    fn test_resolve_many_random_keys() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        let mut s = Session::new(0, [0; 32]);
        let mut keys = Vec::new();
        for id in 0..50u32 {
            let k: PublicKey = rng.gen();
            s.add_peer(id, &format!("peer{}", id), k, PeerStatus::None, PeerRole::User)
                .unwrap();
            keys.push((id, k));
        }

        for (id, k) in keys {
            assert_eq!(s.resolve_identifier(&hex::encode(k)).unwrap(), id);
        }
    }

    #[test]
    fn test_non_hex_64_char_string_is_treated_as_nick() {
        let odd_nick = "g".repeat(64);
        let mut s = session_with(&[]);
        s.add_peer(4, &odd_nick, key(4), PeerStatus::None, PeerRole::User)
            .unwrap();

        assert_eq!(s.resolve_identifier(&odd_nick).unwrap(), 4);
    }
}
