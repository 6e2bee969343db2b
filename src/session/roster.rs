//! # Peer Roster
//!
//! The growable per-session collection of peer records and the mutation
//! paths that keep it consistent: join, exit, rename, role and status
//! changes, sorting, and the derived name cache.
//!
//! Slot policy: a join reuses the first inactive slot and grows the roster
//! by exactly one only when every slot is live. An exit tombstones the slot
//! in place, then the roster is truncated to one past the highest remaining
//! active index, so inactive slots never linger above the live region.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::PublicKey;

use super::Session;

/// Maximum display-name length in bytes; longer names are truncated on a
/// character boundary.
pub const MAX_NAME_LENGTH: usize = 128;

/// A peer's permission tier within a group.
///
/// Ordered Founder > Moderator > User > Observer; the roster sorts by
/// [`rank`](PeerRole::rank) rather than any numeric weight blending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRole {
    /// Created the group; full authority
    Founder,
    /// May kick and silence peers
    Moderator,
    /// Ordinary participant
    #[default]
    User,
    /// Silenced; may not send messages
    Observer,
}

impl PeerRole {
    /// Sort rank, lower is more privileged.
    pub fn rank(&self) -> u8 {
        match self {
            PeerRole::Founder => 0,
            PeerRole::Moderator => 1,
            PeerRole::User => 2,
            PeerRole::Observer => 3,
        }
    }

    /// Lowercase label used in moderation notices.
    pub fn label(&self) -> &'static str {
        match self {
            PeerRole::Founder => "founder",
            PeerRole::Moderator => "moderator",
            PeerRole::User => "user",
            PeerRole::Observer => "observer",
        }
    }
}

/// A peer's self-reported availability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerStatus {
    /// Online with no particular status
    #[default]
    None,
    /// Marked away
    Away,
    /// Marked busy
    Busy,
}

/// One participant's client-local record within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    /// Protocol-assigned id, unique among active peers of the session
    pub peer_id: u32,
    /// The peer's long-term public key
    pub public_key: PublicKey,
    /// Current display name
    pub name: String,
    /// Name before the most recent rename ("X is now known as Y")
    pub previous_name: String,
    /// Self-reported availability
    pub status: PeerStatus,
    /// Permission tier
    pub role: PeerRole,
    /// Whether this slot holds a live peer (false = tombstone)
    pub active: bool,
    /// Whether the user has this peer's messages suppressed
    pub is_ignored: bool,
    /// Last time we saw activity from this peer (Unix seconds)
    pub last_active: i64,
}

impl Peer {
    fn tombstone() -> Self {
        Self {
            peer_id: 0,
            public_key: [0; 32],
            name: String::new(),
            previous_name: String::new(),
            status: PeerStatus::None,
            role: PeerRole::User,
            active: false,
            is_ignored: false,
            last_active: 0,
        }
    }
}

/// Result of a nickname lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NickLookup {
    /// Exactly one active peer uses the nick
    Found(u32),
    /// No active peer uses the nick
    NotFound,
    /// More than one active peer uses the nick
    Ambiguous,
}

/// Truncate a display name to [`MAX_NAME_LENGTH`] bytes on a char boundary.
fn clamp_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LENGTH {
        return name;
    }
    let mut end = MAX_NAME_LENGTH;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

impl Session {
    /// Add a peer to the roster, reusing the first inactive slot or growing
    /// capacity by exactly one.
    ///
    /// `is_ignored` is seeded from the session's ignore list, so a returning
    /// ignored peer is re-silenced automatically; the returned flag tells
    /// the caller whether protocol-level suppression must be re-asserted.
    ///
    /// A stale join for an already-active peer id is a no-op.
    pub(crate) fn add_peer(
        &mut self,
        peer_id: u32,
        name: &str,
        public_key: PublicKey,
        status: PeerStatus,
        role: PeerRole,
    ) -> Result<bool> {
        if let Some(existing) = self.find_by_peer_id(peer_id) {
            return Ok(existing.is_ignored);
        }

        let name = clamp_name(name).to_string();
        let is_ignored = self.ignored.contains(&public_key);
        let peer = Peer {
            peer_id,
            public_key,
            previous_name: name.clone(),
            name,
            status,
            role,
            active: true,
            is_ignored,
            last_active: crate::time::now_timestamp(),
        };

        match self.peers.iter().position(|p| !p.active) {
            Some(idx) => self.peers[idx] = peer,
            None => {
                self.peers
                    .try_reserve(1)
                    .map_err(|_| Error::AllocationFailed)?;
                self.peers.push(peer);
            }
        }

        self.peer_count += 1;
        self.rebuild_name_cache();
        Ok(is_ignored)
    }

    /// Tombstone the peer with `peer_id`, recompute the peer count, and
    /// truncate the roster to one past the highest remaining active index.
    ///
    /// Returns false (and changes nothing) for an unknown peer id.
    pub(crate) fn remove_peer(&mut self, peer_id: u32) -> bool {
        let Some(idx) = self
            .peers
            .iter()
            .position(|p| p.active && p.peer_id == peer_id)
        else {
            return false;
        };

        self.peers[idx] = Peer::tombstone();
        self.peer_count = self.peers.iter().filter(|p| p.active).count();

        let new_len = self
            .peers
            .iter()
            .rposition(|p| p.active)
            .map_or(0, |i| i + 1);
        self.peers.truncate(new_len);
        self.peers.shrink_to_fit();

        self.rebuild_name_cache();
        true
    }

    /// Rename a peer, preserving the prior name for the
    /// "X is now known as Y" transition record.
    ///
    /// Returns the (old, new) pair, or None for an unknown peer id.
    pub(crate) fn change_nick(&mut self, peer_id: u32, new_name: &str) -> Option<(String, String)> {
        let now = crate::time::now_timestamp();
        let new_name = clamp_name(new_name).to_string();

        let peer = self.find_by_peer_id_mut(peer_id)?;
        peer.previous_name = std::mem::replace(&mut peer.name, new_name.clone());
        peer.last_active = now;
        let old_name = peer.previous_name.clone();

        self.rebuild_name_cache();
        Some((old_name, new_name))
    }

    /// Update a peer's status. No sort, no cache rebuild; status does not
    /// participate in ordering.
    pub(crate) fn set_status(&mut self, peer_id: u32, status: PeerStatus) -> bool {
        let now = crate::time::now_timestamp();
        match self.find_by_peer_id_mut(peer_id) {
            Some(peer) => {
                peer.status = status;
                peer.last_active = now;
                true
            }
            None => false,
        }
    }

    /// Update a peer's role and re-sort the roster.
    pub(crate) fn set_role(&mut self, peer_id: u32, role: PeerRole) -> bool {
        match self.find_by_peer_id_mut(peer_id) {
            Some(peer) => {
                peer.role = role;
                self.rebuild_name_cache();
                true
            }
            None => false,
        }
    }

    /// Refresh a peer's `last_active` timestamp.
    pub(crate) fn touch_peer(&mut self, peer_id: u32) {
        let now = crate::time::now_timestamp();
        if let Some(peer) = self.find_by_peer_id_mut(peer_id) {
            peer.last_active = now;
        }
    }

    /// Drop every peer record and the name cache. The ignore list survives.
    pub(crate) fn clear_peers(&mut self) {
        self.peers.clear();
        self.peers.shrink_to_fit();
        self.peer_count = 0;
        self.name_cache.clear();
    }

    /// Find an active peer by its protocol id.
    pub fn find_by_peer_id(&self, peer_id: u32) -> Option<&Peer> {
        self.peers
            .iter()
            .find(|p| p.active && p.peer_id == peer_id)
    }

    pub(crate) fn find_by_peer_id_mut(&mut self, peer_id: u32) -> Option<&mut Peer> {
        self.peers
            .iter_mut()
            .find(|p| p.active && p.peer_id == peer_id)
    }

    /// Find an active peer by public key.
    pub fn find_by_public_key(&self, key: &PublicKey) -> Option<&Peer> {
        self.peers
            .iter()
            .find(|p| p.active && p.public_key == *key)
    }

    /// Find an active peer by exact nickname.
    ///
    /// Nicknames are not unique; a nick shared by more than one active peer
    /// resolves to [`NickLookup::Ambiguous`].
    pub fn find_by_nick(&self, nick: &str) -> NickLookup {
        let mut found = NickLookup::NotFound;

        for peer in self.peers.iter().filter(|p| p.active) {
            if peer.name == nick {
                if matches!(found, NickLookup::Found(_)) {
                    return NickLookup::Ambiguous;
                }
                found = NickLookup::Found(peer.peer_id);
            }
        }

        found
    }

    /// Cloned records of all active peers, in sorted order.
    pub fn active_peers(&self) -> Vec<Peer> {
        self.peers.iter().filter(|p| p.active).cloned().collect()
    }

    /// Stable sort by `(role rank, case-insensitive name)`, active slots
    /// first.
    pub(crate) fn sort_peers(&mut self) {
        self.peers
            .sort_by_cached_key(|p| (!p.active, p.role.rank(), p.name.to_lowercase()));
    }

    /// Rebuild the sorted name cache from the active peer set.
    ///
    /// Full rebuild on every mutation: sort, then collect active names.
    /// O(n log n), fine for rosters in the tens to low hundreds.
    pub(crate) fn rebuild_name_cache(&mut self) {
        self.sort_peers();
        self.name_cache = self
            .peers
            .iter()
            .filter(|p| p.active)
            .map(|p| p.name.clone())
            .collect();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(0, [0; 32])
    }

    fn key(byte: u8) -> PublicKey {
        [byte; 32]
    }

    fn join(s: &mut Session, id: u32, name: &str, role: PeerRole) {
        s.add_peer(id, name, key(id as u8), PeerStatus::None, role)
            .unwrap();
    }

    fn active_slots(s: &Session) -> usize {
        s.peers.iter().filter(|p| p.active).count()
    }

    #[test]
    fn test_join_grows_by_one() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);
        join(&mut s, 2, "bob", PeerRole::User);

        assert_eq!(s.peer_count(), 2);
        assert_eq!(s.peers.len(), 2);
        assert_eq!(active_slots(&s), 2);
    }

    #[test]
    fn test_stale_join_is_noop() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);
        join(&mut s, 1, "alice-again", PeerRole::User);

        assert_eq!(s.peer_count(), 1);
        assert_eq!(s.find_by_peer_id(1).unwrap().name, "alice");
    }

    #[test]
    fn test_exit_tombstones_and_compacts() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);
        join(&mut s, 2, "bob", PeerRole::User);
        join(&mut s, 3, "carol", PeerRole::User);

        assert!(s.remove_peer(3));
        // Trailing tombstone is truncated away; no gaps above the bound.
        assert_eq!(s.peers.len(), active_slots(&s));
        assert_eq!(s.peer_count(), 2);
    }

    #[test]
    fn test_exit_unknown_peer_is_noop() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);

        assert!(!s.remove_peer(99));
        assert_eq!(s.peer_count(), 1);
    }

    #[test]
    fn test_peer_count_matches_active_slots_across_sequences() {
        let mut s = session();

        for id in 1..=10 {
            join(&mut s, id, &format!("peer{}", id), PeerRole::User);
            assert_eq!(s.peer_count(), active_slots(&s));
        }
        for id in [3, 7, 1, 10] {
            s.remove_peer(id);
            assert_eq!(s.peer_count(), active_slots(&s));
        }
        join(&mut s, 11, "late", PeerRole::User);
        assert_eq!(s.peer_count(), active_slots(&s));
        assert_eq!(s.peer_count(), 7);
    }

    #[test]
    fn test_sort_role_then_name() {
        let mut s = session();
        join(&mut s, 1, "bob", PeerRole::User);
        join(&mut s, 2, "Alice", PeerRole::Founder);
        join(&mut s, 3, "Carol", PeerRole::Moderator);

        assert_eq!(s.name_cache(), &["Alice", "Carol", "bob"]);
    }

    #[test]
    fn test_sort_name_is_case_insensitive() {
        let mut s = session();
        join(&mut s, 1, "zed", PeerRole::User);
        join(&mut s, 2, "Adam", PeerRole::User);
        join(&mut s, 3, "mallory", PeerRole::User);

        assert_eq!(s.name_cache(), &["Adam", "mallory", "zed"]);
    }

    #[test]
    fn test_name_cache_follows_every_mutation() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);
        join(&mut s, 2, "bob", PeerRole::User);
        assert_eq!(s.name_cache(), &["alice", "bob"]);

        s.change_nick(1, "zoe");
        assert_eq!(s.name_cache(), &["bob", "zoe"]);

        s.remove_peer(2);
        assert_eq!(s.name_cache(), &["zoe"]);

        s.set_role(1, PeerRole::Observer);
        assert_eq!(s.name_cache(), &["zoe"]);
    }

    #[test]
    fn test_nick_change_preserves_previous_name() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);

        let (old, new) = s.change_nick(1, "alicia").unwrap();
        assert_eq!(old, "alice");
        assert_eq!(new, "alicia");

        let peer = s.find_by_peer_id(1).unwrap();
        assert_eq!(peer.previous_name, "alice");
        assert_eq!(peer.name, "alicia");
    }

    #[test]
    fn test_nick_change_unknown_peer() {
        let mut s = session();
        assert!(s.change_nick(42, "ghost").is_none());
    }

    #[test]
    fn test_status_change_does_not_reorder() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);
        join(&mut s, 2, "bob", PeerRole::User);
        let before = s.name_cache().to_vec();

        assert!(s.set_status(2, PeerStatus::Busy));
        assert_eq!(s.find_by_peer_id(2).unwrap().status, PeerStatus::Busy);
        assert_eq!(s.name_cache(), &before[..]);
    }

    #[test]
    fn test_find_by_nick_ambiguous() {
        let mut s = session();
        join(&mut s, 1, "dup", PeerRole::User);
        join(&mut s, 2, "dup", PeerRole::User);
        join(&mut s, 3, "solo", PeerRole::User);

        assert_eq!(s.find_by_nick("dup"), NickLookup::Ambiguous);
        assert_eq!(s.find_by_nick("solo"), NickLookup::Found(3));
        assert_eq!(s.find_by_nick("ghost"), NickLookup::NotFound);
    }

    #[test]
    fn test_find_by_public_key() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);

        assert_eq!(s.find_by_public_key(&key(1)).unwrap().peer_id, 1);
        assert!(s.find_by_public_key(&key(9)).is_none());
    }

    #[test]
    fn test_long_name_is_clamped() {
        let mut s = session();
        let long = "x".repeat(MAX_NAME_LENGTH + 40);
        join(&mut s, 1, &long, PeerRole::User);

        assert_eq!(s.find_by_peer_id(1).unwrap().name.len(), MAX_NAME_LENGTH);
    }

    #[test]
    fn test_clamp_respects_char_boundary() {
        // 'é' is two bytes; an odd limit must not split it.
        let name: String = "é".repeat(MAX_NAME_LENGTH / 2 + 10);
        let clamped = clamp_name(&name);
        assert!(clamped.len() <= MAX_NAME_LENGTH);
        assert!(name.starts_with(clamped));
    }

    #[test]
    fn test_clear_peers_keeps_ignore_list() {
        let mut s = session();
        join(&mut s, 1, "alice", PeerRole::User);
        s.ignored.add(key(1)).unwrap();

        s.clear_peers();
        assert_eq!(s.peer_count(), 0);
        assert!(s.name_cache().is_empty());
        assert!(s.ignored.contains(&key(1)));
    }
}
