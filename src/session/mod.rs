//! # Session Module
//!
//! Client-local state for joined group conversations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SESSION MODULE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────┐   ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  │
//! │  │   Registry   │   │   Roster    │  │ Ignore List │  │  Resolver   │  │
//! │  │              │   │             │  │             │  │             │  │
//! │  │ - Create     │──►│ - Join/Exit │  │ - Add       │  │ - Key hex   │  │
//! │  │ - Lookup     │   │ - Rename    │  │ - Remove    │  │ - Nickname  │  │
//! │  │ - Close      │   │ - Roles     │  │ - Contains  │  │ - Ambiguity │  │
//! │  │ - Chat id    │   │ - Sort      │  │ - Persists  │  │             │  │
//! │  └──────────────┘   └──────┬──────┘  └─────────────┘  └─────────────┘  │
//! │                           │                                             │
//! │                    ┌──────┴──────┐                                      │
//! │                    │ Name Cache  │  sorted active names, rebuilt on     │
//! │                    │             │  every roster mutation               │
//! │                    └─────────────┘                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One [`Session`] tracks one joined group: its roster, ignore list, and the
//! derived name cache. The [`SessionRegistry`] is the fixed-capacity table of
//! active sessions; mutation always goes through the service's exclusive
//! guard, so nothing here locks on its own.

pub mod ignore;
pub mod resolve;
pub mod roster;

use crate::error::{Error, Result};
use crate::protocol::ChatId;
use ignore::IgnoreList;
use roster::Peer;

/// Maximum number of simultaneously active group sessions.
pub const MAX_SESSIONS: usize = 32;

/// Client-local state for one joined group conversation.
///
/// Owns the peer roster, the ignore list, and the derived name cache. All
/// fields are mutated only through the event-dispatch path; readers go
/// through the accessor methods under the service's shared guard.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) group_id: u32,
    pub(crate) chat_id: ChatId,
    pub(crate) group_name: String,
    pub(crate) topic: String,
    pub(crate) connected_since: i64,
    pub(crate) peers: Vec<Peer>,
    pub(crate) peer_count: usize,
    pub(crate) ignored: IgnoreList,
    pub(crate) name_cache: Vec<String>,
}

impl Session {
    pub(crate) fn new(group_id: u32, chat_id: ChatId) -> Self {
        Self {
            group_id,
            chat_id,
            group_name: String::new(),
            topic: String::new(),
            connected_since: crate::time::now_timestamp(),
            peers: Vec::new(),
            peer_count: 0,
            ignored: IgnoreList::new(),
            name_cache: Vec::new(),
        }
    }

    /// The protocol-layer group id this session tracks.
    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    /// The group's permanent chat id.
    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// The group's display name.
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// The group's current topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// When we connected to the group (Unix seconds).
    pub fn connected_since(&self) -> i64 {
        self.connected_since
    }

    /// Number of active peers in the roster.
    pub fn peer_count(&self) -> usize {
        self.peer_count
    }

    /// Sorted display names of all active peers.
    ///
    /// Rebuilt on every roster mutation, never stale relative to the last
    /// applied event. Consumed by the sidebar and tab completion.
    pub fn name_cache(&self) -> &[String] {
        &self.name_cache
    }

    /// The session's ignore list.
    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignored
    }
}

/// Fixed-capacity table of active group sessions, keyed by group id.
///
/// Slots are reused after close; the scan bound (`max_index`) is one past
/// the highest occupied slot and is recomputed downward whenever the
/// trailing slot is released.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: Vec<Option<Session>>,
    max_index: usize,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session for `group_id`.
    ///
    /// Reuses the first vacant slot, growing the table only when none is
    /// free. Fails with [`Error::SessionAlreadyActive`] if the group already
    /// has a session, or [`Error::SessionLimitReached`] when all
    /// [`MAX_SESSIONS`] slots are in use.
    pub fn create(&mut self, group_id: u32, chat_id: ChatId) -> Result<&mut Session> {
        if self.get(group_id).is_some() {
            return Err(Error::SessionAlreadyActive(group_id));
        }

        let idx = match self.slots[..self.max_index].iter().position(Option::is_none) {
            Some(i) => i,
            None => {
                if self.max_index == MAX_SESSIONS {
                    return Err(Error::SessionLimitReached);
                }
                if self.slots.len() == self.max_index {
                    self.slots.push(None);
                }
                self.max_index += 1;
                self.max_index - 1
            }
        };

        Ok(self.slots[idx].insert(Session::new(group_id, chat_id)))
    }

    /// Look up the session for `group_id`.
    pub fn get(&self, group_id: u32) -> Option<&Session> {
        self.slots[..self.max_index]
            .iter()
            .flatten()
            .find(|s| s.group_id == group_id)
    }

    /// Mutable lookup for `group_id`.
    pub fn get_mut(&mut self, group_id: u32) -> Option<&mut Session> {
        self.slots[..self.max_index]
            .iter_mut()
            .flatten()
            .find(|s| s.group_id == group_id)
    }

    /// Look up a session by its permanent chat id (linear scan).
    pub fn get_by_chat_id(&self, chat_id: &[u8]) -> Option<&Session> {
        self.slots[..self.max_index]
            .iter()
            .flatten()
            .find(|s| s.chat_id == chat_id)
    }

    /// Close the session for `group_id`, releasing its roster and ignore
    /// list and compacting the scan bound.
    pub fn close(&mut self, group_id: u32) -> Result<()> {
        let idx = self.slots[..self.max_index]
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.group_id == group_id))
            .ok_or(Error::SessionNotFound(group_id))?;

        self.slots[idx] = None;

        // Pull the scan bound down to one past the highest occupied slot.
        self.max_index = self.slots[..self.max_index]
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |i| i + 1);
        self.slots.truncate(self.max_index);

        Ok(())
    }

    /// Number of active sessions.
    pub fn active_count(&self) -> usize {
        self.slots[..self.max_index].iter().flatten().count()
    }

    /// Current scan bound (one past the highest occupied slot).
    pub fn scan_bound(&self) -> usize {
        self.max_index
    }
}

// ============================================================================
// TESTS
// ============================================================================
