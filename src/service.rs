//! # Group Service
//!
//! The event dispatcher and the API surface exposed to the UI/command layer.
//!
//! ## Event Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           EVENT FLOW                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Protocol layer                GroupService              UI layer       │
//! │  ──────────────────────────────────────────────────────────────         │
//! │                                                                         │
//! │  GroupEvent  ────────────►  handle_event()                             │
//! │                             │  (exclusive guard for the                │
//! │                             │   entire mutation)                       │
//! │                             ├── roster update                          │
//! │                             ├── ignore-list check                      │
//! │                             ├── name-cache rebuild                     │
//! │                             ▼                                           │
//! │                             Vec<Notice>  ────────────►  render         │
//! │                                                                         │
//! │  queries/commands ◄───────  GroupProtocol trait                        │
//! │  (roles, keys, send,        (resync, set-ignore,                       │
//! │   leave)                     send, leave)                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-writer model: every mutation happens on the dispatch path under
//! one exclusive `parking_lot` guard held for the whole effect, so a reader
//! can never observe a half-applied event (no torn `peer_count` vs. slot
//! contents). Readers take the shared guard via [`GroupService::with_session`].

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::events::{ExitType, GroupEvent, ModEvent, Notice};
use crate::protocol::{GroupProtocol, MessageKind, ProtocolError};
use crate::session::roster::{Peer, PeerRole};
use crate::session::{Session, SessionRegistry};

/// Seconds after connecting during which join notices are suppressed.
///
/// While the protocol layer back-fills the roster right after we connect,
/// every historical member arrives as a join event; without the window the
/// user would see a notification flood.
pub const GRACE_WINDOW_SECS: i64 = 60;

/// Name used when neither the roster nor the protocol layer knows a peer.
const UNKNOWN_NAME: &str = "Unknown";

/// A consistent point-in-time view of a session's roster for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    /// Number of active peers
    pub peer_count: usize,
    /// Active peer names in sorted order
    pub names: Vec<String>,
}

/// Coordinates session state with the external group-messaging layer.
///
/// Owns the session registry behind a single lock and holds the protocol
/// handle used for queries (roles, keys, names) and commands (send,
/// set-ignore, leave).
pub struct GroupService<P: GroupProtocol> {
    registry: RwLock<SessionRegistry>,
    protocol: P,
}

impl<P: GroupProtocol> GroupService<P> {
    /// Create a service with an empty session registry.
    pub fn new(protocol: P) -> Self {
        Self {
            registry: RwLock::new(SessionRegistry::new()),
            protocol,
        }
    }

    /// The protocol handle this service issues commands through.
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    // ── Session lifecycle ───────────────────────────────────────────────

    /// Open a session for a group we created, loaded, or joined.
    ///
    /// Registers the session, records the group's chat id and name, and
    /// seeds the roster with the local user. The seed join lands inside the
    /// grace window, so it produces no notice.
    pub fn create_session(&self, group_id: u32) -> Result<()> {
        let chat_id = self.protocol.chat_id(group_id)?;
        let self_peer_id = self.protocol.self_peer_id(group_id)?;

        let mut registry = self.registry.write();
        let session = registry.create(group_id, chat_id)?;
        session.group_name = self.protocol.group_name(group_id).unwrap_or_default();
        session.topic = self.protocol.topic(group_id).unwrap_or_default();

        if let Err(err) = self.apply_join(session, group_id, self_peer_id) {
            tracing::warn!("Failed to seed session {} with self: {}", group_id, err);
        }
        Ok(())
    }

    /// Leave the group and release all session state.
    ///
    /// The part message is broadcast through the protocol layer first; a
    /// failure there is logged and does not keep the session alive.
    pub fn close_session(&self, group_id: u32, part_message: &str) -> Result<()> {
        if let Err(err) = self.protocol.leave(group_id, part_message) {
            tracing::warn!("Failed to announce departure from group {}: {}", group_id, err);
        }
        self.registry.write().close(group_id)
    }

    /// Clear the roster and reseed it with the local user only.
    ///
    /// Used after a disconnect to rebuild membership from scratch. The
    /// ignore list survives. The self join notice follows the normal
    /// grace-window rule against the session's original connect time.
    pub fn rejoin(&self, group_id: u32) -> Result<Vec<Notice>> {
        let self_peer_id = self.protocol.self_peer_id(group_id)?;

        let mut registry = self.registry.write();
        let session = registry
            .get_mut(group_id)
            .ok_or(Error::SessionNotFound(group_id))?;

        session.clear_peers();
        let notice = self.apply_join(session, group_id, self_peer_id)?;
        Ok(notice.into_iter().collect())
    }

    // ── Event dispatch ──────────────────────────────────────────────────

    /// Apply one protocol event to the local state.
    ///
    /// This is the single entry point for the protocol layer. The mutation
    /// runs atomically under the exclusive guard and every unknown or stale
    /// group/peer id degrades to a no-op; a stale event never fails the
    /// caller. Returned notices are for the UI to render (or drop).
    pub fn handle_event(&self, event: GroupEvent) -> Vec<Notice> {
        let mut notices = Vec::new();
        let mut registry = self.registry.write();

        let group_id = event.group_id();
        let Some(session) = registry.get_mut(group_id) else {
            tracing::debug!("Dropping event for unknown group {}: {:?}", group_id, event);
            return notices;
        };

        match event {
            GroupEvent::PeerJoin { peer_id, .. } => {
                match self.apply_join(session, group_id, peer_id) {
                    Ok(Some(notice)) => notices.push(notice),
                    Ok(None) => {}
                    Err(err) => {
                        // Roster growth aborted; the session keeps its prior
                        // consistent state.
                        tracing::warn!("Join of peer {} not applied: {}", peer_id, err);
                    }
                }
            }

            GroupEvent::PeerExit {
                peer_id,
                exit_type,
                name,
                part_message,
                ..
            } => {
                if exit_type != ExitType::SelfDisconnected {
                    let message = match part_message.filter(|m| !m.is_empty()) {
                        Some(part) => part,
                        None => exit_type.describe().to_string(),
                    };
                    notices.push(Notice::PeerExited { name, message });
                }
                session.remove_peer(peer_id);
            }

            GroupEvent::NickChange {
                peer_id, new_name, ..
            } => {
                if let Some((old_name, new_name)) = session.change_nick(peer_id, &new_name) {
                    notices.push(Notice::NickChanged { old_name, new_name });
                }
            }

            GroupEvent::SelfNickChange { new_name, .. } => {
                if let Ok(self_peer_id) = self.protocol.self_peer_id(group_id) {
                    if let Some((old_name, new_name)) =
                        session.change_nick(self_peer_id, &new_name)
                    {
                        notices.push(Notice::NickChanged { old_name, new_name });
                    }
                }
            }

            GroupEvent::StatusChange {
                peer_id, status, ..
            } => {
                session.set_status(peer_id, status);
            }

            GroupEvent::Moderation {
                source_peer_id,
                target_peer_id,
                event,
                ..
            } => {
                self.apply_moderation(
                    session,
                    group_id,
                    source_peer_id,
                    target_peer_id,
                    event,
                    &mut notices,
                );
            }

            GroupEvent::TopicChange { peer_id, topic, .. } => {
                let by = self.display_name(session, group_id, peer_id);
                session.topic = topic.clone();
                session.touch_peer(peer_id);
                notices.push(Notice::TopicChanged { by, topic });
            }

            GroupEvent::PeerLimitChange { limit, .. } => {
                notices.push(Notice::PeerLimitChanged { limit });
            }

            GroupEvent::PrivacyStateChange { state, .. } => {
                notices.push(Notice::PrivacyChanged { state });
            }

            GroupEvent::VoiceStateChange { state, .. } => {
                notices.push(Notice::VoiceStateChanged { state });
            }

            GroupEvent::TopicLockChange { locked, .. } => {
                notices.push(Notice::TopicLockChanged { locked });
            }

            GroupEvent::PasswordChange { has_password, .. } => {
                notices.push(Notice::PasswordChanged { has_password });
            }

            GroupEvent::SelfJoin { .. } => {
                self.apply_self_join(session, group_id);
            }

            GroupEvent::JoinRejected { reason, .. } => {
                notices.push(Notice::JoinRejected {
                    reason: reason.describe().to_string(),
                });
            }
        }

        notices
    }

    /// Refresh a peer's `last_active` timestamp, e.g. when a message from
    /// them arrives.
    pub fn note_peer_activity(&self, group_id: u32, peer_id: u32) {
        if let Some(session) = self.registry.write().get_mut(group_id) {
            session.touch_peer(peer_id);
        }
    }

    // ── Read path ───────────────────────────────────────────────────────

    /// Run `f` against the session under the shared guard.
    ///
    /// This is the read path for render threads: the guard spans the whole
    /// closure, so count, peer records, and name cache are mutually
    /// consistent for its duration.
    pub fn with_session<R>(&self, group_id: u32, f: impl FnOnce(&Session) -> R) -> Result<R> {
        let registry = self.registry.read();
        let session = registry
            .get(group_id)
            .ok_or(Error::SessionNotFound(group_id))?;
        Ok(f(session))
    }

    /// Point-in-time roster view: peer count plus sorted names.
    pub fn roster_snapshot(&self, group_id: u32) -> Result<RosterSnapshot> {
        self.with_session(group_id, |session| RosterSnapshot {
            peer_count: session.peer_count(),
            names: session.name_cache().to_vec(),
        })
    }

    /// Cloned records of the session's active peers, in sorted order.
    pub fn peers(&self, group_id: u32) -> Result<Vec<Peer>> {
        self.with_session(group_id, Session::active_peers)
    }

    /// Resolve a nickname or public-key hex string to a peer id.
    pub fn resolve_identifier(&self, group_id: u32, identifier: &str) -> Result<u32> {
        self.with_session(group_id, |session| session.resolve_identifier(identifier))?
    }

    // ── Commands ────────────────────────────────────────────────────────

    /// Ignore or unignore a peer.
    ///
    /// Updates the peer flag and the key set, then asks the protocol layer
    /// to suppress (or restore) the peer's traffic. A failed protocol call
    /// leaves local state updated: the gap is logged and accepted rather
    /// than rolled back.
    pub fn set_ignored(&self, group_id: u32, peer_id: u32, ignore: bool) -> Result<()> {
        let mut registry = self.registry.write();
        let session = registry
            .get_mut(group_id)
            .ok_or(Error::SessionNotFound(group_id))?;

        let peer = session
            .find_by_peer_id_mut(peer_id)
            .ok_or(Error::PeerNotFound)?;
        peer.is_ignored = ignore;
        let public_key = peer.public_key;

        if ignore {
            session.ignored.add(public_key)?;
        } else {
            session.ignored.remove(&public_key);
        }

        if let Err(err) = self.protocol.set_ignore(group_id, peer_id, ignore) {
            tracing::warn!(
                "Protocol refused ignore={} for peer {} in group {}: {} (local state kept)",
                ignore,
                peer_id,
                group_id,
                err
            );
        }
        Ok(())
    }

    /// Send a message to the group, classifying permission failures.
    pub fn send_message(&self, group_id: u32, text: &str, kind: MessageKind) -> Result<()> {
        match self.protocol.send_message(group_id, kind, text) {
            Ok(()) => Ok(()),
            Err(ProtocolError::Permissions) => {
                match self.protocol.self_role(group_id) {
                    Ok(PeerRole::Observer) => Err(Error::Silenced),
                    _ => Err(Error::NoVoice),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Send a private message to one peer, classifying permission failures.
    pub fn send_private_message(&self, group_id: u32, peer_id: u32, text: &str) -> Result<()> {
        match self.protocol.send_private_message(group_id, peer_id, text) {
            Ok(()) => Ok(()),
            Err(ProtocolError::Permissions) => Err(Error::Silenced),
            Err(err) => Err(err.into()),
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Populate a roster slot for `peer_id`, pulling its attributes from
    /// the protocol layer.
    ///
    /// Returns the join notice, or None inside the grace window.
    fn apply_join(
        &self,
        session: &mut Session,
        group_id: u32,
        peer_id: u32,
    ) -> Result<Option<Notice>> {
        // No key, no peer: without it the ignore list and key lookups
        // cannot work, so a failed key query drops the join.
        let public_key = self.protocol.peer_public_key(group_id, peer_id)?;
        let name = self
            .protocol
            .peer_name(group_id, peer_id)
            .unwrap_or_else(|_| UNKNOWN_NAME.to_string());
        let status = self.protocol.peer_status(group_id, peer_id).unwrap_or_default();
        let role = self.protocol.peer_role(group_id, peer_id).unwrap_or_default();

        let is_ignored = session.add_peer(peer_id, &name, public_key, status, role)?;

        if is_ignored {
            // Returning ignored peer: re-assert protocol-level suppression.
            if let Err(err) = self.protocol.set_ignore(group_id, peer_id, true) {
                tracing::warn!(
                    "Failed to re-silence returning peer {} in group {}: {}",
                    peer_id,
                    group_id,
                    err
                );
            }
        }

        let elapsed = crate::time::now_timestamp() - session.connected_since;
        if elapsed >= GRACE_WINDOW_SECS {
            Ok(Some(Notice::PeerJoined { name }))
        } else {
            Ok(None)
        }
    }

    fn apply_moderation(
        &self,
        session: &mut Session,
        group_id: u32,
        source_peer_id: u32,
        target_peer_id: u32,
        event: ModEvent,
        notices: &mut Vec<Notice>,
    ) {
        if session.find_by_peer_id(target_peer_id).is_none() {
            // Desync signal: our roster disagrees with the protocol layer
            // about who is here. Re-fetch every role instead of failing.
            tracing::debug!(
                "Moderation target {} unknown in group {}; resyncing roles",
                target_peer_id,
                group_id
            );
            self.resync_roles(session, group_id);
            return;
        }

        let by = self.display_name(session, group_id, source_peer_id);
        let name = self.display_name(session, group_id, target_peer_id);
        session.touch_peer(source_peer_id);

        match event.assigned_role() {
            None => {
                // Kick removes the peer through the same path as an exit.
                session.remove_peer(target_peer_id);
                notices.push(Notice::PeerKicked { name, by });
            }
            Some(role) => {
                session.set_role(target_peer_id, role);
                notices.push(Notice::RoleChanged { name, by, role });
            }
        }
    }

    /// Re-fetch every active peer's role from the protocol layer.
    fn resync_roles(&self, session: &mut Session, group_id: u32) {
        let peer_ids: Vec<u32> = session
            .active_peers()
            .iter()
            .map(|p| p.peer_id)
            .collect();

        for peer_id in peer_ids {
            if let Ok(role) = self.protocol.peer_role(group_id, peer_id) {
                if let Some(peer) = session.find_by_peer_id_mut(peer_id) {
                    peer.role = role;
                }
            }
        }
        session.rebuild_name_cache();
    }

    /// Reconnected to the group: refresh the state that may have changed
    /// while we were offline.
    fn apply_self_join(&self, session: &mut Session, group_id: u32) {
        session.connected_since = crate::time::now_timestamp();

        if let Ok(name) = self.protocol.group_name(group_id) {
            session.group_name = name;
        }
        if let Ok(topic) = self.protocol.topic(group_id) {
            session.topic = topic;
        }

        // Our own role may have changed while we were away.
        if let (Ok(self_peer_id), Ok(role)) = (
            self.protocol.self_peer_id(group_id),
            self.protocol.self_role(group_id),
        ) {
            session.set_role(self_peer_id, role);
        }
    }

    /// A peer's display name: roster first, protocol fallback.
    fn display_name(&self, session: &Session, group_id: u32, peer_id: u32) -> String {
        if let Some(peer) = session.find_by_peer_id(peer_id) {
            return peer.name.clone();
        }
        self.protocol
            .peer_name(group_id, peer_id)
            .unwrap_or_else(|_| UNKNOWN_NAME.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
