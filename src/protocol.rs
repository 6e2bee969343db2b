//! # Protocol Seam
//!
//! The boundary between this crate and the external group-messaging layer.
//!
//! The core never touches the network: it consumes [`GroupEvent`]s fed in by
//! the protocol layer and issues commands back through the [`GroupProtocol`]
//! trait. A real client implements this trait over its wire library; tests
//! implement it over an in-memory fake.
//!
//! [`GroupEvent`]: crate::events::GroupEvent

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::roster::{PeerRole, PeerStatus};

/// Size in bytes of a peer public key and of a group chat id.
///
/// The two are the same size on the wire; `ChatId` and `PublicKey` are kept
/// as distinct aliases anyway so signatures stay readable.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// A peer's long-term public key.
pub type PublicKey = [u8; PUBLIC_KEY_SIZE];

/// A group's permanent chat id.
pub type ChatId = [u8; PUBLIC_KEY_SIZE];

/// Kind of group message being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// A regular chat message
    Normal,
    /// An action ("/me") message
    Action,
}

/// Errors surfaced by the protocol layer.
///
/// These are deliberately coarse: the core only needs to distinguish
/// permission failures (which it classifies for the user) from everything
/// else (which it passes through as display text).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A send was rejected for lack of permission
    #[error("insufficient permissions")]
    Permissions,

    /// A per-peer query (name, key, role, status) failed
    #[error("peer query failed")]
    PeerQueryFailed,

    /// A group state query (name, topic, chat id) failed
    #[error("group state query failed")]
    StateQueryFailed,

    /// A send failed for a reason other than permissions
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Commands and queries the core issues to the group-messaging layer.
///
/// Implementations must not block: every method is expected to resolve
/// against already-synchronized protocol state, the same way the event
/// callbacks feeding [`handle_event`] do.
///
/// [`handle_event`]: crate::service::GroupService::handle_event
pub trait GroupProtocol {
    /// Our own peer id within the group.
    fn self_peer_id(&self, group_id: u32) -> Result<u32, ProtocolError>;

    /// Our own role within the group.
    fn self_role(&self, group_id: u32) -> Result<PeerRole, ProtocolError>;

    /// A peer's current display name.
    fn peer_name(&self, group_id: u32, peer_id: u32) -> Result<String, ProtocolError>;

    /// A peer's public key.
    fn peer_public_key(&self, group_id: u32, peer_id: u32) -> Result<PublicKey, ProtocolError>;

    /// A peer's current status.
    fn peer_status(&self, group_id: u32, peer_id: u32) -> Result<PeerStatus, ProtocolError>;

    /// A peer's current role.
    fn peer_role(&self, group_id: u32, peer_id: u32) -> Result<PeerRole, ProtocolError>;

    /// The group's name.
    fn group_name(&self, group_id: u32) -> Result<String, ProtocolError>;

    /// The group's current topic.
    fn topic(&self, group_id: u32) -> Result<String, ProtocolError>;

    /// The group's permanent chat id.
    fn chat_id(&self, group_id: u32) -> Result<ChatId, ProtocolError>;

    /// Toggle protocol-level suppression of a peer's messages.
    fn set_ignore(&self, group_id: u32, peer_id: u32, ignore: bool) -> Result<(), ProtocolError>;

    /// Send a message to the whole group.
    fn send_message(
        &self,
        group_id: u32,
        kind: MessageKind,
        text: &str,
    ) -> Result<(), ProtocolError>;

    /// Send a private message to a single peer.
    fn send_private_message(
        &self,
        group_id: u32,
        peer_id: u32,
        text: &str,
    ) -> Result<(), ProtocolError>;

    /// Leave the group, broadcasting a part message.
    fn leave(&self, group_id: u32, part_message: &str) -> Result<(), ProtocolError>;
}
