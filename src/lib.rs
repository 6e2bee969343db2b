//! # Coterie Core
//!
//! Per-group session and membership state for a group-chat client: peer
//! rosters, ignore lists, name caches, and the event dispatcher that keeps
//! all of them consistent with the remote protocol layer.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        COTERIE CORE MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Registry   │  │   Roster    │  │   Ignore    │  │   Resolver   │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Sessions  │  │ - Peers     │  │ - Key set   │  │ - Hex keys   │   │
//! │  │ - Slots     │  │ - Roles     │  │ - Rejoin    │  │ - Nicknames  │   │
//! │  │ - Scan bound│  │ - Sorting   │  │   survival  │  │ - Ambiguity  │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌───────────────┴─────────────────────────────────┐  │
//! │  │   Events    │  │                  Service                        │  │
//! │  │             │  │                                                 │  │
//! │  │ - GroupEvent│──►  - handle_event() under one exclusive guard     │  │
//! │  │ - Notices   │  │  - grace-window join suppression                │  │
//! │  │ - Exit/Mod  │  │  - moderation desync resync                     │  │
//! │  └─────────────┘  │  - GroupProtocol commands (send, ignore, leave) │  │
//! │                   └─────────────────────────────────────────────────┘  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`protocol`] - The [`protocol::GroupProtocol`] trait and wire-level types
//! - [`events`] - Membership events and display notices
//! - [`session`] - Session registry, peer roster, ignore list, resolver
//! - [`service`] - Event dispatch and the caller-facing API
//!
//! ## Consistency Model
//!
//! The protocol layer is the source of truth for membership; this crate keeps
//! a local mirror so lookups, sorting, and rendering never block on the
//! network. Every event is applied atomically under one exclusive guard, and
//! every handler degrades to a no-op on unknown or stale group and peer ids.
//! When the mirror is caught out of sync (a moderation event naming a peer we
//! do not know), the affected state is re-fetched wholesale rather than
//! patched.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod error;
pub mod events;
pub mod protocol;
pub mod service;
pub mod session;
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use error::{Error, Result};
pub use events::{ExitType, GroupEvent, JoinFail, ModEvent, Notice, PrivacyState, VoiceState};
pub use protocol::{ChatId, GroupProtocol, MessageKind, ProtocolError, PublicKey};
pub use service::{GroupService, RosterSnapshot, GRACE_WINDOW_SECS};
pub use session::roster::{NickLookup, Peer, PeerRole, PeerStatus, MAX_NAME_LENGTH};
pub use session::{Session, SessionRegistry, MAX_SESSIONS};
