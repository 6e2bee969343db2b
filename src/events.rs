//! # Group Events
//!
//! The closed set of membership and state events delivered by the protocol
//! layer, and the display notices the core hands back to the UI.
//!
//! The event set is closed and the handling is data-flow-centric, so the
//! dispatch surface is one tagged union routed through a single function
//! rather than a per-event callback interface.

use serde::{Deserialize, Serialize};

use crate::session::roster::{PeerRole, PeerStatus};

/// Why a peer left the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitType {
    /// The peer quit voluntarily
    Quit,
    /// The peer's connection timed out
    Timeout,
    /// The peer disconnected
    Disconnected,
    /// The peer was kicked
    Kick,
    /// The peer was dropped after a synchronization error
    SyncError,
    /// We ourselves disconnected; exit notices are suppressed
    SelfDisconnected,
}

impl ExitType {
    /// Display string used in exit notices.
    pub fn describe(&self) -> &'static str {
        match self {
            ExitType::Quit => "Quit",
            ExitType::Timeout => "Connection timed out",
            ExitType::Disconnected => "Disconnected",
            ExitType::Kick => "Kicked",
            ExitType::SyncError => "Sync error",
            ExitType::SelfDisconnected => "Disconnected",
        }
    }
}

/// A moderation action taken against a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModEvent {
    /// The target was kicked from the group
    Kick,
    /// The target was demoted to observer (silenced)
    SetObserver,
    /// The target's role was set to ordinary user
    SetUser,
    /// The target was promoted to moderator
    SetModerator,
}

impl ModEvent {
    /// The role a role-set event assigns, or None for a kick.
    pub fn assigned_role(&self) -> Option<PeerRole> {
        match self {
            ModEvent::Kick => None,
            ModEvent::SetObserver => Some(PeerRole::Observer),
            ModEvent::SetUser => Some(PeerRole::User),
            ModEvent::SetModerator => Some(PeerRole::Moderator),
        }
    }
}

/// Why a join attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinFail {
    /// The group is at its peer limit
    PeerLimit,
    /// The supplied password was wrong
    InvalidPassword,
    /// The protocol layer gave no specific reason
    Unknown,
}

impl JoinFail {
    /// User guidance for this rejection.
    pub fn describe(&self) -> &'static str {
        match self {
            JoinFail::PeerLimit => "Group is full. Try again with the '/rejoin' command.",
            JoinFail::InvalidPassword => "Invalid password.",
            JoinFail::Unknown => "Failed to join group. Try again with the '/rejoin' command.",
        }
    }
}

/// Whether the group is publicly discoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivacyState {
    /// Anyone can find and join the group
    Public,
    /// The group is invite-only
    Private,
}

/// Which roles may speak in the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceState {
    /// Everyone may speak
    All,
    /// Moderators and the founder may speak
    Moderator,
    /// Only the founder may speak
    Founder,
}

/// Events delivered by the protocol layer, each scoped to a group.
///
/// Every handler tolerates an unknown or stale `group_id`/`peer_id` by
/// no-op; a stale event must never fail the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupEvent {
    /// A peer joined the group
    PeerJoin {
        /// The group the event belongs to
        group_id: u32,
        /// The joining peer
        peer_id: u32,
    },

    /// A peer left the group
    PeerExit {
        /// The group the event belongs to
        group_id: u32,
        /// The departing peer
        peer_id: u32,
        /// Why the peer left
        exit_type: ExitType,
        /// The departing peer's last known name (the roster slot may
        /// already be gone, so the event carries it)
        name: String,
        /// Optional parting message
        part_message: Option<String>,
    },

    /// A peer changed their nickname
    NickChange {
        /// The group the event belongs to
        group_id: u32,
        /// The renaming peer
        peer_id: u32,
        /// The new nickname
        new_name: String,
    },

    /// We changed our own nickname
    SelfNickChange {
        /// The group the event belongs to
        group_id: u32,
        /// The new nickname
        new_name: String,
    },

    /// A peer changed their status
    StatusChange {
        /// The group the event belongs to
        group_id: u32,
        /// The peer whose status changed
        peer_id: u32,
        /// The new status
        status: PeerStatus,
    },

    /// A moderator or founder acted on another peer
    Moderation {
        /// The group the event belongs to
        group_id: u32,
        /// The acting peer
        source_peer_id: u32,
        /// The peer acted upon
        target_peer_id: u32,
        /// What was done
        event: ModEvent,
    },

    /// The group topic changed
    TopicChange {
        /// The group the event belongs to
        group_id: u32,
        /// The peer who set the topic
        peer_id: u32,
        /// The new topic
        topic: String,
    },

    /// The founder changed the peer limit
    PeerLimitChange {
        /// The group the event belongs to
        group_id: u32,
        /// The new limit
        limit: u32,
    },

    /// The founder changed the privacy state
    PrivacyStateChange {
        /// The group the event belongs to
        group_id: u32,
        /// The new privacy state
        state: PrivacyState,
    },

    /// The founder changed the voice state
    VoiceStateChange {
        /// The group the event belongs to
        group_id: u32,
        /// The new voice state
        state: VoiceState,
    },

    /// The founder locked or unlocked the topic
    TopicLockChange {
        /// The group the event belongs to
        group_id: u32,
        /// Whether the topic is now locked
        locked: bool,
    },

    /// The founder set or removed the group password
    PasswordChange {
        /// The group the event belongs to
        group_id: u32,
        /// Whether the group now has a password
        has_password: bool,
    },

    /// We (re)connected to the group
    SelfJoin {
        /// The group the event belongs to
        group_id: u32,
    },

    /// Our join attempt was rejected
    JoinRejected {
        /// The group the event belongs to
        group_id: u32,
        /// Why the join failed
        reason: JoinFail,
    },
}

impl GroupEvent {
    /// The group this event is scoped to.
    pub fn group_id(&self) -> u32 {
        match self {
            Self::PeerJoin { group_id, .. } => *group_id,
            Self::PeerExit { group_id, .. } => *group_id,
            Self::NickChange { group_id, .. } => *group_id,
            Self::SelfNickChange { group_id, .. } => *group_id,
            Self::StatusChange { group_id, .. } => *group_id,
            Self::Moderation { group_id, .. } => *group_id,
            Self::TopicChange { group_id, .. } => *group_id,
            Self::PeerLimitChange { group_id, .. } => *group_id,
            Self::PrivacyStateChange { group_id, .. } => *group_id,
            Self::VoiceStateChange { group_id, .. } => *group_id,
            Self::TopicLockChange { group_id, .. } => *group_id,
            Self::PasswordChange { group_id, .. } => *group_id,
            Self::SelfJoin { group_id } => *group_id,
            Self::JoinRejected { group_id, .. } => *group_id,
        }
    }

    /// Check if this event can mutate the peer roster.
    pub fn is_roster_event(&self) -> bool {
        matches!(
            self,
            Self::PeerJoin { .. }
                | Self::PeerExit { .. }
                | Self::NickChange { .. }
                | Self::SelfNickChange { .. }
                | Self::StatusChange { .. }
                | Self::Moderation { .. }
        )
    }
}

/// Display notices produced while applying events.
///
/// The core returns these to the caller instead of rendering anything
/// itself; the UI layer decides how (and whether) to show them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// A peer joined (suppressed inside the connection grace window)
    PeerJoined {
        /// The joining peer's name
        name: String,
    },

    /// A peer left
    PeerExited {
        /// The departing peer's name
        name: String,
        /// Part message if one was given, otherwise the exit description
        message: String,
    },

    /// A peer (or we) changed nickname
    NickChanged {
        /// The previous name
        old_name: String,
        /// The new name
        new_name: String,
    },

    /// A peer was kicked by a moderator or the founder
    PeerKicked {
        /// The kicked peer's name
        name: String,
        /// The acting peer's name
        by: String,
    },

    /// A peer's role was changed
    RoleChanged {
        /// The affected peer's name
        name: String,
        /// The acting peer's name
        by: String,
        /// The newly assigned role
        role: PeerRole,
    },

    /// The topic was changed
    TopicChanged {
        /// The peer who set the topic
        by: String,
        /// The new topic
        topic: String,
    },

    /// The founder changed the peer limit
    PeerLimitChanged {
        /// The new limit
        limit: u32,
    },

    /// The founder changed the privacy state
    PrivacyChanged {
        /// The new privacy state
        state: PrivacyState,
    },

    /// The founder changed the voice state
    VoiceStateChanged {
        /// The new voice state
        state: VoiceState,
    },

    /// The founder locked or unlocked the topic
    TopicLockChanged {
        /// Whether the topic is now locked
        locked: bool,
    },

    /// The founder set or removed the password
    PasswordChanged {
        /// Whether the group now has a password
        has_password: bool,
    },

    /// Our join attempt was rejected
    JoinRejected {
        /// Guidance text for the user
        reason: String,
    },
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_group_id() {
        let event = GroupEvent::PeerJoin {
            group_id: 7,
            peer_id: 42,
        };
        assert_eq!(event.group_id(), 7);

        let event = GroupEvent::SelfJoin { group_id: 3 };
        assert_eq!(event.group_id(), 3);
    }

    #[test]
    fn test_roster_event_categorization() {
        let event = GroupEvent::PeerJoin {
            group_id: 0,
            peer_id: 1,
        };
        assert!(event.is_roster_event());

        let event = GroupEvent::TopicChange {
            group_id: 0,
            peer_id: 1,
            topic: "hello".to_string(),
        };
        assert!(!event.is_roster_event());

        let event = GroupEvent::PeerLimitChange {
            group_id: 0,
            limit: 50,
        };
        assert!(!event.is_roster_event());
    }

    #[test]
    fn test_exit_type_descriptions() {
        assert_eq!(ExitType::Quit.describe(), "Quit");
        assert_eq!(ExitType::Timeout.describe(), "Connection timed out");
        assert_eq!(ExitType::Kick.describe(), "Kicked");
        assert_eq!(ExitType::SyncError.describe(), "Sync error");
    }

    #[test]
    fn test_mod_event_assigned_roles() {
        assert_eq!(ModEvent::Kick.assigned_role(), None);
        assert_eq!(
            ModEvent::SetObserver.assigned_role(),
            Some(PeerRole::Observer)
        );
        assert_eq!(ModEvent::SetUser.assigned_role(), Some(PeerRole::User));
        assert_eq!(
            ModEvent::SetModerator.assigned_role(),
            Some(PeerRole::Moderator)
        );
    }

    #[test]
    fn test_join_fail_guidance() {
        assert!(JoinFail::PeerLimit.describe().contains("/rejoin"));
        assert_eq!(JoinFail::InvalidPassword.describe(), "Invalid password.");
    }
}
