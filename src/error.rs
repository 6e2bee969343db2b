//! # Error Handling
//!
//! Error types for coterie-core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Session Errors                                                    │
//! │  │   ├── SessionNotFound       - No session for the group id           │
//! │  │   ├── SessionAlreadyActive  - Group id already registered           │
//! │  │   └── SessionLimitReached   - Registry is out of slots              │
//! │  │                                                                      │
//! │  ├── Roster Errors                                                     │
//! │  │   ├── PeerNotFound          - Identifier matched no active peer     │
//! │  │   ├── AmbiguousNick         - Nickname shared by several peers      │
//! │  │   └── AllocationFailed      - Roster/ignore-list growth aborted     │
//! │  │                                                                      │
//! │  └── Protocol Errors                                                   │
//! │      ├── Silenced              - Send rejected; we are an observer     │
//! │      ├── NoVoice               - Send rejected; voice state excludes us│
//! │      └── Protocol              - Other protocol-layer failure          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal: every variant either degrades to a message the
//! caller can render, or (for roster desync) is handled internally by a
//! full role resync and never surfaces here at all.

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Result type alias for coterie-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for coterie-core
///
/// All errors are categorized by component to make error handling clearer
/// and to provide meaningful messages to users.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Session Errors
    // ========================================================================

    /// No session exists for the given group id
    #[error("No active session for group {0}.")]
    SessionNotFound(u32),

    /// A session for this group id is already registered
    #[error("A session for group {0} is already active.")]
    SessionAlreadyActive(u32),

    /// The session registry has no free slots
    #[error("Session limit reached. Close a group chat before opening another.")]
    SessionLimitReached,

    // ========================================================================
    // Roster Errors
    // ========================================================================

    /// The given identifier matched no active peer
    #[error("Invalid peer name or public key.")]
    PeerNotFound,

    /// More than one active peer uses the given nickname
    #[error("More than one peer is using the name '{0}'; specify the target's public key.")]
    AmbiguousNick(String),

    /// Growing the roster or ignore list failed; state is unchanged
    #[error("Out of memory while growing the peer list.")]
    AllocationFailed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================

    /// The protocol layer rejected a send because we are silenced
    #[error("You are silenced.")]
    Silenced,

    /// The protocol layer rejected a send because we do not have voice
    #[error("You do not have voice.")]
    NoVoice,

    /// Any other protocol-layer failure
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_user_renderable() {
        assert_eq!(Error::Silenced.to_string(), "You are silenced.");
        assert_eq!(Error::NoVoice.to_string(), "You do not have voice.");
        assert_eq!(
            Error::PeerNotFound.to_string(),
            "Invalid peer name or public key."
        );
    }

    #[test]
    fn test_ambiguous_nick_names_the_nick() {
        let err = Error::AmbiguousNick("alice".to_string());
        assert!(err.to_string().contains("alice"));
        assert!(err.to_string().contains("public key"));
    }

    #[test]
    fn test_protocol_error_conversion() {
        let err: Error = ProtocolError::PeerQueryFailed.into();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
