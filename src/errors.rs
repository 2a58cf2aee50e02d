//! Error handling for the ballot registry

use crate::types::{Address, CandidateId};

/// Result type alias for the ballot registry
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ballot registry
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Caller is not the registry owner
    #[error("Unauthorized: {caller} is not the registry owner")]
    Unauthorized { caller: Address },

    /// Malformed input
    #[error("Invalid argument: {field}")]
    InvalidArgument { field: String },

    /// Voter already on the allow-list
    #[error("Voter {voter} is already registered")]
    AlreadyRegistered { voter: Address },

    /// Vote attempted while the phase is closed
    #[error("Voting is closed")]
    VotingClosed,

    /// Vote attempted by an address that is not allow-listed
    #[error("Voter {voter} is not registered")]
    NotRegistered { voter: Address },

    /// Second vote attempt by the same address
    #[error("Voter {voter} already voted for candidate {candidate_id}")]
    AlreadyVoted {
        voter: Address,
        candidate_id: CandidateId,
    },

    /// Candidate id outside `1..=candidate_count`
    #[error("Invalid candidate {candidate_id} (candidate count is {candidate_count})")]
    InvalidCandidate {
        candidate_id: CandidateId,
        candidate_count: u64,
    },

    /// Signed request failed verification
    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Restored state violates a registry invariant
    #[error("Snapshot rejected: {message}")]
    Snapshot { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new invalid argument error
    pub fn invalid_argument(field: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
        }
    }

    /// Create a new authentication error
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Create a new snapshot error
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this is a precondition rejection the caller can correct,
    /// as opposed to a storage or runtime failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::InvalidArgument { .. }
                | Self::AlreadyRegistered { .. }
                | Self::VotingClosed
                | Self::NotRegistered { .. }
                | Self::AlreadyVoted { .. }
                | Self::InvalidCandidate { .. }
                | Self::Authentication { .. }
        )
    }
}

#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::Error::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::internal(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::invalid_argument("name");
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(err.is_rejection());

        let err = Error::internal("poisoned");
        assert!(matches!(err, Error::Internal { .. }));
        assert!(!err.is_rejection());

        let err = Error::authentication("bad signature");
        assert!(matches!(err, Error::Authentication { .. }));
        assert!(err.is_rejection());

        let err = Error::snapshot("gap in candidate ids");
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidCandidate {
            candidate_id: 3,
            candidate_count: 2,
        };
        assert_eq!(
            err.to_string(),
            "Invalid candidate 3 (candidate count is 2)"
        );

        let err = Error::Unauthorized {
            caller: Address::ZERO,
        };
        assert!(err.to_string().contains("0x0000000000000000000000000000000000000000"));
    }

    #[test]
    fn test_error_macros() {
        let err = internal_error!("lock poisoned");
        assert!(matches!(err, Error::Internal { .. }));

        let err = internal_error!("overflow at {}", 7);
        assert_eq!(err.to_string(), "Internal error: overflow at 7");
    }
}
