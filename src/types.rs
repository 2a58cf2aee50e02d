//! # Core Types for the Ballot Registry
//!
//! This module defines the records the registry stores and the projections it
//! hands back to callers.
//!
//! ## Type Categories
//!
//! ### Identity
//! - [`Address`]: 20-byte caller/voter identity
//! - [`CandidateId`]: dense 1-based candidate identifier
//!
//! ### Stored Records
//! - [`Candidate`]: candidate name and running tally
//! - [`VoterRecord`]: allow-listed voter and the choice they made, if any
//!
//! ### Projections
//! - [`VoterStatus`]: `(has_voted, voted_candidate_id, is_registered)` for any address
//! - [`CandidateColumns`]: parallel id/name/count sequences
//! - [`VotingInfo`]: title, totals and phase
//! - [`CandidateTally`]: per-candidate share of the total
//!
//! ## Usage Examples
//!
//! ```rust
//! use ballot_registry::types::{Address, VoterStatus};
//!
//! let voter: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
//! assert_eq!(voter.to_string(), "0x00000000000000000000000000000000000000aa");
//!
//! // Addresses never seen by the registry project to the zero-value record
//! let status = VoterStatus::UNREGISTERED;
//! assert_eq!(<(bool, u64, bool)>::from(status), (false, 0, false));
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of an [`Address`]
pub const ADDRESS_LENGTH: usize = 20;

/// Dense 1-based candidate identifier, assigned in creation order
pub type CandidateId = u64;

/// A caller or voter identity
///
/// Addresses are opaque 20-byte values. The registry only ever compares them:
/// the owner check is an equality test against the address fixed at creation,
/// and voter records are keyed by address.
///
/// Textual form is `0x` followed by 40 lowercase hex digits; parsing accepts
/// the prefix as optional and either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wrap raw bytes as an address
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Derive an address from an ed25519 verifying key
    ///
    /// Takes the trailing 20 bytes of the Blake3 digest of the key.
    pub fn from_public_key(key: &ed25519_dalek::VerifyingKey) -> Self {
        let digest = blake3::hash(key.as_bytes());
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest.as_bytes()[32 - ADDRESS_LENGTH..]);
        Self(bytes)
    }

    /// Short form used in log lines
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(Error::invalid_argument(format!(
                "address: expected {} hex digits, got {}",
                ADDRESS_LENGTH * 2,
                digits.len()
            )));
        }

        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| Error::invalid_argument(format!("address: {e}")))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

/// A candidate on the ballot
///
/// Everything except `vote_count` is fixed once the candidate is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Position in creation order, starting at 1
    pub id: CandidateId,

    /// Display name, never empty
    pub name: String,

    /// Successful votes referencing this candidate
    pub vote_count: u64,
}

impl Candidate {
    /// Create a candidate with a zero tally
    pub fn new(id: CandidateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vote_count: 0,
        }
    }
}

/// Stored record of an allow-listed voter
///
/// Presence in the registry's voter map means the address is registered.
/// `voted_for` is written once and never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub voted_for: Option<CandidateId>,
}

impl VoterRecord {
    pub fn has_voted(&self) -> bool {
        self.voted_for.is_some()
    }
}

/// Projection of a voter record for any address
///
/// Unregistered addresses project to [`VoterStatus::UNREGISTERED`], and a
/// registered voter who has not voted reports `voted_candidate_id == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterStatus {
    pub has_voted: bool,
    pub voted_candidate_id: CandidateId,
    pub is_registered: bool,
}

impl VoterStatus {
    /// Zero-value status of an address the registry has never seen
    pub const UNREGISTERED: VoterStatus = VoterStatus {
        has_voted: false,
        voted_candidate_id: 0,
        is_registered: false,
    };

    /// Map an optional stored record to its public projection
    pub fn from_record(record: Option<&VoterRecord>) -> Self {
        match record {
            None => Self::UNREGISTERED,
            Some(record) => Self {
                has_voted: record.has_voted(),
                voted_candidate_id: record.voted_for.unwrap_or(0),
                is_registered: true,
            },
        }
    }
}

impl From<VoterStatus> for (bool, CandidateId, bool) {
    fn from(status: VoterStatus) -> Self {
        (
            status.has_voted,
            status.voted_candidate_id,
            status.is_registered,
        )
    }
}

/// All candidates as three parallel sequences, ordered by ascending id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateColumns {
    pub ids: Vec<CandidateId>,
    pub names: Vec<String>,
    pub vote_counts: Vec<u64>,
}

impl CandidateColumns {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
            vote_counts: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, candidate: &Candidate) {
        self.ids.push(candidate.id);
        self.names.push(candidate.name.clone());
        self.vote_counts.push(candidate.vote_count);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Summary of the registry as a whole
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingInfo {
    pub title: String,
    pub total_votes: u64,
    pub candidate_count: u64,
    pub is_open: bool,
}

/// A candidate's share of the votes cast so far
///
/// Tallies are listed in id order. No winner is derived from them and ties
/// are left as ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate_id: CandidateId,
    pub name: String,
    pub vote_count: u64,

    /// `vote_count / total_votes * 100`, or `0.0` before any vote is cast
    pub percentage: f64,
}
