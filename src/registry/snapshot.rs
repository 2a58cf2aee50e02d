//! JSON persistence for registry state
//!
//! A snapshot carries the full registry state but not the event journal;
//! a restored registry starts a fresh journal.

use super::{BallotRegistry, EventJournal};
use crate::types::{Address, Candidate, CandidateId, VoterRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One allow-listed voter in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterEntry {
    pub address: Address,
    pub voted_for: Option<CandidateId>,
}

/// Point-in-time copy of a registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub snapshot_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub owner: Address,
    pub title: String,
    pub is_open: bool,
    pub candidates: Vec<Candidate>,
    /// Sorted by address
    pub voters: Vec<VoterEntry>,
    pub total_votes: u64,
}

impl RegistrySnapshot {
    /// Copy the state of `registry`
    pub fn capture(registry: &BallotRegistry) -> Self {
        let mut voters: Vec<VoterEntry> = registry
            .voters
            .iter()
            .map(|(address, record)| VoterEntry {
                address: *address,
                voted_for: record.voted_for,
            })
            .collect();
        voters.sort_by_key(|entry| entry.address);

        Self {
            snapshot_id: Uuid::new_v4(),
            taken_at: Utc::now(),
            owner: registry.owner,
            title: registry.title.clone(),
            is_open: registry.is_open,
            candidates: registry.candidates.clone(),
            voters,
            total_votes: registry.total_votes,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl BallotRegistry {
    /// Rebuild a registry from a snapshot, rejecting inconsistent state
    pub fn restore(snapshot: RegistrySnapshot, retain_journal: bool) -> Result<Self> {
        let mut voters = HashMap::with_capacity(snapshot.voters.len());
        for entry in &snapshot.voters {
            let record = VoterRecord {
                voted_for: entry.voted_for,
            };
            if voters.insert(entry.address, record).is_some() {
                return Err(Error::snapshot(format!(
                    "voter {} appears more than once",
                    entry.address
                )));
            }
        }

        let registry = Self {
            owner: snapshot.owner,
            title: snapshot.title,
            is_open: snapshot.is_open,
            candidates: snapshot.candidates,
            voters,
            total_votes: snapshot.total_votes,
            journal: EventJournal::new(retain_journal),
        };
        registry.check_invariants()?;

        tracing::debug!(
            "Restored registry \"{}\" from snapshot {}: {} candidates, {} voters, {} votes",
            registry.title,
            snapshot.snapshot_id,
            registry.candidate_count(),
            registry.registered_voter_count(),
            registry.total_votes
        );
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::new([0xaa; 20]);

    fn populated() -> BallotRegistry {
        let mut registry = BallotRegistry::create(OWNER, "Election");
        registry.add_candidate(&OWNER, "Alice").unwrap();
        registry.add_candidate(&OWNER, "Bob").unwrap();
        for byte in 1..=3 {
            registry
                .register_voter(&OWNER, &Address::new([byte; 20]))
                .unwrap();
        }
        registry.set_voting_phase(&OWNER, true).unwrap();
        registry.vote(&Address::new([1; 20]), 2).unwrap();
        registry.vote(&Address::new([2; 20]), 2).unwrap();
        registry
    }

    #[test]
    fn test_restore_preserves_state() {
        let original = populated();
        let json = RegistrySnapshot::capture(&original).to_json().unwrap();

        let restored = BallotRegistry::restore(RegistrySnapshot::from_json(&json).unwrap(), true)
            .unwrap();

        assert_eq!(restored.get_voting_info(), original.get_voting_info());
        assert_eq!(restored.get_all_candidates(), original.get_all_candidates());
        for byte in 1..=4 {
            let address = Address::new([byte; 20]);
            assert_eq!(restored.get_voter(&address), original.get_voter(&address));
        }
        assert_eq!(restored.owner(), &OWNER);
        assert_eq!(restored.journal().recorded(), 0);
    }

    #[test]
    fn test_restored_registry_keeps_enforcing_rules() {
        let snapshot = RegistrySnapshot::capture(&populated());
        let mut restored = BallotRegistry::restore(snapshot, true).unwrap();

        assert!(matches!(
            restored.vote(&Address::new([1; 20]), 1),
            Err(Error::AlreadyVoted { .. })
        ));
        restored.vote(&Address::new([3; 20]), 1).unwrap();
        assert_eq!(restored.total_votes(), 3);
    }

    #[test]
    fn test_snapshot_voters_sorted() {
        let snapshot = RegistrySnapshot::capture(&populated());
        let addresses: Vec<Address> = snapshot.voters.iter().map(|v| v.address).collect();
        let mut sorted = addresses.clone();
        sorted.sort();
        assert_eq!(addresses, sorted);
    }

    #[test]
    fn test_restore_rejects_total_mismatch() {
        let mut snapshot = RegistrySnapshot::capture(&populated());
        snapshot.total_votes = 5;
        assert!(matches!(
            BallotRegistry::restore(snapshot, true),
            Err(Error::Snapshot { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_per_candidate_mismatch() {
        // Both recorded choices are for Bob; move the tally over to Alice
        let mut snapshot = RegistrySnapshot::capture(&populated());
        snapshot.candidates[0].vote_count = 2;
        snapshot.candidates[1].vote_count = 0;

        let err = BallotRegistry::restore(snapshot, true).unwrap_err();
        assert!(matches!(err, Error::Snapshot { ref message } if message.contains("candidate 1")));
    }

    #[test]
    fn test_restore_rejects_id_gap() {
        let mut snapshot = RegistrySnapshot::capture(&populated());
        snapshot.candidates[1].id = 3;
        assert!(matches!(
            BallotRegistry::restore(snapshot, true),
            Err(Error::Snapshot { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_unknown_choice() {
        let mut snapshot = RegistrySnapshot::capture(&populated());
        let voter = snapshot
            .voters
            .iter_mut()
            .find(|v| v.voted_for.is_some())
            .unwrap();
        voter.voted_for = Some(7);
        assert!(matches!(
            BallotRegistry::restore(snapshot, true),
            Err(Error::Snapshot { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_duplicate_voter() {
        let mut snapshot = RegistrySnapshot::capture(&populated());
        let duplicate = snapshot.voters[0];
        snapshot.voters.push(duplicate);
        assert!(matches!(
            BallotRegistry::restore(snapshot, true),
            Err(Error::Snapshot { .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            RegistrySnapshot::from_json("{\"owner\": 1}"),
            Err(Error::Serialization(_))
        ));
    }
}
