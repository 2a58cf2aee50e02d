//! Ballot registry state machine
//!
//! [`BallotRegistry`] owns the candidate list, the voter allow-list and the
//! aggregate counters. Every operation validates all of its preconditions
//! before touching state, so a rejected call leaves the registry exactly as
//! it was:
//!
//! 1. Administrative calls (`add_candidate`, `register_voter`,
//!    `set_voting_phase`) require the caller to be the owner fixed at creation
//! 2. `vote` checks phase, registration, prior vote and candidate range, in
//!    that order, and reports the first failure
//! 3. A successful mutation appends exactly one event to the journal
//!
//! The registry is a plain value with `&mut self` mutators. Concurrent hosts
//! go through [`SharedRegistry`], which serializes writers.

pub mod events;
pub mod shared;
pub mod snapshot;

use crate::config::RegistryConfig;
use crate::types::{
    Address, Candidate, CandidateColumns, CandidateId, CandidateTally, VoterRecord, VoterStatus,
    VotingInfo,
};
use crate::{Error, Result, internal_error};
use std::collections::HashMap;

pub use events::{EventJournal, JournalEntry, RegistryEvent};
pub use shared::SharedRegistry;
pub use snapshot::RegistrySnapshot;

/// Owner-administered registry of candidates, voters and tallies
#[derive(Debug, Clone)]
pub struct BallotRegistry {
    owner: Address,
    title: String,
    is_open: bool,
    /// Candidate with id `n` lives at index `n - 1`
    candidates: Vec<Candidate>,
    /// Absent address == unregistered, has not voted
    voters: HashMap<Address, VoterRecord>,
    total_votes: u64,
    journal: EventJournal,
}

impl BallotRegistry {
    /// Create a closed, empty registry owned by `owner`
    pub fn create(owner: Address, title: impl Into<String>) -> Self {
        Self::with_journal(owner, title, EventJournal::default())
    }

    /// Create a registry using the configured title and journal retention
    pub fn from_config(owner: Address, config: &RegistryConfig) -> Self {
        Self::with_journal(
            owner,
            config.title.clone(),
            EventJournal::new(config.retain_journal),
        )
    }

    fn with_journal(owner: Address, title: impl Into<String>, journal: EventJournal) -> Self {
        let title = title.into();
        tracing::info!("🗳️  Ballot registry \"{}\" created by {}", title, owner.short());

        Self {
            owner,
            title,
            is_open: false,
            candidates: Vec::new(),
            voters: HashMap::new(),
            total_votes: 0,
            journal,
        }
    }

    /// Add a candidate and return its id
    pub fn add_candidate(&mut self, caller: &Address, name: &str) -> Result<CandidateId> {
        self.try_add_candidate(caller, name).inspect_err(|err| {
            tracing::warn!(operation = "add_candidate", caller = %caller, "Rejected: {err}")
        })
    }

    fn try_add_candidate(&mut self, caller: &Address, name: &str) -> Result<CandidateId> {
        self.ensure_owner(caller)?;
        if name.is_empty() {
            return Err(Error::invalid_argument("name"));
        }

        let id = self
            .candidate_count()
            .checked_add(1)
            .ok_or_else(|| internal_error!("Candidate id overflow"))?;

        self.journal.record(RegistryEvent::CandidateAdded {
            id,
            name: name.to_string(),
        })?;
        self.candidates.push(Candidate::new(id, name));

        tracing::info!("➕ Candidate {} added: {}", id, name);
        Ok(id)
    }

    /// Allow-list `voter`
    ///
    /// Registering an address twice is an error, not a no-op.
    pub fn register_voter(&mut self, caller: &Address, voter: &Address) -> Result<()> {
        self.try_register_voter(caller, voter).inspect_err(|err| {
            tracing::warn!(operation = "register_voter", caller = %caller, "Rejected: {err}")
        })
    }

    fn try_register_voter(&mut self, caller: &Address, voter: &Address) -> Result<()> {
        self.ensure_owner(caller)?;
        if self.voters.contains_key(voter) {
            return Err(Error::AlreadyRegistered { voter: *voter });
        }

        self.journal
            .record(RegistryEvent::VoterRegistered { voter: *voter })?;
        self.voters.insert(*voter, VoterRecord::default());

        tracing::info!("📝 Voter registered: {}", voter.short());
        Ok(())
    }

    /// Open or close voting
    ///
    /// Setting the phase it already has is allowed and still emits a
    /// notification.
    pub fn set_voting_phase(&mut self, caller: &Address, open: bool) -> Result<()> {
        self.try_set_voting_phase(caller, open).inspect_err(|err| {
            tracing::warn!(operation = "set_voting_phase", caller = %caller, "Rejected: {err}")
        })
    }

    fn try_set_voting_phase(&mut self, caller: &Address, open: bool) -> Result<()> {
        self.ensure_owner(caller)?;

        self.journal
            .record(RegistryEvent::VotingPhaseChanged { is_open: open })?;
        self.is_open = open;

        tracing::info!(
            "{} Voting phase set to {}",
            if open { "🔓" } else { "🔒" },
            if open { "open" } else { "closed" }
        );
        Ok(())
    }

    /// Cast the caller's single vote for `candidate_id`
    pub fn vote(&mut self, caller: &Address, candidate_id: CandidateId) -> Result<()> {
        self.try_vote(caller, candidate_id).inspect_err(|err| {
            tracing::warn!(operation = "vote", caller = %caller, "Rejected: {err}")
        })
    }

    fn try_vote(&mut self, caller: &Address, candidate_id: CandidateId) -> Result<()> {
        if !self.is_open {
            return Err(Error::VotingClosed);
        }

        let record = self
            .voters
            .get(caller)
            .ok_or(Error::NotRegistered { voter: *caller })?;

        if let Some(previous) = record.voted_for {
            return Err(Error::AlreadyVoted {
                voter: *caller,
                candidate_id: previous,
            });
        }

        let index = self.candidate_index(candidate_id)?;

        let vote_count = self.candidates[index]
            .vote_count
            .checked_add(1)
            .ok_or_else(|| internal_error!("Vote count overflow for candidate {}", candidate_id))?;
        let total_votes = self
            .total_votes
            .checked_add(1)
            .ok_or_else(|| internal_error!("Total vote overflow"))?;

        self.journal.record(RegistryEvent::VoteCast {
            voter: *caller,
            candidate_id,
        })?;

        // Everything below is infallible
        self.candidates[index].vote_count = vote_count;
        self.total_votes = total_votes;
        if let Some(record) = self.voters.get_mut(caller) {
            record.voted_for = Some(candidate_id);
        }

        tracing::info!(
            "🗳️ Vote cast: voter={}, candidate={}",
            caller.short(),
            candidate_id
        );
        Ok(())
    }

    /// Look up one candidate
    pub fn get_candidate(&self, id: CandidateId) -> Result<Candidate> {
        let index = self.candidate_index(id)?;
        Ok(self.candidates[index].clone())
    }

    /// All candidates as parallel id/name/count sequences, id ascending
    pub fn get_all_candidates(&self) -> CandidateColumns {
        let mut columns = CandidateColumns::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            columns.push(candidate);
        }
        columns
    }

    /// Voter status for any address, registered or not
    pub fn get_voter(&self, address: &Address) -> VoterStatus {
        VoterStatus::from_record(self.voters.get(address))
    }

    pub fn get_voting_info(&self) -> VotingInfo {
        VotingInfo {
            title: self.title.clone(),
            total_votes: self.total_votes,
            candidate_count: self.candidate_count(),
            is_open: self.is_open,
        }
    }

    /// Per-candidate share of the votes cast so far, in id order
    pub fn tally(&self) -> Vec<CandidateTally> {
        self.candidates
            .iter()
            .map(|candidate| CandidateTally {
                candidate_id: candidate.id,
                name: candidate.name.clone(),
                vote_count: candidate.vote_count,
                percentage: if self.total_votes == 0 {
                    0.0
                } else {
                    candidate.vote_count as f64 / self.total_votes as f64 * 100.0
                },
            })
            .collect()
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Number of candidates, which is also the highest valid id
    pub fn candidate_count(&self) -> u64 {
        self.candidates.len() as u64
    }

    pub fn total_votes(&self) -> u64 {
        self.total_votes
    }

    pub fn registered_voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// Verify the registry's structural invariants
    ///
    /// - candidate ids are exactly `1..=candidate_count`
    /// - every candidate name is non-empty
    /// - `total_votes` equals the sum of all candidate counts
    /// - every recorded choice is a valid candidate id
    /// - each candidate's count equals the number of voters who chose it
    pub fn check_invariants(&self) -> Result<()> {
        let mut sum: u64 = 0;
        for (index, candidate) in self.candidates.iter().enumerate() {
            if candidate.id != index as u64 + 1 {
                return Err(Error::snapshot(format!(
                    "candidate at position {} has id {}",
                    index + 1,
                    candidate.id
                )));
            }
            if candidate.name.is_empty() {
                return Err(Error::snapshot(format!(
                    "candidate {} has an empty name",
                    candidate.id
                )));
            }
            sum = sum
                .checked_add(candidate.vote_count)
                .ok_or_else(|| Error::snapshot("vote counts overflow"))?;
        }

        if sum != self.total_votes {
            return Err(Error::snapshot(format!(
                "total votes {} does not match candidate sum {}",
                self.total_votes, sum
            )));
        }

        let mut chosen = vec![0u64; self.candidates.len()];
        for (address, record) in &self.voters {
            if let Some(id) = record.voted_for {
                if id == 0 || id > self.candidate_count() {
                    return Err(Error::snapshot(format!(
                        "voter {} chose unknown candidate {}",
                        address, id
                    )));
                }
                chosen[(id - 1) as usize] += 1;
            }
        }

        for (candidate, voters) in self.candidates.iter().zip(&chosen) {
            if candidate.vote_count != *voters {
                return Err(Error::snapshot(format!(
                    "candidate {} has {} votes but {} voters chose it",
                    candidate.id, candidate.vote_count, voters
                )));
            }
        }

        Ok(())
    }

    fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if *caller != self.owner {
            return Err(Error::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    fn candidate_index(&self, id: CandidateId) -> Result<usize> {
        if id == 0 || id > self.candidate_count() {
            return Err(Error::InvalidCandidate {
                candidate_id: id,
                candidate_count: self.candidate_count(),
            });
        }
        Ok((id - 1) as usize)
    }
}
