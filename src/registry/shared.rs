//! Thread-safe registry handle
//!
//! [`SharedRegistry`] puts a [`BallotRegistry`] behind a single `RwLock`:
//! mutations take the write lock for their whole duration, so each one runs
//! to completion with no interleaving, and reads see either all or none of a
//! mutation's effects. Notifications are published while the write lock is
//! still held, which keeps observer order identical to execution order.

use super::{BallotRegistry, JournalEntry, RegistrySnapshot};
use crate::config::RegistryConfig;
use crate::types::{
    Address, Candidate, CandidateColumns, CandidateId, CandidateTally, VoterStatus, VotingInfo,
};
use crate::{Result, internal_error};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Cloneable handle to one registry instance
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<BallotRegistry>>,
    events: broadcast::Sender<JournalEntry>,
}

impl SharedRegistry {
    /// Wrap an existing registry
    pub fn new(registry: BallotRegistry, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: Arc::new(RwLock::new(registry)),
            events,
        }
    }

    /// Create a fresh registry from configuration
    pub fn from_config(owner: Address, config: &RegistryConfig) -> Self {
        Self::new(
            BallotRegistry::from_config(owner, config),
            config.event_capacity,
        )
    }

    /// Rebuild a registry from a snapshot
    pub fn from_snapshot(snapshot: RegistrySnapshot, config: &RegistryConfig) -> Result<Self> {
        let registry = BallotRegistry::restore(snapshot, config.retain_journal)?;
        Ok(Self::new(registry, config.event_capacity))
    }

    /// Receive every notification published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<JournalEntry> {
        self.events.subscribe()
    }

    pub fn add_candidate(&self, caller: &Address, name: &str) -> Result<CandidateId> {
        self.write(|registry| registry.add_candidate(caller, name))
    }

    pub fn register_voter(&self, caller: &Address, voter: &Address) -> Result<()> {
        self.write(|registry| registry.register_voter(caller, voter))
    }

    pub fn set_voting_phase(&self, caller: &Address, open: bool) -> Result<()> {
        self.write(|registry| registry.set_voting_phase(caller, open))
    }

    pub fn vote(&self, caller: &Address, candidate_id: CandidateId) -> Result<()> {
        self.write(|registry| registry.vote(caller, candidate_id))
    }

    pub fn get_candidate(&self, id: CandidateId) -> Result<Candidate> {
        self.read(|registry| registry.get_candidate(id))?
    }

    pub fn get_all_candidates(&self) -> Result<CandidateColumns> {
        self.read(BallotRegistry::get_all_candidates)
    }

    pub fn get_voter(&self, address: &Address) -> Result<VoterStatus> {
        self.read(|registry| registry.get_voter(address))
    }

    pub fn get_voting_info(&self) -> Result<VotingInfo> {
        self.read(BallotRegistry::get_voting_info)
    }

    pub fn tally(&self) -> Result<Vec<CandidateTally>> {
        self.read(BallotRegistry::tally)
    }

    /// Retained journal entries, oldest first
    pub fn journal_entries(&self) -> Result<Vec<JournalEntry>> {
        self.read(|registry| registry.journal().entries().to_vec())
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.read(BallotRegistry::check_invariants)?
    }

    /// Capture the current state for persistence
    pub fn snapshot(&self) -> Result<RegistrySnapshot> {
        self.read(RegistrySnapshot::capture)
    }

    fn write<T>(&self, op: impl FnOnce(&mut BallotRegistry) -> Result<T>) -> Result<T> {
        let mut registry = self
            .inner
            .write()
            .map_err(|_| internal_error!("Registry write lock poisoned"))?;

        let before = registry.journal().recorded();
        let value = op(&mut registry)?;

        if registry.journal().recorded() != before {
            if let Some(entry) = registry.journal().latest() {
                // Fire-and-forget: having no subscribers is not an error
                let _ = self.events.send(entry.clone());
            }
        }

        Ok(value)
    }

    fn read<T>(&self, op: impl FnOnce(&BallotRegistry) -> T) -> Result<T> {
        let registry = self
            .inner
            .read()
            .map_err(|_| internal_error!("Registry read lock poisoned"))?;
        Ok(op(&registry))
    }
}

impl std::fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegistry")
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}
