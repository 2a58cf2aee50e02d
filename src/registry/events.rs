//! Registry notifications and the tamper-evident event journal
//!
//! Every successful mutation appends exactly one [`RegistryEvent`]. Entries
//! are chained: each carries the Blake3 hash of its predecessor, so a
//! retained journal can be re-walked with [`EventJournal::verify`].

use crate::types::{Address, CandidateId};
use crate::{Result, internal_error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification emitted by a successful registry operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    CandidateAdded { id: CandidateId, name: String },
    VoterRegistered { voter: Address },
    VoteCast { voter: Address, candidate_id: CandidateId },
    VotingPhaseChanged { is_open: bool },
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in execution order, starting at 1
    pub sequence: u64,

    pub recorded_at: DateTime<Utc>,

    pub event: RegistryEvent,

    /// Hash of the preceding entry (`None` for the first)
    pub previous_hash: Option<[u8; 32]>,

    /// Hash over sequence, timestamp, event and `previous_hash`
    pub entry_hash: [u8; 32],
}

impl JournalEntry {
    fn new(sequence: u64, event: RegistryEvent, previous_hash: Option<[u8; 32]>) -> Result<Self> {
        let recorded_at = Utc::now();
        let entry_hash = Self::compute_hash(sequence, &recorded_at, &event, &previous_hash)?;

        Ok(Self {
            sequence,
            recorded_at,
            event,
            previous_hash,
            entry_hash,
        })
    }

    fn compute_hash(
        sequence: u64,
        recorded_at: &DateTime<Utc>,
        event: &RegistryEvent,
        previous_hash: &Option<[u8; 32]>,
    ) -> Result<[u8; 32]> {
        let content = serde_json::to_vec(&(sequence, recorded_at, event, previous_hash))?;
        Ok(blake3::hash(&content).into())
    }

    /// Recompute this entry's hash and compare it with the stored one
    pub fn verify_integrity(&self) -> Result<bool> {
        let expected =
            Self::compute_hash(self.sequence, &self.recorded_at, &self.event, &self.previous_hash)?;
        Ok(expected == self.entry_hash)
    }
}

/// Append-only log of registry notifications
///
/// A retaining journal is unbounded: it holds one entry per successful
/// operation for the lifetime of the registry, so memory grows with every
/// vote. Long-lived hosts that persist events elsewhere (for example by
/// draining [`SharedRegistry::subscribe`](super::SharedRegistry::subscribe))
/// should disable retention. With retention disabled only the most recent
/// entry is kept; sequence numbers and the hash chain still advance.
#[derive(Debug, Clone)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
    latest: Option<JournalEntry>,
    retain: bool,
}

impl EventJournal {
    pub fn new(retain: bool) -> Self {
        Self {
            entries: Vec::new(),
            latest: None,
            retain,
        }
    }

    /// Append an event and return the recorded entry
    pub fn record(&mut self, event: RegistryEvent) -> Result<JournalEntry> {
        let (sequence, previous_hash) = match &self.latest {
            Some(last) => (
                last.sequence
                    .checked_add(1)
                    .ok_or_else(|| internal_error!("Journal sequence overflow"))?,
                Some(last.entry_hash),
            ),
            None => (1, None),
        };

        let entry = JournalEntry::new(sequence, event, previous_hash)?;
        if self.retain {
            self.entries.push(entry.clone());
        }
        self.latest = Some(entry.clone());
        Ok(entry)
    }

    /// Most recently recorded entry
    pub fn latest(&self) -> Option<&JournalEntry> {
        self.latest.as_ref()
    }

    /// Retained entries in execution order
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Retained entries with a sequence number greater than `sequence`
    pub fn entries_after(&self, sequence: u64) -> &[JournalEntry] {
        let start = self.entries.partition_point(|entry| entry.sequence <= sequence);
        &self.entries[start..]
    }

    /// Number of events recorded so far, retained or not
    pub fn recorded(&self) -> u64 {
        self.latest.as_ref().map_or(0, |entry| entry.sequence)
    }

    pub fn is_retaining(&self) -> bool {
        self.retain
    }

    /// Re-walk the retained chain
    ///
    /// Returns `false` if any entry hash does not match its content, if a
    /// link to the previous entry is broken, or if sequence numbers skip.
    pub fn verify(&self) -> Result<bool> {
        let mut previous: Option<&JournalEntry> = None;

        for entry in &self.entries {
            if !entry.verify_integrity()? {
                tracing::warn!("Journal entry {} failed integrity check", entry.sequence);
                return Ok(false);
            }

            let linked = match previous {
                None => entry.sequence == 1 && entry.previous_hash.is_none(),
                Some(prev) => {
                    entry.sequence == prev.sequence + 1
                        && entry.previous_hash == Some(prev.entry_hash)
                }
            };
            if !linked {
                tracing::warn!("Journal chain broken at entry {}", entry.sequence);
                return Ok(false);
            }

            previous = Some(entry);
        }

        Ok(true)
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(is_open: bool) -> RegistryEvent {
        RegistryEvent::VotingPhaseChanged { is_open }
    }

    #[test]
    fn test_record_chains_entries() {
        let mut journal = EventJournal::new(true);

        let first = journal.record(phase(true)).unwrap();
        let second = journal
            .record(RegistryEvent::CandidateAdded {
                id: 1,
                name: "Alice".to_string(),
            })
            .unwrap();

        assert_eq!(first.sequence, 1);
        assert!(first.previous_hash.is_none());
        assert_eq!(second.sequence, 2);
        assert_eq!(second.previous_hash, Some(first.entry_hash));
        assert_eq!(journal.recorded(), 2);
        assert!(journal.verify().unwrap());
    }

    #[test]
    fn test_tampering_is_detected() {
        let mut journal = EventJournal::new(true);
        journal.record(phase(true)).unwrap();
        journal.record(phase(false)).unwrap();

        journal.entries[1].event = phase(true);
        assert!(!journal.verify().unwrap());
    }

    #[test]
    fn test_broken_link_is_detected() {
        let mut journal = EventJournal::new(true);
        journal.record(phase(true)).unwrap();
        journal.record(phase(false)).unwrap();

        journal.entries.remove(0);
        assert!(!journal.verify().unwrap());
    }

    #[test]
    fn test_non_retaining_journal_keeps_latest_only() {
        let mut journal = EventJournal::new(false);
        journal.record(phase(true)).unwrap();
        let last = journal.record(phase(false)).unwrap();

        assert!(journal.entries().is_empty());
        assert_eq!(journal.latest(), Some(&last));
        assert_eq!(journal.recorded(), 2);
        assert!(journal.verify().unwrap());
    }

    #[test]
    fn test_retention_growth() {
        let mut retaining = EventJournal::new(true);
        let mut bounded = EventJournal::new(false);
        for i in 0..100 {
            retaining.record(phase(i % 2 == 0)).unwrap();
            bounded.record(phase(i % 2 == 0)).unwrap();
        }

        // One retained entry per operation; the non-retaining journal stays flat
        assert_eq!(retaining.entries().len(), 100);
        assert!(bounded.entries().is_empty());
        assert_eq!(bounded.recorded(), retaining.recorded());
        assert!(!bounded.is_retaining());
    }

    #[test]
    fn test_entries_after() {
        let mut journal = EventJournal::default();
        for open in [true, false, true] {
            journal.record(phase(open)).unwrap();
        }

        let tail = journal.entries_after(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, 2);
        assert!(journal.entries_after(3).is_empty());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(phase(true)).unwrap();
        assert_eq!(json["type"], "voting_phase_changed");
        assert_eq!(json["is_open"], true);
    }
}
