//! The shared proposal collection.
//!
//! One store per day board. Views read it through accessors; every change
//! goes through a named mutation that bumps [`ProposalStore::revision`], so
//! hosts can tell when a re-layout is due.

use crate::scheduler::Proposal;
use crate::timeline::Span;

#[derive(Debug, Clone, Default)]
pub struct ProposalStore {
    proposals: Vec<Proposal>,
    revision: u64,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_proposals(proposals: Vec<Proposal>) -> Self {
        let mut store = Self::new();
        store.replace_all(proposals);
        store
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn get(&self, id: &str) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.stable_id == id)
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Incremented on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Add a proposal, replacing one with the same id.
    pub fn insert(&mut self, proposal: Proposal) {
        match self
            .proposals
            .iter_mut()
            .find(|p| p.stable_id == proposal.stable_id)
        {
            Some(existing) => *existing = proposal,
            None => self.proposals.push(proposal),
        }
        self.bump();
    }

    /// Replace the whole collection. Later duplicates of an id win.
    pub fn replace_all(&mut self, proposals: Vec<Proposal>) {
        self.proposals.clear();
        for proposal in proposals {
            match self
                .proposals
                .iter_mut()
                .find(|p| p.stable_id == proposal.stable_id)
            {
                Some(existing) => *existing = proposal,
                None => self.proposals.push(proposal),
            }
        }
        self.bump();
    }

    /// Move a proposal to `start`, keeping its duration. Returns the times it
    /// had before.
    pub fn move_to(&mut self, id: &str, start: u32) -> Option<Span> {
        let proposal = self.proposals.iter_mut().find(|p| p.stable_id == id)?;
        let previous = proposal.span();
        proposal.move_to(start);
        self.bump();
        Some(previous)
    }

    /// Put back times returned by [`move_to`](Self::move_to). The duration is
    /// left alone.
    pub fn restore(&mut self, id: &str, span: Span) -> Option<Span> {
        let proposal = self.proposals.iter_mut().find(|p| p.stable_id == id)?;
        let previous = proposal.span();
        proposal.assigned_start = span.start;
        proposal.assigned_end = span.end;
        self.bump();
        Some(previous)
    }

    pub fn remove(&mut self, id: &str) -> Option<Proposal> {
        let index = self.proposals.iter().position(|p| p.stable_id == id)?;
        let removed = self.proposals.remove(index);
        self.bump();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.proposals.clear();
        self.bump();
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
