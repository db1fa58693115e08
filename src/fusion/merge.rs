//! Candidate deduplication

use std::collections::{HashMap, HashSet};

use super::candidate::{CandidateSignature, FusionCandidate};

/// Candidates keyed by signature, in first-discovered order
///
/// Inserting a candidate whose signature is already present keeps the one
/// with the wider final immediate field; on a tie the earlier one stays.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<FusionCandidate>,
    index: HashMap<CandidateSignature, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FusionCandidate> {
        self.candidates.iter()
    }

    /// Insert a candidate; returns whether the set changed
    pub fn insert(&mut self, candidate: FusionCandidate) -> bool {
        let signature = candidate.signature();
        match self.index.get(&signature) {
            Some(&slot) => {
                if dominates(&candidate, &self.candidates[slot]) {
                    self.candidates[slot] = candidate;
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(signature, self.candidates.len());
                self.candidates.push(candidate);
                true
            }
        }
    }

    pub fn into_vec(self) -> Vec<FusionCandidate> {
        self.candidates
    }
}

impl Extend<FusionCandidate> for CandidateSet {
    fn extend<I: IntoIterator<Item = FusionCandidate>>(&mut self, iter: I) {
        for candidate in iter {
            self.insert(candidate);
        }
    }
}

impl IntoIterator for CandidateSet {
    type Item = FusionCandidate;
    type IntoIter = std::vec::IntoIter<FusionCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}

impl FromIterator<FusionCandidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = FusionCandidate>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        set.extend(iter);
        set
    }
}

/// Strictly wider final immediate field
fn dominates(challenger: &FusionCandidate, incumbent: &FusionCandidate) -> bool {
    challenger.final_immediate_width() > incumbent.final_immediate_width()
}

/// Collapse candidates to one per template
///
/// The first candidate of each template in the set's order is kept. Within one
/// signature the wider final immediate already won in [`CandidateSet::insert`],
/// so candidates sharing a template but not a signature are simply dropped.
pub fn merge(candidates: CandidateSet) -> Vec<FusionCandidate> {
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.template().to_vec()))
        .collect()
}
