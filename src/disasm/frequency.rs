//! Execution counts per instruction address

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::Program;

use super::decoder::LineDecoder;

/// How often each static instruction executed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyMap {
    counts: HashMap<u64, u64>,
}

impl FrequencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count trace lines whose address is part of `program`
    ///
    /// Addresses with any bit of `excluded_mask` set are skipped, as are
    /// lines the decoder cannot place.
    pub fn from_trace(text: &str, decoder: &dyn LineDecoder, program: &Program, excluded_mask: u64) -> Self {
        let known: HashSet<u64> = program.addresses();
        let mut map = Self::new();
        for line in text.lines() {
            if let Some(address) = decoder.trace_address(line) {
                if address & excluded_mask == 0 && known.contains(&address) {
                    map.record(address);
                }
            }
        }
        map
    }

    /// Add one execution of `address`
    pub fn record(&mut self, address: u64) {
        *self.counts.entry(address).or_insert(0) += 1;
    }

    pub fn count(&self, address: u64) -> Option<u64> {
        self.counts.get(&address).copied()
    }

    /// Number of distinct addresses
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Executed instructions in total
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Executed bytes: count times size of each profiled instruction
    pub fn dynamic_bytes(&self, program: &Program) -> u64 {
        program
            .instructions()
            .iter()
            .filter_map(|i| self.count(i.address()).map(|c| c * i.size_bytes() as u64))
            .sum()
    }
}
