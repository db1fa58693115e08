//! Scores candidates against the instruction sequence and ranks them

use rayon::prelude::*;

use crate::disasm::FrequencyMap;
use crate::fusion::FusionCandidate;
use crate::model::Instruction;

use super::matcher::match_at;
use super::metric::{average_count, Objective, ScoringConfig};

/// A candidate with its total improvement
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    pub candidate: FusionCandidate,
    pub score: f64,
}

/// Ranks candidates by the improvement they realize on a sequence
pub struct Selector<'a> {
    objective: Objective,
    scoring: &'a ScoringConfig,
    /// Execution counts; `None` scores statically
    frequencies: Option<&'a FrequencyMap>,
}

impl<'a> Selector<'a> {
    pub fn new(objective: Objective, scoring: &'a ScoringConfig, frequencies: Option<&'a FrequencyMap>) -> Self {
        Self {
            objective,
            scoring,
            frequencies: frequencies.filter(|f| !f.is_empty()),
        }
    }

    /// Whether scores are weighted by execution counts
    pub fn is_dynamic(&self) -> bool {
        self.frequencies.is_some()
    }

    /// Improvement of one match attempt at `start`; never negative
    pub fn score_at(&self, sequence: &[Instruction], candidate: &FusionCandidate, start: usize) -> f64 {
        let Some(outcome) = match_at(sequence, candidate.template(), start) else {
            return 0.0;
        };
        if !outcome.fits_immediates(candidate.total_immediate_width()) {
            return 0.0;
        }

        let mut improvement = self.objective.improvement(candidate, &outcome);
        if let Some(frequencies) = self.frequencies {
            let average = average_count(&outcome, frequencies, self.scoring.averaging);
            if average > 0.0 {
                improvement *= average;
            }
        }
        improvement.max(0.0)
    }

    /// Total improvement over every position the template could start at
    pub fn score(&self, sequence: &[Instruction], candidate: &FusionCandidate) -> f64 {
        let template = candidate.template();
        let Some(first) = template.first() else {
            return 0.0;
        };
        if template.len() < 2 {
            return 0.0;
        }

        sequence
            .iter()
            .enumerate()
            .filter(|(index, instruction)| {
                instruction.base_mnemonic() == first && index + template.len() <= sequence.len()
            })
            .map(|(index, _)| self.score_at(sequence, candidate, index))
            .sum()
    }

    /// Score, rank and truncate candidates
    ///
    /// Single-instruction candidates are dropped. The ranking is stable:
    /// candidates with equal scores keep the order they were passed in.
    ///
    /// # Arguments
    ///
    /// * `sequence` - Instruction sequence to score against
    /// * `candidates` - Merged candidates in discovery order
    /// * `capacity` - Maximum number of candidates to keep
    pub fn select(
        &self,
        sequence: &[Instruction],
        candidates: Vec<FusionCandidate>,
        capacity: usize,
    ) -> Vec<ScoredCandidate> {
        let fusable: Vec<FusionCandidate> = candidates.into_iter().filter(|c| c.len() > 1).collect();
        let mut scored: Vec<ScoredCandidate> = fusable
            .into_par_iter()
            .map(|candidate| {
                let score = self.score(sequence, &candidate);
                ScoredCandidate { candidate, score }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(capacity);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{Format, Width};

    fn inst(address: u64, mnemonic: &str, operands: &[&str]) -> Instruction {
        let mut instruction = Instruction::new(address, "00a50533", mnemonic).unwrap();
        for operand in operands {
            instruction.append_operand(operand).unwrap();
        }
        instruction
    }

    fn candidate(members: &[Instruction]) -> FusionCandidate {
        let mut chain = FusionCandidate::new(Format::new(Width::Full, 9).unwrap());
        for member in members {
            chain.push(member);
        }
        chain
    }

    fn sequence() -> Vec<Instruction> {
        vec![
            inst(0x0, "addi", &["a0", "a0", "1"]),
            inst(0x4, "add", &["a1", "a1", "a0"]),
            inst(0x8, "addi", &["t0", "t0", "2"]),
            inst(0xc, "add", &["t1", "t1", "t0"]),
            inst(0x10, "sub", &["t2", "t2", "t1"]),
        ]
    }

    #[test]
    fn test_static_size_score() {
        let seq = sequence();
        let config = ScoringConfig::default();
        let selector = Selector::new(Objective::Size, &config, None);

        let fused = candidate(&seq[0..2]);
        // Two 4-byte matches, each replaced by one 4-byte instruction
        assert_eq!(selector.score(&seq, &fused), 8.0);
        assert!(!selector.is_dynamic());
    }

    #[test]
    fn test_count_score() {
        let seq = sequence();
        let config = ScoringConfig::default();
        let selector = Selector::new(Objective::Count, &config, None);

        // The sub at 0x10 also completes the match starting at 0x0
        assert_eq!(selector.score(&seq, &candidate(&seq[2..5])), 4.0);
        assert_eq!(selector.score(&seq, &candidate(&seq[0..1])), 0.0);
    }

    #[test]
    fn test_dynamic_weighting() {
        let seq = sequence();
        let config = ScoringConfig::default();
        let mut frequencies = FrequencyMap::new();
        for _ in 0..3 {
            frequencies.record(0x0);
            frequencies.record(0x4);
        }
        let selector = Selector::new(Objective::Count, &config, Some(&frequencies));
        assert!(selector.is_dynamic());

        // First match averages 3 executions, second is unprofiled
        assert_eq!(selector.score(&seq, &candidate(&seq[0..2])), 3.0 + 1.0);
    }

    #[test]
    fn test_empty_profile_scores_statically() {
        let config = ScoringConfig::default();
        let frequencies = FrequencyMap::new();
        let selector = Selector::new(Objective::Count, &config, Some(&frequencies));
        assert!(!selector.is_dynamic());
    }

    #[test]
    fn test_immediate_overflow_scores_zero() {
        let seq = vec![
            inst(0x0, "addi", &["a0", "a0", "0x7ff"]),
            inst(0x4, "add", &["a1", "a1", "a0"]),
        ];
        let narrow = candidate(&[inst(0x0, "addi", &["a0", "a0", "1"]), seq[1].clone()]);
        let config = ScoringConfig::default();
        let selector = Selector::new(Objective::Count, &config, None);

        assert_eq!(narrow.total_immediate_width(), 1);
        assert_eq!(selector.score(&seq, &narrow), 0.0);
    }

    // ========================================================================
    // Ranking Tests
    // ========================================================================

    #[test]
    fn test_select_truncates_with_stable_ties() {
        let mut seq = Vec::new();
        let mut candidates = Vec::new();
        for i in 0..10u64 {
            let op = ["add", "sub", "xor", "or", "and", "sll", "srl", "sra", "slt", "sltu"][i as usize];
            let pair = [inst(i * 8, op, &["a0", "a0", "a1"]), inst(i * 8 + 4, "mul", &["a2", "a2", "a0"])];
            candidates.push(candidate(&pair));
            // Candidates 0..5 occur twice, the rest once
            let repeats = if i < 5 { 2 } else { 1 };
            for _ in 0..repeats {
                seq.extend(pair.iter().cloned());
            }
        }

        let config = ScoringConfig::default();
        let selector = Selector::new(Objective::Count, &config, None);
        let selected = selector.select(&seq, candidates, 4);

        assert_eq!(selected.len(), 4);
        let names: Vec<String> = selected.iter().map(|s| s.candidate.name()).collect();
        assert_eq!(names, vec!["add_mul", "sub_mul", "xor_mul", "or_mul"]);
        assert!(selected.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(selected.iter().all(|s| s.score == 2.0));
    }

    #[test]
    fn test_select_ranks_descending() {
        let seq = sequence();
        let config = ScoringConfig::default();
        let selector = Selector::new(Objective::Count, &config, None);
        let candidates = vec![
            candidate(&seq[3..5]),
            candidate(&seq[0..2]),
            candidate(&seq[2..5]),
            candidate(&seq[4..5]),
        ];

        let selected = selector.select(&seq, candidates, 10);
        let scores: Vec<f64> = selected.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![4.0, 2.0, 2.0]);
        let names: Vec<String> = selected.iter().map(|s| s.candidate.name()).collect();
        assert_eq!(names, vec!["addi_add_sub", "add_sub", "addi_add"]);
    }
}
