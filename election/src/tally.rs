//! Vote totals and shares.

use serde::Serialize;
use votechain_types::Candidate;

/// One candidate's share of the vote.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TallyEntry {
    pub candidate: Candidate,
    /// Percentage of all votes, rounded to two decimals.
    pub percentage: f64,
}

/// Totals computed from a candidate list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tally {
    pub total_votes: u64,
    pub entries: Vec<TallyEntry>,
}

impl Tally {
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let total_votes = candidates
            .iter()
            .fold(0u64, |total, c| total.saturating_add(c.vote_count));
        let entries = candidates
            .into_iter()
            .map(|candidate| TallyEntry {
                percentage: percentage(candidate.vote_count, total_votes),
                candidate,
            })
            .collect();
        Self {
            total_votes,
            entries,
        }
    }

    /// The candidate with the most votes; ties go to the earlier entry.
    pub fn leader(&self) -> Option<&TallyEntry> {
        self.entries
            .iter()
            .fold(None, |best: Option<&TallyEntry>, e| match best {
                Some(b) if b.candidate.vote_count >= e.candidate.vote_count => Some(b),
                _ => Some(e),
            })
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (votes as f64 * 10_000.0 / total as f64).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, votes: u64) -> Candidate {
        let mut c = Candidate::new(id, format!("c{id}"));
        c.vote_count = votes;
        c
    }

    #[test]
    fn shares_round_to_two_decimals() {
        let tally = Tally::from_candidates(vec![candidate(1, 1), candidate(2, 2)]);
        assert_eq!(tally.total_votes, 3);
        assert_eq!(tally.entries[0].percentage, 33.33);
        assert_eq!(tally.entries[1].percentage, 66.67);
        assert_eq!(tally.leader().unwrap().candidate.id, 2);
    }

    #[test]
    fn no_votes_is_all_zero() {
        let tally = Tally::from_candidates(vec![candidate(1, 0), candidate(2, 0)]);
        assert!(tally.entries.iter().all(|e| e.percentage == 0.0));
        assert_eq!(tally.leader().unwrap().candidate.id, 1);
    }

    #[test]
    fn oversized_counts_saturate() {
        let tally = Tally::from_candidates(vec![candidate(1, u64::MAX), candidate(2, 5)]);
        assert_eq!(tally.total_votes, u64::MAX);
        assert_eq!(tally.entries[0].percentage, 100.0);
        assert_eq!(tally.leader().unwrap().candidate.id, 1);
    }

    #[test]
    fn empty_has_no_leader() {
        assert!(Tally::from_candidates(Vec::new()).leader().is_none());
    }
}
