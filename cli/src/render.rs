//! Terminal output for command results.

use serde::Serialize;
use votechain_election::{ActionOutcome, PeriodView, Phase, Tally};
use votechain_orchestrator::AttemptEvent;
use votechain_types::{Candidate, VoterRecord};

/// Print `value` as pretty JSON.
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn period(view: &PeriodView) {
    let p = &view.period;
    match view.phase {
        Phase::NotSet => println!("voting period: not set"),
        Phase::Pending => println!(
            "voting period: pending (opens in {}, window {}..{})",
            votechain_utils::format_duration(p.chain_time.until(p.start_time)),
            p.start_time,
            p.end_time
        ),
        Phase::Active => match view.remaining {
            Some(left) => println!("voting period: active, {left} remaining"),
            None => println!("voting period: active"),
        },
        Phase::Ended => println!("voting period: ended at {}", p.end_time),
    }
}

pub fn candidates(list: &[Candidate]) {
    if list.is_empty() {
        println!("no candidates");
        return;
    }
    for c in list {
        let image = c.image_cid.as_deref().unwrap_or("-");
        println!("{:>4}  {:<24} {:>6} votes  image {}", c.id, c.name, c.vote_count, image);
    }
}

pub fn voters(list: &[VoterRecord]) {
    for v in list {
        let vote = match (v.has_voted, v.voted_candidate_id) {
            (true, Some(id)) => format!("voted for {id}"),
            (true, None) => "voted".to_string(),
            (false, _) => "not voted".to_string(),
        };
        println!("{}  {}", v.address, vote);
    }
}

pub fn tally(tally: &Tally) {
    println!("total votes: {}", tally.total_votes);
    for e in &tally.entries {
        println!(
            "{:>4}  {:<24} {:>6}  {:>6.2}%",
            e.candidate.id, e.candidate.name, e.candidate.vote_count, e.percentage
        );
    }
}

/// One line per attempt state change, on stderr.
pub fn event(event: &AttemptEvent) {
    match event {
        AttemptEvent::Built { action, .. } => eprintln!("[{action}] transaction built"),
        AttemptEvent::AwaitingSignature { action, .. } => {
            eprintln!("[{action}] waiting for wallet signature (Ctrl-C to abandon)")
        }
        AttemptEvent::Broadcast { action, hash, .. } => {
            eprintln!("[{action}] broadcast {hash}, waiting for confirmation")
        }
        AttemptEvent::Confirmed {
            action,
            block_number,
            ..
        } => eprintln!("[{action}] confirmed in block {block_number}"),
        AttemptEvent::Failed {
            action,
            stage,
            reason,
            ..
        } => eprintln!("[{action}] failed during {}: {reason}", stage.as_str()),
    }
}

/// Confirmation line plus any reconciliation warning.
pub fn outcome<T>(label: &str, outcome: &ActionOutcome<T>) {
    println!(
        "{label}: confirmed {} (block {})",
        outcome.confirmation.hash, outcome.confirmation.block_number
    );
    if let Some(warning) = outcome.reconciliation.warning() {
        eprintln!("warning: {warning}");
    }
}
