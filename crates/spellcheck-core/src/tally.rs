//! Tally Engine
//!
//! Ranks the registered players that completed the round, credits the
//! winners and renders the scoreboard. Lower scores rank higher.

use tracing::{debug, info};

use crate::errors::{TrackerError, TrackerResult};
use crate::registry::PlayerRegistry;
use crate::types::{PlayerName, RoundNumber};

/// One scoreboard row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub rank: u32,
    pub name: PlayerName,
    pub score: u32,
    /// Lifetime wins, including this round's win if any
    pub win_count: u32,
    pub winner: bool,
}

/// Final ranking of a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    pub round: RoundNumber,
    pub standings: Vec<Standing>,
}

impl Scoreboard {
    pub fn winners(&self) -> impl Iterator<Item = &Standing> {
        self.standings.iter().filter(|s| s.winner)
    }

    pub fn is_empty(&self) -> bool {
        self.standings.is_empty()
    }

    /// Human-readable scoreboard lines, header first
    pub fn lines(&self, puzzle_name: &str) -> Vec<String> {
        let mut lines = vec![format!(
            "{} #{} COMPLETE!\n\n**SCOREBOARD:**",
            puzzle_name.to_uppercase(),
            self.round
        )];

        if self.standings.is_empty() {
            lines.push("Nobody submitted results.".to_string());
        }

        for standing in &self.standings {
            let wins = match standing.win_count {
                1 => "1 win".to_string(),
                n => format!("{} wins", n),
            };
            if standing.winner {
                lines.push(format!(
                    "{}. {} ({}) wins with a score of {}!",
                    standing.rank, standing.name, wins, standing.score
                ));
            } else {
                lines.push(format!(
                    "{}. {} ({}) got a score of {}.",
                    standing.rank, standing.name, wins, standing.score
                ));
            }
        }

        lines
    }

    /// The scoreboard as a single chat message
    pub fn render(&self, puzzle_name: &str) -> String {
        let mut text = self.lines(puzzle_name).join("\n");
        text.push('\n');
        text
    }
}

/// Rank already-sorted ascending scores
///
/// Equal scores share a rank and the next distinct score takes the next
/// rank: `[5, 5, 7, 9]` ranks as `[1, 1, 2, 3]`.
pub fn competition_ranks(sorted_scores: &[u32]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted_scores.len());
    let mut rank = 0;
    let mut previous = None;

    for &score in sorted_scores {
        if previous != Some(score) {
            rank += 1;
            previous = Some(score);
        }
        ranks.push(rank);
    }

    ranks
}

/// Produces the ranking for a round
#[derive(Debug, Clone, Copy, Default)]
pub struct TallyEngine;

impl TallyEngine {
    /// Rank every registered player that completed the round and credit a
    /// win to each player tied for the lowest score
    ///
    /// Fails with `NoRegisteredPlayers` without touching the registry when
    /// the roster has nobody registered.
    pub fn tally(
        &self,
        registry: &mut PlayerRegistry,
        round: RoundNumber,
    ) -> TrackerResult<Scoreboard> {
        if !registry.has_registered() {
            debug!("Nothing to tally for round {}", round);
            return Err(TrackerError::NoRegisteredPlayers);
        }

        let mut entries: Vec<(PlayerName, u32)> = registry
            .registered()
            .filter(|p| p.has_completed())
            .map(|p| (p.name().clone(), p.score()))
            .collect();
        // Stable: ties keep registration order
        entries.sort_by_key(|(_, score)| *score);

        let best = entries.first().map(|(_, score)| *score);
        let scores: Vec<u32> = entries.iter().map(|(_, score)| *score).collect();
        let ranks = competition_ranks(&scores);

        let mut standings = Vec::with_capacity(entries.len());
        for ((name, score), rank) in entries.into_iter().zip(ranks) {
            let winner = Some(score) == best;
            let mut win_count = 0;
            if let Some(player) = registry.find_mut(&name) {
                if winner {
                    player.record_win();
                }
                win_count = player.win_count();
            }
            debug!("{}. {} ({} wins) with {} score", rank, name, win_count, score);
            standings.push(Standing {
                rank,
                name,
                score,
                win_count,
                winner,
            });
        }

        info!(
            "Tallied round {}: {} ranked, {} winner(s)",
            round,
            standings.len(),
            standings.iter().filter(|s| s.winner).count()
        );

        Ok(Scoreboard { round, standings })
    }
}
