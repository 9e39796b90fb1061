//! Chat-facing texts
//!
//! Every sentence the tracker posts is built here so the wording stays in
//! one place.

use crate::errors::TrackerError;
use crate::registry::{DeregisterOutcome, RegisterOutcome};
use crate::types::{PlayerName, RoundNumber};

pub fn register_reply(puzzle: &str, outcome: RegisterOutcome) -> String {
    match outcome {
        RegisterOutcome::Registered | RegisterOutcome::Reregistered => {
            format!("You have been registered for {} tracking.", puzzle)
        }
        RegisterOutcome::AlreadyRegistered => {
            format!("You are already registered for {} tracking!", puzzle)
        }
    }
}

pub fn deregister_reply(puzzle: &str, outcome: &DeregisterOutcome) -> String {
    match outcome {
        DeregisterOutcome::Deregistered => {
            format!("You have been deregistered for {} tracking.", puzzle)
        }
        DeregisterOutcome::DataDeleted { .. } => {
            format!("Your saved data has been deleted for {} tracking.", puzzle)
        }
        DeregisterOutcome::NotFound => {
            format!("You have no saved data for {} tracking.", puzzle)
        }
    }
}

pub fn score_ack(player: &PlayerName, score: u32, awaiting_attachment: bool) -> String {
    let mut text = format!("{} scored {} points.", player, score);
    if awaiting_attachment {
        text.push_str(
            "\nPlease send a screenshot of your spellings as a spoiler attachment, **NOT** a link.",
        );
    }
    text
}

pub fn attachment_ack(puzzle: &str, player: &PlayerName, replaced: bool, completed: bool) -> String {
    let mut text = if replaced {
        format!("Received replacement image from {}.", player)
    } else {
        format!("Received image from {}.", player)
    };
    if !completed {
        text.push_str(&format!(
            "\nPlease copy and send your {}-generated results.",
            puzzle
        ));
    }
    text
}

/// Reply to a rejected submission; `mention` addresses the submitter
pub fn rejection(puzzle: &str, mention: &str, error: &TrackerError) -> String {
    match error {
        TrackerError::InvalidFormat(_) => format!(
            "{}, you sent a {} results message with invalid syntax. Please try again.",
            mention, puzzle
        ),
        TrackerError::RoundMismatch { expected, declared } => format!(
            "You sent results for {puzzle} #{declared}; I'm currently only accepting results for {puzzle} #{expected}."
        ),
        TrackerError::AlreadyCompleted { .. } => format!(
            "{}, you have already submitted your results today.",
            mention
        ),
        TrackerError::NotRegistered { .. } => format!(
            "{}, you are not registered! Please register and resend your results.",
            mention
        ),
        TrackerError::NoRegisteredPlayers => format!(
            "{}, there are no registered players! Please register and resend your results to be the first.",
            mention
        ),
        TrackerError::RoundClosed { round } => format!(
            "{}, {} #{} has already been scored. The next round opens at midnight.",
            mention, puzzle, round
        ),
        _ => format!(
            "{}, something went wrong while recording your results. Please try again.",
            mention
        ),
    }
}

pub fn warning(puzzle: &str, mentions: &[String], round: RoundNumber) -> String {
    format!(
        "{}, you have one hour left to do (or skip) the {} #{}!",
        mentions.join(" "),
        puzzle,
        round
    )
}

pub fn shame(puzzle: &str, mentions: &[String], round: RoundNumber) -> String {
    format!(
        "SHAME ON {} FOR NOT DOING {} #{}!",
        mentions.join(" "),
        puzzle,
        round
    )
}

pub fn new_round(puzzle: &str, url: &str, mentions: &[String], round: RoundNumber) -> String {
    format!(
        "{}\nIt's time to do {} #{}!\n{}",
        mentions.join(" "),
        puzzle,
        round,
        url
    )
}

pub fn attachment_caption(player: &PlayerName, caption: Option<&str>) -> String {
    format!("__{}:__\n{}", player, caption.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_texts() {
        let mismatch = TrackerError::RoundMismatch {
            expected: RoundNumber::new(12),
            declared: RoundNumber::new(11),
        };
        assert_eq!(
            rejection("Spellcheck", "@alice", &mismatch),
            "You sent results for Spellcheck #11; I'm currently only accepting results for Spellcheck #12."
        );
        assert!(rejection("Spellcheck", "@alice", &TrackerError::NoRegisteredPlayers)
            .starts_with("@alice, there are no registered players!"));
    }

    #[test]
    fn test_score_ack_requests_screenshot() {
        let alice = PlayerName::new("alice");
        assert_eq!(score_ack(&alice, 5, false), "alice scored 5 points.");
        assert!(score_ack(&alice, 5, true).contains("spoiler attachment"));
    }

    #[test]
    fn test_boundary_texts() {
        let mentions = vec!["@alice".to_string(), "@bob".to_string()];
        assert_eq!(
            warning("Spellcheck", &mentions, RoundNumber::new(3)),
            "@alice @bob, you have one hour left to do (or skip) the Spellcheck #3!"
        );
        assert_eq!(
            shame("Spellcheck", &mentions, RoundNumber::new(3)),
            "SHAME ON @alice @bob FOR NOT DOING Spellcheck #3!"
        );
        assert_eq!(
            new_round("Spellcheck", "https://spellcheck.xyz/", &mentions, RoundNumber::new(4)),
            "@alice @bob\nIt's time to do Spellcheck #4!\nhttps://spellcheck.xyz/"
        );
    }
}
