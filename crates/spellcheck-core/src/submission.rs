//! Submission Parser
//!
//! Turns a shared result message into a validated, scored submission.
//!
//! # Grammar (version 1)
//!
//! ```text
//! submission := blank* header (NL (row | blank))*
//! header     := any-text "#" ws* digits ws*      ; first non-blank line
//! row        := ws* marker (ws* marker)* ws*     ; one guess attempt
//! marker     := SUCCESS | FAILURE                ; 🟩 / 🟥 by default
//! ```
//!
//! Blank lines after the header are ignored. Every row must carry the same
//! number of markers; any other content after the header is rejected.
//!
//! # Scoring
//!
//! Rows are numbered from 1. Each success marker on row *i* is worth *i*
//! points and failure markers are worth nothing, so a word spelled correctly
//! on the first attempt costs 1 point while one that took three attempts
//! costs 3. The total is the sum over all rows and lower totals rank higher.
//! Note this is not "count the successes": a late correct guess weighs
//! more than an early one.

use crate::config::TrackerConfig;
use crate::errors::{SubmissionError, TrackerError, TrackerResult};
use crate::types::RoundNumber;

/// Version of the grid grammar implemented by this module
pub const GRID_GRAMMAR_VERSION: u8 = 1;

/// Emoji variation selector some clients append to square emoji
const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Result of a single word within one guess attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// A parsed result message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    round: RoundNumber,
    rows: Vec<Vec<Outcome>>,
    score: u32,
}

impl Submission {
    /// Round number declared in the header
    pub fn round(&self) -> RoundNumber {
        self.round
    }

    /// Guess attempts in order, first attempt first
    pub fn rows(&self) -> &[Vec<Outcome>] {
        &self.rows
    }

    /// Weighted score of the grid, see the module docs
    pub fn score(&self) -> u32 {
        self.score
    }
}

/// Score a grid: each success on row `i` (1-indexed) is worth `i` points
///
/// `None` when the total does not fit in a `u32`.
pub fn score_rows(rows: &[Vec<Outcome>]) -> Option<u32> {
    rows.iter().enumerate().try_fold(0u32, |total, (index, row)| {
        let weight = u32::try_from(index).ok()?.checked_add(1)?;
        let successes = row.iter().filter(|o| **o == Outcome::Success).count();
        let successes = u32::try_from(successes).ok()?;
        total.checked_add(successes.checked_mul(weight)?)
    })
}

/// Recognises and parses result messages for one puzzle
#[derive(Debug, Clone)]
pub struct SubmissionParser {
    header_tag: String,
    success: char,
    failure: char,
}

impl SubmissionParser {
    pub fn new(puzzle_name: &str, success: char, failure: char) -> Self {
        Self {
            header_tag: format!("{} #", puzzle_name.trim()),
            success,
            failure,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(
            &config.puzzle_name,
            config.success_marker,
            config.failure_marker,
        )
    }

    /// Whether a chat message is meant as a result submission
    ///
    /// Loose on purpose: a message that passes here but fails `parse` is
    /// answered with a retry request instead of being ignored.
    pub fn looks_like_result(&self, content: &str) -> bool {
        content.contains(&self.header_tag)
            && content
                .chars()
                .any(|c| c == self.success || c == self.failure)
    }

    /// Parse a result message against the version 1 grammar
    pub fn parse(&self, text: &str) -> Result<Submission, SubmissionError> {
        let mut lines = text.lines();

        let header = lines
            .find(|line| !line.trim().is_empty())
            .ok_or(SubmissionError::MissingHeader)?;
        let round = parse_header(header)?;

        let mut rows: Vec<Vec<Outcome>> = Vec::new();
        for line in lines.filter(|line| !line.trim().is_empty()) {
            let row_number = rows.len() + 1;
            let row = self.parse_row(line, row_number)?;

            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(SubmissionError::RaggedRow {
                        row: row_number,
                        expected: first.len(),
                        actual: row.len(),
                    });
                }
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(SubmissionError::EmptyGrid);
        }

        let score =
            score_rows(&rows).ok_or(SubmissionError::GridTooLarge { rows: rows.len() })?;
        Ok(Submission { round, rows, score })
    }

    /// Parse a result message and require it to be for `expected`
    pub fn parse_for_round(&self, text: &str, expected: RoundNumber) -> TrackerResult<Submission> {
        let submission = self.parse(text)?;
        if submission.round() != expected {
            return Err(TrackerError::RoundMismatch {
                expected,
                declared: submission.round(),
            });
        }
        Ok(submission)
    }

    fn parse_row(&self, line: &str, row: usize) -> Result<Vec<Outcome>, SubmissionError> {
        line.chars()
            .filter(|c| !c.is_whitespace() && *c != VARIATION_SELECTOR)
            .map(|c| {
                if c == self.success {
                    Ok(Outcome::Success)
                } else if c == self.failure {
                    Ok(Outcome::Failure)
                } else {
                    Err(SubmissionError::InvalidRow { row })
                }
            })
            .collect()
    }
}

fn parse_header(header: &str) -> Result<RoundNumber, SubmissionError> {
    let invalid = || SubmissionError::InvalidRoundNumber {
        header: header.trim().to_string(),
    };

    let (_, number) = header.split_once('#').ok_or_else(invalid)?;
    let number = number.trim();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    number.parse::<RoundNumber>().map_err(|_| invalid())
}
