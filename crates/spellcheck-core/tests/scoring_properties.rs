//! Property tests for result parsing, scoring and ranking

use proptest::prelude::*;
use spellcheck_core::{competition_ranks, RoundNumber, SubmissionParser};

fn parser() -> SubmissionParser {
    SubmissionParser::new("Spellcheck", '🟩', '🟥')
}

fn render(round: u32, grid: &[Vec<bool>]) -> String {
    let mut text = format!("Spellcheck #{}", round);
    for row in grid {
        text.push('\n');
        text.extend(row.iter().map(|&ok| if ok { '🟩' } else { '🟥' }));
    }
    text
}

fn grid_strategy() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (1usize..6).prop_flat_map(|width| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), width), 1..8)
    })
}

proptest! {
    #[test]
    fn score_is_row_weighted_success_count(round in 0u32..10_000, grid in grid_strategy()) {
        let expected: u32 = grid
            .iter()
            .enumerate()
            .map(|(i, row)| (i as u32 + 1) * row.iter().filter(|&&ok| ok).count() as u32)
            .sum();

        let submission = parser().parse(&render(round, &grid)).unwrap();
        prop_assert_eq!(submission.round(), RoundNumber::new(round));
        prop_assert_eq!(submission.score(), expected);
    }

    #[test]
    fn wrong_round_never_parses_for_current(current in 0u32..1000, offset in 1u32..1000, grid in grid_strategy()) {
        let text = render(current + offset, &grid);
        prop_assert!(parser().parse_for_round(&text, RoundNumber::new(current)).is_err());
    }

    #[test]
    fn ranks_are_dense_and_start_at_one(mut scores in prop::collection::vec(0u32..50, 1..20)) {
        scores.sort_unstable();
        let ranks = competition_ranks(&scores);

        prop_assert_eq!(ranks[0], 1);
        for i in 1..scores.len() {
            if scores[i] == scores[i - 1] {
                prop_assert_eq!(ranks[i], ranks[i - 1]);
            } else {
                prop_assert_eq!(ranks[i], ranks[i - 1] + 1);
            }
        }
    }
}

#[test]
fn documented_example_scores_five() {
    let submission = parser().parse("Spellcheck #3\n🟩🟥\n🟩🟩").unwrap();
    assert_eq!(submission.score(), 5);
}
