use chrono::Utc;
use quiz_backend::models::quiz_attempt::{AnswerMap, RecordedAnswer};
use quiz_backend::models::quiz_results::PassStatus;
use quiz_backend::services::scoring_service::ScoringService;
use uuid::Uuid;

fn answers(correct: usize, wrong: usize) -> AnswerMap {
    let mut map = AnswerMap::new();
    for i in 0..(correct + wrong) {
        map.insert(
            Uuid::new_v4(),
            RecordedAnswer {
                selected_options: vec![format!("opt-{}", i)],
                is_correct: i < correct,
                time_spent: 10,
            },
        );
    }
    map
}

#[test]
fn three_of_four_correct_with_no_time_spent_doubles_xp() {
    let results = ScoringService::compute(&answers(3, 1), 0, Utc::now());
    assert_eq!(results.total_questions, 4);
    assert_eq!(results.correct_answers, 3);
    assert_eq!(results.score, 75.0);
    assert_eq!(results.xp_gained, 150);
    assert_eq!(results.status, PassStatus::Passed);
}

#[test]
fn spending_the_whole_time_budget_removes_the_bonus() {
    let results = ScoringService::compute(&answers(3, 1), 4 * 60, Utc::now());
    assert_eq!(results.score, 75.0);
    assert_eq!(results.xp_gained, 75);
}

#[test]
fn half_the_budget_gives_half_the_bonus() {
    let results = ScoringService::compute(&answers(3, 1), 120, Utc::now());
    // 100 * 0.75 * 1.5 = 112.5
    assert_eq!(results.xp_gained, 113);
}

#[test]
fn running_over_the_budget_never_reduces_base_xp() {
    let results = ScoringService::compute(&answers(3, 1), 10_000, Utc::now());
    assert_eq!(ScoringService::time_bonus(10_000, 4), 0.0);
    assert_eq!(results.xp_gained, 75);
}

#[test]
fn negative_time_never_pushes_the_bonus_past_double() {
    assert_eq!(ScoringService::time_bonus(-600, 1), 1.0);
    assert_eq!(ScoringService::xp_gained(100.0, -600, 1), 200);
}

#[test]
fn empty_answer_map_scores_zero() {
    let results = ScoringService::compute(&AnswerMap::new(), 30, Utc::now());
    assert_eq!(results.total_questions, 0);
    assert_eq!(results.correct_answers, 0);
    assert_eq!(results.score, 0.0);
    assert_eq!(results.xp_gained, 0);
    assert_eq!(results.status, PassStatus::Failed);
}

#[test]
fn pass_threshold_is_inclusive_at_seventy() {
    assert_eq!(ScoringService::pass_status(70.0), PassStatus::Passed);
    assert_eq!(ScoringService::pass_status(69.999_999), PassStatus::Failed);

    let results = ScoringService::compute(&answers(7, 3), 0, Utc::now());
    assert_eq!(results.score, 70.0);
    assert_eq!(results.status, PassStatus::Passed);

    let results = ScoringService::compute(&answers(2, 1), 0, Utc::now());
    assert!(results.score < 70.0);
    assert_eq!(results.status, PassStatus::Failed);
}

#[test]
fn scoring_is_deterministic_for_a_fixed_mapping() {
    let map = answers(5, 2);
    let at = Utc::now();
    let first = ScoringService::compute(&map, 200, at);
    let second = ScoringService::compute(&map, 200, at);
    assert_eq!(first, second);
}

#[test]
fn option_comparison_ignores_order_but_not_extras() {
    let a = vec!["b".to_string(), "a".to_string()];
    let b = vec!["a".to_string(), "b".to_string()];
    let c = vec!["a".to_string()];
    assert!(ScoringService::options_match(&a, &b));
    assert!(!ScoringService::options_match(&a, &c));
    assert!(!ScoringService::options_match(&[], &c));
}
