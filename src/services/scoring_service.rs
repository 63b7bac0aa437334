use crate::models::quiz_attempt::AnswerMap;
use crate::models::quiz_results::{PassStatus, QuizResults};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub const BASE_XP: f64 = 100.0;
pub const PASSING_SCORE: f64 = 70.0;
/// Time budget per answered question before the speed bonus starts shrinking.
pub const SECONDS_PER_QUESTION: f64 = 60.0;

pub struct ScoringService;

impl ScoringService {
    /// Returns `(total_questions, correct_answers, score)`, with score in 0..=100.
    pub fn score(answers: &AnswerMap) -> (u32, u32, f64) {
        let total = answers.len() as u32;
        let correct = answers.values().filter(|a| a.is_correct).count() as u32;
        let score = if total == 0 {
            0.0
        } else {
            100.0 * f64::from(correct) / f64::from(total)
        };
        (total, correct, score)
    }

    /// Speed bonus in `0..=1`, so XP is at most doubled.
    pub fn time_bonus(time_spent: i32, total_questions: u32) -> f64 {
        if total_questions == 0 {
            return 0.0;
        }
        let budget = f64::from(total_questions) * SECONDS_PER_QUESTION;
        (1.0 - f64::from(time_spent) / budget).clamp(0.0, 1.0)
    }

    pub fn xp_gained(score: f64, time_spent: i32, total_questions: u32) -> i32 {
        let multiplier = score / 100.0;
        let bonus = Self::time_bonus(time_spent, total_questions);
        (BASE_XP * multiplier * (1.0 + bonus)).round() as i32
    }

    pub fn pass_status(score: f64) -> PassStatus {
        if score >= PASSING_SCORE {
            PassStatus::Passed
        } else {
            PassStatus::Failed
        }
    }

    pub fn compute(answers: &AnswerMap, time_spent: i32, completed_at: DateTime<Utc>) -> QuizResults {
        let (total_questions, correct_answers, score) = Self::score(answers);
        QuizResults {
            total_questions,
            correct_answers,
            score,
            xp_gained: Self::xp_gained(score, time_spent, total_questions),
            status: Self::pass_status(score),
            completed_at,
        }
    }

    /// An answer is correct when the selected set equals the correct set, order ignored.
    pub fn options_match(selected: &[String], correct: &[String]) -> bool {
        let selected: HashSet<&str> = selected.iter().map(|s| s.as_str()).collect();
        let correct: HashSet<&str> = correct.iter().map(|s| s.as_str()).collect();
        selected == correct
    }
}
