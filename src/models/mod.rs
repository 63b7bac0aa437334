pub mod justification;
pub mod payment;
pub mod quiz_attempt;
pub mod quiz_results;
pub mod user_answer;
pub mod xp_entry;
