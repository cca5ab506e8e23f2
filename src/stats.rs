// src/stats.rs

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::models::{
    quiz::{Difficulty, Quiz},
    quiz_result::QuizResult,
};

/// Summary of a user's results: count, mean, max and min of `score`.
/// Produced by a set-based aggregate query; `None` when the user has no results.
#[derive(Debug, Serialize)]
pub struct BasicStats {
    pub total_quizzes: i64,
    pub average_score: f64,
    pub highest_score: i64,
    pub lowest_score: i64,
}

/// Per-group slice of a breakdown. `avg_score` is the truncated integer
/// average (sum of scores divided by count, remainder discarded).
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct GroupStats {
    pub count: i64,
    pub avg_score: i64,
}

/// Full statistics report for a user.
#[derive(Debug, Serialize)]
pub struct UserStatistics {
    pub total_quizzes: i64,
    pub average_score: i64,
    pub best_score: i64,
    pub total_questions_answered: i64,
    pub difficulty_breakdown: HashMap<Difficulty, GroupStats>,
    pub topic_breakdown: HashMap<String, GroupStats>,
    pub recent_activity: i64,
}

#[derive(Default)]
struct GroupAcc {
    count: i64,
    score_sum: i64,
}

impl GroupAcc {
    fn push(&mut self, score: i64) {
        self.count += 1;
        self.score_sum += score;
    }

    fn finish(self) -> GroupStats {
        GroupStats {
            count: self.count,
            avg_score: self.score_sum / self.count,
        }
    }
}

/// Aggregates a user's full result history in a single streaming pass.
///
/// Overall totals (`total_quizzes`, `average_score`, `best_score`,
/// `total_questions_answered`, `recent_activity`) are computed over the raw
/// result set. The difficulty and topic breakdowns only cover results whose
/// quiz still resolves; a dangling `quiz_id` drops the result from both
/// breakdowns without touching the totals. Topic keys are matched exactly,
/// case included.
///
/// `now` is the evaluation instant for the 7-day recency window. The
/// comparison is naive wall-clock time, no timezone offsets.
pub fn aggregate(
    results: &[QuizResult],
    quizzes: &HashMap<i64, Quiz>,
    now: NaiveDateTime,
) -> UserStatistics {
    if results.is_empty() {
        return UserStatistics {
            total_quizzes: 0,
            average_score: 0,
            best_score: 0,
            total_questions_answered: 0,
            difficulty_breakdown: HashMap::new(),
            topic_breakdown: HashMap::new(),
            recent_activity: 0,
        };
    }

    let cutoff = now - Duration::days(7);

    let mut score_sum = 0i64;
    let mut best_score = 0i64;
    let mut total_questions_answered = 0i64;
    let mut recent_activity = 0i64;
    let mut by_difficulty: HashMap<Difficulty, GroupAcc> = HashMap::new();
    let mut by_topic: HashMap<String, GroupAcc> = HashMap::new();

    for result in results {
        score_sum += result.score;
        best_score = best_score.max(result.score);
        total_questions_answered += result.total_questions;
        if result.created_at >= cutoff {
            recent_activity += 1;
        }

        let Some(quiz) = quizzes.get(&result.quiz_id) else {
            continue;
        };
        by_difficulty.entry(quiz.difficulty).or_default().push(result.score);
        by_topic
            .entry(quiz.topic.clone())
            .or_default()
            .push(result.score);
    }

    let total_quizzes = results.len() as i64;

    UserStatistics {
        total_quizzes,
        // Integer division truncates, same as every per-group average.
        average_score: score_sum / total_quizzes,
        best_score,
        total_questions_answered,
        difficulty_breakdown: by_difficulty
            .into_iter()
            .map(|(k, acc)| (k, acc.finish()))
            .collect(),
        topic_breakdown: by_topic.into_iter().map(|(k, acc)| (k, acc.finish())).collect(),
        recent_activity,
    }
}
