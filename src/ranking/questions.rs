//! Next-best question recommendation
use serde::Serialize;
use std::collections::HashSet;

use crate::ranking::library::{QuestionCategory, RecommendableQuestion};
use crate::ranking::profile::PatientProfile;
use crate::ranking::types::DEFAULT_MAX_QUESTIONS;

const BASE_SCORE: u32 = 1;
const CONDITION_MATCH: u32 = 5;
const REPORT_MATCH: u32 = 5;
const COLD_START_BRIEFING_BOOST: u32 = 10;

/// Conversations shorter than this get the briefing boost
const COLD_START_HISTORY: usize = 2;

/// Question with its relevance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredQuestion {
    pub question: RecommendableQuestion,
    pub score: u32,
}

/// Ranks a question catalog against a patient profile
#[derive(Debug, Clone)]
pub struct QuestionRecommender {
    max_questions: usize,
}

impl QuestionRecommender {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_QUESTIONS)
    }

    pub fn with_limit(max_questions: usize) -> Self {
        Self { max_questions }
    }

    /// Score every question not yet asked, best first.
    /// Equal scores keep catalog order.
    pub fn score(
        &self,
        library: &[RecommendableQuestion],
        profile: &PatientProfile,
        question_history: &[String],
    ) -> Vec<ScoredQuestion> {
        let asked: HashSet<String> = question_history.iter().map(|q| q.to_lowercase()).collect();
        let cold_start = question_history.len() < COLD_START_HISTORY;

        let mut scored: Vec<ScoredQuestion> = library
            .iter()
            .filter(|q| !asked.contains(&q.text.to_lowercase()))
            .map(|q| ScoredQuestion {
                question: *q,
                score: score_question(q, profile, cold_start),
            })
            .collect();

        // Stable sort
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    /// Top question texts for the patient
    pub fn recommend(
        &self,
        library: &[RecommendableQuestion],
        profile: &PatientProfile,
        question_history: &[String],
    ) -> Vec<&'static str> {
        self.score(library, profile, question_history)
            .into_iter()
            .take(self.max_questions)
            .map(|scored| scored.question.text)
            .collect()
    }

    pub fn max_questions(&self) -> usize {
        self.max_questions
    }
}

impl Default for QuestionRecommender {
    fn default() -> Self {
        Self::new()
    }
}

fn score_question(question: &RecommendableQuestion, profile: &PatientProfile, cold_start: bool) -> u32 {
    let condition_hits = question
        .relevance
        .conditions
        .iter()
        .filter(|c| profile.has_condition(**c))
        .count() as u32;

    let report_hits = question
        .relevance
        .reports
        .iter()
        .filter(|r| profile.has_report(**r))
        .count() as u32;

    let briefing = if cold_start && question.category == QuestionCategory::BriefingSummary {
        COLD_START_BRIEFING_BOOST
    } else {
        0
    };

    BASE_SCORE + condition_hits * CONDITION_MATCH + report_hits * REPORT_MATCH + briefing
}

/// Recommend the top questions with default settings
pub fn recommend_questions(
    library: &[RecommendableQuestion],
    profile: &PatientProfile,
    question_history: &[String],
) -> Vec<&'static str> {
    QuestionRecommender::new().recommend(library, profile, question_history)
}
