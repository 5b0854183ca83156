//! Clinical relevance ranking
//!
//! Two pure, deterministic rankers:
//! - report selection for bounded-context AI prompts
//! - next-best question recommendation from a fixed catalog

pub mod library;
pub mod profile;
pub mod questions;
pub mod reports;
pub mod types;

pub use library::{QuestionCategory, QuestionRelevance, RecommendableQuestion, QUESTION_LIBRARY};
pub use profile::{Condition, PatientProfile, ReportTag};
pub use questions::{recommend_questions, QuestionRecommender, ScoredQuestion};
pub use reports::{format_reports_for_prompt, select_relevant_reports, RankedReport, ReportRanker, ReportScore};
pub use types::{ClinicalDocument, MedicalHistoryEntry, Patient, RankingConfig, ReportType};
