//! Report relevance ranking for bounded AI context
//!
//! Each document is scored on its own (recency + acuity + patient context),
//! then the list is stable-sorted by descending score. The result is a
//! relevance order, not a chronological one.

use chrono::NaiveDate;
use serde::Serialize;

use crate::ranking::types::{ClinicalDocument, Patient, ReportType, DEFAULT_MAX_REPORTS};

/// Title keywords and their acuity weight; only the first hit counts
pub const ACUITY_KEYWORDS: &[(&str, f64)] = &[
    ("stemi", 50.0),
    ("admission", 40.0),
    ("holter", 35.0),
    ("stress test", 35.0),
    ("post-pci", 30.0),
    ("interrogation", 30.0),
    ("angiogram", 30.0),
    ("critical", 25.0),
];

/// History/alert keywords and the document types they make relevant
pub const CONTEXT_KEYWORDS: &[(&str, &[ReportType])] = &[
    ("stemi", &[ReportType::Ecg, ReportType::Lab]),
    ("aortic stenosis", &[ReportType::Echo]),
    ("heart failure", &[ReportType::Echo, ReportType::Lab]),
    ("atrial fibrillation", &[ReportType::Ecg, ReportType::Device]),
    ("coronary artery disease", &[ReportType::Cath, ReportType::Cta, ReportType::Lab]),
    ("cardiomyopathy", &[ReportType::Echo, ReportType::Device]),
    ("chronic kidney disease", &[ReportType::Lab]),
];

/// Bonus per matching context keyword
pub const CONTEXT_MATCH_BONUS: f64 = 40.0;

/// Score components for one document
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportScore {
    pub recency: f64,
    pub acuity: f64,
    pub context: f64,
}

impl ReportScore {
    pub fn total(&self) -> f64 {
        self.recency + self.acuity + self.context
    }
}

/// Document with its score
#[derive(Debug, Clone, Serialize)]
pub struct RankedReport<'a> {
    pub document: &'a ClinicalDocument,
    pub score: ReportScore,
}

/// Selects the most relevant documents of a patient
#[derive(Debug, Clone)]
pub struct ReportRanker {
    max_reports: usize,
}

impl ReportRanker {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_REPORTS)
    }

    pub fn with_limit(max_reports: usize) -> Self {
        Self { max_reports }
    }

    /// Score and order every document of the patient relative to `now`
    pub fn rank<'a>(&self, patient: &'a Patient, now: NaiveDate) -> Vec<RankedReport<'a>> {
        let context = patient.context_text();

        let mut ranked: Vec<RankedReport<'a>> = patient
            .reports
            .iter()
            .map(|document| RankedReport {
                document,
                score: ReportScore {
                    recency: recency_score(document.date, now),
                    acuity: acuity_score(&document.title),
                    context: context_score(&document.report_type, &context),
                },
            })
            .collect();

        // Stable sort keeps input order on ties
        ranked.sort_by(|a, b| {
            b.score
                .total()
                .partial_cmp(&a.score.total())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ranked
    }

    /// Top documents by relevance
    pub fn select<'a>(&self, patient: &'a Patient, now: NaiveDate) -> Vec<&'a ClinicalDocument> {
        self.rank(patient, now)
            .into_iter()
            .take(self.max_reports)
            .map(|ranked| ranked.document)
            .collect()
    }

    pub fn max_reports(&self) -> usize {
        self.max_reports
    }
}

impl Default for ReportRanker {
    fn default() -> Self {
        Self::new()
    }
}

/// Select the `limit` most relevant reports
pub fn select_relevant_reports(patient: &Patient, now: NaiveDate, limit: usize) -> Vec<&ClinicalDocument> {
    ReportRanker::with_limit(limit).select(patient, now)
}

/// Bucketed recency bonus minus a slow decay of a point per year
pub fn recency_score(date: NaiveDate, now: NaiveDate) -> f64 {
    let age_days = (now - date).num_days() as f64;

    let bucket = if age_days <= 7.0 {
        100.0
    } else if age_days <= 30.0 {
        50.0
    } else if age_days <= 180.0 {
        10.0
    } else {
        0.0
    };

    bucket - age_days / 365.0
}

/// Weight of the first acuity keyword found in the title
pub fn acuity_score(title: &str) -> f64 {
    let title = title.to_lowercase();
    ACUITY_KEYWORDS
        .iter()
        .find(|(keyword, _)| title.contains(keyword))
        .map_or(0.0, |(_, weight)| *weight)
}

/// Bonus for each context keyword whose types include the document type
pub fn context_score(report_type: &ReportType, context: &str) -> f64 {
    CONTEXT_KEYWORDS
        .iter()
        .filter(|(keyword, types)| context.contains(keyword) && types.contains(report_type))
        .count() as f64
        * CONTEXT_MATCH_BONUS
}

/// Render selected documents as a prompt block, truncating long content
pub fn format_reports_for_prompt(documents: &[&ClinicalDocument], max_chars_per_doc: usize) -> String {
    documents
        .iter()
        .map(|doc| {
            let mut content: String = doc.content.chars().take(max_chars_per_doc).collect();
            if doc.content.chars().count() > max_chars_per_doc {
                content.push_str("...");
            }
            format!(
                "### {} ({}, {})\n{}",
                doc.title,
                doc.report_type,
                doc.date.format("%Y-%m-%d"),
                content.trim_end()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
