//! Clinical record shapes consumed by the rankers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::Result;

/// Default number of documents selected for a prompt
pub const DEFAULT_MAX_REPORTS: usize = 7;

/// Default number of recommended questions
pub const DEFAULT_MAX_QUESTIONS: usize = 5;

/// Ranking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Documents kept for a bounded AI context (default: 7)
    pub max_reports: usize,

    /// Questions recommended per turn (default: 5)
    pub max_questions: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_reports: DEFAULT_MAX_REPORTS,
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }
}

/// Kind of clinical document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportType {
    Lab,
    Ecg,
    Echo,
    Imaging,
    Meds,
    Cath,
    Device,
    Cta,
    Pdf,
    Link,
    /// Any type label not listed above, kept verbatim
    Other(String),
}

impl ReportType {
    pub fn as_str(&self) -> &str {
        match self {
            ReportType::Lab => "Lab",
            ReportType::Ecg => "ECG",
            ReportType::Echo => "Echo",
            ReportType::Imaging => "Imaging",
            ReportType::Meds => "Meds",
            ReportType::Cath => "Cath",
            ReportType::Device => "Device",
            ReportType::Cta => "CTA",
            ReportType::Pdf => "PDF",
            ReportType::Link => "Link",
            ReportType::Other(label) => label,
        }
    }
}

impl From<String> for ReportType {
    fn from(label: String) -> Self {
        match label.to_lowercase().as_str() {
            "lab" | "labs" => ReportType::Lab,
            "ecg" | "ekg" => ReportType::Ecg,
            "echo" => ReportType::Echo,
            "imaging" => ReportType::Imaging,
            "meds" => ReportType::Meds,
            "cath" => ReportType::Cath,
            "device" => ReportType::Device,
            "cta" => ReportType::Cta,
            "pdf" => ReportType::Pdf,
            "link" => ReportType::Link,
            _ => ReportType::Other(label),
        }
    }
}

impl From<ReportType> for String {
    fn from(report_type: ReportType) -> Self {
        report_type.as_str().to_string()
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document in a patient's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl ClinicalDocument {
    pub fn new(id: &str, report_type: ReportType, date: NaiveDate, title: &str) -> Self {
        Self {
            id: id.to_string(),
            report_type,
            date,
            title: title.to_string(),
            content: String::new(),
        }
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }
}

/// Free-text history item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalHistoryEntry {
    pub description: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Patient record as supplied by the host application
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub medical_history: Vec<MedicalHistoryEntry>,
    #[serde(default)]
    pub critical_alerts: Vec<String>,
    #[serde(default)]
    pub reports: Vec<ClinicalDocument>,
}

impl Patient {
    /// Parse a patient record from host-application JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Lowercased history descriptions, one per line
    pub fn history_text(&self) -> String {
        self.medical_history
            .iter()
            .map(|entry| entry.description.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lowercased history descriptions and critical alerts
    pub fn context_text(&self) -> String {
        let alerts = self
            .critical_alerts
            .iter()
            .map(|alert| alert.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}", self.history_text(), alerts)
    }
}
