//! Patient condition and report-availability profiling
//!
//! Conditions come from medical-history text, report tags from report
//! types and titles, both through fixed trigger vocabularies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ranking::types::{Patient, ReportType};

/// Condition tag used for question relevance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    HfrEF,
    Cad,
    AtrialFibrillation,
    AorticStenosis,
    Hypertension,
    Diabetes,
    Ckd,
    Hyperlipidemia,
    PostPci,
    DeviceImplant,
}

impl Condition {
    pub const ALL: [Condition; 10] = [
        Condition::HfrEF,
        Condition::Cad,
        Condition::AtrialFibrillation,
        Condition::AorticStenosis,
        Condition::Hypertension,
        Condition::Diabetes,
        Condition::Ckd,
        Condition::Hyperlipidemia,
        Condition::PostPci,
        Condition::DeviceImplant,
    ];

    /// History terms that imply this condition
    pub fn triggers(&self) -> &'static [&'static str] {
        match self {
            Condition::HfrEF => &["hfref", "heart failure", "reduced ejection fraction", "cardiomyopathy"],
            Condition::Cad => &[
                "coronary artery disease",
                "cad",
                "stemi",
                "myocardial infarction",
                "angina",
            ],
            Condition::AtrialFibrillation => &["atrial fibrillation", "afib", "a-fib", "atrial flutter"],
            Condition::AorticStenosis => &["aortic stenosis", "tavr", "tavi"],
            Condition::Hypertension => &["hypertension", "htn"],
            Condition::Diabetes => &["diabetes", "t2dm", "dm2"],
            Condition::Ckd => &["chronic kidney disease", "ckd", "renal insufficiency"],
            Condition::Hyperlipidemia => &["hyperlipidemia", "dyslipidemia", "hypercholesterolemia"],
            Condition::PostPci => &["pci", "stent"],
            Condition::DeviceImplant => &["icd", "pacemaker", "crt-d", "crt-p"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Condition::HfrEF => "HFrEF",
            Condition::Cad => "CAD",
            Condition::AtrialFibrillation => "Atrial fibrillation",
            Condition::AorticStenosis => "Aortic stenosis",
            Condition::Hypertension => "Hypertension",
            Condition::Diabetes => "Diabetes",
            Condition::Ckd => "CKD",
            Condition::Hyperlipidemia => "Hyperlipidemia",
            Condition::PostPci => "Post-PCI",
            Condition::DeviceImplant => "Cardiac device",
        }
    }
}

/// Kind of report a patient has on file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReportTag {
    Echo,
    Ecg,
    Holter,
    Cath,
    Labs,
    Device,
    Cta,
    Imaging,
    StressTest,
    Meds,
}

impl ReportTag {
    /// Tag implied by a document type alone
    pub fn from_report_type(report_type: &ReportType) -> Option<Self> {
        match report_type {
            ReportType::Echo => Some(ReportTag::Echo),
            ReportType::Ecg => Some(ReportTag::Ecg),
            ReportType::Lab => Some(ReportTag::Labs),
            ReportType::Cath => Some(ReportTag::Cath),
            ReportType::Device => Some(ReportTag::Device),
            ReportType::Cta => Some(ReportTag::Cta),
            ReportType::Imaging => Some(ReportTag::Imaging),
            ReportType::Meds => Some(ReportTag::Meds),
            ReportType::Pdf | ReportType::Link | ReportType::Other(_) => None,
        }
    }
}

/// Title keywords that imply a report tag regardless of document type
const TITLE_TRIGGERS: &[(&str, ReportTag)] = &[
    ("holter", ReportTag::Holter),
    ("stress", ReportTag::StressTest),
    ("echo", ReportTag::Echo),
    ("ecg", ReportTag::Ecg),
    ("ekg", ReportTag::Ecg),
    ("angiogram", ReportTag::Cath),
    ("cath", ReportTag::Cath),
    ("interrogation", ReportTag::Device),
    ("lipid", ReportTag::Labs),
    ("panel", ReportTag::Labs),
];

/// Derived condition and report-availability sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub conditions: BTreeSet<Condition>,
    pub report_tags: BTreeSet<ReportTag>,
}

impl PatientProfile {
    pub fn from_patient(patient: &Patient) -> Self {
        let history = patient.history_text();

        let conditions = Condition::ALL
            .iter()
            .copied()
            .filter(|condition| condition.triggers().iter().any(|term| mentions(&history, term)))
            .collect();

        let mut report_tags = BTreeSet::new();
        for report in &patient.reports {
            if let Some(tag) = ReportTag::from_report_type(&report.report_type) {
                report_tags.insert(tag);
            }
            if let ReportType::Other(label) = &report.report_type {
                report_tags.extend(title_tags(&label.to_lowercase()));
            }
            report_tags.extend(title_tags(&report.title.to_lowercase()));
        }

        Self {
            conditions,
            report_tags,
        }
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn has_report(&self, tag: ReportTag) -> bool {
        self.report_tags.contains(&tag)
    }
}

fn title_tags(title: &str) -> impl Iterator<Item = ReportTag> + '_ {
    TITLE_TRIGGERS
        .iter()
        .filter(move |(keyword, _)| title.contains(keyword))
        .map(|(_, tag)| *tag)
}

/// Whole-word match so short abbreviations like "cad" skip "decade"
fn mentions(text: &str, term: &str) -> bool {
    text.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..].chars().next().map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}
