//! Built-in catalog of recommendable clinical questions

use serde::Serialize;
use std::fmt;

use crate::ranking::profile::{Condition, ReportTag};
use Condition as C;
use QuestionCategory as Q;
use ReportTag as R;

/// Question grouping shown in quick-reply menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuestionCategory {
    /// Orienting questions favoured at the start of a conversation
    BriefingSummary,
    RiskStratification,
    TherapyOptimization,
    DiagnosticsTrends,
    DifferentialDiagnosis,
    CarePlanning,
}

impl QuestionCategory {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionCategory::BriefingSummary => "Briefing & Summary",
            QuestionCategory::RiskStratification => "Risk Stratification",
            QuestionCategory::TherapyOptimization => "Therapy Optimization",
            QuestionCategory::DiagnosticsTrends => "Diagnostics & Trends",
            QuestionCategory::DifferentialDiagnosis => "Differential Diagnosis",
            QuestionCategory::CarePlanning => "Care Planning",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Conditions and reports that make a question relevant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QuestionRelevance {
    pub conditions: &'static [Condition],
    pub reports: &'static [ReportTag],
}

impl QuestionRelevance {
    pub const GENERAL: QuestionRelevance = QuestionRelevance {
        conditions: &[],
        reports: &[],
    };
}

/// Immutable catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecommendableQuestion {
    pub text: &'static str,
    pub category: QuestionCategory,
    pub relevance: QuestionRelevance,
}

const fn question(
    text: &'static str,
    category: QuestionCategory,
    conditions: &'static [Condition],
    reports: &'static [ReportTag],
) -> RecommendableQuestion {
    RecommendableQuestion {
        text,
        category,
        relevance: QuestionRelevance { conditions, reports },
    }
}

/// Default question library, in display priority order
pub static QUESTION_LIBRARY: &[RecommendableQuestion] = &[
    question("Give me a one-minute briefing on this patient.", Q::BriefingSummary, &[], &[]),
    question("Summarize the most recent reports.", Q::BriefingSummary, &[], &[]),
    question("What changed since the last visit?", Q::BriefingSummary, &[], &[]),
    question("List the active critical alerts and what they imply.", Q::BriefingSummary, &[], &[]),
    question(
        "Is this patient on optimal GDMT for HFrEF?",
        Q::TherapyOptimization,
        &[C::HfrEF],
        &[],
    ),
    question(
        "Show the ejection fraction trend across echos.",
        Q::DiagnosticsTrends,
        &[C::HfrEF],
        &[R::Echo],
    ),
    question(
        "Does the patient qualify for an ICD or CRT?",
        Q::RiskStratification,
        &[C::HfrEF],
        &[R::Echo, R::Ecg],
    ),
    question(
        "What is the CHA2DS2-VASc score and is anticoagulation indicated?",
        Q::RiskStratification,
        &[C::AtrialFibrillation],
        &[],
    ),
    question(
        "Summarize the arrhythmia burden on the latest Holter.",
        Q::DiagnosticsTrends,
        &[C::AtrialFibrillation],
        &[R::Holter],
    ),
    question(
        "Should we pursue rate or rhythm control?",
        Q::TherapyOptimization,
        &[C::AtrialFibrillation],
        &[],
    ),
    question(
        "How severe is the aortic stenosis and is the patient a TAVR candidate?",
        Q::CarePlanning,
        &[C::AorticStenosis],
        &[R::Echo],
    ),
    question(
        "Summarize the coronary anatomy from the latest cath.",
        Q::DiagnosticsTrends,
        &[C::Cad, C::PostPci],
        &[R::Cath],
    ),
    question(
        "How long should dual antiplatelet therapy continue?",
        Q::TherapyOptimization,
        &[C::PostPci],
        &[],
    ),
    question(
        "Are the LDL targets met on current lipid therapy?",
        Q::TherapyOptimization,
        &[C::Cad, C::Hyperlipidemia],
        &[R::Labs],
    ),
    question(
        "What do the stress test findings suggest about ischemia?",
        Q::DiagnosticsTrends,
        &[C::Cad],
        &[R::StressTest],
    ),
    question(
        "Is blood pressure at goal on the current regimen?",
        Q::TherapyOptimization,
        &[C::Hypertension],
        &[],
    ),
    question(
        "Are there renal dosing concerns with current medications?",
        Q::TherapyOptimization,
        &[C::Ckd],
        &[R::Labs, R::Meds],
    ),
    question(
        "Plot the creatinine and potassium trend.",
        Q::DiagnosticsTrends,
        &[C::Ckd, C::HfrEF],
        &[R::Labs],
    ),
    question(
        "Would an SGLT2 inhibitor benefit this patient?",
        Q::TherapyOptimization,
        &[C::Diabetes, C::HfrEF, C::Ckd],
        &[],
    ),
    question(
        "Summarize the last device interrogation.",
        Q::DiagnosticsTrends,
        &[C::DeviceImplant],
        &[R::Device],
    ),
    question(
        "Any new ECG changes compared with prior tracings?",
        Q::DiagnosticsTrends,
        &[],
        &[R::Ecg],
    ),
    question(
        "What does the coronary CTA show?",
        Q::DiagnosticsTrends,
        &[C::Cad],
        &[R::Cta],
    ),
    question("What is the differential for the current symptoms?", Q::DifferentialDiagnosis, &[], &[]),
    question("Estimate 10-year ASCVD risk.", Q::RiskStratification, &[C::Hypertension, C::Diabetes, C::Hyperlipidemia], &[R::Labs]),
    question("Are there any drug interactions in the medication list?", Q::CarePlanning, &[], &[R::Meds]),
    question("What follow-up tests are due?", Q::CarePlanning, &[], &[]),
    question("Draft a plan for the next visit.", Q::CarePlanning, &[], &[]),
];
