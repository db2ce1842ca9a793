use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Education level is fixed for this generator.
pub const EDUCATION_LEVEL: &str = "SMA/SMK/MA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RPPRequest {
    pub school_name: String,
    pub teacher_name: String,
    pub level: String,
    pub grade: String,
    pub subject: String,
    pub topic: String,
    pub cp: String, // Capaian Pembelajaran
    pub conditions: String,
    pub academic_year: String,
    pub semester: String,
    pub time_allocation: String,
    pub learning_method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Memahami,
    Mengaplikasi,
    Merefleksi,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Memahami, Phase::Mengaplikasi, Phase::Merefleksi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Memahami => "Memahami",
            Phase::Mengaplikasi => "Mengaplikasi",
            Phase::Merefleksi => "Merefleksi",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningFlow {
    pub phase: Phase,
    pub activity: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignElements {
    pub pedagogical_practice: String,
    pub learning_partnership: String,
    pub learning_environment: String,
    pub digital_utilization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessments {
    pub as_learning: Vec<String>,  // self / peer
    pub for_learning: Vec<String>, // feedback, process
    pub of_learning: Vec<String>,  // summative
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LkpdTask {
    pub title: String,
    pub instructions: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LkpdActivities {
    pub understand: LkpdTask,
    pub apply: LkpdTask,
    pub reflect: LkpdTask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lkpd {
    pub title: String,
    pub activities: LkpdActivities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RPPResponse {
    pub topic_refined: String,
    pub graduate_profile_dimensions: Vec<String>,
    pub learning_objectives: Vec<String>,
    pub design_elements: DesignElements,
    pub learning_flow: Vec<LearningFlow>,
    pub assessments: Assessments,
    pub lkpd: Lkpd,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("learning_flow is empty")]
    EmptyLearningFlow,
}

impl RPPResponse {
    /// Decodes an untrusted payload and checks the structure the renderers rely on.
    ///
    /// Missing fields, wrong types and phases outside the closed set fail in
    /// decoding; anything past that is checked by [`RPPResponse::validate`].
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ResponseError> {
        if self.learning_flow.is_empty() {
            return Err(ResponseError::EmptyLearningFlow);
        }

        for phase in Phase::ALL {
            let count = self
                .learning_flow
                .iter()
                .filter(|flow| flow.phase == phase)
                .count();
            if count != 1 {
                tracing::warn!(%phase, count, "learning_flow does not have exactly one entry for phase");
            }
        }

        Ok(())
    }
}
