//! Analysis kinds a batch can request

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One dimension of analysis requested from the reasoning provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    CodeQuality,
    Complexity,
    Security,
    BestPractices,
    LearningGaps,
}

impl AnalysisKind {
    /// Every kind, in canonical order
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::CodeQuality,
        AnalysisKind::Complexity,
        AnalysisKind::Security,
        AnalysisKind::BestPractices,
        AnalysisKind::LearningGaps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::CodeQuality => "code_quality",
            AnalysisKind::Complexity => "complexity",
            AnalysisKind::Security => "security",
            AnalysisKind::BestPractices => "best_practices",
            AnalysisKind::LearningGaps => "learning_gaps",
        }
    }

    /// Short human-readable description for the catalog endpoint
    pub fn description(&self) -> &'static str {
        match self {
            AnalysisKind::CodeQuality => "Overall code quality, readability and maintainability",
            AnalysisKind::Complexity => "Cyclomatic and cognitive complexity of the code",
            AnalysisKind::Security => "Security vulnerabilities and unsafe patterns",
            AnalysisKind::BestPractices => "Adherence to language idioms and best practices",
            AnalysisKind::LearningGaps => "Concepts the author should study next",
        }
    }

    /// Task line rendered into the provider prompt
    pub fn task(&self) -> &'static str {
        match self {
            AnalysisKind::CodeQuality => {
                "Assess code quality: readability, naming, structure and maintainability"
            }
            AnalysisKind::Complexity => {
                "Assess complexity: deeply nested logic, long functions and hard-to-follow control flow"
            }
            AnalysisKind::Security => {
                "Assess security: injection risks, unsafe input handling and leaked secrets"
            }
            AnalysisKind::BestPractices => {
                "Check best practices: idiomatic usage of the language and its standard library"
            }
            AnalysisKind::LearningGaps => {
                "Identify learning gaps: concepts the author appears unfamiliar with"
            }
        }
    }

    /// Canonical, de-duplicated list; empty input means every kind
    pub fn normalize(kinds: &[AnalysisKind]) -> Vec<AnalysisKind> {
        if kinds.is_empty() {
            return Self::ALL.to_vec();
        }
        let mut normalized: Vec<AnalysisKind> = kinds.to_vec();
        normalized.sort();
        normalized.dedup();
        normalized
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| {
                format!(
                    "Invalid analysis type '{}'. Must be one of: {}",
                    s,
                    Self::ALL.map(|k| k.as_str()).join(", ")
                )
            })
    }
}
