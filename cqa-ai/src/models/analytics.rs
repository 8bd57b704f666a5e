//! Derived analytics, computed on read and never stored

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Average, minimum and maximum of one score dimension
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreSummary {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
}

/// Per-language slice of a project's assessments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageBreakdown {
    pub language: String,
    pub analyses_count: i64,
    pub avg_quality_score: f64,
    pub avg_complexity_score: f64,
    pub avg_security_score: f64,
}

/// How often one (type, severity) issue pair occurs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueFrequency {
    pub issue_type: String,
    pub severity: String,
    pub occurrences: i64,
}

/// Rollup over every assessment of one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalytics {
    pub project_id: Uuid,
    pub total_analyses: i64,
    pub analyzed_files: i64,
    pub quality: ScoreSummary,
    pub complexity: ScoreSummary,
    pub security: ScoreSummary,
    pub languages_count: i64,
    pub first_analysis: Option<DateTime<Utc>>,
    pub last_analysis: Option<DateTime<Utc>>,
    pub language_distribution: Vec<LanguageBreakdown>,
    pub top_issues: Vec<IssueFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProjectAnalytics {
    /// Zero summary for a project without assessments
    pub fn empty(project_id: Uuid) -> Self {
        Self {
            project_id,
            total_analyses: 0,
            analyzed_files: 0,
            quality: ScoreSummary::default(),
            complexity: ScoreSummary::default(),
            security: ScoreSummary::default(),
            languages_count: 0,
            first_analysis: None,
            last_analysis: None,
            language_distribution: Vec::new(),
            top_issues: Vec::new(),
            message: Some("No analyses found for this project".to_string()),
        }
    }
}

/// Lookback window for user progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl Timeframe {
    pub fn days(&self) -> i64 {
        match self {
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Quarter => 90,
            Timeframe::Year => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
            Timeframe::Quarter => "90d",
            Timeframe::Year => "1y",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            "90d" => Ok(Timeframe::Quarter),
            "1y" => Ok(Timeframe::Year),
            other => Err(format!(
                "Invalid timeframe '{}'. Must be one of: 7d, 30d, 90d, 1y",
                other
            )),
        }
    }
}

/// Totals and averages over a user's window
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverallProgress {
    pub projects_count: i64,
    pub total_analyses: i64,
    pub files_analyzed: i64,
    pub avg_quality_score: f64,
    pub avg_complexity_score: f64,
    pub avg_security_score: f64,
}

/// One calendar week (starting Monday)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    /// ISO date of the Monday starting the week
    pub week_start: String,
    pub analyses_count: i64,
    pub avg_quality_score: f64,
    pub avg_complexity_score: f64,
    pub avg_security_score: f64,
}

/// Per-language experience of one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageExpertise {
    pub language: String,
    pub analyses_count: i64,
    pub avg_quality_score: f64,
    pub avg_complexity_score: f64,
    pub avg_security_score: f64,
    pub projects_count: i64,
}

/// Progress report for one user over a timeframe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub timeframe: Timeframe,
    pub overall: OverallProgress,
    pub weekly_progress: Vec<WeeklyProgress>,
    pub language_expertise: Vec<LanguageExpertise>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UserProgress {
    pub fn empty(user_id: &str, timeframe: Timeframe) -> Self {
        Self {
            user_id: user_id.to_string(),
            timeframe,
            overall: OverallProgress::default(),
            weekly_progress: Vec::new(),
            language_expertise: Vec::new(),
            message: Some("No analyses found for this user in the specified timeframe".to_string()),
        }
    }
}

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
