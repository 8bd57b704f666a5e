//! Assessment model: the persisted, validated result of analyzing one file

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest accepted score
pub const MIN_SCORE: f64 = 1.0;
/// Highest accepted score
pub const MAX_SCORE: f64 = 10.0;

/// One problem found in a file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Something the author should study next
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningRecommendation {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Canonical analysis report produced by the reasoning client
///
/// Scores are passed through as reported; range checks happen at persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub quality_score: f64,
    pub complexity_score: f64,
    pub security_score: f64,
    pub issues: Vec<Issue>,
    pub strengths: Vec<String>,
    pub suggestions: Vec<String>,
    pub learning_recommendations: Vec<LearningRecommendation>,
}

/// Stored assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    #[serde(rename = "analysisId")]
    pub assessment_id: Uuid,
    pub file_id: Uuid,
    pub project_id: Uuid,
    pub analysis_type: String,
    pub issues_found: Vec<Issue>,
    pub suggestions: Vec<String>,
    pub quality_score: f64,
    pub complexity_score: f64,
    pub security_score: f64,
    pub strengths: Vec<String>,
    pub learning_recommendations: Vec<LearningRecommendation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated input for creating an assessment
///
/// Every identifying field and score is optional here so that missing
/// values are reported as validation errors instead of parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssessment {
    pub file_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub analysis_type: Option<String>,
    pub quality_score: Option<f64>,
    pub complexity_score: Option<f64>,
    pub security_score: Option<f64>,
    #[serde(default)]
    pub issues_found: Vec<Issue>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub learning_recommendations: Vec<LearningRecommendation>,
}

impl NewAssessment {
    /// Build the input for persisting a provider report
    pub fn from_report(
        file_id: Uuid,
        project_id: Uuid,
        analysis_type: &str,
        report: &AnalysisReport,
    ) -> Self {
        Self {
            file_id: Some(file_id),
            project_id: Some(project_id),
            analysis_type: Some(analysis_type.to_string()),
            quality_score: Some(report.quality_score),
            complexity_score: Some(report.complexity_score),
            security_score: Some(report.security_score),
            issues_found: report.issues.clone(),
            suggestions: report.suggestions.clone(),
            strengths: report.strengths.clone(),
            learning_recommendations: report.learning_recommendations.clone(),
        }
    }
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentUpdate {
    pub quality_score: Option<f64>,
    pub complexity_score: Option<f64>,
    pub security_score: Option<f64>,
    pub issues_found: Option<Vec<Issue>>,
    pub suggestions: Option<Vec<String>>,
    pub strengths: Option<Vec<String>>,
    pub learning_recommendations: Option<Vec<LearningRecommendation>>,
}

impl AssessmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.quality_score.is_none()
            && self.complexity_score.is_none()
            && self.security_score.is_none()
            && self.issues_found.is_none()
            && self.suggestions.is_none()
            && self.strengths.is_none()
            && self.learning_recommendations.is_none()
    }
}

/// Sort column for assessment listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentOrder {
    #[default]
    CreatedAt,
    QualityScore,
    ComplexityScore,
    SecurityScore,
}

impl AssessmentOrder {
    pub fn column(&self) -> &'static str {
        match self {
            AssessmentOrder::CreatedAt => "created_at",
            AssessmentOrder::QualityScore => "quality_score",
            AssessmentOrder::ComplexityScore => "complexity_score",
            AssessmentOrder::SecurityScore => "security_score",
        }
    }
}

/// Pagination and filters for listing a project's assessments
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssessmentQuery {
    pub limit: i64,
    pub offset: i64,
    pub min_quality_score: Option<f64>,
    pub max_complexity_score: Option<f64>,
    pub order_by: AssessmentOrder,
}

impl Default for AssessmentQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            min_quality_score: None,
            max_complexity_score: None,
            order_by: AssessmentOrder::CreatedAt,
        }
    }
}
