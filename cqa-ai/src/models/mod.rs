//! Data models for the code quality assessment service

pub mod analysis_kind;
pub mod analytics;
pub mod assessment;
pub mod batch;
pub mod project;
pub mod source_file;

pub use analysis_kind::AnalysisKind;
pub use analytics::{
    IssueFrequency, LanguageBreakdown, LanguageExpertise, OverallProgress, ProjectAnalytics,
    ScoreSummary, Timeframe, UserProgress, WeeklyProgress,
};
pub use assessment::{
    AnalysisReport, Assessment, AssessmentOrder, AssessmentQuery, AssessmentUpdate, Issue,
    LearningRecommendation, NewAssessment, MAX_SCORE, MIN_SCORE,
};
pub use batch::{BatchResult, FileAnalysis, FileFailure, FileOutcome};
pub use project::{NewProject, Project, ProjectStatus};
pub use source_file::{NewSourceFile, SourceFile};
