//! Analytics aggregation over stored assessments
//!
//! Everything here is computed on read with SQL aggregates; nothing is cached.
//! Issue statistics flatten the JSON `issues` column with `json_each`.

use chrono::{Duration, Utc};
use cqa_common::time::{parse_db_timestamp, to_db_timestamp};
use cqa_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::analytics::round2;
use crate::models::{
    IssueFrequency, LanguageBreakdown, LanguageExpertise, OverallProgress, ProjectAnalytics,
    ScoreSummary, Timeframe, UserProgress, WeeklyProgress,
};

/// Number of issue (type, severity) pairs reported per project
pub const TOP_ISSUES_LIMIT: i64 = 10;

fn summary(avg: Option<f64>, min: Option<f64>, max: Option<f64>) -> ScoreSummary {
    ScoreSummary {
        average: round2(avg.unwrap_or(0.0)),
        minimum: min.unwrap_or(0.0),
        maximum: max.unwrap_or(0.0),
    }
}

/// Rollup of every assessment in a project
pub async fn project_analytics(pool: &SqlitePool, project_id: Uuid) -> Result<ProjectAnalytics> {
    let project = project_id.to_string();

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total_analyses,
            COUNT(DISTINCT a.file_id) AS analyzed_files,
            AVG(a.quality_score) AS avg_quality, MIN(a.quality_score) AS min_quality, MAX(a.quality_score) AS max_quality,
            AVG(a.complexity_score) AS avg_complexity, MIN(a.complexity_score) AS min_complexity, MAX(a.complexity_score) AS max_complexity,
            AVG(a.security_score) AS avg_security, MIN(a.security_score) AS min_security, MAX(a.security_score) AS max_security,
            COUNT(DISTINCT f.language) AS languages_count,
            MIN(a.created_at) AS first_analysis,
            MAX(a.created_at) AS last_analysis
        FROM assessments a
        JOIN source_files f ON f.file_id = a.file_id
        WHERE a.project_id = ?
        "#,
    )
    .bind(&project)
    .fetch_one(pool)
    .await?;

    let total_analyses: i64 = row.get("total_analyses");
    if total_analyses == 0 {
        return Ok(ProjectAnalytics::empty(project_id));
    }

    let first_analysis: Option<String> = row.get("first_analysis");
    let last_analysis: Option<String> = row.get("last_analysis");

    let language_rows = sqlx::query(
        r#"
        SELECT f.language AS language,
               COUNT(*) AS analyses_count,
               AVG(a.quality_score) AS avg_quality,
               AVG(a.complexity_score) AS avg_complexity,
               AVG(a.security_score) AS avg_security
        FROM assessments a
        JOIN source_files f ON f.file_id = a.file_id
        WHERE a.project_id = ?
        GROUP BY f.language
        ORDER BY analyses_count DESC, f.language
        "#,
    )
    .bind(&project)
    .fetch_all(pool)
    .await?;

    let language_distribution = language_rows
        .iter()
        .map(|r| LanguageBreakdown {
            language: r.get("language"),
            analyses_count: r.get("analyses_count"),
            avg_quality_score: round2(r.get("avg_quality")),
            avg_complexity_score: round2(r.get("avg_complexity")),
            avg_security_score: round2(r.get("avg_security")),
        })
        .collect();

    let issue_rows = sqlx::query(
        r#"
        SELECT
            COALESCE(LOWER(json_extract(issue.value, '$.type')), 'general') AS issue_type,
            COALESCE(LOWER(json_extract(issue.value, '$.severity')), 'medium') AS severity,
            COUNT(*) AS occurrences
        FROM assessments a, json_each(a.issues) AS issue
        WHERE a.project_id = ?
        GROUP BY issue_type, severity
        ORDER BY occurrences DESC, issue_type, severity
        LIMIT ?
        "#,
    )
    .bind(&project)
    .bind(TOP_ISSUES_LIMIT)
    .fetch_all(pool)
    .await?;

    let top_issues = issue_rows
        .iter()
        .map(|r| IssueFrequency {
            issue_type: r.get("issue_type"),
            severity: r.get("severity"),
            occurrences: r.get("occurrences"),
        })
        .collect();

    Ok(ProjectAnalytics {
        project_id,
        total_analyses,
        analyzed_files: row.get("analyzed_files"),
        quality: summary(row.get("avg_quality"), row.get("min_quality"), row.get("max_quality")),
        complexity: summary(
            row.get("avg_complexity"),
            row.get("min_complexity"),
            row.get("max_complexity"),
        ),
        security: summary(row.get("avg_security"), row.get("min_security"), row.get("max_security")),
        languages_count: row.get("languages_count"),
        first_analysis: first_analysis.as_deref().map(parse_db_timestamp).transpose()?,
        last_analysis: last_analysis.as_deref().map(parse_db_timestamp).transpose()?,
        language_distribution,
        top_issues,
        message: None,
    })
}

/// Progress of one user's projects over the lookback window
pub async fn user_progress(
    pool: &SqlitePool,
    user_id: &str,
    timeframe: Timeframe,
) -> Result<UserProgress> {
    let cutoff = to_db_timestamp(Utc::now() - Duration::days(timeframe.days()));

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(DISTINCT a.project_id) AS projects_count,
            COUNT(*) AS total_analyses,
            COUNT(DISTINCT a.file_id) AS files_analyzed,
            AVG(a.quality_score) AS avg_quality,
            AVG(a.complexity_score) AS avg_complexity,
            AVG(a.security_score) AS avg_security
        FROM assessments a
        JOIN projects p ON p.project_id = a.project_id
        WHERE p.owner_id = ? AND a.created_at >= ?
        "#,
    )
    .bind(user_id)
    .bind(&cutoff)
    .fetch_one(pool)
    .await?;

    let total_analyses: i64 = row.get("total_analyses");
    if total_analyses == 0 {
        return Ok(UserProgress::empty(user_id, timeframe));
    }

    let overall = OverallProgress {
        projects_count: row.get("projects_count"),
        total_analyses,
        files_analyzed: row.get("files_analyzed"),
        avg_quality_score: round2(row.get::<Option<f64>, _>("avg_quality").unwrap_or(0.0)),
        avg_complexity_score: round2(row.get::<Option<f64>, _>("avg_complexity").unwrap_or(0.0)),
        avg_security_score: round2(row.get::<Option<f64>, _>("avg_security").unwrap_or(0.0)),
    };

    // Week buckets start on Monday
    let weekly_rows = sqlx::query(
        r#"
        SELECT
            date(a.created_at, '-6 days', 'weekday 1') AS week_start,
            COUNT(*) AS analyses_count,
            AVG(a.quality_score) AS avg_quality,
            AVG(a.complexity_score) AS avg_complexity,
            AVG(a.security_score) AS avg_security
        FROM assessments a
        JOIN projects p ON p.project_id = a.project_id
        WHERE p.owner_id = ? AND a.created_at >= ?
        GROUP BY week_start
        ORDER BY week_start
        "#,
    )
    .bind(user_id)
    .bind(&cutoff)
    .fetch_all(pool)
    .await?;

    let weekly_progress = weekly_rows
        .iter()
        .map(|r| WeeklyProgress {
            week_start: r.get("week_start"),
            analyses_count: r.get("analyses_count"),
            avg_quality_score: round2(r.get("avg_quality")),
            avg_complexity_score: round2(r.get("avg_complexity")),
            avg_security_score: round2(r.get("avg_security")),
        })
        .collect();

    let language_rows = sqlx::query(
        r#"
        SELECT
            f.language AS language,
            COUNT(*) AS analyses_count,
            AVG(a.quality_score) AS avg_quality,
            AVG(a.complexity_score) AS avg_complexity,
            AVG(a.security_score) AS avg_security,
            COUNT(DISTINCT a.project_id) AS projects_count
        FROM assessments a
        JOIN projects p ON p.project_id = a.project_id
        JOIN source_files f ON f.file_id = a.file_id
        WHERE p.owner_id = ? AND a.created_at >= ?
        GROUP BY f.language
        ORDER BY analyses_count DESC, f.language
        "#,
    )
    .bind(user_id)
    .bind(&cutoff)
    .fetch_all(pool)
    .await?;

    let language_expertise = language_rows
        .iter()
        .map(|r| LanguageExpertise {
            language: r.get("language"),
            analyses_count: r.get("analyses_count"),
            avg_quality_score: round2(r.get("avg_quality")),
            avg_complexity_score: round2(r.get("avg_complexity")),
            avg_security_score: round2(r.get("avg_security")),
            projects_count: r.get("projects_count"),
        })
        .collect();

    Ok(UserProgress {
        user_id: user_id.to_string(),
        timeframe,
        overall,
        weekly_progress,
        language_expertise,
        message: None,
    })
}
