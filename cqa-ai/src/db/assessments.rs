//! Assessment persistence and validation
//!
//! Nothing reaches the `assessments` table without passing
//! [`validate_new_assessment`]: identifiers and analysis type present, the
//! type one of the known kinds, and every score a finite number in [1, 10].
//! Out-of-range scores are rejected, never clamped.

use cqa_common::time::{now_secs, parse_db_timestamp, to_db_timestamp};
use cqa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{from_json, parse_uuid, to_json};
use crate::models::{
    AnalysisKind, Assessment, AssessmentQuery, AssessmentUpdate, NewAssessment, MAX_SCORE,
    MIN_SCORE,
};

const ASSESSMENT_COLUMNS: &str = "assessment_id, file_id, project_id, analysis_type, \
     quality_score, complexity_score, security_score, issues, suggestions, strengths, \
     learning_recommendations, created_at, updated_at";

/// Check one score: present, finite, within [1, 10]
pub fn validate_score(name: &str, value: Option<f64>) -> Result<f64> {
    let value = value.ok_or_else(|| Error::InvalidInput(format!("{} is required", name)))?;

    if !value.is_finite() {
        return Err(Error::InvalidInput(format!("{} must be a number", name)));
    }

    if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        return Err(Error::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            name, MIN_SCORE, MAX_SCORE, value
        )));
    }

    Ok(value)
}

/// Validated, normalized fields ready to insert
#[derive(Debug)]
struct ValidatedAssessment {
    file_id: Uuid,
    project_id: Uuid,
    analysis_type: AnalysisKind,
    quality_score: f64,
    complexity_score: f64,
    security_score: f64,
}

fn validate_new_assessment(input: &NewAssessment) -> Result<ValidatedAssessment> {
    let file_id = input
        .file_id
        .ok_or_else(|| Error::InvalidInput("File ID is required".to_string()))?;
    let project_id = input
        .project_id
        .ok_or_else(|| Error::InvalidInput("Project ID is required".to_string()))?;
    let analysis_type = input
        .analysis_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput("Analysis type is required".to_string()))?
        .parse::<AnalysisKind>()
        .map_err(Error::InvalidInput)?;

    Ok(ValidatedAssessment {
        file_id,
        project_id,
        analysis_type,
        quality_score: validate_score("Quality score", input.quality_score)?,
        complexity_score: validate_score("Complexity score", input.complexity_score)?,
        security_score: validate_score("Security score", input.security_score)?,
    })
}

/// Validate and store a new assessment
pub async fn create_assessment(pool: &SqlitePool, input: &NewAssessment) -> Result<Assessment> {
    let validated = validate_new_assessment(input)?;
    let now = now_secs();

    let assessment = Assessment {
        assessment_id: Uuid::new_v4(),
        file_id: validated.file_id,
        project_id: validated.project_id,
        analysis_type: validated.analysis_type.as_str().to_string(),
        issues_found: input.issues_found.clone(),
        suggestions: input.suggestions.clone(),
        quality_score: validated.quality_score,
        complexity_score: validated.complexity_score,
        security_score: validated.security_score,
        strengths: input.strengths.clone(),
        learning_recommendations: input.learning_recommendations.clone(),
        created_at: now,
        updated_at: now,
    };

    insert_assessment(pool, &assessment).await?;

    tracing::debug!(
        assessment_id = %assessment.assessment_id,
        file_id = %assessment.file_id,
        analysis_type = %assessment.analysis_type,
        "Assessment stored"
    );

    Ok(assessment)
}

async fn insert_assessment(pool: &SqlitePool, assessment: &Assessment) -> Result<()> {
    let issues = to_json(&assessment.issues_found, "issues")?;
    let suggestions = to_json(&assessment.suggestions, "suggestions")?;
    let strengths = to_json(&assessment.strengths, "strengths")?;
    let recommendations = to_json(&assessment.learning_recommendations, "learning_recommendations")?;

    sqlx::query(&format!(
        "INSERT INTO assessments ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        ASSESSMENT_COLUMNS
    ))
    .bind(assessment.assessment_id.to_string())
    .bind(assessment.file_id.to_string())
    .bind(assessment.project_id.to_string())
    .bind(&assessment.analysis_type)
    .bind(assessment.quality_score)
    .bind(assessment.complexity_score)
    .bind(assessment.security_score)
    .bind(issues)
    .bind(suggestions)
    .bind(strengths)
    .bind(recommendations)
    .bind(to_db_timestamp(assessment.created_at))
    .bind(to_db_timestamp(assessment.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_assessment(pool: &SqlitePool, assessment_id: Uuid) -> Result<Option<Assessment>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM assessments WHERE assessment_id = ?",
        ASSESSMENT_COLUMNS
    ))
    .bind(assessment_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_assessment).transpose()
}

/// Apply a partial update; touched scores are re-validated
pub async fn update_assessment(
    pool: &SqlitePool,
    assessment_id: Uuid,
    update: &AssessmentUpdate,
) -> Result<Assessment> {
    if update.is_empty() {
        return Err(Error::InvalidInput("No fields to update".to_string()));
    }

    let mut assessment = get_assessment(pool, assessment_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Assessment {}", assessment_id)))?;

    if update.quality_score.is_some() {
        assessment.quality_score = validate_score("Quality score", update.quality_score)?;
    }
    if update.complexity_score.is_some() {
        assessment.complexity_score = validate_score("Complexity score", update.complexity_score)?;
    }
    if update.security_score.is_some() {
        assessment.security_score = validate_score("Security score", update.security_score)?;
    }
    if let Some(issues) = &update.issues_found {
        assessment.issues_found = issues.clone();
    }
    if let Some(suggestions) = &update.suggestions {
        assessment.suggestions = suggestions.clone();
    }
    if let Some(strengths) = &update.strengths {
        assessment.strengths = strengths.clone();
    }
    if let Some(recommendations) = &update.learning_recommendations {
        assessment.learning_recommendations = recommendations.clone();
    }
    assessment.updated_at = now_secs();

    sqlx::query(
        r#"
        UPDATE assessments SET
            quality_score = ?, complexity_score = ?, security_score = ?,
            issues = ?, suggestions = ?, strengths = ?, learning_recommendations = ?,
            updated_at = ?
        WHERE assessment_id = ?
        "#,
    )
    .bind(assessment.quality_score)
    .bind(assessment.complexity_score)
    .bind(assessment.security_score)
    .bind(to_json(&assessment.issues_found, "issues")?)
    .bind(to_json(&assessment.suggestions, "suggestions")?)
    .bind(to_json(&assessment.strengths, "strengths")?)
    .bind(to_json(&assessment.learning_recommendations, "learning_recommendations")?)
    .bind(to_db_timestamp(assessment.updated_at))
    .bind(assessment_id.to_string())
    .execute(pool)
    .await?;

    Ok(assessment)
}

/// Paginated, filtered listing of a project's assessments (descending by the sort column)
pub async fn list_assessments_for_project(
    pool: &SqlitePool,
    project_id: Uuid,
    query: &AssessmentQuery,
) -> Result<Vec<Assessment>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM assessments
        WHERE project_id = ?
          AND (? IS NULL OR quality_score >= ?)
          AND (? IS NULL OR complexity_score <= ?)
        ORDER BY {} DESC, assessment_id
        LIMIT ? OFFSET ?
        "#,
        ASSESSMENT_COLUMNS,
        query.order_by.column()
    ))
    .bind(project_id.to_string())
    .bind(query.min_quality_score)
    .bind(query.min_quality_score)
    .bind(query.max_complexity_score)
    .bind(query.max_complexity_score)
    .bind(query.limit.clamp(1, 500))
    .bind(query.offset.max(0))
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_assessment).collect()
}

pub async fn count_assessments_for_project(pool: &SqlitePool, project_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assessments WHERE project_id = ?")
        .bind(project_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn row_to_assessment(row: &SqliteRow) -> Result<Assessment> {
    Ok(Assessment {
        assessment_id: parse_uuid(row.get("assessment_id"), "assessment_id")?,
        file_id: parse_uuid(row.get("file_id"), "file_id")?,
        project_id: parse_uuid(row.get("project_id"), "project_id")?,
        analysis_type: row.get("analysis_type"),
        issues_found: from_json(row.get("issues"), "issues")?,
        suggestions: from_json(row.get("suggestions"), "suggestions")?,
        quality_score: row.get("quality_score"),
        complexity_score: row.get("complexity_score"),
        security_score: row.get("security_score"),
        strengths: from_json(row.get("strengths"), "strengths")?,
        learning_recommendations: from_json(
            row.get("learning_recommendations"),
            "learning_recommendations",
        )?,
        created_at: parse_db_timestamp(row.get("created_at"))?,
        updated_at: parse_db_timestamp(row.get("updated_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_score_bounds() {
        assert_eq!(validate_score("q", Some(1.0)).unwrap(), 1.0);
        assert_eq!(validate_score("q", Some(10.0)).unwrap(), 10.0);
        assert!(validate_score("q", Some(0.0)).is_err());
        assert!(validate_score("q", Some(11.0)).is_err());
        assert!(validate_score("q", Some(f64::NAN)).is_err());
        assert!(validate_score("q", Some(f64::INFINITY)).is_err());
        assert!(validate_score("q", None).is_err());
    }

    #[test]
    fn test_validate_requires_identifiers() {
        let input = NewAssessment {
            project_id: Some(Uuid::new_v4()),
            analysis_type: Some("security".to_string()),
            quality_score: Some(5.0),
            complexity_score: Some(5.0),
            security_score: Some(5.0),
            ..Default::default()
        };
        let err = validate_new_assessment(&input).unwrap_err();
        assert!(err.to_string().contains("File ID is required"));
    }

    #[test]
    fn test_validate_normalizes_analysis_type() {
        let input = NewAssessment {
            file_id: Some(Uuid::new_v4()),
            project_id: Some(Uuid::new_v4()),
            analysis_type: Some("Code_Quality".to_string()),
            quality_score: Some(5.0),
            complexity_score: Some(5.0),
            security_score: Some(5.0),
            ..Default::default()
        };
        assert_eq!(
            validate_new_assessment(&input).unwrap().analysis_type,
            AnalysisKind::CodeQuality
        );

        let unknown = NewAssessment {
            analysis_type: Some("vibes".to_string()),
            ..input
        };
        assert!(matches!(validate_new_assessment(&unknown), Err(Error::InvalidInput(_))));
    }
}
