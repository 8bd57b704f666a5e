//! Provider response parsing
//!
//! The provider's text is untrusted. Whatever comes back is classified into
//! one of a few shapes and normalized into an [`AnalysisReport`]; anything
//! unusable becomes the deterministic default report. Parsing never fails.

use serde_json::{Map, Value};

use crate::models::{AnalysisReport, Issue, LearningRecommendation};

/// Issue type used by the default report
pub const PARSING_ERROR_ISSUE: &str = "parsing_error";

/// Score assigned to every dimension of the default report
pub const DEFAULT_SCORE: f64 = 5.0;

/// Recognized response shapes
#[derive(Debug, PartialEq)]
enum ResponseShape {
    /// `{ "analysis": { ...report... } }`
    Nested(Map<String, Value>),
    /// The report object itself
    Flat(Map<String, Value>),
    Malformed(String),
}

/// Parse raw provider text into a report
pub fn parse_report(text: &str) -> AnalysisReport {
    let normalized = match classify(text) {
        ResponseShape::Nested(object) | ResponseShape::Flat(object) => normalize(&object),
        ResponseShape::Malformed(reason) => Err(reason),
    };

    match normalized {
        Ok(report) => report,
        Err(reason) => {
            tracing::warn!(reason = %reason, "Unusable provider response, using default report");
            default_report()
        }
    }
}

/// Deterministic report used when the response cannot be interpreted
pub fn default_report() -> AnalysisReport {
    AnalysisReport {
        quality_score: DEFAULT_SCORE,
        complexity_score: DEFAULT_SCORE,
        security_score: DEFAULT_SCORE,
        issues: vec![Issue {
            issue_type: PARSING_ERROR_ISSUE.to_string(),
            severity: "low".to_string(),
            line: None,
            description: "The analysis response could not be parsed".to_string(),
            suggestion: Some("Re-run the analysis for this file".to_string()),
        }],
        strengths: vec!["Code was submitted for automated review".to_string()],
        suggestions: Vec::new(),
        learning_recommendations: vec![LearningRecommendation {
            topic: "Code review fundamentals".to_string(),
            priority: Some("medium".to_string()),
            reason: Some("Automated analysis was inconclusive".to_string()),
        }],
    }
}

fn classify(text: &str) -> ResponseShape {
    let value = match extract_json(text) {
        Some(value) => value,
        None => return ResponseShape::Malformed("no JSON object found".to_string()),
    };

    match value {
        Value::Object(mut object) => match object.remove("analysis") {
            Some(Value::Object(inner)) => ResponseShape::Nested(inner),
            Some(other) => {
                // Not a wrapper after all; keep the field and treat the object as flat
                object.insert("analysis".to_string(), other);
                ResponseShape::Flat(object)
            }
            None => ResponseShape::Flat(object),
        },
        other => ResponseShape::Malformed(format!("expected a JSON object, got {}", type_name(&other))),
    }
}

/// Outermost `{ ... }` span first, then the whole text
fn extract_json(text: &str) -> Option<Value> {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Some(value);
            }
        }
    }
    serde_json::from_str::<Value>(text.trim()).ok()
}

fn normalize(object: &Map<String, Value>) -> Result<AnalysisReport, String> {
    Ok(AnalysisReport {
        quality_score: score(object, "qualityScore", "quality_score")?,
        complexity_score: score(object, "complexityScore", "complexity_score")?,
        security_score: score(object, "securityScore", "security_score")?,
        issues: array(object, "issues").iter().filter_map(issue).collect(),
        strengths: strings(array(object, "strengths")),
        suggestions: strings(array(object, "suggestions")),
        learning_recommendations: array(object, "learningRecommendations")
            .iter()
            .chain(array(object, "learning_recommendations").iter())
            .filter_map(recommendation)
            .collect(),
    })
}

/// Finite JSON number; out-of-range values pass through for persistence to reject
fn score(object: &Map<String, Value>, key: &str, alt_key: &str) -> Result<f64, String> {
    let value = object
        .get(key)
        .or_else(|| object.get(alt_key))
        .ok_or_else(|| format!("missing {}", key))?;

    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{} is not a number", key))
}

fn array<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn strings(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str().map(str::trim))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn issue(value: &Value) -> Option<Issue> {
    match value {
        Value::String(description) if !description.trim().is_empty() => Some(Issue {
            issue_type: "general".to_string(),
            severity: "medium".to_string(),
            line: None,
            description: description.trim().to_string(),
            suggestion: None,
        }),
        Value::Object(object) => {
            let description = text_field(object, &["description", "message"])?;
            Some(Issue {
                issue_type: text_field(object, &["type", "category"])
                    .unwrap_or_else(|| "general".to_string())
                    .to_lowercase(),
                severity: text_field(object, &["severity"])
                    .unwrap_or_else(|| "medium".to_string())
                    .to_lowercase(),
                line: object
                    .get("line")
                    .and_then(Value::as_u64)
                    .and_then(|line| u32::try_from(line).ok()),
                description,
                suggestion: text_field(object, &["suggestion", "fix"]),
            })
        }
        _ => None,
    }
}

fn recommendation(value: &Value) -> Option<LearningRecommendation> {
    match value {
        Value::String(topic) if !topic.trim().is_empty() => Some(LearningRecommendation {
            topic: topic.trim().to_string(),
            priority: None,
            reason: None,
        }),
        Value::Object(object) => Some(LearningRecommendation {
            topic: text_field(object, &["topic", "title"])?,
            priority: text_field(object, &["priority"]),
            reason: text_field(object, &["reason", "description"]),
        }),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
