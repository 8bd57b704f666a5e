//! Request payload construction

use super::provider::{ChatMessage, ChatRequest};
use crate::models::AnalysisKind;

/// Fixes the output shape the provider must return
pub const SYSTEM_PROMPT: &str = "You are an expert code analyst. \
Respond with a single JSON object and nothing else. \
Scores are numbers from 1 to 10.";

const RESPONSE_SHAPE: &str = r#"{
  "qualityScore": number (1-10),
  "complexityScore": number (1-10),
  "securityScore": number (1-10),
  "issues": [
    { "type": "string", "severity": "low|medium|high|critical", "line": number, "description": "string", "suggestion": "string" }
  ],
  "strengths": [ "string" ],
  "suggestions": [ "string" ],
  "learningRecommendations": [
    { "topic": "string", "priority": "low|medium|high", "reason": "string" }
  ]
}"#;

/// User message: shape, fenced source, and one task line per kind
pub fn build_user_prompt(content: &str, language: &str, kinds: &[AnalysisKind]) -> String {
    let tasks = kinds
        .iter()
        .map(|kind| format!("- {}", kind.task()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze the following {language} code and return only a JSON object with this structure:\n\n\
         ```json\n{RESPONSE_SHAPE}\n```\n\n\
         Code to analyze:\n\n\
         ```{language}\n{content}\n```\n\n\
         Perform these tasks:\n{tasks}\n\n\
         Do not include any explanation or commentary. Just return the JSON object."
    )
}

pub fn build_request(
    model: &str,
    content: &str,
    language: &str,
    kinds: &[AnalysisKind],
    temperature: f32,
    max_tokens: u32,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(content, language, kinds)),
        ],
        temperature,
        max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_fences_source_by_language() {
        let prompt = build_user_prompt("print(1)", "python", &[AnalysisKind::Security]);
        assert!(prompt.contains("```python\nprint(1)\n```"));
        assert!(prompt.contains("- Assess security"));
        assert!(!prompt.contains("Assess complexity"));
    }

    #[test]
    fn test_request_carries_sampling_settings() {
        let request = build_request("m", "x", "javascript", &AnalysisKind::ALL, 0.1, 2048);
        assert_eq!(request.model, "m");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.max_tokens, 2048);
        assert_eq!(request.messages[1].content.matches("\n- ").count(), 5);
    }
}
