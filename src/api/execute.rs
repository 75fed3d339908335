//! Prompt execution call: `POST /api/execute`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiClient, ApiError, Body};

pub const EXECUTE_ENDPOINT: &str = "/api/execute";
pub const JOB_TEXT_COMPLETION: &str = "text-completion";

#[derive(Serialize, Debug, Clone)]
pub struct ExecutionRequest {
    pub job_type: &'static str,
    pub payload: ExecutionPayload,
    pub dry_run: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct ExecutionPayload {
    pub model: String,
    pub messages: Vec<RequestMessage>,
}

#[derive(Serialize, Debug, Clone)]
pub struct RequestMessage {
    pub role: &'static str,
    pub content: String,
}

impl ExecutionRequest {
    /// Build a text-completion request whose single user message is the rules
    /// template, a blank line, then the prompt.
    pub fn text_completion(model: &str, rules_template: &str, prompt: &str) -> Self {
        Self {
            job_type: JOB_TEXT_COMPLETION,
            payload: ExecutionPayload {
                model: model.to_string(),
                messages: vec![RequestMessage {
                    role: "user",
                    content: format!("{rules_template}\n\n{prompt}"),
                }],
            },
            dry_run: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ExecutionResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub routing: RoutingInfo,
    #[serde(default)]
    pub result: Option<ExecutionResult>,
    #[serde(default)]
    pub usage: UsageInfo,
}

/// Gateway-reported metadata about which provider/endpoint actually served
/// the request.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RoutingInfo {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ExecutionResult {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Token and cost accounting; every field is optional on the wire.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UsageInfo {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub input_cost: Option<f64>,
    #[serde(default)]
    pub output_cost: Option<f64>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub estimated: bool,
}

impl ExecutionResponse {
    /// The assistant's message text, when the gateway returned one.
    pub fn assistant_message(&self) -> Option<&str> {
        self.result
            .as_ref()?
            .choices
            .first()?
            .message
            .as_ref()
            .map(|m| m.content.as_str())
    }
}

/// A parsed execution response paired with the raw body for display/copy.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    pub response: ExecutionResponse,
    pub raw: Value,
}

impl ExecOutcome {
    pub fn raw_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_else(|_| self.raw.to_string())
    }
}

/// Submit a prompt. HTTP client errors propagate unchanged; no retry, no
/// timeout beyond the transport default.
pub async fn execute(
    client: &ApiClient,
    model: &str,
    rules_template: &str,
    prompt: &str,
) -> Result<ExecOutcome, ApiError> {
    let request = ExecutionRequest::text_completion(model, rules_template, prompt);
    match client.post_json(EXECUTE_ENDPOINT, &request).await? {
        Body::Json(raw) => {
            let response = serde_json::from_value(raw.clone())
                .map_err(|e| ApiError::decode(format!("Unexpected execute response shape: {e}")))?;
            Ok(ExecOutcome { response, raw })
        }
        Body::Text(text) => Err(ApiError::decode(format!(
            "Expected a JSON execute response, got: {text}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_content_is_rules_blank_line_prompt() {
        let request = ExecutionRequest::text_completion("m", "R", "P");
        assert_eq!(request.payload.messages.len(), 1);
        assert_eq!(request.payload.messages[0].content, "R\n\nP");
        assert_eq!(request.payload.messages[0].role, "user");
    }

    #[test]
    fn request_serializes_to_gateway_schema() {
        let request = ExecutionRequest::text_completion("gpt-x", "Be concise.", "Hello");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "job_type": "text-completion",
                "payload": {
                    "model": "gpt-x",
                    "messages": [
                        {"role": "user", "content": "Be concise.\n\nHello"}
                    ]
                },
                "dry_run": false
            })
        );
    }

    #[test]
    fn assistant_message_extraction() {
        let response: ExecutionResponse = serde_json::from_value(json!({
            "status": "completed",
            "routing": {"provider": "acme", "model": "gpt-x"},
            "result": {
                "choices": [{"message": {"role": "assistant", "content": "Hi there"}}]
            },
            "usage": {"input_tokens": 12, "output_tokens": 3, "total_cost": 0.000042}
        }))
        .unwrap();
        assert_eq!(response.assistant_message(), Some("Hi there"));
        assert_eq!(response.usage.input_tokens, Some(12));
        assert_eq!(response.usage.total_cost, Some(0.000042));
        assert!(!response.usage.estimated);
    }

    #[test]
    fn missing_result_yields_no_assistant_message() {
        let response: ExecutionResponse =
            serde_json::from_value(json!({"status": "failed", "routing": {}, "usage": {}}))
                .unwrap();
        assert_eq!(response.assistant_message(), None);
    }
}
