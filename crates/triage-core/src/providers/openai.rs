//! OpenAI Responses API backend
//!
//! Hosted tools (file search, web search) and strict JSON-schema output are
//! Responses API features, so agents run through `/v1/responses` rather than
//! chat completions.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::agents::{AgentDefinition, OutputShape, ReasoningSettings, ToolGrant};
use crate::history::{ConversationItem, Role};
use crate::settings::{ApiKey, SearchContextSize, UserLocation};

use super::types::{AgentRun, InferenceBackend, Usage};

/// Backend that runs agents against the OpenAI Responses API
pub struct OpenAiResponsesBackend {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl std::fmt::Debug for OpenAiResponsesBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiResponsesBackend")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiResponsesBackend {
    /// Only the connect phase is bounded; a run may take as long as the
    /// model needs.
    pub fn new(api_key: ApiKey, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the request body for one agent run
    fn build_request<'a>(agent: &'a AgentDefinition, input: &[ConversationItem]) -> ResponsesRequest<'a> {
        let text = match &agent.output {
            OutputShape::Text => None,
            OutputShape::JsonSchema { name, schema } => Some(TextConfig {
                format: TextFormat {
                    kind: "json_schema",
                    name,
                    schema,
                    strict: true,
                },
            }),
        };

        ResponsesRequest {
            model: &agent.model,
            instructions: &agent.instructions,
            input: Self::to_input_messages(input),
            tools: agent.tools.iter().map(ToolSpec::from_grant).collect(),
            text,
            reasoning: agent.settings.reasoning,
            temperature: agent.settings.temperature,
            store: agent.settings.store,
        }
    }

    /// Convert history items to Responses input messages.
    ///
    /// Only messages are replayed; hosted tool calls and reasoning items are
    /// recorded in the history but not sent back.
    fn to_input_messages(items: &[ConversationItem]) -> Vec<InputMessage> {
        items
            .iter()
            .filter_map(|item| match item {
                ConversationItem::Message { role, text } => Some(InputMessage {
                    role: role.to_string(),
                    content: vec![match role {
                        Role::User => InputContent::InputText { text: text.clone() },
                        Role::Assistant => InputContent::OutputText { text: text.clone() },
                    }],
                }),
                ConversationItem::ToolCall { .. } | ConversationItem::Reasoning { .. } => None,
            })
            .collect()
    }

    /// Convert a Responses API reply into an agent run
    fn from_response(resp: ResponsesApiResponse) -> Result<AgentRun> {
        if let Some(error) = resp.error {
            return Err(anyhow!(
                "OpenAI response {} failed: {}",
                resp.id,
                error.message
            ));
        }

        let new_items: Vec<ConversationItem> =
            resp.output.into_iter().filter_map(convert_output_item).collect();

        let final_output = new_items
            .iter()
            .rev()
            .find(|item| item.role() == Some(Role::Assistant))
            .and_then(ConversationItem::message_text)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let usage = resp.usage.map_or(Usage::default(), |u| Usage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        });

        Ok(AgentRun {
            final_output,
            new_items,
            usage,
        })
    }
}

/// Map one raw output item to a conversation item
fn convert_output_item(item: Value) -> Option<ConversationItem> {
    let kind = item.get("type").and_then(Value::as_str)?.to_string();
    match kind.as_str() {
        "message" => {
            let text = item
                .get("content")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter(|p| p.get("type").and_then(Value::as_str) == Some("output_text"))
                        .filter_map(|p| p.get("text").and_then(Value::as_str))
                        .collect::<String>()
                })
                .unwrap_or_default();
            Some(ConversationItem::assistant(text))
        }
        "reasoning" => {
            let summary = item
                .get("summary")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter_map(|p| p.get("text").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(ConversationItem::Reasoning { summary })
        }
        k if k.ends_with("_call") => {
            let id = item
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(ConversationItem::ToolCall {
                kind: k.to_string(),
                id,
                detail: item,
            })
        }
        _ => {
            debug!("Ignoring unsupported output item type '{}'", kind);
            None
        }
    }
}

#[async_trait]
impl InferenceBackend for OpenAiResponsesBackend {
    fn backend_name(&self) -> &str {
        "openai"
    }

    async fn run(&self, agent: &AgentDefinition, input: &[ConversationItem]) -> Result<AgentRun> {
        let url = format!("{}/v1/responses", self.base_url);
        let body = Self::build_request(agent, input);

        debug!(
            "OpenAI request: agent={}, model={}, items={}, tools={}",
            agent.name,
            agent.model,
            body.input.len(),
            body.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "OpenAI API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: ResponsesApiResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI API response")?;

        debug!(
            "OpenAI response: id={}, status={:?}, output_items={}",
            api_response.id,
            api_response.status,
            api_response.output.len()
        );

        Self::from_response(api_response)
    }
}

// ── Responses wire types ──

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextConfig<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
struct InputMessage {
    role: String,
    content: Vec<InputContent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputContent {
    InputText { text: String },
    OutputText { text: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolSpec {
    FileSearch {
        vector_store_ids: Vec<String>,
    },
    WebSearchPreview {
        search_context_size: SearchContextSize,
        user_location: ApproximateLocation,
    },
}

impl ToolSpec {
    fn from_grant(grant: &ToolGrant) -> Self {
        match grant {
            ToolGrant::FileSearch { vector_store_ids } => Self::FileSearch {
                vector_store_ids: vector_store_ids.clone(),
            },
            ToolGrant::WebSearch {
                search_context_size,
                user_location,
            } => Self::WebSearchPreview {
                search_context_size: *search_context_size,
                user_location: ApproximateLocation {
                    kind: "approximate",
                    location: user_location.clone(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ApproximateLocation {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    location: UserLocation,
}

#[derive(Debug, Serialize)]
struct TextConfig<'a> {
    format: TextFormat<'a>,
}

#[derive(Debug, Serialize)]
struct TextFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    schema: &'a Value,
    strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsesApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Vec<Value>,
    #[serde(default)]
    usage: Option<ResponsesUsage>,
    #[serde(default)]
    error: Option<ResponsesError>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsesError {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{self, AgentSet};
    use crate::settings::WorkflowSettings;

    fn agents() -> AgentSet {
        let mut settings = WorkflowSettings::new(
            ApiKey::new("sk-test-key-123456").unwrap(),
            vec!["vs_123".to_string()],
        );
        settings.web_search.user_location.country = Some("US".to_string());
        AgentSet::from_settings(&settings)
    }

    fn body(agent: &AgentDefinition, input: &[ConversationItem]) -> Value {
        serde_json::to_value(OpenAiResponsesBackend::build_request(agent, input)).unwrap()
    }

    fn response(json: Value) -> ResponsesApiResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_classifier_request_uses_strict_schema() {
        let agents = agents();
        let body = body(&agents.classifier, &[ConversationItem::user("rewrite this")]);

        assert_eq!(body["model"], "gpt-5.2");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["text"]["format"]["type"], "json_schema");
        assert_eq!(body["text"]["format"]["name"], "classify");
        assert_eq!(body["text"]["format"]["strict"], true);
        assert_eq!(
            body["text"]["format"]["schema"]["properties"]["category"]["enum"][1],
            "Polish Reply"
        );
        assert!(body.get("tools").is_none());
        assert!(body.get("reasoning").is_none());
        assert!(body.get("store").is_none());
        assert_eq!(body["input"][0]["role"], "user");
        assert_eq!(body["input"][0]["content"][0]["type"], "input_text");
        assert_eq!(body["input"][0]["content"][0]["text"], "rewrite this");
    }

    #[test]
    fn test_kb_request_grants_file_search() {
        let agents = agents();
        let body = body(&agents.kb_search, &[ConversationItem::user("q")]);

        assert_eq!(body["tools"][0]["type"], "file_search");
        assert_eq!(body["tools"][0]["vector_store_ids"][0], "vs_123");
        assert_eq!(body["reasoning"]["effort"], "medium");
        assert_eq!(body["reasoning"]["summary"], "auto");
        assert_eq!(body["store"], true);
        assert!(body.get("text").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_general_request_grants_web_search() {
        let agents = agents();
        let body = body(&agents.general, &[ConversationItem::user("Do a web search")]);

        let tool = &body["tools"][0];
        assert_eq!(tool["type"], "web_search_preview");
        assert_eq!(tool["search_context_size"], "medium");
        assert_eq!(tool["user_location"]["type"], "approximate");
        assert_eq!(tool["user_location"]["country"], "US");
        assert!(tool["user_location"].get("city").is_none());
        assert_eq!(body["reasoning"]["effort"], "low");
    }

    #[test]
    fn test_input_skips_tool_calls_and_reasoning() {
        let items = vec![
            ConversationItem::user("how to recover domain from redemption"),
            ConversationItem::ToolCall {
                kind: "file_search_call".to_string(),
                id: "fs_1".to_string(),
                detail: serde_json::json!({}),
            },
            ConversationItem::Reasoning { summary: vec![] },
            ConversationItem::assistant("Open the domain manager..."),
            ConversationItem::user("make it sound better"),
        ];
        let messages = OpenAiResponsesBackend::to_input_messages(&items);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, "assistant");
        assert!(matches!(
            &messages[1].content[0],
            InputContent::OutputText { text } if text == "Open the domain manager..."
        ));
        assert_eq!(messages[2].role, "user");
    }

    #[test]
    fn test_from_response_text() {
        let resp = response(serde_json::json!({
            "id": "resp_1",
            "status": "completed",
            "output": [{
                "type": "message",
                "id": "msg_1",
                "role": "assistant",
                "content": [{"type": "output_text", "text": "{\"category\":\"Search in KB\"}", "annotations": []}]
            }],
            "usage": {"input_tokens": 320, "output_tokens": 9, "total_tokens": 329}
        }));
        let run = OpenAiResponsesBackend::from_response(resp).unwrap();
        assert_eq!(
            run.final_output.as_deref(),
            Some("{\"category\":\"Search in KB\"}")
        );
        assert_eq!(run.new_items.len(), 1);
        assert_eq!(run.usage.input_tokens, 320);
        assert_eq!(run.usage.output_tokens, 9);
    }

    #[test]
    fn test_from_response_keeps_item_order() {
        let resp = response(serde_json::json!({
            "id": "resp_2",
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": [{"type": "summary_text", "text": "Searching files"}]},
                {"type": "file_search_call", "id": "fs_1", "status": "completed", "queries": ["payment link"]},
                {"type": "message", "id": "msg_1", "role": "assistant", "content": [
                    {"type": "output_text", "text": "Use the Order tool "},
                    {"type": "output_text", "text": "to create the link."}
                ]}
            ]
        }));
        let run = OpenAiResponsesBackend::from_response(resp).unwrap();
        assert_eq!(run.new_items.len(), 3);
        assert_eq!(
            run.new_items[0],
            ConversationItem::Reasoning {
                summary: vec!["Searching files".to_string()],
            }
        );
        assert!(matches!(
            &run.new_items[1],
            ConversationItem::ToolCall { kind, id, detail }
                if kind == "file_search_call" && id == "fs_1" && detail["queries"][0] == "payment link"
        ));
        assert_eq!(
            run.final_output.as_deref(),
            Some("Use the Order tool to create the link.")
        );
        assert_eq!(run.usage, Usage::default());
    }

    #[test]
    fn test_from_response_without_message_has_no_output() {
        let resp = response(serde_json::json!({
            "id": "resp_3",
            "status": "incomplete",
            "output": [{"type": "web_search_call", "id": "ws_1", "status": "completed"}]
        }));
        let run = OpenAiResponsesBackend::from_response(resp).unwrap();
        assert!(run.final_output.is_none());
        assert_eq!(run.new_items.len(), 1);
    }

    #[test]
    fn test_from_response_error_body() {
        let resp = response(serde_json::json!({
            "id": "resp_4",
            "status": "failed",
            "output": [],
            "error": {"code": "server_error", "message": "The model failed"}
        }));
        let err = OpenAiResponsesBackend::from_response(resp).unwrap_err();
        assert!(err.to_string().contains("The model failed"));
    }

    #[test]
    fn test_unknown_output_items_are_dropped() {
        assert!(convert_output_item(serde_json::json!({"type": "image_generation"})).is_none());
        assert!(convert_output_item(serde_json::json!({"id": "no_type"})).is_none());
    }

    #[test]
    fn test_backend_debug_hides_key() {
        let backend = OpenAiResponsesBackend::new(
            ApiKey::new("sk-secret-key-abcdef").unwrap(),
            "https://api.openai.com/",
        )
        .unwrap();
        let debug = format!("{:?}", backend);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("https://api.openai.com\""));
        assert_eq!(backend.backend_name(), "openai");
    }

    #[test]
    fn test_agent_names_reach_requests_unchanged() {
        let agents = agents();
        assert_eq!(agents.kb_search.name, agents::KB_SEARCH_AGENT);
        let body = body(&agents.polish_reply, &[ConversationItem::user("x")]);
        assert_eq!(body["instructions"], agents.polish_reply.instructions);
    }
}
