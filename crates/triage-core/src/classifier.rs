//! Intent classification
//!
//! The classifier agent sees only the raw message text, never the running
//! conversation, and must answer with `{"category": "<label>"}`. The label is
//! then mapped to a [`Route`]; any label that is not exactly
//! "Search in KB" or "Polish Reply" goes to the general assistant.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::agents::AgentDefinition;
use crate::error::WorkflowError;
use crate::history::ConversationItem;
use crate::providers::{InferenceBackend, Usage};

pub const SEARCH_IN_KB: &str = "Search in KB";
pub const POLISH_REPLY: &str = "Polish Reply";
pub const GENERAL_ASSISTANT: &str = "General Assistant";

/// The only labels the classifier schema allows
pub const CATEGORY_LABELS: [&str; 3] = [SEARCH_IN_KB, POLISH_REPLY, GENERAL_ASSISTANT];

pub const SCHEMA_NAME: &str = "classify";

/// Which responder handles a classified message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    KbSearch,
    PolishReply,
    /// Catch-all for everything that is not one of the two labels above
    General,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::KbSearch, Route::PolishReply, Route::General];

    /// Exact, case-sensitive match. Unknown labels fall through to `General`.
    pub fn from_label(label: &str) -> Self {
        match label {
            SEARCH_IN_KB => Self::KbSearch,
            POLISH_REPLY => Self::PolishReply,
            _ => Self::General,
        }
    }

    /// Canonical classifier label for this route
    pub fn label(&self) -> &'static str {
        match self {
            Self::KbSearch => SEARCH_IN_KB,
            Self::PolishReply => POLISH_REPLY,
            Self::General => GENERAL_ASSISTANT,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KbSearch => write!(f, "kb_search"),
            Self::PolishReply => write!(f, "polish_reply"),
            Self::General => write!(f, "general"),
        }
    }
}

/// Structured classifier output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
}

impl ClassificationResult {
    pub fn route(&self) -> Route {
        Route::from_label(&self.category)
    }

    /// Whether the category is one of [`CATEGORY_LABELS`]
    pub fn is_known(&self) -> bool {
        CATEGORY_LABELS.contains(&self.category.as_str())
    }
}

/// Strict JSON schema for the classifier output
pub fn category_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "category": {
                "type": "string",
                "enum": CATEGORY_LABELS,
            }
        },
        "required": ["category"],
        "additionalProperties": false,
    })
}

/// Parse the classifier's final output into a result.
///
/// Tolerates text around the JSON object. A missing or non-string category,
/// or an empty one, is a classification failure.
pub fn parse_classification(text: &str) -> Result<ClassificationResult, WorkflowError> {
    let start = text
        .find('{')
        .ok_or_else(|| WorkflowError::ClassificationFailed("no JSON object in output".to_string()))?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| {
            WorkflowError::ClassificationFailed("no closing brace in output".to_string())
        })?;

    let result: ClassificationResult = serde_json::from_str(&text[start..=end])
        .map_err(|e| WorkflowError::ClassificationFailed(format!("unparseable result: {}", e)))?;

    if result.category.trim().is_empty() {
        return Err(WorkflowError::ClassificationFailed(
            "empty category".to_string(),
        ));
    }

    Ok(result)
}

/// Run the classifier agent on `text` alone
pub async fn classify(
    backend: &dyn InferenceBackend,
    agent: &AgentDefinition,
    text: &str,
) -> Result<(ClassificationResult, Usage), WorkflowError> {
    if text.trim().is_empty() {
        return Err(WorkflowError::InvalidInput(
            "message text must not be empty".to_string(),
        ));
    }

    let input = [ConversationItem::user(text)];
    let run = backend
        .run(agent, &input)
        .await
        .map_err(|source| WorkflowError::Inference {
            agent: agent.name.clone(),
            source,
        })?;

    let output = run
        .final_output
        .filter(|o| !o.trim().is_empty())
        .ok_or_else(|| WorkflowError::ClassificationFailed("agent result is undefined".to_string()))?;

    let result = parse_classification(&output)?;
    if !result.is_known() {
        warn!(
            "Classifier returned unlisted category {:?}, routing to {}",
            result.category,
            result.route()
        );
    }
    debug!("Classified as {:?} -> {}", result.category, result.route());

    Ok((result, run.usage))
}
