//! Startup settings passed by value into the workflow

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

pub const DEFAULT_MODEL: &str = "gpt-5.2";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_WORKFLOW_NAME: &str = "Customer Success Slack Agent";
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Inference credential. Never printed in full.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate a credential. Empty or whitespace-only keys are a startup error.
    pub fn new(key: impl Into<String>) -> Result<Self, WorkflowError> {
        let key = key.into();
        let key = key.trim();
        if key.is_empty() {
            return Err(WorkflowError::MissingCredential {
                name: API_KEY_VAR.to_string(),
            });
        }
        Ok(Self(key.to_string()))
    }

    /// Read the key from `OPENAI_API_KEY`
    pub fn from_env() -> Result<Self, WorkflowError> {
        Self::new(std::env::var(API_KEY_VAR).unwrap_or_default())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First 3 and last 4 chars for keys longer than 7 chars, otherwise "***"
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 7 {
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", prefix, suffix)
        } else {
            "***".to_string()
        }
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKey").field(&self.masked()).finish()
    }
}

/// How much retrieved web context the general assistant may use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Low,
    #[default]
    Medium,
    High,
}

impl SearchContextSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Approximate location hint for web search. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchSettings {
    #[serde(default)]
    pub search_context_size: SearchContextSize,
    #[serde(default)]
    pub user_location: UserLocation,
}

/// Per-agent model overrides; `None` falls back to [`WorkflowSettings::model`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOverrides {
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub kb_search: Option<String>,
    #[serde(default)]
    pub polish_reply: Option<String>,
    #[serde(default)]
    pub general: Option<String>,
}

/// Everything the workflow needs, resolved once at process start
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub models: ModelOverrides,
    /// Vector stores searched by the knowledge-base agent
    pub vector_store_ids: Vec<String>,
    pub web_search: WebSearchSettings,
    /// Ask the backend to keep responder responses server-side
    pub store: bool,
    pub workflow_name: String,
    pub workflow_id: Option<String>,
}

impl WorkflowSettings {
    pub fn new(api_key: ApiKey, vector_store_ids: Vec<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            models: ModelOverrides::default(),
            vector_store_ids,
            web_search: WebSearchSettings::default(),
            store: true,
            workflow_name: DEFAULT_WORKFLOW_NAME.to_string(),
            workflow_id: None,
        }
    }

    /// Check the settings can drive every agent
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.model.trim().is_empty() {
            return Err(WorkflowError::Config("model must not be empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(WorkflowError::Config("base_url must not be empty".to_string()));
        }
        if !self.vector_store_ids.iter().any(|id| !id.trim().is_empty()) {
            return Err(WorkflowError::Config(
                "at least one vector store id is required for knowledge-base search".to_string(),
            ));
        }
        Ok(())
    }

    pub fn classifier_model(&self) -> &str {
        self.models.classifier.as_deref().unwrap_or(&self.model)
    }

    pub fn kb_search_model(&self) -> &str {
        self.models.kb_search.as_deref().unwrap_or(&self.model)
    }

    pub fn polish_reply_model(&self) -> &str {
        self.models.polish_reply.as_deref().unwrap_or(&self.model)
    }

    pub fn general_model(&self) -> &str {
        self.models.general.as_deref().unwrap_or(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> WorkflowSettings {
        WorkflowSettings::new(
            ApiKey::new("sk-test-1234567890").unwrap(),
            vec!["vs_test".to_string()],
        )
    }

    #[test]
    fn test_empty_api_key_is_missing_credential() {
        let err = ApiKey::new("   ").unwrap_err();
        assert!(matches!(err, WorkflowError::MissingCredential { ref name } if name == API_KEY_VAR));
        assert!(err.is_startup());
    }

    #[test]
    fn test_api_key_is_trimmed() {
        let key = ApiKey::new("  sk-abc  ").unwrap();
        assert_eq!(key.expose(), "sk-abc");
    }

    #[test]
    fn test_api_key_debug_is_masked() {
        let key = ApiKey::new("sk-secret-key-value").unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("sk-...alue"));
        assert_eq!(ApiKey::new("short").unwrap().masked(), "***");
    }

    #[test]
    fn test_defaults() {
        let s = settings();
        assert_eq!(s.model, DEFAULT_MODEL);
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.workflow_name, DEFAULT_WORKFLOW_NAME);
        assert!(s.store);
        assert_eq!(s.web_search.search_context_size, SearchContextSize::Medium);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_model_overrides() {
        let mut s = settings();
        s.models.classifier = Some("gpt-4.1-mini".to_string());
        assert_eq!(s.classifier_model(), "gpt-4.1-mini");
        assert_eq!(s.kb_search_model(), DEFAULT_MODEL);
        assert_eq!(s.polish_reply_model(), DEFAULT_MODEL);
        assert_eq!(s.general_model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_validate_requires_vector_store() {
        let mut s = settings();
        s.vector_store_ids = vec!["  ".to_string()];
        assert!(matches!(s.validate(), Err(WorkflowError::Config(_))));
    }

    #[test]
    fn test_search_context_size_serde() {
        let size: SearchContextSize = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(size, SearchContextSize::High);
        assert_eq!(SearchContextSize::Low.as_str(), "low");
    }
}
