//! Agent definitions: instructions, model, tool grants and output shape
//!
//! The workflow uses four fixed agents: a classifier and three responders.
//! [`AgentSet::from_settings`] builds all of them from [`WorkflowSettings`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classifier::{self, Route};
use crate::prompts;
use crate::settings::{SearchContextSize, UserLocation, WorkflowSettings};

pub const CLASSIFY_AGENT: &str = "Classify";
pub const KB_SEARCH_AGENT: &str = "Search Through KB";
pub const POLISH_REPLY_AGENT: &str = "Polish Reply Agent";
pub const GENERAL_AGENT: &str = "General Agent";

/// A hosted capability the backend may use while running an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolGrant {
    FileSearch {
        vector_store_ids: Vec<String>,
    },
    WebSearch {
        search_context_size: SearchContextSize,
        user_location: UserLocation,
    },
}

/// What shape the agent's final output must take
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum OutputShape {
    #[default]
    Text,
    /// Strict JSON schema the backend must enforce
    JsonSchema { name: String, schema: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningSummary {
    Auto,
    Concise,
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningSettings {
    pub effort: ReasoningEffort,
    pub summary: ReasoningSummary,
}

/// Sampling and reasoning knobs sent with every call for an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub reasoning: Option<ReasoningSettings>,
    /// `None` leaves the backend default in place
    #[serde(default)]
    pub store: Option<bool>,
}

/// A named agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub instructions: String,
    pub model: String,
    #[serde(default)]
    pub tools: Vec<ToolGrant>,
    #[serde(default)]
    pub output: OutputShape,
    #[serde(default)]
    pub settings: ModelSettings,
}

impl AgentDefinition {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            tools: Vec::new(),
            output: OutputShape::Text,
            settings: ModelSettings::default(),
        }
    }

    pub fn with_tool(mut self, tool: ToolGrant) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_output(mut self, output: OutputShape) -> Self {
        self.output = output;
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Whether the agent must return a structured result
    pub fn is_structured(&self) -> bool {
        matches!(self.output, OutputShape::JsonSchema { .. })
    }
}

fn reasoning(effort: ReasoningEffort) -> Option<ReasoningSettings> {
    Some(ReasoningSettings {
        effort,
        summary: ReasoningSummary::Auto,
    })
}

/// Classifier: temperature 0, output constrained to the category schema
pub fn classifier(settings: &WorkflowSettings) -> AgentDefinition {
    AgentDefinition::new(
        CLASSIFY_AGENT,
        prompts::CLASSIFY_INSTRUCTIONS,
        settings.classifier_model(),
    )
    .with_output(OutputShape::JsonSchema {
        name: classifier::SCHEMA_NAME.to_string(),
        schema: classifier::category_schema(),
    })
    .with_settings(ModelSettings {
        temperature: Some(0.0),
        reasoning: None,
        store: None,
    })
}

pub fn kb_search(settings: &WorkflowSettings) -> AgentDefinition {
    AgentDefinition::new(
        KB_SEARCH_AGENT,
        prompts::KB_SEARCH_INSTRUCTIONS,
        settings.kb_search_model(),
    )
    .with_tool(ToolGrant::FileSearch {
        vector_store_ids: settings
            .vector_store_ids
            .iter()
            .filter(|id| !id.trim().is_empty())
            .cloned()
            .collect(),
    })
    .with_settings(ModelSettings {
        temperature: None,
        reasoning: reasoning(ReasoningEffort::Medium),
        store: Some(settings.store),
    })
}

pub fn polish_reply(settings: &WorkflowSettings) -> AgentDefinition {
    AgentDefinition::new(
        POLISH_REPLY_AGENT,
        prompts::POLISH_REPLY_INSTRUCTIONS,
        settings.polish_reply_model(),
    )
    .with_settings(ModelSettings {
        temperature: None,
        reasoning: reasoning(ReasoningEffort::Medium),
        store: Some(settings.store),
    })
}

pub fn general_assistant(settings: &WorkflowSettings) -> AgentDefinition {
    AgentDefinition::new(
        GENERAL_AGENT,
        prompts::GENERAL_ASSISTANT_INSTRUCTIONS,
        settings.general_model(),
    )
    .with_tool(ToolGrant::WebSearch {
        search_context_size: settings.web_search.search_context_size,
        user_location: settings.web_search.user_location.clone(),
    })
    .with_settings(ModelSettings {
        temperature: None,
        reasoning: reasoning(ReasoningEffort::Low),
        store: Some(settings.store),
    })
}

/// The classifier plus one responder per route
#[derive(Debug, Clone)]
pub struct AgentSet {
    pub classifier: AgentDefinition,
    pub kb_search: AgentDefinition,
    pub polish_reply: AgentDefinition,
    pub general: AgentDefinition,
}

impl AgentSet {
    pub fn from_settings(settings: &WorkflowSettings) -> Self {
        Self {
            classifier: classifier(settings),
            kb_search: kb_search(settings),
            polish_reply: polish_reply(settings),
            general: general_assistant(settings),
        }
    }

    /// The responder that handles `route`
    pub fn responder(&self, route: Route) -> &AgentDefinition {
        match route {
            Route::KbSearch => &self.kb_search,
            Route::PolishReply => &self.polish_reply,
            Route::General => &self.general,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ApiKey;

    fn settings() -> WorkflowSettings {
        WorkflowSettings::new(
            ApiKey::new("sk-test").unwrap(),
            vec!["vs_kb".to_string(), " ".to_string()],
        )
    }

    #[test]
    fn test_classifier_is_only_structured_agent() {
        let agents = AgentSet::from_settings(&settings());
        assert!(agents.classifier.is_structured());
        assert!(!agents.kb_search.is_structured());
        assert!(!agents.polish_reply.is_structured());
        assert!(!agents.general.is_structured());
        assert_eq!(agents.classifier.settings.temperature, Some(0.0));
        assert!(agents.classifier.tools.is_empty());
    }

    #[test]
    fn test_kb_search_grants_file_search() {
        let agent = kb_search(&settings());
        assert_eq!(agent.name, KB_SEARCH_AGENT);
        assert_eq!(
            agent.tools,
            vec![ToolGrant::FileSearch {
                vector_store_ids: vec!["vs_kb".to_string()],
            }]
        );
        assert_eq!(
            agent.settings.reasoning.map(|r| r.effort),
            Some(ReasoningEffort::Medium)
        );
        assert_eq!(agent.settings.store, Some(true));
    }

    #[test]
    fn test_polish_reply_has_no_tools() {
        let agent = polish_reply(&settings());
        assert!(agent.tools.is_empty());
        assert_eq!(agent.instructions, prompts::POLISH_REPLY_INSTRUCTIONS);
    }

    #[test]
    fn test_general_grants_web_search() {
        let mut s = settings();
        s.web_search.search_context_size = SearchContextSize::High;
        s.web_search.user_location.country = Some("GB".to_string());
        let agent = general_assistant(&s);
        match &agent.tools[..] {
            [ToolGrant::WebSearch {
                search_context_size,
                user_location,
            }] => {
                assert_eq!(*search_context_size, SearchContextSize::High);
                assert_eq!(user_location.country.as_deref(), Some("GB"));
            }
            other => panic!("unexpected tools: {:?}", other),
        }
        assert_eq!(
            agent.settings.reasoning,
            Some(ReasoningSettings {
                effort: ReasoningEffort::Low,
                summary: ReasoningSummary::Auto,
            })
        );
    }

    #[test]
    fn test_responder_selection() {
        let agents = AgentSet::from_settings(&settings());
        assert_eq!(agents.responder(Route::KbSearch).name, KB_SEARCH_AGENT);
        assert_eq!(agents.responder(Route::PolishReply).name, POLISH_REPLY_AGENT);
        assert_eq!(agents.responder(Route::General).name, GENERAL_AGENT);
    }

    #[test]
    fn test_per_agent_model_override() {
        let mut s = settings();
        s.models.general = Some("gpt-4o".to_string());
        let agents = AgentSet::from_settings(&s);
        assert_eq!(agents.general.model, "gpt-4o");
        assert_eq!(agents.classifier.model, s.model);
    }
}
