//! Backend-agnostic types for running an agent

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::AgentDefinition;
use crate::history::ConversationItem;

/// Token usage reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

impl std::ops::Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        Usage {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
        }
    }
}

/// Result of running one agent over a list of conversation items
#[derive(Debug, Clone, Default)]
pub struct AgentRun {
    /// Final text produced by the agent. For structured agents this is the
    /// raw JSON document.
    pub final_output: Option<String>,
    /// Every item the agent produced, in the order the backend returned them
    pub new_items: Vec<ConversationItem>,
    pub usage: Usage,
}

/// Trait every inference backend implements
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Human-readable backend name (e.g. "openai")
    fn backend_name(&self) -> &str;

    /// Run `agent` once over `input` and return what it produced
    async fn run(&self, agent: &AgentDefinition, input: &[ConversationItem]) -> Result<AgentRun>;
}
