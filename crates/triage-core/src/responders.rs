//! Running a responder agent over the conversation

use tracing::debug;

use crate::agents::AgentDefinition;
use crate::error::WorkflowError;
use crate::history::ConversationHistory;
use crate::providers::{InferenceBackend, Usage};

/// Run `agent` over the whole history.
///
/// Every item the agent produced is appended to `history` before the final
/// output is checked, so a caller keeping the history sees this turn even if
/// the agent ended without an answer.
pub async fn respond(
    backend: &dyn InferenceBackend,
    agent: &AgentDefinition,
    history: &mut ConversationHistory,
) -> Result<(String, Usage), WorkflowError> {
    debug!(
        "Running responder '{}' over {} items",
        agent.name,
        history.len()
    );

    let run = backend
        .run(agent, history.items())
        .await
        .map_err(|source| WorkflowError::Inference {
            agent: agent.name.clone(),
            source,
        })?;

    debug!(
        "Responder '{}' produced {} items",
        agent.name,
        run.new_items.len()
    );
    history.extend(run.new_items);

    let text = run
        .final_output
        .filter(|o| !o.trim().is_empty())
        .ok_or_else(|| WorkflowError::AgentResultMissing {
            agent: agent.name.clone(),
        })?;

    Ok((text, run.usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ConversationItem;
    use crate::providers::AgentRun;
    use anyhow::Result;
    use async_trait::async_trait;

    struct EchoBackend {
        final_output: Option<String>,
    }

    #[async_trait]
    impl InferenceBackend for EchoBackend {
        fn backend_name(&self) -> &str {
            "echo"
        }

        async fn run(&self, agent: &AgentDefinition, input: &[ConversationItem]) -> Result<AgentRun> {
            Ok(AgentRun {
                final_output: self.final_output.clone(),
                new_items: vec![
                    ConversationItem::Reasoning {
                        summary: vec![format!("{} saw {} items", agent.name, input.len())],
                    },
                    ConversationItem::assistant(self.final_output.clone().unwrap_or_default()),
                ],
                usage: Usage {
                    input_tokens: 40,
                    output_tokens: 20,
                },
            })
        }
    }

    fn agent() -> AgentDefinition {
        AgentDefinition::new("Polish Reply Agent", "polish", "test-model")
    }

    #[tokio::test]
    async fn test_respond_appends_items_in_order() {
        let backend = EchoBackend {
            final_output: Some("Thanks so much for reaching out!".to_string()),
        };
        let mut history = ConversationHistory::new("make it sound better");
        let initial = history.clone();

        let (text, usage) = respond(&backend, &agent(), &mut history).await.unwrap();
        assert_eq!(text, "Thanks so much for reaching out!");
        assert_eq!(usage.total(), 60);
        assert_eq!(history.len(), 3);
        assert!(history.extends(&initial));
        assert_eq!(
            history.items()[1],
            ConversationItem::Reasoning {
                summary: vec!["Polish Reply Agent saw 1 items".to_string()],
            }
        );
        assert_eq!(
            history.last_assistant_text(),
            Some("Thanks so much for reaching out!")
        );
    }

    #[tokio::test]
    async fn test_respond_missing_output_still_records_items() {
        let backend = EchoBackend { final_output: None };
        let mut history = ConversationHistory::new("rewrite this");

        let err = respond(&backend, &agent(), &mut history).await.unwrap_err();
        assert!(
            matches!(err, WorkflowError::AgentResultMissing { ref agent } if agent == "Polish Reply Agent")
        );
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn test_respond_blank_output_is_missing() {
        let backend = EchoBackend {
            final_output: Some("  ".to_string()),
        };
        let mut history = ConversationHistory::new("rewrite this");
        let err = respond(&backend, &agent(), &mut history).await.unwrap_err();
        assert!(matches!(err, WorkflowError::AgentResultMissing { .. }));
    }
}
