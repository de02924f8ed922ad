//! Classify-then-dispatch workflow
//!
//! One run is exactly two sequential inference calls:
//!
//! ```text
//! Start ──classify──▶ Classified ──respond──▶ Responded ──▶ Done
//!   │                     │
//!   └──────────┬──────────┘
//!              ▼
//!            Failed
//! ```
//!
//! Nothing is retried and no fallback category is used; the first failure
//! ends the run and is returned to the caller.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::agents::AgentSet;
use crate::classifier::{self, ClassificationResult, Route};
use crate::error::WorkflowError;
use crate::history::ConversationHistory;
use crate::providers::{InferenceBackend, OpenAiResponsesBackend, Usage};
use crate::responders;
use crate::settings::{DEFAULT_WORKFLOW_NAME, WorkflowSettings};

/// Workflow entry payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInput {
    pub input_as_text: String,
}

impl WorkflowInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            input_as_text: text.into(),
        }
    }
}

/// Workflow result payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub output_text: String,
}

/// Where a run is in the classify-then-dispatch sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Start,
    Classified,
    Responded,
    Done,
    Failed,
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Classified => write!(f, "classified"),
            Self::Responded => write!(f, "responded"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Full report of one successful turn
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRun {
    pub classification: ClassificationResult,
    pub route: Route,
    /// Name of the responder that produced the answer
    pub agent: String,
    pub output_text: String,
    /// Classifier and responder usage combined
    pub usage: Usage,
}

/// The router. Holds only immutable agent definitions and a shared backend,
/// so one instance can serve any number of concurrent runs.
pub struct Workflow {
    backend: Arc<dyn InferenceBackend>,
    agents: AgentSet,
    name: String,
    workflow_id: Option<String>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("backend", &self.backend.backend_name())
            .field("name", &self.name)
            .field("workflow_id", &self.workflow_id)
            .finish()
    }
}

impl Workflow {
    pub fn new(backend: Arc<dyn InferenceBackend>, agents: AgentSet) -> Self {
        Self {
            backend,
            agents,
            name: DEFAULT_WORKFLOW_NAME.to_string(),
            workflow_id: None,
        }
    }

    /// Validate settings and wire the OpenAI backend and the four agents
    pub fn from_settings(settings: WorkflowSettings) -> Result<Self, WorkflowError> {
        settings.validate()?;
        let backend = OpenAiResponsesBackend::new(settings.api_key.clone(), settings.base_url.clone())
            .map_err(|e| WorkflowError::Config(format!("{:#}", e)))?;
        let agents = AgentSet::from_settings(&settings);

        info!(
            "Workflow '{}' ready (model: {}, vector stores: {})",
            settings.workflow_name,
            settings.model,
            settings.vector_store_ids.len()
        );

        let mut workflow = Self::new(Arc::new(backend), agents).with_name(settings.workflow_name);
        workflow.workflow_id = settings.workflow_id;
        Ok(workflow)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    pub fn agents(&self) -> &AgentSet {
        &self.agents
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run only the classifier
    pub async fn classify(&self, text: &str) -> Result<ClassificationResult, WorkflowError> {
        let (result, _) =
            classifier::classify(self.backend.as_ref(), &self.agents.classifier, text).await?;
        Ok(result)
    }

    /// Run the workflow on a fresh conversation
    pub async fn run(&self, input: WorkflowInput) -> Result<WorkflowOutput, WorkflowError> {
        let (run, _) = self.run_detailed(input).await?;
        Ok(WorkflowOutput {
            output_text: run.output_text,
        })
    }

    /// Like [`Workflow::run`] but also returns the report and the final history
    pub async fn run_detailed(
        &self,
        input: WorkflowInput,
    ) -> Result<(WorkflowRun, ConversationHistory), WorkflowError> {
        let mut history = ConversationHistory::new(input.input_as_text.clone());
        let run = self.dispatch(&mut history, &input.input_as_text).await?;
        Ok((run, history))
    }

    /// Follow-up turn: append `text` as a user message to an existing history,
    /// classify `text` on its own, and answer with the whole history.
    pub async fn run_turn(
        &self,
        history: &mut ConversationHistory,
        text: &str,
    ) -> Result<WorkflowRun, WorkflowError> {
        if text.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "message text must not be empty".to_string(),
            ));
        }
        history.push_user(text);
        self.dispatch(history, text).await
    }

    async fn dispatch(
        &self,
        history: &mut ConversationHistory,
        text: &str,
    ) -> Result<WorkflowRun, WorkflowError> {
        let span = info_span!(
            "workflow",
            name = %self.name,
            workflow_id = self.workflow_id.as_deref().unwrap_or(""),
            run_id = %Uuid::new_v4(),
        );

        async move {
            debug!(stage = %WorkflowStage::Start, "Classifying {} chars", text.len());
            let (classification, classify_usage) =
                classifier::classify(self.backend.as_ref(), &self.agents.classifier, text)
                    .await
                    .inspect_err(|e| log_failure(WorkflowStage::Start, e))?;

            let route = classification.route();
            info!(
                stage = %WorkflowStage::Classified,
                category = %classification.category,
                route = %route,
                "Message classified"
            );

            let agent = self.agents.responder(route);
            let (output_text, respond_usage) =
                responders::respond(self.backend.as_ref(), agent, history)
                    .await
                    .inspect_err(|e| log_failure(WorkflowStage::Classified, e))?;

            info!(
                stage = %WorkflowStage::Responded,
                agent = %agent.name,
                history_len = history.len(),
                "Responder finished"
            );

            let usage = classify_usage + respond_usage;
            debug!(stage = %WorkflowStage::Done, tokens = usage.total(), "Workflow complete");

            Ok(WorkflowRun {
                classification,
                route,
                agent: agent.name.clone(),
                output_text,
                usage,
            })
        }
        .instrument(span)
        .await
    }
}

fn log_failure(from: WorkflowStage, err: &WorkflowError) {
    warn!(stage = %WorkflowStage::Failed, from = %from, "Workflow failed: {}", err);
}
