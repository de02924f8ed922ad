//! Error taxonomy for the triage workflow

use thiserror::Error;

/// Every way a workflow can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A required credential was absent at startup
    #[error("missing credential: {name} is not set")]
    MissingCredential { name: String },

    /// Startup configuration that cannot produce a working workflow
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The classifier returned no usable structured result
    #[error("classification failed: {0}")]
    ClassificationFailed(String),

    /// A responder finished without a final answer
    #[error("agent result missing from '{agent}'")]
    AgentResultMissing { agent: String },

    /// The inference backend call itself failed
    #[error("inference call for '{agent}' failed: {source:#}")]
    Inference {
        agent: String,
        #[source]
        source: anyhow::Error,
    },
}

impl WorkflowError {
    /// Startup errors prevent any invocation; the rest fail a single run
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::MissingCredential { .. } | Self::Config(_))
    }
}
