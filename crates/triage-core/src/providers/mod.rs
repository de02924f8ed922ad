//! Inference backends
//!
//! Backends implement [`InferenceBackend`]: given an agent definition and a
//! list of conversation items they return the agent's final output plus every
//! item it produced. The workflow only ever talks to this trait, so tests run
//! against deterministic fakes.

pub mod openai;
pub mod types;

pub use openai::OpenAiResponsesBackend;
pub use types::{AgentRun, InferenceBackend, Usage};
