//! FlowRunner – convenience wrapper that loads a session, executes exactly
//! one user turn, and persists the updated session back to storage.
//!
//! Interactive services want to run one turn per request, return the
//! assistant's reply, and have the session saved for the next roundtrip;
//! `FlowRunner` makes that a one-liner. Use `Graph::execute_session`
//! directly only when you need to inspect the intermediate `Session`
//! before saving.

use std::sync::Arc;

use crate::{
    error::{FlowError, Result},
    graph::{ExecutionResult, Graph},
    storage::SessionStorage,
};

/// High-level helper that orchestrates the common load → execute → save
/// pattern.
#[derive(Clone)]
pub struct FlowRunner {
    graph: Arc<Graph>,
    storage: Arc<dyn SessionStorage>,
}

impl FlowRunner {
    pub fn new(graph: Arc<Graph>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { graph, storage }
    }

    /// Execute exactly one turn for the given `session_id` and persist the
    /// updated session.
    pub async fn run(&self, session_id: &str) -> Result<ExecutionResult> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        let result = self.graph.execute_session(&mut session).await?;

        self.storage.save(session).await?;

        Ok(result)
    }
}
