use std::sync::Arc;

use async_trait::async_trait;
use dialog_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use futures::StreamExt;
use tracing::info;

use crate::llm::{ChatClient, ChatRequest};
use crate::models::{TrainingDocument, session_keys};

use super::router::ROUTER_TASK_ID;

pub const FREE_FORM_TASK_ID: &str = "free_form_chat";

/// Upper bound on the document excerpt embedded in the system instruction.
const CONTEXT_EXCERPT_CHARS: usize = 6000;

const FREE_FORM_SYSTEM: &str = "あなたは『研修レポート作成を支援する専門家』です。\
丁寧で論理的に、文脈に沿って分かりやすく説明してください。";

/// Free-form turn: the full transcript plus a system instruction (with a
/// bounded document excerpt when one is available) goes to the LLM in
/// streaming mode. Chunks are concatenated in arrival order and the
/// transcript is only appended once the stream has completed; partial
/// responses are never stored.
pub struct FreeFormChatTask {
    client: Arc<dyn ChatClient>,
}

impl FreeFormChatTask {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Task for FreeFormChatTask {
    fn id(&self) -> &str {
        FREE_FORM_TASK_ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let document: Option<TrainingDocument> = context.get(session_keys::DOCUMENT).await;
        let system = match document.as_ref().filter(|d| d.has_text()) {
            Some(doc) => format!(
                "{}\n\n--- 参考ドキュメント抜粋 ---\n{}",
                FREE_FORM_SYSTEM,
                doc.excerpt(CONTEXT_EXCERPT_CHARS)
            ),
            None => FREE_FORM_SYSTEM.to_string(),
        };

        let request = ChatRequest {
            system: Some(system),
            messages: context.transcript().await,
            temperature: None,
        };

        let mut stream = self
            .client
            .stream(request)
            .await
            .map_err(|e| FlowError::TaskExecutionFailed(e.to_string()))?;

        let mut response = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FlowError::TaskExecutionFailed(e.to_string()))?;
            response.push_str(&chunk);
        }
        info!(chars = response.len(), "free-form response complete");

        context.add_assistant_message(&response).await;

        Ok(TaskResult::new(
            Some(response),
            NextAction::GoTo(ROUTER_TASK_ID.to_string()),
        ))
    }
}
