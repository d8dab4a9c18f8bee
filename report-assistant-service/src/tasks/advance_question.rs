use async_trait::async_trait;
use dialog_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use tracing::info;

use crate::models::session_keys;

use super::router::ROUTER_TASK_ID;
use super::start_walk::ANSWER_INVITATION;

pub const ADVANCE_TASK_ID: &str = "advance_question";

const WALK_DONE_NOTICE: &str =
    "ありがとう！予定していた問いは以上です。必要なら「できた」と送るとドラフトを作成します。";

/// Handles one answer inside the question walk: the user message is the
/// answer to the previous question, the cursor advances, and the next
/// question goes out without the intro line. When the list is exhausted
/// the task emits its terminal notice exactly once, then falls through to
/// free-form chat within the same turn (the outgoing edge to
/// `free_form_chat` is only ever taken on this path).
pub struct AdvanceQuestionTask;

#[async_trait]
impl Task for AdvanceQuestionTask {
    fn id(&self) -> &str {
        ADVANCE_TASK_ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let questions: Vec<String> = context
            .get(session_keys::QUESTIONS)
            .await
            .ok_or_else(|| FlowError::ContextError("questions not found".to_string()))?;
        let cursor: usize = context.get(session_keys::CURSOR).await.unwrap_or(0);

        if cursor < questions.len() {
            let message = format!("{}{}", questions[cursor], ANSWER_INVITATION);
            context.set(session_keys::CURSOR, cursor + 1).await;
            context.add_assistant_message(&message).await;
            info!(asked = cursor + 1, total = questions.len(), "asked next question");

            return Ok(TaskResult::new_with_status(
                Some(message),
                NextAction::GoTo(ROUTER_TASK_ID.to_string()),
                Some(format!("質問 {}/{}", cursor + 1, questions.len())),
            ));
        }

        // Exhausted: close the walk and let free-form chat answer the same
        // message in this turn.
        context.set(session_keys::WALK_CLOSED, true).await;
        context.add_assistant_message(WALK_DONE_NOTICE).await;
        info!("question walk exhausted, falling through to free-form chat");

        Ok(TaskResult::new_with_status(
            Some(WALK_DONE_NOTICE.to_string()),
            NextAction::ContinueAndExecute,
            Some("質問ウォーク完了".to_string()),
        ))
    }
}
