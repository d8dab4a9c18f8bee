use async_trait::async_trait;
use dialog_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use tracing::info;

use crate::models::session_keys;

pub const ROUTER_TASK_ID: &str = "route_message";

/// Signals that the user is done answering and wants the report draft.
/// Checked before the acknowledge set; "done" and "完了" appear in both.
const COMPLETION_SYNONYMS: &[&str] = &["できた", "done", "完了", "完成", "終わった"];

/// Acknowledge/start signals ("the PDF is uploaded, let's go").
const START_SYNONYMS: &[&str] = &["ok", "ｏｋ", "おk", "了解", "upした", "アップした", "done", "完了"];

/// Where a user turn is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    GenerateReport,
    StartWalk,
    AdvanceWalk,
    FreeForm,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::GenerateReport => "generate_report",
            Route::StartWalk => "start_walk",
            Route::AdvanceWalk => "advance_walk",
            Route::FreeForm => "free_form",
        }
    }
}

/// Question-walk position, read from the session context.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkState {
    /// Number of questions in the list
    pub total: usize,
    /// Questions asked so far; equals `total` once the walk is exhausted
    pub cursor: usize,
    /// Whether the one-time exhaustion notice has been sent
    pub closed: bool,
}

impl WalkState {
    pub async fn load(context: &Context) -> Self {
        let questions: Vec<String> = context
            .get(session_keys::QUESTIONS)
            .await
            .unwrap_or_default();
        Self {
            total: questions.len(),
            cursor: context.get(session_keys::CURSOR).await.unwrap_or(0),
            closed: context.get(session_keys::WALK_CLOSED).await.unwrap_or(false),
        }
    }
}

/// The transition table: ordered rules over the normalized user input and
/// the walk position. Rule order matters: the completion set shadows the
/// overlapping acknowledge set, and both shadow the in-walk answer rule.
pub fn decide(normalized: &str, walk: WalkState) -> Route {
    if COMPLETION_SYNONYMS.contains(&normalized) {
        return Route::GenerateReport;
    }
    if START_SYNONYMS.contains(&normalized) {
        return Route::StartWalk;
    }
    if walk.total > 0 && walk.cursor >= 1 {
        if walk.cursor < walk.total {
            return Route::AdvanceWalk;
        }
        if !walk.closed {
            // Exhausted but not yet announced: one more pass through the
            // walk handler emits the terminal notice and falls through.
            return Route::AdvanceWalk;
        }
    }
    Route::FreeForm
}

/// Entry task of every user turn: normalizes the input, consults the rule
/// table, and hands off over the matching conditional edge.
pub struct RouterTask;

#[async_trait]
impl Task for RouterTask {
    fn id(&self) -> &str {
        ROUTER_TASK_ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let input: String = context
            .get(session_keys::USER_INPUT)
            .await
            .ok_or_else(|| FlowError::ContextError("user_input not found".to_string()))?;

        let normalized = input.trim().to_lowercase();
        let walk = WalkState::load(&context).await;
        let route = decide(&normalized, walk);
        info!(route = route.as_str(), "routing user message");

        context.set(session_keys::ROUTE, route.as_str()).await;
        Ok(TaskResult::new(None, NextAction::ContinueAndExecute))
    }
}

/// Edge condition helper for the workflow wiring.
pub fn route_is(context: &Context, route: Route) -> bool {
    context
        .get_sync::<String>(session_keys::ROUTE)
        .as_deref()
        == Some(route.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(total: usize, cursor: usize, closed: bool) -> WalkState {
        WalkState { total, cursor, closed }
    }

    #[test]
    fn completion_synonyms_win_from_any_state() {
        for input in ["できた", "done", "完了", "完成", "終わった"] {
            assert_eq!(decide(input, WalkState::default()), Route::GenerateReport);
            assert_eq!(decide(input, walk(3, 2, false)), Route::GenerateReport);
        }
    }

    #[test]
    fn acknowledge_synonyms_start_the_walk() {
        for input in ["ok", "ｏｋ", "おk", "了解", "upした", "アップした"] {
            assert_eq!(decide(input, WalkState::default()), Route::StartWalk);
        }
        // Mid-walk "ok" still goes to the walk handler, not the answer path.
        assert_eq!(decide("ok", walk(3, 2, false)), Route::StartWalk);
    }

    #[test]
    fn answers_advance_the_walk() {
        assert_eq!(decide("昨日の講義が印象的でした", walk(3, 1, false)), Route::AdvanceWalk);
        assert_eq!(decide("なるほど", walk(3, 2, false)), Route::AdvanceWalk);
    }

    #[test]
    fn exhausted_walk_gets_one_terminal_pass_then_free_form() {
        assert_eq!(decide("最後の回答です", walk(3, 3, false)), Route::AdvanceWalk);
        assert_eq!(decide("他に聞きたいことがある", walk(3, 3, true)), Route::FreeForm);
    }

    #[test]
    fn no_walk_means_free_form() {
        assert_eq!(decide("こんにちは", WalkState::default()), Route::FreeForm);
        // Questions exist but the walk never started.
        assert_eq!(decide("こんにちは", walk(3, 0, false)), Route::FreeForm);
    }

    #[test]
    fn normalization_is_the_callers_job_but_case_folding_matches() {
        // The router lowercases before consulting the table.
        assert_eq!(decide(&"OK".to_lowercase(), WalkState::default()), Route::StartWalk);
        assert_eq!(decide(&"Done".to_lowercase(), WalkState::default()), Route::GenerateReport);
    }
}
