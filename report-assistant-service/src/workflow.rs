use std::sync::Arc;

use dialog_flow::{Context, FlowRunner, Graph, GraphBuilder, Session, SessionStorage};
use uuid::Uuid;

use crate::config::QuestionSource;
use crate::llm::ChatClient;
use crate::models::{TrainingDocument, session_keys};
use crate::tasks::{
    ADVANCE_TASK_ID, AdvanceQuestionTask, FREE_FORM_TASK_ID, FreeFormChatTask, GenerateReportTask,
    REPORT_TASK_ID, ROUTER_TASK_ID, Route, RouterTask, START_WALK_TASK_ID, StartQuestionWalkTask,
    route_is,
};

/// First transcript entry of every session.
pub const GREETING: &str = "💬 研修お疲れさまでした！\n\
まずは研修ドキュメント（PDF）をアップロードしてください。\n\
アップできたら **ok** とだけ送ってください。";

/// Wire the conversation graph. The router's conditional edges are the
/// transition table; the unconditional edge to free-form chat is the
/// catch-all, and `advance_question → free_form_chat` is the exhaustion
/// fallthrough taken within a single turn.
pub fn build_report_workflow(client: Arc<dyn ChatClient>, source: QuestionSource) -> Graph {
    GraphBuilder::new("report_assistant")
        .add_task(Arc::new(RouterTask))
        .add_task(Arc::new(GenerateReportTask::new(client.clone())))
        .add_task(Arc::new(StartQuestionWalkTask::new(client.clone(), source)))
        .add_task(Arc::new(AdvanceQuestionTask))
        .add_task(Arc::new(FreeFormChatTask::new(client)))
        .add_conditional_edge(ROUTER_TASK_ID, REPORT_TASK_ID, |ctx| {
            route_is(ctx, Route::GenerateReport)
        })
        .add_conditional_edge(ROUTER_TASK_ID, START_WALK_TASK_ID, |ctx| {
            route_is(ctx, Route::StartWalk)
        })
        .add_conditional_edge(ROUTER_TASK_ID, ADVANCE_TASK_ID, |ctx| {
            route_is(ctx, Route::AdvanceWalk)
        })
        .add_edge(ROUTER_TASK_ID, FREE_FORM_TASK_ID)
        .add_edge(ADVANCE_TASK_ID, FREE_FORM_TASK_ID)
        .build()
}

/// Create a fresh session parked on the router, with the greeting as the
/// first transcript entry.
pub async fn create_report_session() -> Session {
    let session = Session::new_from_task(Uuid::new_v4().to_string(), ROUTER_TASK_ID);
    session.context.add_assistant_message(GREETING).await;
    session
}

/// Install a freshly uploaded document: all state derived from the
/// previous document (question list, cursor, walk latch, report draft) is
/// reset; the transcript is preserved.
pub async fn install_document(context: &Context, document: TrainingDocument) {
    context.set(session_keys::DOCUMENT, document).await;
    context.remove(session_keys::QUESTIONS).await;
    context.remove(session_keys::CURSOR).await;
    context.remove(session_keys::WALK_CLOSED).await;
    context.remove(session_keys::REPORT_DRAFT).await;
}

pub fn create_flow_runner(
    storage: Arc<dyn SessionStorage>,
    client: Arc<dyn ChatClient>,
    source: QuestionSource,
) -> FlowRunner {
    let graph = Arc::new(build_report_workflow(client, source));
    FlowRunner::new(graph, storage)
}
