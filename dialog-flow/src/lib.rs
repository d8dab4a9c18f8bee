pub mod context;
pub mod error;
pub mod graph;
pub mod runner;
pub mod storage;
pub mod task;

// Re-export commonly used types
pub use context::{ChatMessage, ChatRole, Context};
pub use error::{FlowError, Result};
pub use graph::{ExecutionResult, ExecutionStatus, Graph, GraphBuilder};
pub use runner::FlowRunner;
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use task::{NextAction, Task, TaskResult};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoTask;

    #[async_trait]
    impl Task for EchoTask {
        fn id(&self) -> &str {
            "echo"
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            let input: String = context.get("input").await.unwrap_or_default();
            context.add_assistant_message(format!("echo: {}", input)).await;
            Ok(TaskResult::new(
                Some(format!("echo: {}", input)),
                NextAction::WaitForInput,
            ))
        }
    }

    struct RouteTask;

    #[async_trait]
    impl Task for RouteTask {
        fn id(&self) -> &str {
            "route"
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            let input: String = context.get("input").await.unwrap_or_default();
            context.set("lane", if input == "left" { "a" } else { "b" }).await;
            Ok(TaskResult::new(None, NextAction::ContinueAndExecute))
        }
    }

    struct SayTask {
        id: &'static str,
        text: &'static str,
        next: NextAction,
    }

    #[async_trait]
    impl Task for SayTask {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, _context: Context) -> Result<TaskResult> {
            Ok(TaskResult::new(Some(self.text.to_string()), self.next.clone()))
        }
    }

    fn lane_is(context: &Context, lane: &str) -> bool {
        context.get_sync::<String>("lane").as_deref() == Some(lane)
    }

    #[tokio::test]
    async fn test_single_task_turn() {
        let graph = GraphBuilder::new("test").add_task(Arc::new(EchoTask)).build();

        let mut session = Session::new_from_task("s1".to_string(), "echo");
        session.context.set("input", "hello").await;

        let result = graph.execute_session(&mut session).await.unwrap();
        assert_eq!(result.response.as_deref(), Some("echo: hello"));
        assert!(matches!(result.status, ExecutionStatus::WaitingForInput));
        assert_eq!(session.current_task_id, "echo");
    }

    #[tokio::test]
    async fn test_conditional_edges_pick_matching_lane() {
        let graph = GraphBuilder::new("test")
            .add_task(Arc::new(RouteTask))
            .add_task(Arc::new(SayTask {
                id: "a",
                text: "lane a",
                next: NextAction::GoTo("route".to_string()),
            }))
            .add_task(Arc::new(SayTask {
                id: "b",
                text: "lane b",
                next: NextAction::GoTo("route".to_string()),
            }))
            .add_conditional_edge("route", "a", |ctx| lane_is(ctx, "a"))
            .add_edge("route", "b")
            .build();

        let mut session = Session::new_from_task("s1".to_string(), "route");
        session.context.set("input", "left").await;
        let result = graph.execute_session(&mut session).await.unwrap();
        assert_eq!(result.response.as_deref(), Some("lane a"));
        // Handler parked the session back on the router.
        assert_eq!(session.current_task_id, "route");

        session.context.set("input", "right").await;
        let result = graph.execute_session(&mut session).await.unwrap();
        assert_eq!(result.response.as_deref(), Some("lane b"));
    }

    #[tokio::test]
    async fn test_chained_responses_are_merged_in_order() {
        let graph = GraphBuilder::new("test")
            .add_task(Arc::new(SayTask {
                id: "first",
                text: "that is all",
                next: NextAction::ContinueAndExecute,
            }))
            .add_task(Arc::new(SayTask {
                id: "second",
                text: "moving on",
                next: NextAction::WaitForInput,
            }))
            .add_edge("first", "second")
            .build();

        let mut session = Session::new_from_task("s1".to_string(), "first");
        let result = graph.execute_session(&mut session).await.unwrap();
        assert_eq!(result.response.as_deref(), Some("that is all\n\nmoving on"));
        assert_eq!(session.current_task_id, "second");
    }

    #[tokio::test]
    async fn test_goto_unknown_task_is_an_error() {
        let graph = GraphBuilder::new("test")
            .add_task(Arc::new(SayTask {
                id: "first",
                text: "x",
                next: NextAction::GoTo("missing".to_string()),
            }))
            .build();

        let mut session = Session::new_from_task("s1".to_string(), "first");
        let err = graph.execute_session(&mut session).await.unwrap_err();
        assert!(matches!(err, FlowError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_transcript_accumulates_in_order() {
        let context = Context::new();
        context.add_user_message("hi").await;
        context.add_assistant_message("hello").await;
        context.add_user_message("question one answer").await;

        let transcript = context.transcript().await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[1].role, ChatRole::Assistant);

        let users = context.user_messages().await;
        assert_eq!(users, vec!["hi".to_string(), "question one answer".to_string()]);
    }

    #[tokio::test]
    async fn test_session_storage_roundtrip() {
        let storage = InMemorySessionStorage::new();

        let session = Session::new_from_task("session1".to_string(), "echo");
        session.context.set("input", "kept").await;
        storage.save(session).await.unwrap();

        let loaded = storage.get("session1").await.unwrap().unwrap();
        assert_eq!(loaded.current_task_id, "echo");
        let input: String = loaded.context.get("input").await.unwrap();
        assert_eq!(input, "kept");

        storage.delete("session1").await.unwrap();
        assert!(storage.get("session1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flow_runner_persists_between_turns() {
        let graph = Arc::new(GraphBuilder::new("test").add_task(Arc::new(EchoTask)).build());
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());

        let session = Session::new_from_task("s1".to_string(), "echo");
        session.context.set("input", "one").await;
        storage.save(session).await.unwrap();

        let runner = FlowRunner::new(graph, storage.clone());
        let result = runner.run("s1").await.unwrap();
        assert_eq!(result.response.as_deref(), Some("echo: one"));

        let saved = storage.get("s1").await.unwrap().unwrap();
        assert_eq!(saved.context.transcript().await.len(), 1);

        let err = runner.run("unknown").await.unwrap_err();
        assert!(matches!(err, FlowError::SessionNotFound(_)));
    }
}
