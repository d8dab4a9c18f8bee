use std::sync::Arc;

use async_trait::async_trait;
use dialog_flow::{ChatMessage, Context, FlowError, NextAction, Result, Task, TaskResult};
use tracing::info;

use crate::llm::{ChatClient, ChatRequest};
use crate::models::{DEFAULT_DOC_TITLE, TrainingDocument, session_keys};

use super::router::ROUTER_TASK_ID;

pub const REPORT_TASK_ID: &str = "generate_report";

/// Grounding excerpt bound for the report prompt, in characters.
const REPORT_EXCERPT_CHARS: usize = 4000;

const REPORT_GUIDANCE: &str =
    "まずはPDFのアップロードと、いくつかの質問への回答をお願いします。";

const REPORT_SYSTEM: &str = "あなたは日本語で、簡潔で誇張のない文体の編集者です。\
事実に基づき、断定しすぎず、丁寧に書きます。";

/// Drafts the summary report from the collected answers and a bounded
/// document excerpt. Every invocation regenerates from scratch and
/// overwrites the stored draft; nothing is cached, so two successive
/// drafts may differ in content and only the format contract holds.
pub struct GenerateReportTask {
    client: Arc<dyn ChatClient>,
}

impl GenerateReportTask {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Task for GenerateReportTask {
    fn id(&self) -> &str {
        REPORT_TASK_ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let document: Option<TrainingDocument> = context.get(session_keys::DOCUMENT).await;
        let has_text = document.as_ref().is_some_and(|d| d.has_text());
        let user_messages = context.user_messages().await;

        // The only user entry at this point is the completion signal
        // itself; with no document either, there is nothing to draft from.
        if !has_text && user_messages.len() <= 1 {
            context.add_assistant_message(REPORT_GUIDANCE).await;
            return Ok(TaskResult::new(
                Some(REPORT_GUIDANCE.to_string()),
                NextAction::GoTo(ROUTER_TASK_ID.to_string()),
            ));
        }

        let title = document
            .as_ref()
            .map(|d| d.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_DOC_TITLE.to_string());
        let excerpt = document
            .as_ref()
            .map(|d| d.excerpt(REPORT_EXCERPT_CHARS))
            .unwrap_or_default();
        let answers = user_messages.join("\n");

        let request = ChatRequest {
            system: Some(REPORT_SYSTEM.to_string()),
            messages: vec![ChatMessage::user(build_report_prompt(
                &title, &excerpt, &answers,
            ))],
            temperature: Some(0.2),
        };

        let body = self
            .client
            .complete(request)
            .await
            .map_err(|e| FlowError::TaskExecutionFailed(e.to_string()))?;

        let draft = ensure_title(&title, body.trim());
        context.set(session_keys::REPORT_DRAFT, &draft).await;
        context.add_assistant_message(&draft).await;
        info!(chars = draft.chars().count(), "report draft generated");

        Ok(TaskResult::new_with_status(
            Some(draft),
            NextAction::GoTo(ROUTER_TASK_ID.to_string()),
            Some("レポートドラフト作成済み".to_string()),
        ))
    }
}

fn build_report_prompt(title: &str, excerpt: &str, answers: &str) -> String {
    format!(
        "次の情報（PDF抜粋と受講生の回答）だけを根拠に、短い感想文を作ってください。\n\
- 出力フォーマットは厳守：最初の行に【{}】、空行1つ、次の行から本文のみ。\n\
- 本文は300〜450文字程度。比喩や煽りは使わず、断定しすぎない表現（〜と感じた／〜に気づいた等）を用いる。\n\
- 事実にない内容は書かない。推測・決めつけ・一般化のしすぎを避ける。\n\
- 箇条書きにしない。小見出し（はじめに 等）は付けない。\n\
- 「です・ます」調で統一。末尾に注記や指示文を入れない。\n\
\n\
[PDF抜粋]\n{}\n\n[受講生の回答]\n{}",
        title, excerpt, answers
    )
}

/// The draft must open with a bracket-wrapped title line. If the model
/// already produced one it is kept verbatim; otherwise the document title
/// is prepended in the required format.
fn ensure_title(title: &str, body: &str) -> String {
    let first_line = body.lines().next().unwrap_or_default();
    if first_line.starts_with('【') && first_line.contains('】') {
        return body.to_string();
    }
    format!("【{}】\n\n{}", title, body)
}
