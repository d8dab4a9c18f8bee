use std::sync::Arc;

use async_trait::async_trait;
use dialog_flow::{ChatMessage, Context, FlowError, NextAction, Result, Task, TaskResult};
use tracing::info;

use crate::config::QuestionSource;
use crate::extract::{DEFAULT_MAX_QUESTIONS, clean_generated_line, extract_questions};
use crate::llm::{ChatClient, ChatRequest};
use crate::models::{TrainingDocument, session_keys};

use super::router::ROUTER_TASK_ID;

pub const START_WALK_TASK_ID: &str = "start_question_walk";

/// How many reflective questions to ask the model for.
const GENERATED_QUESTION_COUNT: usize = 3;

const UPLOAD_REMINDER: &str =
    "まだPDFが読み込まれていないようです。先に研修ドキュメント（PDF）をアップしてください。";

const NO_QUESTIONS_FALLBACK: &str =
    "資料から問いを作れませんでした。まずは**感想を気軽に書いてください😉**";

pub const WALK_INTRO_LINE: &str = "じゃあ今回の研修を振り返っていきましょう！\n";

pub const ANSWER_INVITATION: &str = "\n\n自由に書いてください。";

const GENERATE_QUESTIONS_SYSTEM: &str = "あなたは“研修のふり返り”を促す専門家です。\
以下の資料抜粋をざっくり把握し、学習者が答えやすい自然な問いを日本語で短く3～4文（1文=1問い）作ってください。\
・『Q1.』などの番号や記号は付けない\n\
・1行1問い、簡潔、具体\n\
・最初は感想→次に学び→最後に現場での適用/次の一歩、の順が望ましい";

/// Handles the acknowledge signal: populates the question list on first
/// use (one strategy per session, never mixed) and emits the next unasked
/// question, prefixed with the intro line only on the very first one.
pub struct StartQuestionWalkTask {
    client: Arc<dyn ChatClient>,
    source: QuestionSource,
}

impl StartQuestionWalkTask {
    pub fn new(client: Arc<dyn ChatClient>, source: QuestionSource) -> Self {
        Self { client, source }
    }

    async fn populate_questions(&self, document: &TrainingDocument) -> Result<Vec<String>> {
        let questions = match self.source {
            QuestionSource::Markers => {
                extract_questions(&document.text, DEFAULT_MAX_QUESTIONS)
            }
            QuestionSource::Llm => self
                .generate_questions(&document.text, GENERATED_QUESTION_COUNT)
                .await
                .map_err(|e| FlowError::TaskExecutionFailed(e.to_string()))?,
        };
        info!(count = questions.len(), source = ?self.source, "populated question list");
        Ok(questions)
    }

    async fn generate_questions(&self, text: &str, n: usize) -> anyhow::Result<Vec<String>> {
        let snippet = bounded_snippet(text);
        let request = ChatRequest {
            system: Some(GENERATE_QUESTIONS_SYSTEM.to_string()),
            messages: vec![ChatMessage::user(format!(
                "【資料抜粋】\n{}\n\n出力：箇条書き（- で始める）。{}個。",
                snippet, n
            ))],
            temperature: Some(0.3),
        };
        let response = self.client.complete(request).await?;

        let mut questions = Vec::new();
        for line in response.lines() {
            let question = clean_generated_line(line);
            if question.is_empty() {
                continue;
            }
            questions.push(question);
            if questions.len() >= n {
                break;
            }
        }
        Ok(questions)
    }
}

#[async_trait]
impl Task for StartQuestionWalkTask {
    fn id(&self) -> &str {
        START_WALK_TASK_ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let document: Option<TrainingDocument> = context.get(session_keys::DOCUMENT).await;
        let Some(document) = document.filter(|d| d.has_text()) else {
            context.add_assistant_message(UPLOAD_REMINDER).await;
            return Ok(TaskResult::new(
                Some(UPLOAD_REMINDER.to_string()),
                NextAction::GoTo(ROUTER_TASK_ID.to_string()),
            ));
        };

        let mut questions: Vec<String> = context
            .get(session_keys::QUESTIONS)
            .await
            .unwrap_or_default();
        if questions.is_empty() {
            questions = self.populate_questions(&document).await?;
            context.set(session_keys::QUESTIONS, &questions).await;
            context.set(session_keys::CURSOR, 0usize).await;
            context.set(session_keys::WALK_CLOSED, false).await;
        }

        let cursor: usize = context.get(session_keys::CURSOR).await.unwrap_or(0);
        if cursor >= questions.len() {
            // Nothing (left) to ask — invite free-form reflection instead.
            context.add_assistant_message(NO_QUESTIONS_FALLBACK).await;
            return Ok(TaskResult::new(
                Some(NO_QUESTIONS_FALLBACK.to_string()),
                NextAction::GoTo(ROUTER_TASK_ID.to_string()),
            ));
        }

        let intro = if cursor == 0 { WALK_INTRO_LINE } else { "" };
        let message = format!("{}{}{}", intro, questions[cursor], ANSWER_INVITATION);
        context.set(session_keys::CURSOR, cursor + 1).await;
        context.add_assistant_message(&message).await;

        Ok(TaskResult::new_with_status(
            Some(message),
            NextAction::GoTo(ROUTER_TASK_ID.to_string()),
            Some(format!("質問 {}/{}", cursor + 1, questions.len())),
        ))
    }
}

/// Head/tail excerpt used when a document is too large to hand to the
/// model whole: over 9000 characters, keep the first 6000 and the last
/// 2500 around an ellipsis line.
fn bounded_snippet(text: &str) -> String {
    let trimmed = text.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 9000 {
        return trimmed.to_string();
    }
    let head: String = chars[..6000].iter().collect();
    let tail: String = chars[chars.len() - 2500..].iter().collect();
    format!("{}\n...\n{}", head, tail)
}
