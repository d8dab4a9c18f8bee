use serde::{Deserialize, Serialize};

/// Default document title when the upload has no usable filename.
pub const DEFAULT_DOC_TITLE: &str = "研修レポート";

/// The uploaded training document. Empty `text` is a valid state (scanned
/// or otherwise unreadable PDF), not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDocument {
    pub title: String,
    pub text: String,
    pub page_count: usize,
}

impl TrainingDocument {
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Character-bounded prefix of the document text. Counted in
    /// characters, not bytes; byte slicing would split UTF-8 sequences in
    /// Japanese text.
    pub fn excerpt(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub session_id: String,
    pub response: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub greeting: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub title: String,
    pub pages: usize,
    pub readable: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub current_task: String,
    pub status_message: Option<String>,
    pub document_title: Option<String>,
    pub document_pages: Option<usize>,
    pub question_count: usize,
    pub questions_asked: usize,
    pub has_report_draft: bool,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub session_id: String,
    pub report: String,
}

/// Context keys shared between the service layer and the dialog tasks.
pub mod session_keys {
    pub const USER_INPUT: &str = "user_input";
    pub const DOCUMENT: &str = "document";
    pub const QUESTIONS: &str = "questions";
    pub const CURSOR: &str = "cursor";
    pub const WALK_CLOSED: &str = "walk_closed";
    pub const ROUTE: &str = "route";
    pub const REPORT_DRAFT: &str = "report_draft";
}
