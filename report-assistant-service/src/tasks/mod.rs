pub mod advance_question;
pub mod free_form;
pub mod report;
pub mod router;
pub mod start_walk;

pub use advance_question::{ADVANCE_TASK_ID, AdvanceQuestionTask};
pub use free_form::{FREE_FORM_TASK_ID, FreeFormChatTask};
pub use report::{GenerateReportTask, REPORT_TASK_ID};
pub use router::{ROUTER_TASK_ID, Route, RouterTask, WalkState, decide, route_is};
pub use start_walk::{START_WALK_TASK_ID, StartQuestionWalkTask};
