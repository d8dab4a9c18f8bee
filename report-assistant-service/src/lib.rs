pub mod config;
pub mod extract;
pub mod llm;
pub mod models;
pub mod service;
pub mod tasks;
pub mod workflow;

pub use config::{QuestionSource, ServiceConfig};
pub use models::*;
pub use service::{AppState, create_app};
pub use workflow::{build_report_workflow, create_flow_runner, create_report_session};
