pub mod pdf;
pub mod questions;

pub use pdf::{read_pdf_text, title_from_filename};
pub use questions::{DEFAULT_MAX_QUESTIONS, clean_generated_line, extract_questions};
