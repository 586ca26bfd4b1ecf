pub mod json;
pub mod markdown;

pub use json::to_json;
pub use markdown::{assemble_document, render_header, suggested_filename};
