pub mod timestamps;
pub mod tool_result;

pub use tool_result::{extract_error, has_error, normalize, ContentChunk, RawResult, ToolResponse};
