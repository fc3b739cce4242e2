use sre_core::error::AppError;

/// Blocking text-generation seam. Async callers run it on the blocking pool.
pub trait Llm: Send + Sync {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError>;
}

pub mod ollama_llm;
