pub mod guardrails;
pub mod llm;
pub mod ollama;
pub mod synth;
