//! LLM provider implementations

pub mod gemini;

// Re-export for convenience
pub use gemini::GeminiTransport;
