pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod prompt;
pub mod transport;
pub mod retry;
pub mod normalize;
pub mod client;
pub mod document;
pub mod service;
use serde::Serialize;

/*

docchat: upload a document, get a summary from Gemini, then ask
questions about it. The LLM layer is the part with real control flow:

  caller -> prompt -> retry (drives transport) -> normalize -> caller

docchat/
├── src/
│   ├── lib.rs          # Intent / Reply and re-exports
│   ├── error.rs        # Error taxonomy and user-facing messages
│   ├── config.rs       # Endpoint, key, timeouts, retry limits
│   ├── request.rs      # generateContent wire types
│   ├── prompt.rs       # Truncation and per-intent prompts
│   ├── transport.rs    # One-call transport seam
│   ├── providers/      # reqwest transport for Gemini
│   ├── retry.rs        # Backoff state machine
│   ├── normalize.rs    # Terminal state -> Reply
│   ├── client.rs       # summarize / answer / self_test
│   ├── document.rs     # Extractor and store contracts
│   ├── service.rs      # Upload and chat flow
│   └── main.rs         # CLI
└── tests/

*/

pub use client::DocumentClient;
pub use config::Config;
pub use error::Error;
pub use service::{DocumentService, Upload};

/// DOCCHAT API INTERFACE:

/// Which LLM operation a call represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent<'a>
{   Summarize
    {   document: &'a str
    }
  , AnswerQuestion
    {   question: &'a str
      , document: &'a str
    }
}

/// Outcome handed back to callers.
///
/// Exactly one of answer and error is set; the fields stay private so
/// the constructors are the only way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply
{   #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>
}

impl Reply
{   pub fn answer(text: impl Into<String>) -> Self
    {   Reply
        {   answer: Some(text.into())
          , error: None
        }
    }

    pub fn error(message: impl Into<String>) -> Self
    {   Reply
        {   answer: None
          , error: Some(message.into())
        }
    }

    pub fn answer_text(&self) -> Option<&str>
    {   self.answer.as_deref()
    }

    pub fn error_text(&self) -> Option<&str>
    {   self.error.as_deref()
    }

    pub fn is_ok(&self) -> bool
    {   self.answer.is_some()
    }

    pub fn into_result(self) -> Result<String, String>
    {   let Reply { answer, error } = self;
        answer.ok_or_else(|| error.unwrap_or_default())
    }
}
