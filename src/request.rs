//! Wire types for the generateContent endpoint

use serde::{Deserialize, Serialize};

/// Request body: `{contents:[{parts:[{text}]}], generationConfig:{..}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest
{   pub contents: Vec<Content>
  , pub generation_config: GenerationConfig
}

impl GenerateContentRequest
{   /// Single-turn request carrying one text part
    pub fn single_text(
      text: impl Into<String>
    , generation_config: GenerationConfig
    ) -> Self
    {   GenerateContentRequest
        {   contents: vec![
              Content
              {   parts: vec![Part { text: text.into() }]
              }
            ]
          , generation_config
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content
{   pub parts: Vec<Part>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part
{   pub text: String
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub temperature: f32
  , pub top_k: u32
  , pub top_p: f32
  , pub max_output_tokens: u32
}

/// Success body; only the first candidate is ever read
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse
{   pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate
{   pub content: Content
  , #[serde(default, rename = "finishReason")]
    pub finish_reason: Option<String>
}
