//! Prompt construction for the summarize and answer intents

use log::debug;
use crate::request::{GenerateContentRequest, GenerationConfig};
use crate::Intent;

pub const TRUNCATION_MARKER: &str = "\n... [Content Truncated]";

pub const SUMMARIZE_CONFIG: GenerationConfig = GenerationConfig
{   temperature: 0.5
  , top_k: 1
  , top_p: 1.0
  , max_output_tokens: 2048
};

pub const ANSWER_CONFIG: GenerationConfig = GenerationConfig
{   temperature: 0.3
  , top_k: 1
  , top_p: 1.0
  , max_output_tokens: 1024
};

/// Final instruction text plus sampling parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload
{   pub instruction: String
  , pub generation_config: GenerationConfig
}

impl PromptPayload
{   pub fn to_request(&self) -> GenerateContentRequest
    {   GenerateContentRequest::single_text(
          self.instruction.clone(),
          self.generation_config
        )
    }
}

/// Cut `text` to `max_chars` characters and append the marker.
///
/// Text within budget is returned as-is. Counting is by `char`, so the
/// cut always lands on a character boundary.
pub fn truncate_document(text: &str, max_chars: usize) -> String
{   match text.char_indices().nth(max_chars)
    {   Some((cut, _)) => {
          debug!(
            "Truncating document text at {} chars", max_chars
          );
          let mut out = String::with_capacity(
            cut + TRUNCATION_MARKER.len()
          );
          out.push_str(&text[..cut]);
          out.push_str(TRUNCATION_MARKER);
          out
        }
      , None => text.to_string()
    }
}

/// Build the payload for an intent. The question is never truncated.
pub fn build_payload(intent: &Intent<'_>, max_chars: usize)
  -> PromptPayload
{   match intent
    {   Intent::Summarize { document } => {
          let text = truncate_document(document, max_chars);
          PromptPayload
          {   instruction: format!(
                "Please provide a concise, multi-paragraph summary \
                 of the following document content:\n\n---\n\n{}",
                text
              )
            , generation_config: SUMMARIZE_CONFIG
          }
        }
      , Intent::AnswerQuestion { question, document } => {
          let text = truncate_document(document, max_chars);
          PromptPayload
          {   instruction: format!(
                "Based on the following document content, please \
                 answer this question: {}\n\nDocument content:\n---\n\
                 {}\n\nPlease provide a detailed and accurate answer \
                 based only on the information in the document. If \
                 the answer cannot be found in the document, please \
                 say so.",
                question, text
              )
            , generation_config: ANSWER_CONFIG
          }
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn short_text_is_untouched()
    {   assert_eq!(truncate_document("abc", 3), "abc");
        assert_eq!(truncate_document("", 10), "");
    }

    #[test]
    fn cut_respects_multibyte_chars()
    {   let text = "héllo wörld";
        let out = truncate_document(text, 4);
        assert_eq!(out, format!("héll{}", TRUNCATION_MARKER));
    }

    #[test]
    fn answer_prompt_keeps_question_whole()
    {   let question = "q".repeat(50);
        let payload = build_payload(
          &Intent::AnswerQuestion
          {   question: &question
            , document: "0123456789"
          },
          5
        );
        assert!(payload.instruction.contains(&question));
        assert!(payload.instruction.contains("01234\n... [Content Truncated]"));
        assert_eq!(payload.generation_config, ANSWER_CONFIG);
    }
}
