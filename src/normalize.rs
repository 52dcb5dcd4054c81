//! Terminal controller state to `(answer, error)` reply

use log::{debug, error};
use crate::request::GenerateContentResponse;
use crate::retry::RetryState;
use crate::Reply;

/// Text of `candidates[0].content.parts[0]`
pub fn first_candidate_text(body: &str)
  -> Result<String, crate::error::Error>
{   let response: GenerateContentResponse = serde_json::from_str(body)
      .map_err(|e| {
        error!("Unparseable candidate body: {}", e);
        crate::error::Error::InvalidResponse
      })?;

    let candidate = response.candidates.first()
      .ok_or(crate::error::Error::InvalidResponse)?;
    if let Some(reason) = &candidate.finish_reason
    {   debug!("First candidate finish reason: {}", reason);
    }

    candidate.content.parts.first()
      .map(|p| p.text.clone())
      .ok_or_else(|| {
        error!("First candidate has no parts");
        crate::error::Error::InvalidResponse
      })
}

/// Never panics; anything unexpected becomes an error reply
pub fn normalize(state: RetryState) -> Reply
{   match state
    {   RetryState::Succeeded(body) => {
          match first_candidate_text(&body)
          {   Ok(text) => Reply::answer(text)
            , Err(e) => Reply::error(e.to_string())
          }
        }
      , RetryState::Failed(e) => Reply::error(e.to_string())
      , other => {
          error!("normalize called on non-terminal state {:?}", other);
          Reply::error(crate::error::Error::Other(
            "request did not complete".to_string()
          ).to_string())
        }
    }
}
