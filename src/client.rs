use std::sync::Arc;
use log::{debug, error};

use crate::config::{Config, API_KEY_VAR};
use crate::prompt::{build_payload, PromptPayload};
use crate::request::GenerationConfig;
use crate::retry::{run_with_retry, RetryPolicy, Sleeper, TokioSleeper};
use crate::transport::Transport;
use crate::{Intent, Reply};

const SELF_TEST_PROMPT: &str = "Reply with the single word OK.";

/// Orchestrates prompt building, retries and normalization.
///
/// Every call runs inline on the caller's task: no background worker,
/// and the only suspension points are the network call and the backoff
/// sleep. Cheap to share; all state is read-only.
#[derive(Clone)]
pub struct DocumentClient
{   config: Arc<Config>
  , policy: RetryPolicy
  , transport: Arc<dyn Transport>
  , sleeper: Arc<dyn Sleeper>
}

impl DocumentClient
{   /// Client talking to the configured Gemini endpoint
    pub fn new(config: Arc<Config>) -> Self
    {   let transport = Arc::new(
          crate::providers::GeminiTransport::new(config.clone())
        );
        DocumentClient::with_parts(
          config,
          transport,
          Arc::new(TokioSleeper)
        )
    }

    /// Client with substituted transport and sleeper
    pub fn with_parts(
      config: Arc<Config>
    , transport: Arc<dyn Transport>
    , sleeper: Arc<dyn Sleeper>
    ) -> Self
    {   debug!("Creating DocumentClient: {:?}", config);
        let policy = RetryPolicy::from(&config.retry);
        DocumentClient
        {   config
          , policy
          , transport
          , sleeper
        }
    }

    pub fn config(&self) -> &Config
    {   &self.config
    }

    /// Summarize document text
    pub async fn summarize(&self, document: &str) -> Reply
    {   debug!("summarize: {} chars", document.chars().count());
        self.run(Intent::Summarize { document }).await
    }

    /// Answer a question from document text only
    pub async fn answer(&self, question: &str, document: &str) -> Reply
    {   debug!(
          "answer: question {} chars, document {} chars",
          question.chars().count(),
          document.chars().count()
        );
        self.run(Intent::AnswerQuestion { question, document }).await
    }

    /// One short request, single attempt, short timeout
    pub async fn self_test(&self) -> Reply
    {   if let Some(reply) = self.missing_key_reply()
        {   return reply;
        }
        let payload = PromptPayload
        {   instruction: SELF_TEST_PROMPT.to_string()
          , generation_config: GenerationConfig
            {   temperature: 0.0
              , top_k: 1
              , top_p: 1.0
              , max_output_tokens: 16
            }
        };
        let state = run_with_retry(
          &RetryPolicy::no_retry(),
          self.transport.as_ref(),
          self.sleeper.as_ref(),
          &payload.to_request(),
          self.config.self_test_timeout()
        ).await;
        crate::normalize::normalize(state)
    }

    async fn run(&self, intent: Intent<'_>) -> Reply
    {   if let Some(reply) = self.missing_key_reply()
        {   return reply;
        }
        let payload = build_payload(
          &intent,
          self.config.max_document_chars
        );
        let state = run_with_retry(
          &self.policy,
          self.transport.as_ref(),
          self.sleeper.as_ref(),
          &payload.to_request(),
          self.config.timeout()
        ).await;
        crate::normalize::normalize(state)
    }

    fn missing_key_reply(&self) -> Option<Reply>
    {   if self.config.has_api_key()
        {   None
        } else
        {   error!("{} is not set; skipping LLM call", API_KEY_VAR);
            Some(Reply::error(
              crate::error::Error::MissingApiKey(
                API_KEY_VAR.to_string()
              ).to_string()
            ))
        }
    }
}
