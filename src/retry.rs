//! Retry and exponential backoff around the transport
//!
//! The controller is an explicit state machine:
//! `Attempting -> Backoff -> Attempting -> ... -> Succeeded | Failed`.
//! [`next_state`] holds every decision and is pure; [`run_with_retry`]
//! only performs the I/O and the sleeps between states.

use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error, info, warn};

use crate::request::GenerateContentRequest;
use crate::transport::{RawResponse, Transport};

/// Retry policy for provider calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy
{   pub max_attempts: usize
  , pub backoff_multiplier: f32
  , pub initial_backoff: Duration
  , /// Ceiling for any single backoff sleep
    pub max_backoff: Duration
}

pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_attempts: usize
    , backoff_multiplier: f32
    , initial_backoff_ms: u64
    ) -> Self
    {   RetryPolicy
        {   max_attempts
          , backoff_multiplier
          , initial_backoff: Duration::from_millis(
              initial_backoff_ms
            )
          , max_backoff: Duration::from_millis(
              DEFAULT_MAX_BACKOFF_MS
            )
        }
    }

    pub fn with_max_backoff(mut self, max_backoff_ms: u64) -> Self
    {   self.max_backoff = Duration::from_millis(max_backoff_ms);
        self
    }

    /// Single attempt, used by the connectivity self-test
    pub fn no_retry() -> Self
    {   RetryPolicy::new(1, 1.0, 0)
    }

    /// Delay to use after `current` has been slept.
    ///
    /// Saturates at `max_backoff`; a product that is not a valid
    /// duration (overflow, NaN, negative) also lands on the ceiling.
    pub fn next_backoff(&self, current: Duration) -> Duration
    {   Duration::try_from_secs_f32(
          current.as_secs_f32() * self.backoff_multiplier
        )
          .unwrap_or(self.max_backoff)
          .min(self.max_backoff)
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(3, 2.0, 1000)
    }
}

impl From<&crate::config::RetryConfig> for RetryPolicy
{   fn from(config: &crate::config::RetryConfig) -> Self
    {   RetryPolicy::new(
          config.max_attempts,
          config.backoff_multiplier,
          config.initial_backoff_ms
        ).with_max_backoff(config.max_backoff_ms)
    }
}

/// Classified result of a single transport call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome
{   /// HTTP 200; body not yet validated
    Success(String)
  , RateLimited
  , ServerOverloaded
  , /// Any other status, with the body for diagnostics
    ClientError(u16, String)
  , /// The call never produced a status
    TransportFailure(crate::error::Error)
}

impl CallOutcome
{   fn kind(&self) -> &'static str
    {   match self
        {   CallOutcome::Success(_) => "success"
          , CallOutcome::RateLimited => "rate limited"
          , CallOutcome::ServerOverloaded => "server overloaded"
          , CallOutcome::ClientError(..) => "client error"
          , CallOutcome::TransportFailure(_) => "transport failure"
        }
    }
}

/// Map a transport result onto the outcome taxonomy
pub fn classify(
  result: Result<RawResponse, crate::error::Error>
) -> CallOutcome
{   match result
    {   Ok(RawResponse { status: 200, body }) => {
          CallOutcome::Success(body)
        }
      , Ok(RawResponse { status: 429, .. }) => CallOutcome::RateLimited
      , Ok(RawResponse { status: 503, .. }) => {
          CallOutcome::ServerOverloaded
        }
      , Ok(RawResponse { status, body }) => {
          CallOutcome::ClientError(status, body)
        }
      , Err(e) => CallOutcome::TransportFailure(e)
    }
}

/// Controller state
#[derive(Debug, Clone, PartialEq)]
pub enum RetryState
{   /// About to perform attempt number `attempt` (1-based)
    Attempting
    {   attempt: usize
      , delay: Duration
    }
  , /// Attempt `attempt` failed retryably; sleep `delay` next
    Backoff
    {   attempt: usize
      , delay: Duration
    }
  , /// Validated success body
    Succeeded(String)
  , Failed(crate::error::Error)
}

impl RetryState
{   pub fn initial(policy: &RetryPolicy) -> Self
    {   RetryState::Attempting
        {   attempt: 1
          , delay: policy.initial_backoff.min(policy.max_backoff)
        }
    }

    pub fn is_terminal(&self) -> bool
    {   matches!(self, RetryState::Succeeded(_) | RetryState::Failed(_))
    }
}

/// Decide what follows `outcome` of attempt number `attempt`.
///
/// `delay` is the backoff that would be slept before the next attempt.
pub fn next_state(
  policy: &RetryPolicy
, attempt: usize
, delay: Duration
, outcome: CallOutcome
) -> RetryState
{   let retry = |reason: crate::error::Error| {
      if attempt < policy.max_attempts
      {   RetryState::Backoff { attempt, delay }
      } else
      {   debug!("Retry budget spent; last cause: {}", reason);
          RetryState::Failed(crate::error::Error::RetriesExhausted)
      }
    };

    match outcome
    {   CallOutcome::Success(body) => {
          if has_candidates(&body)
          {   RetryState::Succeeded(body)
          } else
          {   error!("200 response without candidates: {}", body);
              RetryState::Failed(crate::error::Error::InvalidResponse)
          }
        }
      , CallOutcome::RateLimited => {
          retry(crate::error::Error::RateLimited)
        }
      , CallOutcome::ServerOverloaded => {
          retry(crate::error::Error::Overloaded)
        }
      , CallOutcome::ClientError(status, body) => {
          error!("API Error: {}\n{}", status, body);
          RetryState::Failed(crate::error::Error::ApiError(status))
        }
      , CallOutcome::TransportFailure(cause) => {
          if cause.is_retryable()
          {   retry(cause)
          } else
          {   RetryState::Failed(cause)
          }
        }
    }
}

fn has_candidates(body: &str) -> bool
{   serde_json::from_str::<serde_json::Value>(body)
      .ok()
      .and_then(|v| {
        v.get("candidates")
          .and_then(|c| c.as_array())
          .map(|c| !c.is_empty())
      })
      .unwrap_or(false)
}

/// Injectable delay function
#[async_trait]
pub trait Sleeper: Send + Sync
{   async fn sleep(&self, duration: Duration);
}

/// Real sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper
{   async fn sleep(&self, duration: Duration)
    {   tokio::time::sleep(duration).await;
    }
}

/// Drive the transport until a terminal state is reached
pub async fn run_with_retry(
  policy: &RetryPolicy
, transport: &dyn Transport
, sleeper: &dyn Sleeper
, request: &GenerateContentRequest
, timeout: Duration
) -> RetryState
{   let mut state = RetryState::initial(policy);
    loop
    {   state = match state
        {   RetryState::Attempting { attempt, delay } => {
              info!(
                "Attempt {}/{} to call the LLM",
                attempt, policy.max_attempts
              );
              let outcome = classify(
                transport.send(request, timeout).await
              );
              let kind = outcome.kind();
              let next = next_state(policy, attempt, delay, outcome);
              if let RetryState::Backoff { delay, .. } = &next
              {   warn!(
                    "Attempt {} got {}. Retrying in {:?}...",
                    attempt, kind, delay
                  );
              }
              next
            }
          , RetryState::Backoff { attempt, delay } => {
              sleeper.sleep(delay).await;
              RetryState::Attempting
              {   attempt: attempt + 1
                , delay: policy.next_backoff(delay)
              }
            }
          , RetryState::Succeeded(body) => {
              info!("LLM call succeeded");
              return RetryState::Succeeded(body);
            }
          , RetryState::Failed(e) => {
              error!("LLM call failed: {}", e);
              return RetryState::Failed(e);
            }
        };
    }
}
