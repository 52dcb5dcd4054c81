mod common;

use std::time::Duration;
use common::{ok, ok_body, status, RecordingSleeper, ScriptedTransport};
use docchat::error::Error;
use docchat::normalize::normalize;
use docchat::request::GenerateContentRequest;
use docchat::retry::{
  classify, next_state, run_with_retry, CallOutcome, RetryPolicy,
  RetryState,
};
use docchat::transport::RawResponse;

fn request() -> GenerateContentRequest
{   docchat::prompt::build_payload(
      &docchat::Intent::Summarize { document: "hello" },
      100
    ).to_request()
}

async fn drive(
  script: Vec<Result<RawResponse, Error>>
) -> (RetryState, usize, Vec<Duration>)
{   let transport = ScriptedTransport::new(script);
    let sleeper = RecordingSleeper::new();
    let state = run_with_retry(
      &RetryPolicy::default(),
      transport.as_ref(),
      sleeper.as_ref(),
      &request(),
      Duration::from_secs(60)
    ).await;
    (state, transport.calls(), sleeper.slept())
}

#[tokio::test]
async fn rate_limited_twice_then_success()
{   let (state, calls, slept)
      = drive(vec![status(429), status(429), ok("done")]).await;
    assert_eq!(state, RetryState::Succeeded(ok_body("done")));
    assert_eq!(calls, 3);
    assert_eq!(slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
}

#[tokio::test]
async fn overloaded_until_budget_is_spent()
{   let (state, calls, slept)
      = drive(vec![status(503), status(503), status(503), ok("late")])
        .await;
    assert_eq!(state, RetryState::Failed(Error::RetriesExhausted));
    assert_eq!(calls, 3);
    // no sleep after the final attempt
    assert_eq!(slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    assert_eq!(
      normalize(state).error_text(),
      Some("Error: API request failed after all retries.")
    );
}

#[tokio::test]
async fn client_error_stops_immediately()
{   let (state, calls, slept) = drive(vec![
      Ok(RawResponse { status: 400, body: "bad request".into() })
    ]).await;
    assert_eq!(state, RetryState::Failed(Error::ApiError(400)));
    assert_eq!(calls, 1);
    assert!(slept.is_empty());

    let reply = normalize(state);
    let message = reply.error_text().unwrap();
    assert!(message.contains("400"));
    assert!(!message.contains("bad request"));
}

#[tokio::test]
async fn transport_failures_use_the_same_backoff()
{   let (state, calls, slept) = drive(vec![
      Err(Error::Timeout),
      Err(Error::HttpError("connection refused".into())),
      ok("finally")
    ]).await;
    assert!(matches!(state, RetryState::Succeeded(_)));
    assert_eq!(calls, 3);
    assert_eq!(slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
}

#[tokio::test]
async fn non_retryable_transport_error_is_terminal()
{   let (state, calls, slept) = drive(vec![
      Err(Error::MissingApiKey("GEMINI_API_KEY".into()))
    ]).await;
    assert_eq!(
      state,
      RetryState::Failed(Error::MissingApiKey("GEMINI_API_KEY".into()))
    );
    assert_eq!(calls, 1);
    assert!(slept.is_empty());
}

#[tokio::test]
async fn success_without_candidates_is_invalid_response()
{   for body in ["{\"promptFeedback\":{}}", "{\"candidates\":[]}", "not json"]
    {   let (state, calls, slept) = drive(vec![
          Ok(RawResponse { status: 200, body: body.into() })
        ]).await;
        assert_eq!(state, RetryState::Failed(Error::InvalidResponse));
        assert_eq!(calls, 1);
        assert!(slept.is_empty());
        assert_eq!(
          normalize(state).error_text(),
          Some("Error: Invalid response from API.")
        );
    }
}

#[test]
fn candidate_without_parts_normalizes_to_invalid_response()
{   let body = r#"{"candidates":[{"content":{"parts":[]}}]}"#;
    let state = next_state(
      &RetryPolicy::default(),
      1,
      Duration::from_secs(1),
      CallOutcome::Success(body.to_string())
    );
    assert_eq!(state, RetryState::Succeeded(body.to_string()));

    let reply = normalize(state);
    assert!(!reply.is_ok());
    assert_eq!(reply.error_text(), Some("Error: Invalid response from API."));
}

#[test]
fn classify_maps_statuses()
{   assert_eq!(classify(status(429)), CallOutcome::RateLimited);
    assert_eq!(classify(status(503)), CallOutcome::ServerOverloaded);
    assert_eq!(
      classify(status(500)),
      CallOutcome::ClientError(500, "status 500".into())
    );
    assert_eq!(
      classify(ok("x")),
      CallOutcome::Success(ok_body("x"))
    );
    assert_eq!(
      classify(Err(Error::Timeout)),
      CallOutcome::TransportFailure(Error::Timeout)
    );
}

#[test]
fn next_state_backs_off_only_with_attempts_left()
{   let policy = RetryPolicy::default();
    let delay = Duration::from_secs(2);

    assert_eq!(
      next_state(&policy, 2, delay, CallOutcome::RateLimited),
      RetryState::Backoff { attempt: 2, delay }
    );
    assert_eq!(
      next_state(&policy, 3, delay, CallOutcome::ServerOverloaded),
      RetryState::Failed(Error::RetriesExhausted)
    );
    assert_eq!(
      next_state(
        &policy, 1, delay,
        CallOutcome::ClientError(404, String::new())
      ),
      RetryState::Failed(Error::ApiError(404))
    );
}

#[test]
fn backoff_doubles()
{   let policy = RetryPolicy::default();
    let first = RetryState::initial(&policy);
    assert_eq!(
      first,
      RetryState::Attempting { attempt: 1, delay: Duration::from_secs(1) }
    );
    assert_eq!(
      policy.next_backoff(Duration::from_secs(4)),
      Duration::from_secs(8)
    );
    assert!(!first.is_terminal());
    assert!(RetryState::Failed(Error::Timeout).is_terminal());
}

#[test]
fn backoff_saturates_instead_of_overflowing()
{   let policy = RetryPolicy::new(3, 1e20, 1000);
    assert_eq!(
      policy.next_backoff(Duration::from_secs(1)),
      policy.max_backoff
    );
    assert_eq!(
      RetryPolicy::new(3, f32::NAN, 1000)
        .next_backoff(Duration::from_secs(1)),
      Duration::from_millis(docchat::retry::DEFAULT_MAX_BACKOFF_MS)
    );

    let capped = RetryPolicy::new(5, 2.0, 1000).with_max_backoff(3000);
    assert_eq!(
      capped.next_backoff(Duration::from_secs(2)),
      Duration::from_secs(3)
    );
}

#[tokio::test]
async fn huge_multiplier_still_reaches_a_terminal_state()
{   let transport = ScriptedTransport::new(
      vec![status(429), status(429), ok("done")]
    );
    let sleeper = RecordingSleeper::new();
    let policy = RetryPolicy::new(3, 1e20, 1000);
    let state = run_with_retry(
      &policy,
      transport.as_ref(),
      sleeper.as_ref(),
      &request(),
      Duration::from_secs(60)
    ).await;
    assert!(matches!(state, RetryState::Succeeded(_)));
    assert_eq!(
      sleeper.slept(),
      vec![Duration::from_secs(1), policy.max_backoff]
    );
}

#[test]
fn every_terminal_reply_has_exactly_one_side()
{   let states = vec![
      RetryState::Succeeded(ok_body("a"))
    , RetryState::Succeeded("{}".into())
    , RetryState::Failed(Error::RetriesExhausted)
    , RetryState::Failed(Error::ApiError(418))
    , RetryState::Attempting { attempt: 1, delay: Duration::ZERO }
    ];
    for state in states
    {   let reply = normalize(state);
        assert!(reply.answer_text().is_some() ^ reply.error_text().is_some());
    }
}
