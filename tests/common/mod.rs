#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use docchat::error::Error;
use docchat::request::GenerateContentRequest;
use docchat::retry::Sleeper;
use docchat::transport::{RawResponse, Transport};
use docchat::{Config, DocumentClient};

/// Transport replaying a fixed script of results
pub struct ScriptedTransport
{   script: Mutex<VecDeque<Result<RawResponse, Error>>>
  , calls: AtomicUsize
  , requests: Mutex<Vec<(GenerateContentRequest, Duration)>>
}

impl ScriptedTransport
{   pub fn new(script: Vec<Result<RawResponse, Error>>) -> Arc<Self>
    {   Arc::new(ScriptedTransport
        {   script: Mutex::new(script.into())
          , calls: AtomicUsize::new(0)
          , requests: Mutex::new(vec![])
        })
    }

    pub fn calls(&self) -> usize
    {   self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(GenerateContentRequest, Duration)>
    {   self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport
{   async fn send(
      &self
    , request: &GenerateContentRequest
    , timeout: Duration
    ) -> Result<RawResponse, Error>
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((request.clone(), timeout));
        self.script.lock().pop_front()
          .unwrap_or_else(|| Err(Error::HttpError("script exhausted".into())))
    }
}

/// Records requested delays instead of sleeping
#[derive(Default)]
pub struct RecordingSleeper
{   slept: Mutex<Vec<Duration>>
}

impl RecordingSleeper
{   pub fn new() -> Arc<Self>
    {   Arc::new(RecordingSleeper::default())
    }

    pub fn slept(&self) -> Vec<Duration>
    {   self.slept.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper
{   async fn sleep(&self, duration: Duration)
    {   self.slept.lock().push(duration);
    }
}

pub fn status(code: u16) -> Result<RawResponse, Error>
{   Ok(RawResponse { status: code, body: format!("status {}", code) })
}

pub fn ok_body(text: &str) -> String
{   json!({
      "candidates": [
        { "content": { "parts": [ { "text": text } ], "role": "model" }
        , "finishReason": "STOP"
        }
      ]
    }).to_string()
}

pub fn ok(text: &str) -> Result<RawResponse, Error>
{   Ok(RawResponse { status: 200, body: ok_body(text) })
}

pub fn keyed_config() -> Config
{   Config::default().with_api_key("test-key")
}

pub fn client_with(
  config: Config
, transport: &Arc<ScriptedTransport>
, sleeper: &Arc<RecordingSleeper>
) -> DocumentClient
{   DocumentClient::with_parts(
      Arc::new(config),
      transport.clone(),
      sleeper.clone()
    )
}
