//! Seam between the retry controller and the network

use std::time::Duration;
use async_trait::async_trait;
use crate::request::GenerateContentRequest;

/// Status and body of one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse
{   pub status: u16
  , pub body: String
}

/// Performs exactly one outbound call; never retries
#[async_trait]
pub trait Transport: Send + Sync
{   async fn send(
      &self
    , request: &GenerateContentRequest
    , timeout: Duration
    ) -> Result<RawResponse, crate::error::Error>;
}
