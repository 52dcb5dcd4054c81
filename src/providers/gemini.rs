use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, trace, error};

use crate::request::GenerateContentRequest;
use crate::transport::{RawResponse, Transport};

/// reqwest-backed transport for the Gemini generateContent endpoint
pub struct GeminiTransport
{   config: Arc<crate::config::Config>
  , http_client: reqwest::Client
}

impl GeminiTransport
{   pub fn new(config: Arc<crate::config::Config>) -> Self
    {   debug!("Creating GeminiTransport for model: {}", config.model);
        GeminiTransport
        {   config
          , http_client: reqwest::Client::new()
        }
    }
}

#[async_trait]
impl Transport for GeminiTransport
{   async fn send(
      &self
    , request: &GenerateContentRequest
    , timeout: Duration
    ) -> Result<RawResponse, crate::error::Error>
    {   // Resolved per call so a missing key never reaches the network.
        let url = self.config.endpoint_url()?;

        trace!(
          "Gemini request: {} content part(s), config {:?}",
          request.contents.len(),
          request.generation_config
        );

        let response = self.http_client
          .post(url)
          .header("Content-Type", "application/json")
          .timeout(timeout)
          .json(request)
          .send()
          .await
          .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        trace!("Gemini response status: {}", status);

        let body = response.text().await
          .map_err(map_reqwest_error)?;

        Ok(RawResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> crate::error::Error
{   // reqwest embeds the URL, and with it the key, in its Display.
    let e = e.without_url();
    if e.is_timeout()
    {   error!("Gemini request timed out");
        crate::error::Error::Timeout
    } else
    {   error!("HTTP error: {}", e);
        crate::error::Error::HttpError(e.to_string())
    }
}
