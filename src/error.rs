use std::fmt;

/// Custom error type for docchat operations
/// Implements Clone so terminal retry states can carry it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// API key is missing (names the env variable)
    MissingApiKey(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Provider answered 429
    RateLimited
  , /// Provider answered 503
    Overloaded
  , /// Connection, DNS or body read failure
    HttpError(String)
  , /// Per-attempt timeout elapsed
    Timeout
  , /// 200 response without a usable candidate
    InvalidResponse
  , /// Provider rejected the request with this status
    ApiError(u16)
  , /// Retry budget spent without a success
    RetriesExhausted
  , /// Upload arrived without a filename
    NoFileSelected
  , /// Extension outside the allow-list
    UnsupportedFileType(String)
  , /// Extractor produced nothing usable
    NoTextExtracted
  , /// Chat requested before any upload in the session
    NoDocument
  , /// Question is blank after trimming
    EmptyQuestion
  , /// Document store failure
    Storage(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// Whether the retry controller may try again after this error
    pub fn is_retryable(&self) -> bool
    {   matches!(
          self,
          Error::RateLimited
            | Error::Overloaded
            | Error::HttpError(_)
            | Error::Timeout
        )
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingApiKey(var) => {
              write!(f,
                "Error: {} is not set in the environment.",
                var
              )
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::RateLimited => {
              write!(f, "API rate limit exceeded")
            }
          , Error::Overloaded => {
              write!(f, "API server overloaded")
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::InvalidResponse => {
              write!(f, "Error: Invalid response from API.")
            }
          , Error::ApiError(status) => {
              write!(f,
                "API Error: {}. Check server logs.",
                status
              )
            }
          , Error::RetriesExhausted => {
              write!(f,
                "Error: API request failed after all retries."
              )
            }
          , Error::NoFileSelected => {
              write!(f,
                "No file selected. Please choose a document to upload."
              )
            }
          , Error::UnsupportedFileType(allowed) => {
              write!(f,
                "Invalid file type. Allowed types are: {}",
                allowed
              )
            }
          , Error::NoTextExtracted => {
              write!(f,
                "Could not extract any text from the file. \
                 The file might be empty, corrupted, or an \
                 unsupported format."
              )
            }
          , Error::NoDocument => {
              write!(f,
                "No document uploaded. Please upload a document first."
              )
            }
          , Error::EmptyQuestion => {
              write!(f, "Please provide a question.")
            }
          , Error::Storage(msg) => {
              write!(f, "Storage error: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
