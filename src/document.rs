//! Contracts for the collaborators around the LLM layer: text
//! extraction and document/chat persistence.

use std::path::Path;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Upload formats accepted by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat
{   Pdf
  , Csv
  , Xlsx
  , Html
}

impl DocumentFormat
{   pub const ALL: [DocumentFormat; 4] = [
      DocumentFormat::Pdf
    , DocumentFormat::Csv
    , DocumentFormat::Xlsx
    , DocumentFormat::Html
    ];

    /// Case-insensitive match on the file extension
    pub fn from_filename(filename: &str) -> Option<Self>
    {   let ext = Path::new(filename)
          .extension()?
          .to_str()?
          .to_ascii_lowercase();
        DocumentFormat::ALL
          .into_iter()
          .find(|f| f.extension() == ext)
    }

    pub fn extension(&self) -> &'static str
    {   match self
        {   DocumentFormat::Pdf => "pdf"
          , DocumentFormat::Csv => "csv"
          , DocumentFormat::Xlsx => "xlsx"
          , DocumentFormat::Html => "html"
        }
    }
}

/// `.pdf, .csv, .xlsx, .html`
pub fn allowed_extensions() -> String
{   DocumentFormat::ALL
      .iter()
      .map(|f| format!(".{}", f.extension()))
      .collect::<Vec<_>>()
      .join(", ")
}

/// UTF-8, falling back to Latin-1 for anything that is not
pub fn decode_text(bytes: &[u8]) -> String
{   match std::str::from_utf8(bytes)
    {   Ok(text) => text.to_string()
      , Err(_) => bytes.iter().map(|&b| b as char).collect()
    }
}

/// Turns raw upload bytes into plain text.
///
/// `None` signals an unsupported or unreadable file.
#[async_trait]
pub trait Extractor: Send + Sync
{   async fn extract(
      &self
    , bytes: &[u8]
    , format: DocumentFormat
    ) -> Option<String>;
}

/// Extractor for formats that are already text.
///
/// CSV is decoded as-is; pdf, xlsx and html need a real parser and
/// come back as `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor
{   async fn extract(
      &self
    , bytes: &[u8]
    , format: DocumentFormat
    ) -> Option<String>
    {   match format
        {   DocumentFormat::Csv => Some(decode_text(bytes))
          , other => {
              debug!("No text extractor for .{}", other.extension());
              None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord
{   pub id: Uuid
  , pub session_id: String
  , pub filename: String
  , /// sha256 of the raw upload, hex
    pub content_hash: String
  , /// Upload size in bytes
    pub size: usize
  , pub text: String
  , pub summary: Option<String>
  , pub created_at: DateTime<Utc>
}

impl DocumentRecord
{   pub fn new(
      session_id: &str
    , filename: &str
    , bytes: &[u8]
    , text: String
    ) -> Self
    {   DocumentRecord
        {   id: Uuid::new_v4()
          , session_id: session_id.to_string()
          , filename: filename.to_string()
          , content_hash: content_hash(bytes)
          , size: bytes.len()
          , text
          , summary: None
          , created_at: Utc::now()
        }
    }
}

pub fn content_hash(bytes: &[u8]) -> String
{   let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn
{   pub id: Uuid
  , pub document_id: Uuid
  , pub question: String
  , pub answer: String
  , pub created_at: DateTime<Utc>
}

impl ChatTurn
{   pub fn new(document_id: Uuid, question: &str, answer: &str) -> Self
    {   ChatTurn
        {   id: Uuid::new_v4()
          , document_id
          , question: question.to_string()
          , answer: answer.to_string()
          , created_at: Utc::now()
        }
    }
}

/// Read/write contract for documents and chat turns
#[async_trait]
pub trait DocumentStore: Send + Sync
{   async fn save_document(&self, record: DocumentRecord)
      -> Result<(), crate::error::Error>;

    async fn update_summary(&self, id: Uuid, summary: String)
      -> Result<(), crate::error::Error>;

    async fn document(&self, id: Uuid)
      -> Result<Option<DocumentRecord>, crate::error::Error>;

    /// Most recently saved document of a session
    async fn latest_for_session(&self, session_id: &str)
      -> Result<Option<DocumentRecord>, crate::error::Error>;

    async fn save_turn(&self, turn: ChatTurn)
      -> Result<(), crate::error::Error>;

    /// Turns of a document in insertion order
    async fn turns(&self, document_id: Uuid)
      -> Result<Vec<ChatTurn>, crate::error::Error>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore
{   documents: RwLock<Vec<DocumentRecord>>
  , turns: RwLock<Vec<ChatTurn>>
}

impl MemoryStore
{   pub fn new() -> Self
    {   MemoryStore::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore
{   async fn save_document(&self, record: DocumentRecord)
      -> Result<(), crate::error::Error>
    {   debug!("Storing document {} ({})", record.id, record.filename);
        self.documents.write().push(record);
        Ok(())
    }

    async fn update_summary(&self, id: Uuid, summary: String)
      -> Result<(), crate::error::Error>
    {   let mut documents = self.documents.write();
        let record = documents.iter_mut()
          .find(|d| d.id == id)
          .ok_or_else(|| {
            crate::error::Error::Storage(
              format!("unknown document {}", id)
            )
          })?;
        record.summary = Some(summary);
        Ok(())
    }

    async fn document(&self, id: Uuid)
      -> Result<Option<DocumentRecord>, crate::error::Error>
    {   Ok(self.documents.read()
          .iter()
          .find(|d| d.id == id)
          .cloned())
    }

    async fn latest_for_session(&self, session_id: &str)
      -> Result<Option<DocumentRecord>, crate::error::Error>
    {   Ok(self.documents.read()
          .iter()
          .rev()
          .find(|d| d.session_id == session_id)
          .cloned())
    }

    async fn save_turn(&self, turn: ChatTurn)
      -> Result<(), crate::error::Error>
    {   if !self.documents.read().iter().any(|d| d.id == turn.document_id)
        {   return Err(crate::error::Error::Storage(
              format!("unknown document {}", turn.document_id)
            ));
        }
        self.turns.write().push(turn);
        Ok(())
    }

    async fn turns(&self, document_id: Uuid)
      -> Result<Vec<ChatTurn>, crate::error::Error>
    {   Ok(self.turns.read()
          .iter()
          .filter(|t| t.document_id == document_id)
          .cloned()
          .collect())
    }
}
