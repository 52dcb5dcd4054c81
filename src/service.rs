//! Upload and chat flow on top of [`DocumentClient`]

use std::sync::Arc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::client::DocumentClient;
use crate::document::{
  allowed_extensions, ChatTurn, DocumentFormat, DocumentRecord,
  DocumentStore, Extractor,
};
use crate::Reply;

/// Result of an accepted upload.
///
/// The document is stored even when summarizing failed; `reply` then
/// carries the error and chat still works.
#[derive(Debug, Clone)]
pub struct Upload
{   pub document: DocumentRecord
  , pub reply: Reply
}

pub struct DocumentService
{   client: DocumentClient
  , extractor: Arc<dyn Extractor>
  , store: Arc<dyn DocumentStore>
}

impl DocumentService
{   pub fn new(
      client: DocumentClient
    , extractor: Arc<dyn Extractor>
    , store: Arc<dyn DocumentStore>
    ) -> Self
    {   DocumentService
        {   client
          , extractor
          , store
        }
    }

    /// Validate, extract and store an uploaded file without summarizing
    pub async fn ingest(
      &self
    , session_id: &str
    , filename: &str
    , bytes: &[u8]
    ) -> Result<DocumentRecord, crate::error::Error>
    {   if filename.is_empty()
        {   return Err(crate::error::Error::NoFileSelected);
        }
        let format = DocumentFormat::from_filename(filename)
          .ok_or_else(|| {
            crate::error::Error::UnsupportedFileType(allowed_extensions())
          })?;

        let text = self.extractor.extract(bytes, format).await
          .filter(|t| !t.trim().is_empty())
          .ok_or_else(|| {
            warn!("No text extracted from {}", filename);
            crate::error::Error::NoTextExtracted
          })?;
        debug!(
          "Extracted {} chars from {} ({} bytes)",
          text.chars().count(), filename, bytes.len()
        );

        let document = DocumentRecord::new(
          session_id, filename, bytes, text
        );
        self.store.save_document(document.clone()).await?;
        Ok(document)
    }

    /// Ingest an uploaded file, then summarize it
    pub async fn upload(
      &self
    , session_id: &str
    , filename: &str
    , bytes: &[u8]
    ) -> Result<Upload, crate::error::Error>
    {   let mut document = self.ingest(session_id, filename, bytes).await?;

        let reply = self.client.summarize(&document.text).await;
        if let Some(summary) = reply.answer_text()
        {   self.store
              .update_summary(document.id, summary.to_string())
              .await?;
            document.summary = Some(summary.to_string());
        }
        info!("Uploaded {} as {}", filename, document.id);

        Ok(Upload { document, reply })
    }

    /// Answer a question about the session's latest document
    pub async fn ask(
      &self
    , session_id: &str
    , question: &str
    ) -> Result<Reply, crate::error::Error>
    {   let document = self.store.latest_for_session(session_id).await?
          .ok_or(crate::error::Error::NoDocument)?;

        let question = question.trim();
        if question.is_empty()
        {   return Err(crate::error::Error::EmptyQuestion);
        }

        let reply = self.client.answer(question, &document.text).await;
        if let Some(answer) = reply.answer_text()
        {   self.store
              .save_turn(ChatTurn::new(document.id, question, answer))
              .await?;
        }
        Ok(reply)
    }

    pub async fn history(&self, document_id: Uuid)
      -> Result<Vec<ChatTurn>, crate::error::Error>
    {   self.store.turns(document_id).await
    }
}
