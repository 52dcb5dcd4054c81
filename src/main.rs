use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use log::{debug, error};

use docchat::document::{MemoryStore, TextExtractor};
use docchat::{Config, DocumentClient, DocumentService, Reply};

/// Session id for documents ingested from the command line
const CLI_SESSION: &str = "cli";

/// Summarize a document or ask questions about it with Gemini
#[derive(Debug, Parser)]
#[command(name = "docchat", version)]
struct Cli
{   /// JSON config file; defaults plus environment otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>

  , #[command(subcommand)]
    command: Command
}

#[derive(Debug, Subcommand)]
enum Command
{   /// Upload a document and print its summary
    Summarize
    {   file: PathBuf
    }
  , /// Ask a question about a document
    Ask
    {   file: PathBuf
      , question: String
    }
  , /// Check connectivity and the API key
    Ping
}

#[tokio::main]
async fn main() -> ExitCode
{   dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await
    {   Ok(reply) => match reply.into_result()
        {   Ok(text) => {
              println!("{}", text);
              ExitCode::SUCCESS
            }
          , Err(message) => {
              eprintln!("{}", message);
              ExitCode::FAILURE
            }
        }
      , Err(e) => {
          error!("{}", e);
          eprintln!("{}", e);
          ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Reply, docchat::Error>
{   let config = match &cli.config
    {   Some(path) => Config::from_file(path)?
      , None => Config::from_env()
    };
    config.validate()?;
    debug!("Effective config: {:?}", config);

    let client = DocumentClient::new(Arc::new(config));
    let service = DocumentService::new(
      client.clone(),
      Arc::new(TextExtractor),
      Arc::new(MemoryStore::new())
    );
    match cli.command
    {   Command::Summarize { file } => {
          let (name, bytes) = read_upload(&file)?;
          let upload = service.upload(CLI_SESSION, &name, &bytes).await?;
          Ok(upload.reply)
        }
      , Command::Ask { file, question } => {
          let (name, bytes) = read_upload(&file)?;
          service.ingest(CLI_SESSION, &name, &bytes).await?;
          service.ask(CLI_SESSION, &question).await
        }
      , Command::Ping => Ok(client.self_test().await)
    }
}

fn read_upload(path: &Path) -> Result<(String, Vec<u8>), docchat::Error>
{   let name = path.file_name()
      .and_then(|n| n.to_str())
      .unwrap_or_default()
      .to_string();
    let bytes = std::fs::read(path)
      .map_err(|e| {
        docchat::Error::Other(
          format!("cannot read {}: {}", path.display(), e)
        )
      })?;
    Ok((name, bytes))
}
