#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, CommandStrategy, GenerateInput, GenerateStrategy, IngestInput,
    IngestStrategy, InfoStrategy, InitStrategy, VersionStrategy,
};
use logrelay_ingest::TextEncoding;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "logrelay")]
#[command(about = "Conversational relay to a generative model, with log file ingestion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the reply as JSON
    Generate {
        /// Prompt text
        #[arg(short = 'p', long)]
        prompt: Option<String>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Feed a log file to the model in batches of lines
    Ingest {
        /// File to ingest
        path: PathBuf,

        /// Lines per batch
        #[arg(short = 'b', long)]
        batch_size: Option<usize>,

        /// Text encoding of the file (utf-8 or utf-16le)
        #[arg(short = 'e', long)]
        encoding: Option<TextEncoding>,

        /// Prompt to send once the file has been ingested
        #[arg(short = 'p', long)]
        prompt: Option<String>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Interactive conversation
    Chat {
        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Show configuration
    Info,
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only replies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { prompt, model } => {
            GenerateStrategy
                .execute(GenerateInput { prompt, model })
                .await
        }
        Commands::Ingest {
            path,
            batch_size,
            encoding,
            prompt,
            model,
        } => {
            IngestStrategy
                .execute(IngestInput {
                    path,
                    batch_size,
                    encoding,
                    prompt,
                    model,
                })
                .await
        }
        Commands::Chat { model } => ChatStrategy.execute(ChatInput { model }).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
