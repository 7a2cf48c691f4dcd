use std::path::PathBuf;

use logrelay_conversation::generate;
use logrelay_ingest::{TextEncoding, ingest_reply};
use tracing::info;

use super::{emit, init_relay};

#[derive(Debug, Clone)]
pub struct IngestInput {
    pub path: PathBuf,
    /// Overrides `ingest.batch_size`
    pub batch_size: Option<usize>,
    /// Overrides `ingest.encoding`
    pub encoding: Option<TextEncoding>,
    /// Optional follow-up prompt against the ingested conversation
    pub prompt: Option<String>,
    pub model: Option<String>,
}

/// Strategy for file ingestion.
///
/// The file is fed to a fresh conversation one batch at a time. With a
/// follow-up prompt, the prompt is sent to the same conversation afterwards
/// and its reply is printed as well.
#[derive(Debug, Clone, Copy)]
pub struct IngestStrategy;

impl super::CommandStrategy for IngestStrategy {
    type Input = IngestInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let relay = init_relay(input.model)?;

        let mut options = relay.config.ingest;
        if let Some(batch_size) = input.batch_size {
            options.batch_size = batch_size;
        }
        if let Some(encoding) = input.encoding {
            options.encoding = encoding;
        }

        let reply = ingest_reply(
            &input.path,
            &options,
            &relay.caller,
            &relay.conversation,
            &relay.config.strings,
        )
        .await;
        emit(&reply)?;

        if let Some(prompt) = input.prompt {
            info!("Sending follow-up prompt");
            let reply = generate(
                &relay.caller,
                &relay.conversation,
                Some(&prompt),
                &relay.config.strings,
            )
            .await;
            emit(&reply)?;
        }

        Ok(())
    }
}
