//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is a separate strategy type with its own input, dispatched
//! statically from `main`.

use logrelay_config::Config;
use logrelay_conversation::{Conversation, Reply, ResilientCaller};
use logrelay_providers::GeminiProvider;
use tracing::info;

mod chat;
mod generate;
mod info;
mod ingest;
mod init;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use generate::{GenerateInput, GenerateStrategy};
pub use info::InfoStrategy;
pub use ingest::{IngestInput, IngestStrategy};
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Contract for all command strategies.
///
/// Each strategy defines its own input type, so parameters are passed without
/// runtime casting or boxing.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Everything a command needs to run turns: the loaded config, a caller
/// bound to the configured provider, and a fresh conversation seeded with
/// the context message.
struct Relay {
    config: Config,
    caller: ResilientCaller<GeminiProvider>,
    conversation: Conversation,
}

fn init_relay(model: Option<String>) -> anyhow::Result<Relay> {
    let config = Config::load()?;
    info!("Loaded config from ~/logrelay/config.json");

    let model = model.unwrap_or_else(|| config.provider.model.clone());
    let mut provider = GeminiProvider::new(config.provider.api_key.clone())
        .with_base_url(config.provider.base_url.clone())
        .with_model(model)
        .with_roles(config.roles.clone())
        .with_unknown_error(config.strings.unknown_error.clone());
    if let Some(timeout) = config.provider.timeout() {
        provider = provider.with_timeout(timeout);
    }

    let caller = ResilientCaller::new(provider, config.retry.policy())
        .with_fallback_text(config.strings.no_content_generated.clone());

    let conversation = Conversation::new(
        config.conversation.max_total_length,
        &config.conversation.context_message,
    )?
    .with_contention(config.conversation.contention);
    info!(
        "Conversation {} ready (max total length {})",
        conversation.id(),
        config.conversation.max_total_length
    );

    Ok(Relay {
        config,
        caller,
        conversation,
    })
}

/// Print a reply as JSON on stdout; non-2xx replies become an error so the
/// process exits non-zero.
fn emit(reply: &Reply) -> anyhow::Result<()> {
    println!("{}", reply.to_json()?);
    if !reply.is_success() {
        anyhow::bail!("request failed with status {}", reply.status);
    }
    Ok(())
}
