use logrelay_conversation::generate;

use super::{emit, init_relay};

#[derive(Debug, Clone)]
pub struct GenerateInput {
    pub prompt: Option<String>,
    pub model: Option<String>,
}

/// Strategy for a single direct prompt.
///
/// Prints `{"generatedText": ...}` with the whole conversation on success, or
/// `{"error": ...}` and exits non-zero.
#[derive(Debug, Clone, Copy)]
pub struct GenerateStrategy;

impl super::CommandStrategy for GenerateStrategy {
    type Input = GenerateInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let relay = init_relay(input.model)?;
        let reply = generate(
            &relay.caller,
            &relay.conversation,
            input.prompt.as_deref(),
            &relay.config.strings,
        )
        .await;
        emit(&reply)
    }
}
