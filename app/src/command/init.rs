use logrelay_config::Config;

/// Strategy for writing the config template to `~/logrelay/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let path = Config::create_config()?;
        println!("Created config at {}", path.display());
        println!("Set provider.api_key (or export GEMINI_API_KEY) before running other commands.");
        Ok(())
    }
}
