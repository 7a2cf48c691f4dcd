use logrelay_config::{API_KEY_ENV, Config};

/// Strategy for displaying the effective configuration, API key masked.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== logrelay Configuration ===\n");

        println!("Provider:");
        println!("  API Key: {}", mask(&config.provider.api_key));
        if std::env::var_os(API_KEY_ENV).is_some() {
            println!("  (from {API_KEY_ENV})");
        }
        println!("  Model: {}", config.provider.model);
        println!("  Base URL: {}", config.provider.base_url);
        match config.provider.timeout_secs {
            Some(secs) => println!("  Timeout: {secs}s"),
            None => println!("  Timeout: (none)"),
        }
        println!();

        println!("Conversation:");
        println!(
            "  Context Message: {}",
            truncate(&config.conversation.context_message, 60)
        );
        println!(
            "  Max Total Length: {}",
            config.conversation.max_total_length
        );
        println!("  Contention: {:?}", config.conversation.contention);
        println!();

        println!("Retry:");
        println!("  Max Retries: {}", config.retry.max_retries);
        println!("  Initial Delay: {}ms", config.retry.initial_delay_ms);
        println!();

        println!("Ingest:");
        println!("  Batch Size: {}", config.ingest.batch_size);
        println!("  Encoding: {}", config.ingest.encoding);
        println!("  Max File Bytes: {}", config.ingest.max_file_bytes);
        println!();

        println!("Roles:");
        println!("  Context: {}", config.roles.context);
        println!("  Requester: {}", config.roles.requester);
        println!("  Responder: {}", config.roles.responder);

        Ok(())
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{head}...")
    }
}
