//! Interactive conversation on stdin/stdout.
//!
//! Every line is a prompt against one in-process conversation. Lines starting
//! with `/` are local commands:
//! - `/ingest <path>` feeds a log file into the conversation
//! - `/stats` prints the conversation's size and evictions
//! - `/history` prints every message in context

use std::io::Write;
use std::path::Path;

use logrelay_conversation::Reply;
use logrelay_ingest::ingest_file;
use tracing::info;

use super::{Relay, init_relay};

#[derive(Debug, Clone)]
pub struct ChatInput {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let relay = init_relay(input.model)?;

        println!("=== Conversation {} ===", relay.conversation.id());
        println!("Type '/ingest <path>', '/stats', '/history', or 'exit' to end the session.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if std::io::stdin().read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();

            if matches!(line, "exit" | "quit" | "q") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            if let Some(path) = line.strip_prefix("/ingest ") {
                ingest(&relay, Path::new(path.trim())).await;
            } else if line == "/stats" {
                let stats = relay.conversation.stats().await;
                println!(
                    "\n{} messages, {}/{} chars, {} evicted\n",
                    stats.messages, stats.total_length, stats.max_total_length, stats.evicted
                );
            } else if line == "/history" {
                for message in relay.conversation.snapshot().await {
                    println!("[{}] {}", message.index, message.text);
                }
                println!();
            } else {
                turn(&relay, line).await;
            }
        }

        let stats = relay.conversation.stats().await;
        info!("Conversation ended: {} messages in context", stats.messages);
        Ok(())
    }
}

async fn turn(relay: &Relay, prompt: &str) {
    match relay.caller.call(&relay.conversation, prompt).await {
        Ok(snapshot) => {
            if let Some(response) = snapshot.last() {
                println!("\n{}\n", response.text);
            }
        }
        Err(err) => print_failure(&Reply::generate_failure(&err, &relay.config.strings)),
    }
}

async fn ingest(relay: &Relay, path: &Path) {
    match ingest_file(path, &relay.config.ingest, &relay.caller, &relay.conversation).await {
        Ok(outcome) => println!(
            "\n{} ({} lines in {} batches)\n",
            relay.config.strings.ingest_succeeded, outcome.report.lines, outcome.report.batches
        ),
        Err(err) => print_failure(&Reply::ingest_failure(&err, &relay.config.strings)),
    }
}

fn print_failure(reply: &Reply) {
    match reply.to_json() {
        Ok(json) => eprintln!("Error ({}): {json}", reply.status),
        Err(e) => eprintln!("Error ({}): {e}", reply.status),
    }
}
