use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use futures_util::StreamExt;

use parley::config::Config;
use parley::{GenerationEvent, ParleyError, Provider, Turn, WorkerHandle};

/// Send a conversation to a Gemini-style endpoint and stream the answer.
#[derive(Debug, Parser)]
#[command(name = "parley", version)]
struct Cli {
    /// Prompt text for the new user turn.
    #[arg(required = true)]
    prompt: Vec<String>,

    /// JSON file with earlier turns (`[{"text": ..., "is_authored_by_user": ...}]`).
    #[arg(long)]
    history: Option<PathBuf>,

    /// File to inline with the prompt. Repeatable.
    #[arg(long = "attach", short = 'a')]
    attachments: Vec<PathBuf>,

    /// google-ai-studio, vertex-ai or generic.
    #[arg(long)]
    provider: Option<Provider>,

    #[arg(long)]
    model: Option<String>,

    /// Model URL without the `:generateContent` suffix.
    #[arg(long)]
    endpoint: Option<String>,

    /// Request reasoning summaries.
    #[arg(long)]
    thinking: bool,

    /// Wait for the whole answer instead of streaming it.
    #[arg(long)]
    no_stream: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(provider) = cli.provider {
        config.generation.provider = provider;
    }
    if let Some(model) = cli.model {
        config.generation.model = model;
    }
    if let Some(endpoint) = cli.endpoint {
        config.generation.endpoint_base = Some(endpoint);
    }
    config.generation.thinking |= cli.thinking;
    config.generation.streaming &= !cli.no_stream;

    let mut history: Vec<Turn> = match &cli.history {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Vec::new(),
    };
    let mut turn = Turn::user(cli.prompt.join(" "));
    turn.attachments = cli.attachments;
    history.push(turn);

    let shown = |e: ParleyError| anyhow::anyhow!(e.user_message());
    let request = config
        .request(history, config.api_key().map_err(shown)?)
        .map_err(shown)?;
    let mut handle = WorkerHandle::from_config(&config);
    let mut events = handle.submit(request).map_err(shown)?;

    let mut printed_text = 0usize;
    let mut printed_thoughts = 0usize;
    let mut stdout = std::io::stdout();

    loop {
        let event = tokio::select! {
            event = events.next() => event,
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                continue;
            }
        };

        match event {
            Some(GenerationEvent::PartialAnswer {
                text,
                thought_summary,
            }) => {
                if thought_summary.len() > printed_thoughts {
                    eprint!("{}", &thought_summary[printed_thoughts..]);
                    printed_thoughts = thought_summary.len();
                }
                if text.len() > printed_text {
                    print!("{}", &text[printed_text..]);
                    stdout.flush().ok();
                    printed_text = text.len();
                }
            }
            Some(GenerationEvent::Done) => {
                println!();
                break;
            }
            Some(GenerationEvent::Cancelled) => {
                eprintln!("\n[stopped]");
                break;
            }
            Some(GenerationEvent::Failed { kind, detail }) => {
                tracing::debug!(?kind, %detail, "generation failed");
                anyhow::bail!(kind.user_message(&detail));
            }
            None => break,
        }
    }

    Ok(())
}
