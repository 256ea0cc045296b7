use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use toolchat::{
    ClientConfig, Conversation, ConversationLogger, HttpTransport, RunOutcome, RunOverrides,
};

#[derive(Parser, Debug)]
#[command(
    name = "toolchat",
    about = "Ask a tool-augmented model a question over an OpenAI-compatible endpoint",
    version
)]
struct Cli {
    /// The question to ask
    question: Vec<String>,

    /// Enable web browsing (forces search, then a page fetch)
    #[arg(long)]
    browse: bool,

    /// Browse without the mandated page fetch
    #[arg(long, requires = "browse")]
    search_only: bool,

    /// Fetch this URL once and inject its text before the first request
    #[arg(long, value_name = "URL")]
    prime: Option<String>,

    /// Model identifier (overrides TOOLCHAT_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Ceiling on completion requests for this run
    #[arg(long, value_name = "N")]
    max_calls: Option<u32>,

    /// Write a JSONL transcript under ./logs
    #[arg(long)]
    log: bool,

    /// Verbose request/response logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.question.is_empty() {
        bail!("no question given; try: toolchat \"what is the capital of Norway?\"");
    }

    let config = ClientConfig::from_env()?.with_verbose(cli.verbose);
    let transport = HttpTransport::new(&config);

    let mut conversation = Conversation::new(config);
    conversation.add_system_message(
        "You are a helpful assistant. Use the available tools when they help answer the question.",
    );
    conversation.add_user_message(cli.question.join(" "));

    if cli.browse {
        conversation.enable_browsing(cli.search_only)?;
    }
    if let Some(url) = cli.prime {
        conversation.set_priming_url(url);
    }
    if cli.log {
        conversation.set_logger(ConversationLogger::new(Path::new(".")).await?);
    }

    let overrides = RunOverrides {
        model: cli.model,
        call_ceiling: cli.max_calls,
        ..Default::default()
    };

    let outcome = conversation.run(&transport, overrides).await?;
    match outcome {
        RunOutcome::Answer(message) => {
            println!("\n{}", "🤖 Assistant:".bright_green().bold());
            println!("{}", message.content);
        }
        RunOutcome::Arguments(map) => {
            println!("\n{}", "📋 Captured arguments:".bright_green().bold());
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
    }

    if let Some(path) = conversation.shutdown_logger().await {
        println!("{} transcript written to {}", "📝".dimmed(), path.display());
    }

    Ok(())
}
