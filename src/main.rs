use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use prompt_assist_lib::agents::CliPathResolver;
use prompt_assist_lib::commands::{
    executor_from_config, parse_transcript, ChatInput, ConversationDriver, IgnoreReason,
    SendOutcome, CHAT_HELP,
};
use prompt_assist_lib::config::{
    load_merged_config, AgentBackend, PartialAgentConfig, PartialConfig,
};
use prompt_assist_lib::events::{AssistEvent, EventBroadcaster};
use prompt_assist_lib::{AgentType, AssistTarget, ConversationContext, SuggestionExtractor};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

/// Prompt Assist - conversational help for writing agent descriptions and system prompts
#[derive(Parser, Debug)]
#[command(name = "prompt-assist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ./.prompt-assist/config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Agent backend (cli or http)
    #[arg(long, global = true)]
    backend: Option<AgentBackend>,

    /// Agent CLI to run (claude, opencode, cursor, codex, qwen, droid)
    #[arg(long, global = true)]
    agent: Option<AgentType>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the best suggestion from a JSON transcript ("-" reads stdin)
    Extract {
        file: String,
    },
    /// Chat with the assistant about an agent field
    Chat(ChatArgs),
    /// Check whether the agent CLI is installed
    CheckAgent,
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// Field being authored (description or system-prompt)
    #[arg(long, default_value = "description")]
    target: AssistTarget,

    /// Name of the agent being authored
    #[arg(long)]
    name: String,

    /// Short hint about what kind of agent this is
    #[arg(long, default_value = "")]
    type_hint: String,

    /// Current value of the field, if any
    #[arg(long, default_value = "")]
    current: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = PartialConfig {
        agent: Some(PartialAgentConfig {
            backend: cli.backend,
            agent_type: cli.agent,
            ..Default::default()
        }),
        ..Default::default()
    };
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let config = load_merged_config(Some(&cwd), cli.config.as_deref(), Some(overrides))
        .context("Failed to load configuration")?;

    match cli.command {
        Command::Extract { file } => {
            let extractor = SuggestionExtractor::with_options(config.extraction.to_options());
            run_extract(&file, &extractor)
        }
        Command::Chat(args) => {
            let executor =
                executor_from_config(&config.agent).context("Failed to set up agent backend")?;
            let driver = ConversationDriver::new(executor)
                .with_extraction_options(config.extraction.to_options());
            run_chat(driver, args).await
        }
        Command::CheckAgent => {
            let availability = CliPathResolver::check_availability(config.agent.agent_type);
            println!("{}", serde_json::to_string_pretty(&availability)?);
            if !availability.available {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn run_extract(file: &str, extractor: &SuggestionExtractor) -> Result<()> {
    let raw = if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read transcript from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read transcript '{}'", file))?
    };

    let turns = parse_transcript(&raw).map_err(anyhow::Error::msg)?;
    match extractor.extract(&turns) {
        Some(suggestion) => {
            println!("{}", serde_json::to_string_pretty(&suggestion)?);
            Ok(())
        }
        None => bail!("No suggestion found in {} turns", turns.len()),
    }
}

async fn run_chat(driver: ConversationDriver, args: ChatArgs) -> Result<()> {
    let broadcaster = Arc::new(EventBroadcaster::new());
    tokio::spawn(log_events(broadcaster.subscribe()));
    let driver = driver.with_emitter(broadcaster);

    let context = ConversationContext::new(args.target, args.name)
        .with_type_hint(args.type_hint)
        .with_current_value(args.current);

    println!("Assisting with the {} (/help for commands)", args.target.display_name());
    print_outcome(driver.start(context).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ChatInput::parse(&line) {
            ChatInput::Quit => break,
            ChatInput::Help => println!("{}", CHAT_HELP),
            ChatInput::Clear => {
                driver.clear();
                println!("Conversation cleared.");
            }
            ChatInput::Suggest => match driver.suggestion() {
                Some(s) => println!("{}", serde_json::to_string_pretty(&s)?),
                None => println!("No suggestion yet."),
            },
            ChatInput::Apply => match driver.apply_suggestion() {
                Some(applied) => println!(
                    "--- {} ---\n{}",
                    applied.target.display_name(),
                    applied.value
                ),
                None => println!("No suggestion yet."),
            },
            ChatInput::Unknown(cmd) => println!("Unknown command {}. Try /help.", cmd),
            ChatInput::Message(text) => print_outcome(driver.send(&text, None).await),
        }
    }

    Ok(())
}

fn print_outcome(outcome: SendOutcome) {
    match outcome {
        SendOutcome::Replied(turn) => println!("\n{}\n", turn.content),
        SendOutcome::Failed(message) => eprintln!("Agent error: {}", message),
        SendOutcome::Ignored(IgnoreReason::Busy) => eprintln!("Still waiting for a reply."),
        SendOutcome::Ignored(IgnoreReason::EmptyMessage) | SendOutcome::Discarded => {}
    }
}

async fn log_events(mut rx: broadcast::Receiver<AssistEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => log::debug!("{} {}", event.event, event.payload),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("Event log lagged, skipped {} events", n)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
