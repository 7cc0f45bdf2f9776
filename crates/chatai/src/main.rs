//! chatai: question/answer assistant
//!
//! Usage:
//!   chatai                 - Start interactive CLI mode
//!   chatai --ask "<q>"     - Ask one question, print the answer and exit
//!   chatai --history       - Print stored history
//!   chatai --help          - Show help

mod cli;

use std::sync::Arc;

use anyhow::{Context, bail};
use chatai_core::{ChatSession, Config, GeminiClient, HistoryStore, open_backend};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Interactive CLI mode
    Cli,
    /// One-shot question
    Ask(String),
    /// Print stored history
    History,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    mode: RunMode,
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    match args.mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("chatai {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Logs go to stderr so they never mix with answers on stdout
    let level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let config = Config::load().context("Config error")?;

    let backend = open_backend(&config.storage).context("Failed to open history storage")?;
    let store = HistoryStore::open(backend);
    tracing::info!(
        "History storage: {:?} at {} ({} records)",
        config.storage.backend,
        config.storage.effective_path().display(),
        store.len()
    );

    if args.mode == RunMode::History {
        cli::print_history(store.records());
        return Ok(());
    }

    config.validate().context("Config error")?;

    let client = GeminiClient::new(&config).context("Failed to create LLM client")?;
    tracing::info!("Model: {}", client.model());
    let session = ChatSession::new(store, Arc::new(client));

    match args.mode {
        RunMode::Ask(question) => cli::run_ask(&session, &question).await,
        _ => cli::run_cli(session).await,
    }
}

/// Parse command line arguments (without the program name)
fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut mode = RunMode::Cli;
    let mut verbose = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cli" | "-c" => mode = RunMode::Cli,
            "--ask" | "-a" => match args.next() {
                Some(question) => mode = RunMode::Ask(question),
                None => bail!("{} requires a question", arg),
            },
            "--history" => mode = RunMode::History,
            "--verbose" => verbose = true,
            "--help" | "-h" => return Ok(Args { mode: RunMode::Help, verbose }),
            "--version" | "-v" => return Ok(Args { mode: RunMode::Version, verbose }),
            other => bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(Args { mode, verbose })
}

/// Print help message
fn print_help() {
    println!("chatai - ask questions, keep an editable answer history");
    println!();
    println!("Usage:");
    println!("  chatai                  Start interactive CLI mode");
    println!("  chatai --ask \"<q>\"      Ask one question and print the answer");
    println!("  chatai --history        Print stored history");
    println!("  chatai --verbose        Log progress to stderr");
    println!("  chatai --help           Show this help message");
    println!("  chatai --version        Show version");
    println!();
    println!("Environment Variables:");
    println!("  GEMINI_API_KEY          API key (required; LLM_API_KEY also accepted)");
    println!("  LLM_MODEL               Model name (default: gemini-pro)");
    println!("  LLM_BASE_URL            Custom API endpoint");
    println!("  LLM_TIMEOUT_SECS        Request timeout in seconds (default: 120)");
    println!("  STORAGE_BACKEND         file, sqlite or memory (default: file)");
    println!("  STORAGE_PATH            History directory or database path");
    println!();
    println!("Settings may also be placed in chatai.toml in the working directory.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_default_is_cli() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.mode, RunMode::Cli);
        assert!(!args.verbose);
    }

    #[test]
    fn test_ask_takes_question() {
        let args = parse(&["--verbose", "-a", "What is Rust?"]).unwrap();
        assert_eq!(args.mode, RunMode::Ask("What is Rust?".to_string()));
        assert!(args.verbose);
    }

    #[test]
    fn test_ask_without_question_fails() {
        assert!(parse(&["--ask"]).is_err());
    }

    #[test]
    fn test_help_wins() {
        assert_eq!(parse(&["--history", "--help"]).unwrap().mode, RunMode::Help);
        assert_eq!(parse(&["-v"]).unwrap().mode, RunMode::Version);
    }

    #[test]
    fn test_unknown_argument() {
        assert!(parse(&["--serve"]).is_err());
        assert_eq!(parse(&["--history"]).unwrap().mode, RunMode::History);
    }
}
