//! medrag-chat - Terminal Chat for the Medical RAG Backend
//!
//! Interactive REPL on top of `medrag-conductor`. Questions stream back with
//! their source documents; slash commands switch mode and manage history.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session against the default backend (http://localhost:3001)
//! medrag-chat
//!
//! # Agent mode against another backend
//! medrag-chat --mode agent --backend-url http://rag.internal:3001
//!
//! # One question, then exit
//! medrag-chat --query "당뇨병의 증상은 무엇인가요?"
//!
//! # Verbose logging (to stderr)
//! RUST_LOG=debug medrag-chat
//! ```
//!
//! # Signals
//!
//! - `SIGINT` (Ctrl-C): stops the answer in progress; at the prompt, exits

mod commands;
mod display;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use medrag_conductor::{
    load_config, load_config_from_path, ChatMode, ChatSession, ConfigOverrides, HttpBackend,
    SessionError, ABANDONED_MESSAGE,
};

use commands::{parse_input, Command, Input};
use display::{render_history, render_modes, status_line, TerminalRenderer};

/// medrag-chat - streaming chat client for the medical RAG backend
#[derive(Parser, Debug)]
#[command(name = "medrag-chat")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Backend base URL (overrides config file and MEDRAG_BACKEND_URL)
    #[arg(short = 'b', long, value_name = "URL")]
    backend_url: Option<String>,

    /// Starting mode: default or agent
    #[arg(short = 'm', long, value_name = "MODE")]
    mode: Option<ChatMode>,

    /// Connection timeout in milliseconds
    #[arg(long, value_name = "MS")]
    connect_timeout_ms: Option<u64>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "MEDRAG_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ask a single question and exit
    #[arg(short = 'q', long, value_name = "TEXT")]
    query: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "MEDRAG_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

type Session = ChatSession<HttpBackend>;

/// Initialize logging with the specified level
///
/// Logs go to stderr so they never interleave with streamed answers.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("medrag_chat={level},medrag_conductor={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_flush(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Ask one question, streaming the answer to stdout
///
/// Ctrl-C abandons the exchange; the session stays usable.
async fn ask(session: &mut Session, query: &str) -> Result<()> {
    let mut renderer = TerminalRenderer::new(std::io::stdout());

    let outcome = tokio::select! {
        result = session.submit(query, &mut renderer) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(report)) => {
            if let Some(error) = &report.error {
                println!("{}", error.user_message());
            }
            info!(
                chunks = report.chunk_count,
                elapsed_ms = report.elapsed_ms,
                "Answer finished"
            );
        }
        Some(Err(SessionError::EmptyQuery)) => {}
        Some(Err(e)) => println!("{e}"),
        None => {
            session.abandon();
            renderer.interrupted(ABANDONED_MESSAGE)?;
        }
    }
    Ok(())
}

/// Handle a slash command; returns `false` when the REPL should exit
async fn run_command(session: &mut Session, command: Command) -> Result<bool> {
    let backend_url = session.backend().base_url().to_string();
    match command {
        Command::Mode(None) => print!("{}", render_modes(session.mode())),
        Command::Mode(Some(mode)) => {
            session.set_mode(mode);
            println!("Mode: {}\n    {}", mode.label(), mode.description());
        }
        Command::Clear => {
            session.clear();
            println!("Chat history cleared.");
        }
        Command::History => print!("{}", render_history(session.history())),
        Command::Status => {
            println!("{}", status_line(session.mode(), &backend_url, session.message_count()));
        }
        Command::Health => {
            if session.health_check().await {
                println!("Backend {backend_url} is healthy.");
            } else {
                println!("Backend {backend_url} is not reachable.");
            }
        }
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

async fn repl(session: &mut Session) -> Result<()> {
    println!("🏥 Medical RAG Chat");
    println!(
        "{}",
        status_line(
            session.mode(),
            session.backend().base_url(),
            session.message_count()
        )
    );
    println!("Type a question, or /help for commands.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_flush("> ")?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match parse_input(&line) {
            Ok(Input::Empty) => {}
            Ok(Input::Query(query)) => ask(session, &query).await?,
            Ok(Input::Command(command)) => {
                if !run_command(session, command).await? {
                    break;
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match args.config {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    overrides.backend_url = args.backend_url;
    overrides.default_mode = args.mode;
    overrides.connect_timeout_ms = args.connect_timeout_ms;
    overrides
        .apply(&mut config)
        .context("Invalid command-line option")?;

    info!(
        backend = %config.backend_url,
        mode = ?config.default_mode,
        source = %config.source(),
        "Configuration loaded"
    );

    let backend = HttpBackend::from_config(&config).context("Failed to build HTTP client")?;
    let mut session = ChatSession::new(Arc::new(backend), config.default_mode);

    if !session.health_check().await {
        warn!(backend = %config.backend_url, "Backend health check failed");
        eprintln!(
            "⚠️ Backend {} is not responding; questions will fail until it is up.",
            config.backend_url
        );
    }

    if let Some(query) = args.query {
        return ask(&mut session, &query).await;
    }

    repl(&mut session).await
}
