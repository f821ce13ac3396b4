//! chatgpt-bridge -- command-line front end for the ChatGPT web backend client.
//!
//! Each invocation runs one operation:
//!   - Session refresh
//!   - Clearance pair capture
//!   - A buffered or streamed conversation turn

use std::io::Write;
use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::{Context, bail};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use chatgpt_bridge::config::Config;
use chatgpt_bridge::{ChatClient, ConversationThread, StreamOutcome};

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

enum Command {
    Session { session_token: String },
    Clearance { token: String, user_agent: String },
    Ask { access_token: String, text: String },
    Stream { access_token: String, text: String },
}

struct CliArgs {
    config_path: PathBuf,
    conversation_id: Option<String>,
    parent_id: Option<String>,
    command: Command,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut config_path = PathBuf::from("chatgpt-bridge.toml");
    let mut conversation_id = None;
    let mut parent_id = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config_path = PathBuf::from(args.next().context("--config requires a path argument")?);
            }
            "--conversation" => {
                conversation_id = Some(args.next().context("--conversation requires an id")?);
            }
            "--parent" => {
                parent_id = Some(args.next().context("--parent requires a message id")?);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("chatgpt-bridge {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => {
                bail!("Unknown argument: {flag}\nRun with --help for usage information.");
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().context("Missing command. Run with --help for usage.")?;
    let mut next = |what: &str| {
        positional
            .next()
            .with_context(|| format!("`{name}` requires {what}"))
    };

    let command = match name.as_str() {
        "session" => Command::Session {
            session_token: next("a session token")?,
        },
        "clearance" => Command::Clearance {
            token: next("a clearance token")?,
            user_agent: next("a user agent")?,
        },
        "ask" => Command::Ask {
            access_token: next("an access token")?,
            text: next("a prompt")?,
        },
        "stream" => Command::Stream {
            access_token: next("an access token")?,
            text: next("a prompt")?,
        },
        other => bail!("Unknown command: {other}\nRun with --help for usage information."),
    };

    if parent_id.is_some() && conversation_id.is_none() {
        bail!("--parent requires --conversation");
    }

    Ok(CliArgs {
        config_path,
        conversation_id,
        parent_id,
        command,
    })
}

fn print_usage() {
    println!(
        "\
chatgpt-bridge {version} -- ChatGPT web backend client

USAGE:
    chatgpt-bridge [OPTIONS] <COMMAND>

COMMANDS:
    session <SESSION_TOKEN>          Refresh a session and print the identity JSON
    clearance <TOKEN> <USER_AGENT>   Validate and store a clearance pair
    ask <ACCESS_TOKEN> <TEXT>        Send one turn and print the full answer
    stream <ACCESS_TOKEN> <TEXT>     Send one turn and print the answer as it arrives

OPTIONS:
    -c, --config <PATH>      Path to configuration file [default: chatgpt-bridge.toml]
        --conversation <ID>  Continue an existing conversation
        --parent <ID>        Message id to answer (with --conversation)
    -h, --help               Print this help message
    -V, --version            Print version information

ENVIRONMENT:
    RUST_LOG                 Override log level (e.g. RUST_LOG=debug)
    CHATGPT_BRIDGE_CONFIG    Alternative to --config flag

The clearance pair only survives between runs with `clearance.store = \"file\"`.
",
        version = env!("CARGO_PKG_VERSION")
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?
        .block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let cli = parse_args()?;

    let config_path = std::env::var("CHATGPT_BRIDGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or(cli.config_path);
    let config = Config::load(&config_path)?;

    init_tracing(&config);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "Starting chatgpt-bridge"
    );

    let client = ChatClient::from_config(&config)?;
    let thread = match (cli.conversation_id, cli.parent_id) {
        (Some(conversation), parent) => ConversationThread::resume(
            &config.backend.model,
            conversation,
            parent.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        ),
        (None, _) => ConversationThread::new(&config.backend.model),
    };

    match cli.command {
        Command::Session { session_token } => {
            let identity = client.refresh_session(&session_token).await?;
            println!("{}", serde_json::to_string_pretty(&identity)?);
        }
        Command::Clearance { token, user_agent } => {
            let clearance = client.update_clearance(&token, &user_agent).await?;
            println!("Clearance stored at {}", clearance.captured_at.to_rfc3339());
        }
        Command::Ask { access_token, text } => {
            let mut thread = thread;
            let request = thread.next_request(text);
            let response = client.conversation(&access_token, &request).await?;
            thread.record(&response)?;

            println!("{}", response.text().unwrap_or_default());
            print_thread(&thread);
        }
        Command::Stream { access_token, text } => {
            let mut thread = thread;
            let request = thread.next_request(text);
            run_stream(&client, &access_token, &request, &mut thread).await?;
        }
    }

    Ok(())
}

/// Print each frame's new text as it arrives. Ctrl+C drops the stream.
async fn run_stream(
    client: &ChatClient,
    access_token: &str,
    request: &chatgpt_bridge::ChatRequest,
    thread: &mut ConversationThread,
) -> anyhow::Result<()> {
    let mut printed = 0usize;
    let mut stdout = std::io::stdout();

    let stream = client.conversation_stream(
        access_token,
        request,
        || tracing::debug!("Stream connected"),
        |frame| {
            write_growth(&mut stdout, &mut printed, frame.text().unwrap_or_default())
                .map_err(|e| chatgpt_bridge::Error::Aborted(format!("stdout closed: {e}")))?;
            Ok(ControlFlow::Continue(()))
        },
    );

    let outcome = tokio::select! {
        outcome = stream => outcome?,
        _ = signal::ctrl_c() => {
            println!();
            tracing::info!("Interrupted, stream closed");
            return Ok(());
        }
    };
    println!();

    if let StreamOutcome::Completed(Some(last)) = outcome {
        thread.record(&last)?;
        print_thread(thread);
    }
    Ok(())
}

/// Write the part of `text` not yet printed.
///
/// Frames are cumulative; a frame shorter than what was printed restarts the
/// answer.
fn write_growth<W: Write>(out: &mut W, printed: &mut usize, text: &str) -> std::io::Result<()> {
    let fresh = text.get(*printed..).unwrap_or(text);
    out.write_all(fresh.as_bytes())?;
    out.flush()?;
    *printed = text.len();
    Ok(())
}

fn print_thread(thread: &ConversationThread) {
    eprintln!(
        "conversation: {}  parent: {}",
        thread.conversation_id().unwrap_or("-"),
        thread.parent_message_id()
    );
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

fn init_tracing(config: &Config) {
    // RUST_LOG env var takes precedence over config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        EnvFilter::new(format!("chatgpt_bridge={level},warn"))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
