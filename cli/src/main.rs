mod args;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use args::{Cli, Command};
use clap::Parser;
use explorer_core::format::{format_bytes, pretty_body, StatusClass};
use explorer_core::{
    cancel_pair, Dispatcher, HistoryBackend, MemoryHistory, NotificationLevel, RemoteHistory,
    ReqwestTransport, SessionController, SessionPhase,
};
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

type Session = SessionController<ReqwestTransport, Arc<dyn HistoryBackend>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let transport = match cli.timeout {
        Some(secs) => ReqwestTransport::with_timeout(Duration::from_secs(secs))
            .context("failed to build HTTP client")?,
        None => ReqwestTransport::new(),
    };
    let remote = |url: &str| -> Arc<dyn HistoryBackend> {
        Arc::new(RemoteHistory::new(url, transport.clone()))
    };

    match &cli.command {
        Command::Send(args) => {
            let history: Arc<dyn HistoryBackend> = match &cli.history_url {
                Some(url) => remote(url),
                None => {
                    debug!("no history URL configured, history is not kept");
                    Arc::new(MemoryHistory::new())
                }
            };
            let mut session = SessionController::new(Dispatcher::new(transport.clone()), history)
                .with_draft(args.clone().into_spec());
            send(&mut session, cli.verbose).await
        }
        Command::History => {
            let history = remote(cli.require_history_url("history")?);
            let mut session = SessionController::new(Dispatcher::new(transport.clone()), history);
            let entries = session.history().await;
            let failed = print_notifications(&mut session);
            for entry in entries {
                let status = entry
                    .response_summary
                    .and_then(|s| s.status)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {}  {:<7} {}  {}",
                    entry.id, entry.timestamp, entry.request.method, entry.request.url, status
                );
            }
            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Replay { id } => {
            let history = remote(cli.require_history_url("replay")?);
            let mut session = SessionController::new(Dispatcher::new(transport.clone()), history);
            let entries = session.history().await;
            if print_notifications(&mut session) {
                return Ok(ExitCode::FAILURE);
            }
            let entry = entries
                .iter()
                .find(|e| &e.id == id)
                .ok_or_else(|| anyhow!("no history entry with id {id}"))?;
            session.load_history_item(entry);
            print_notifications(&mut session);
            send(&mut session, cli.verbose).await
        }
    }
}

async fn send(session: &mut Session, verbose: bool) -> Result<ExitCode> {
    let (handle, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    if verbose {
        let draft = session.draft();
        eprintln!("> {} {}", draft.method, draft.url);
    }

    let outcome = session.send_with(&token).await;
    print_notifications(session);

    if let Some(envelope) = session.response() {
        if let Some(status) = envelope.status {
            let marker = if StatusClass::of(envelope.status).is_error() {
                " (error)"
            } else {
                ""
            };
            eprintln!(
                "> status: {status} {}{marker}",
                envelope.status_text.as_deref().unwrap_or_default()
            );
        }
        if let Some(size) = envelope.size {
            eprintln!("> size: {}", format_bytes(size, 2));
        }
        if let Some(time) = envelope.time {
            eprintln!("> time: {time} ms");
        }
        if verbose {
            for (name, value) in envelope.headers.iter().flatten() {
                eprintln!("> {name}: {value}");
            }
        }
        if let Some(body) = pretty_body(envelope) {
            println!("{body}");
        }
    }

    Ok(match outcome.phase {
        SessionPhase::Succeeded => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Prints queued notifications; true when any of them was an error.
fn print_notifications(session: &mut Session) -> bool {
    let mut failed = false;
    for note in session.take_notifications() {
        let level = match note.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Error => {
                failed = true;
                "error"
            }
        };
        eprintln!("[{level}] {}: {}", note.title, note.description);
    }
    failed
}

/// Logs go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
