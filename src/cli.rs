//! Terminal front end: stdin/stdout REPL over the orchestrator.

use std::collections::HashMap;
use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::events::PipelineEvent;
use crate::pipeline::orchestrator::{Orchestrator, RejectReason, TurnOutcome};
use crate::pipeline::trace::StageStatus;
use crate::render::{render_message, render_profile, render_trace};

pub const HELP_TEXT: &str = "\
Type a homework question and press Enter.
Commands:
  /trace     show the observability trace
  /profile   show the student profile
  /history   show the conversation so far
  /help      show this help
  /quit      exit";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Trace,
    Profile,
    History,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if !trimmed.starts_with('/') {
            return Self::Ask(trimmed.to_string());
        }
        match trimmed.to_lowercase().as_str() {
            "/trace" | "/logs" => Self::Trace,
            "/profile" | "/memory" => Self::Profile,
            "/history" => Self::History,
            "/help" | "/?" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

/// Terminal output produced by one pipeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Echo {
    /// Step label, to stderr.
    Progress(String),
    /// Solution text, to stdout without a newline.
    Fragment(String),
    /// Stage failure, to stderr.
    Failure(String),
}

impl Echo {
    fn write(&self) {
        match self {
            Self::Progress(label) => eprintln!("⏳ {label}"),
            Self::Fragment(text) => {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            Self::Failure(text) => eprintln!("\n❌ {text}"),
        }
    }
}

/// Turns pipeline events into terminal output.
///
/// Streamed text is printed from `MessageUpdated.content`, past what was
/// already shown for that message, so a lagged receiver still prints every
/// character once.
#[derive(Debug, Default)]
pub struct EventPrinter {
    shown: HashMap<Uuid, usize>,
}

impl EventPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echo(&mut self, event: &PipelineEvent) -> Option<Echo> {
        match event {
            PipelineEvent::StateChanged { to, .. } if !to.is_idle() => {
                Some(Echo::Progress(to.status_label().to_string()))
            }
            PipelineEvent::MessageUpdated { id, content, .. } => {
                let shown = self.shown.entry(*id).or_insert(0);
                let unseen = content.get(*shown..).filter(|tail| !tail.is_empty())?;
                *shown = content.len();
                Some(Echo::Fragment(unseen.to_string()))
            }
            PipelineEvent::LogUpdated { entry } if entry.status == StageStatus::Error => {
                Some(Echo::Failure(format!(
                    "{} failed: {}",
                    entry.agent_name,
                    entry.output.as_deref().unwrap_or("unknown error")
                )))
            }
            _ => None,
        }
    }

    fn handle(&mut self, received: std::result::Result<PipelineEvent, RecvError>) {
        match received {
            Ok(event) => {
                if let Some(echo) = self.echo(&event) {
                    echo.write();
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged, catching up from message content");
            }
            Err(RecvError::Closed) => {}
        }
    }

    /// Print everything already queued on `rx`.
    fn drain(&mut self, rx: &mut broadcast::Receiver<PipelineEvent>) {
        loop {
            match rx.try_recv() {
                Ok(event) => self.handle(Ok(event)),
                Err(TryRecvError::Lagged(skipped)) => self.handle(Err(RecvError::Lagged(skipped))),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

/// Submit a question, printing its events as they are published. Every
/// event of the turn has been printed by the time this returns.
async fn submit_and_echo(
    orchestrator: &mut Orchestrator,
    rx: &mut broadcast::Receiver<PipelineEvent>,
    printer: &mut EventPrinter,
    question: &str,
) -> Result<TurnOutcome> {
    let outcome = {
        let turn = orchestrator.submit(question);
        tokio::pin!(turn);
        loop {
            tokio::select! {
                outcome = &mut turn => break outcome,
                received = rx.recv() => printer.handle(received),
            }
        }
    };
    printer.drain(rx);
    outcome
}

/// Run the REPL until EOF or `/quit`.
pub async fn run(mut orchestrator: Orchestrator) -> std::io::Result<()> {
    for message in orchestrator.state().transcript().messages() {
        println!("{}", render_message(message));
    }

    let mut rx = orchestrator.subscribe();
    let mut printer = EventPrinter::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => eprintln!("{HELP_TEXT}"),
            Command::Trace => eprintln!("{}", render_trace(orchestrator.state().trace().entries())),
            Command::Profile => eprintln!("{}", render_profile(orchestrator.state().profile())),
            Command::History => {
                for message in orchestrator.state().transcript().messages() {
                    println!("{}", render_message(message));
                }
            }
            Command::Unknown(cmd) => eprintln!("Unknown command: {cmd}. Try /help."),
            Command::Ask(question) => {
                let first_entry = orchestrator.state().trace().len();
                let outcome =
                    submit_and_echo(&mut orchestrator, &mut rx, &mut printer, &question).await;
                report_outcome(&orchestrator, outcome);
                let entries = &orchestrator.state().trace().entries()[first_entry..];
                if !entries.is_empty() {
                    eprintln!("{}", render_trace(entries));
                }
            }
        }
    }

    Ok(())
}

fn report_outcome(orchestrator: &Orchestrator, outcome: Result<TurnOutcome>) {
    match outcome {
        Ok(TurnOutcome::Completed { practice_failed, .. }) => {
            println!();
            if practice_failed {
                eprintln!("⚠️  Practice problems unavailable this time.");
            }
            eprintln!(
                "✅ Done. {} questions answered so far.",
                orchestrator.state().profile().total_questions
            );
        }
        Ok(TurnOutcome::Aborted { stage, .. }) => {
            eprintln!("\n🛑 Stopped at {stage}. Ask again to retry.");
        }
        Ok(TurnOutcome::Rejected(RejectReason::Busy(state))) => {
            eprintln!("Still working ({}). Please wait.", state.status_label());
        }
        Ok(TurnOutcome::Rejected(RejectReason::EmptyQuestion)) => {}
        Err(e) => {
            tracing::error!(error = %e, "Turn failed");
            eprintln!("Internal error: {e}");
        }
    }
}
