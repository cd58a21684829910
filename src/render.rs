//! Plain-text rendering of the trace panel, profile and transcript.

use std::fmt::Write as _;

use crate::pipeline::trace::{StageLogEntry, StageStatus};
use crate::session::profile::StudentProfile;
use crate::session::transcript::{Message, MessageRole};

/// Output payloads longer than this are cut on the panel.
pub const OUTPUT_PREVIEW_CHARS: usize = 300;

/// Render the observability panel for a list of entries.
pub fn render_trace(entries: &[StageLogEntry]) -> String {
    let mut out = String::from("── SYSTEM OBSERVABILITY ──\n");
    if entries.is_empty() {
        out.push_str("Waiting for agent activity...\n");
        return out;
    }
    for entry in entries {
        out.push_str(&render_entry(entry));
    }
    out
}

/// Render a single trace entry.
pub fn render_entry(entry: &StageLogEntry) -> String {
    let mut out = String::new();
    let status = match entry.status {
        StageStatus::Running => "⏳ running",
        StageStatus::Success => "✅ success",
        StageStatus::Error => "❌ error",
    };
    let _ = writeln!(
        out,
        "{} {} [{}] {}",
        entry.emoji,
        entry.agent_name,
        status,
        entry.started_at.format("%H:%M:%S")
    );

    if let Some(ref input) = entry.input {
        let _ = writeln!(out, "   input: {}", preview(input, OUTPUT_PREVIEW_CHARS));
    }
    for (key, value) in &entry.metadata {
        let _ = writeln!(out, "   {}: {}", key.to_uppercase(), value);
    }
    if let Some(ref output) = entry.output {
        let _ = writeln!(out, "   output: {}", preview(output, OUTPUT_PREVIEW_CHARS));
    }
    if let Some(ms) = entry.duration_ms {
        let _ = writeln!(out, "   latency: {ms}ms");
    }
    out
}

/// Render the profile snapshot.
pub fn render_profile(profile: &StudentProfile) -> String {
    let mut out = String::from("── MEMORY STATE ──\n");
    let _ = writeln!(out, "ID: {}", profile.id);
    let _ = writeln!(out, "Name: {}", profile.name);
    let _ = writeln!(out, "Style: {}", profile.learning_style);
    let _ = writeln!(out, "Stats: {} Interactions", profile.total_questions);
    for (subject, stats) in &profile.subjects {
        let _ = writeln!(
            out,
            "  {subject}: {} asked, {:?}, last {}",
            stats.questions_asked, stats.mastery_level, stats.last_difficulty
        );
    }
    out
}

/// Render a transcript message.
pub fn render_message(message: &Message) -> String {
    let who = match message.role {
        MessageRole::User => "You",
        MessageRole::Assistant => "Helper",
    };
    format!("[{}] {}:\n{}\n", message.timestamp.format("%H:%M:%S"), who, message.content)
}

/// First `max` characters, with an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
