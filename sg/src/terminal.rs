//! Terminal rendering for the `sg` binary

use std::sync::Mutex;

use colored::*;

use crate::history::{GenerationRecord, GenerationStatus};
use crate::view::{Notification, NotificationLevel, NotificationSink, ViewRenderer, ViewStage, ViewState};

/// Prints each new view stage and every notification
///
/// The busy flag is not drawn; a stage is only printed when it differs from
/// the last one printed.
#[derive(Default)]
pub struct TerminalUi {
    last_stage: Mutex<Option<ViewStage>>,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage_changed(&self, stage: &ViewStage) -> bool {
        let mut last = self.last_stage.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.as_ref() == Some(stage) {
            return false;
        }
        *last = Some(stage.clone());
        true
    }
}

impl ViewRenderer for TerminalUi {
    fn render(&self, state: &ViewState) {
        if !self.stage_changed(&state.stage) {
            return;
        }

        match &state.stage {
            ViewStage::Idle => {}
            ViewStage::LyricsShown { lyrics } => {
                println!("{}", "Lyrics".bright_cyan().bold());
                println!("{}", lyrics);
                println!();
            }
            ViewStage::Approved => {
                println!("{} Lyrics approved", "✓".green());
            }
            ViewStage::Synthesizing { content_id, task_id } => {
                println!(
                    "{} Synthesizing {} (task {})...",
                    "♪".yellow(),
                    content_id.cyan(),
                    task_id
                );
            }
            ViewStage::Played(song) => {
                let title = song.title.as_deref().unwrap_or(&song.content_id);
                println!("{} {}", "♪".green(), title.bold());
                if let Some(url) = &song.audio_url {
                    println!("  audio:    {}", url.underline());
                }
                if let Some(duration) = song.duration {
                    println!("  duration: {:.0}s", duration);
                }
                if let Some(image) = &song.image_url {
                    println!("  cover:    {}", image);
                }
            }
        }
    }

    fn render_history(&self, records: &[GenerationRecord]) {
        if records.is_empty() {
            println!("No generations yet");
            return;
        }

        for (index, record) in records.iter().enumerate() {
            let status = record.status.to_string();
            let status = match record.status {
                GenerationStatus::Completed => status.green(),
                GenerationStatus::Failed => status.red(),
                GenerationStatus::Generating | GenerationStatus::Submitted => status.yellow(),
                GenerationStatus::LyricsGenerated => status.normal(),
            };
            println!(
                "{:>2}  {}  {:<16}  {} / {} / {}",
                index,
                record.timestamp.format("%Y-%m-%d %H:%M"),
                status,
                record.prompt.bold(),
                record.genre,
                record.mood
            );
            println!("    {}", record.lyrics_excerpt.dimmed());
            if let Some(url) = &record.audio_url {
                println!("    {}", url.underline());
            }
        }
    }
}

impl NotificationSink for TerminalUi {
    fn notify(&self, notification: Notification) {
        let Notification { level, message } = notification;
        match level {
            NotificationLevel::Success => println!("{} {}", "✓".green(), message.green()),
            NotificationLevel::Info => println!("{} {}", "i".cyan(), message),
            NotificationLevel::Warning => eprintln!("{} {}", "!".yellow(), message.yellow()),
            NotificationLevel::Error => eprintln!("{} {}", "✗".red(), message.red()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_printed_once() {
        let ui = TerminalUi::new();
        assert!(ui.stage_changed(&ViewStage::Approved));
        assert!(!ui.stage_changed(&ViewStage::Approved));
        assert!(ui.stage_changed(&ViewStage::Idle));
    }
}
