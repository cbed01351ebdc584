use crate::attachment::Attachment;
use crate::client::{GENERIC_FAILURE, RecommendClient, Submission};
use crate::config::Config;
use crate::events::ChatEvent;
use crate::ui::chat::commands::{ParsedCommand, SlashCommand, get_help_text};
use crate::ui::chat::composer::{ChatComposer, ComposerResult};
use crate::ui::chat::transcript::Transcript;
use anyhow::Result;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Actions that can be requested by the chat manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    None,
    Exit,
}

/// A dispatched request awaiting its completion event.
struct InFlight {
    request_id: Uuid,
    rx: mpsc::Receiver<ChatEvent>,
}

/// Owns the transcript and the composer, and drives the submission
/// lifecycle: validate, echo, dispatch, reset, then resolve the pending
/// placeholder when the completion event arrives.
pub struct ChatManager {
    transcript: Transcript,
    composer: ChatComposer,
    client: RecommendClient,
    in_flight: Option<InFlight>,
}

impl ChatManager {
    pub fn new(config: &Config, client: RecommendClient) -> Self {
        let mut composer =
            ChatComposer::new("Describe your mood... (/help for commands)".to_string());
        composer.set_focus(true);

        Self {
            transcript: Transcript::new(config.ui.max_messages),
            composer,
            client,
            in_flight: None,
        }
    }

    /// Handle key input
    pub async fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Result<ChatAction> {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(submission) => {
                self.dispatch(submission);
                Ok(ChatAction::None)
            }
            ComposerResult::Command(command) => self.handle_slash_command(command).await,
            ComposerResult::None => Ok(ChatAction::None),
        }
    }

    /// Echo the composition, send it, and reset the pending selection.
    ///
    /// The reset is fire-and-forget: it happens at dispatch time, not when
    /// the response comes back. Requests are serialized; submitting while
    /// one is in flight is a silent no-op, so at most one placeholder can
    /// ever exist.
    fn dispatch(&mut self, submission: Submission) {
        if submission.is_empty() || self.in_flight.is_some() {
            return;
        }

        self.transcript.add_user_echo(
            submission.color,
            submission.image.as_ref().map(|a| a.filename.clone()),
            submission.text.clone(),
        );
        self.composer.reset();

        let request_id = Uuid::new_v4();
        let rx = self.client.request_events(request_id, submission);
        self.transcript.begin_pending(request_id);
        self.in_flight = Some(InFlight { request_id, rx });
    }

    /// Drain the completion event, if any (called from the main loop on
    /// each tick). The placeholder is removed before the final message is
    /// appended.
    pub fn process_completions(&mut self) {
        let Some(in_flight) = &mut self.in_flight else {
            return;
        };

        match in_flight.rx.try_recv() {
            Ok(ChatEvent::Reply { request_id, reply }) => {
                self.transcript.resolve_pending(request_id);
                self.transcript.add_playlist(reply);
                self.in_flight = None;
            }
            Ok(ChatEvent::Failed { request_id, message }) => {
                self.transcript.resolve_pending(request_id);
                self.transcript
                    .add_notice(format!("Sorry, something went wrong: {message}"));
                self.in_flight = None;
            }
            Err(mpsc::error::TryRecvError::Empty) => {}
            Err(mpsc::error::TryRecvError::Disconnected) => {
                // The request task went away without reporting.
                let request_id = in_flight.request_id;
                self.transcript.resolve_pending(request_id);
                self.transcript
                    .add_notice(format!("Sorry, something went wrong: {GENERIC_FAILURE}"));
                self.in_flight = None;
            }
        }
    }

    /// Handle slash commands
    async fn handle_slash_command(&mut self, command: ParsedCommand) -> Result<ChatAction> {
        match command.command {
            SlashCommand::Color => {
                if let Some(tag) = command.color_target() {
                    self.composer.toggle_color(tag);
                } else {
                    self.transcript.add_notice(
                        "Pick one of: red, orange, yellow, green, blue, purple.".to_string(),
                    );
                }
                Ok(ChatAction::None)
            }
            SlashCommand::Attach => {
                let Some(path) = command.argument() else {
                    self.transcript
                        .add_notice("Usage: /attach <path-to-image>".to_string());
                    return Ok(ChatAction::None);
                };

                match Attachment::load(path).await {
                    Ok(attachment) => self.composer.set_attachment(attachment),
                    Err(e) => self
                        .transcript
                        .add_notice(format!("Could not attach: {e:#}")),
                }
                Ok(ChatAction::None)
            }
            SlashCommand::Detach => {
                self.composer.clear_attachment();
                Ok(ChatAction::None)
            }
            SlashCommand::Clear => {
                self.transcript.clear();
                Ok(ChatAction::None)
            }
            SlashCommand::Help => {
                self.transcript.add_notice(get_help_text());
                Ok(ChatAction::None)
            }
            SlashCommand::Bye => Ok(ChatAction::Exit),
        }
    }

    /// Render the chat UI: transcript on top, selection strip, composer.
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(area);

        self.transcript.clone().render(chunks[0], buf);

        let strip = self.composer.selection_line();
        buf.set_line(chunks[1].x + 1, chunks[1].y, &strip, chunks[1].width.saturating_sub(1));

        self.composer.clone().render(chunks[2], buf);
    }
}
