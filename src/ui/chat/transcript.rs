//! Transcript state and message rendering.
//!
//! The transcript is an append-only list of immutable messages; the view
//! stays bottom-anchored so every append shows the latest entry. At most
//! one pending "searching" placeholder exists at any time, tagged with the
//! request id it belongs to.

use crate::client::BotReply;
use crate::events::{ColorTag, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::collections::VecDeque;
use uuid::Uuid;

/// Terminal color used for a mood swatch.
pub fn swatch_color(tag: ColorTag) -> Color {
    match tag {
        ColorTag::Red => Color::Red,
        ColorTag::Orange => Color::LightRed,
        ColorTag::Yellow => Color::Yellow,
        ColorTag::Green => Color::Green,
        ColorTag::Blue => Color::Blue,
        ColorTag::Purple => Color::Magenta,
    }
}

/// A single message in the transcript
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub body: MessageBody,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        matches!(self.body, MessageBody::Pending)
    }
}

/// What a message renders as.
#[derive(Debug, Clone)]
pub enum MessageBody {
    /// The user's echoed composition: swatch, then image glyph, then text.
    Composed {
        color: Option<ColorTag>,
        image: Option<String>,
        text: Option<String>,
    },
    /// A playlist reply from the backend.
    Playlist(BotReply),
    /// System or error notice.
    Notice(String),
    /// The "searching" placeholder shown while a request is in flight.
    Pending,
}

/// Transcript display component
#[derive(Clone)]
pub struct Transcript {
    messages: VecDeque<Message>,
    max_messages: usize,
}

impl Transcript {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages,
        }
    }

    fn push(&mut self, role: Role, body: MessageBody) {
        self.push_with_id(Uuid::new_v4(), role, body);
    }

    fn push_with_id(&mut self, id: Uuid, role: Role, body: MessageBody) {
        self.messages.push_back(Message {
            id,
            role,
            body,
            timestamp: chrono::Utc::now(),
        });

        if self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }

    /// Echo the user's own composition.
    pub fn add_user_echo(
        &mut self,
        color: Option<ColorTag>,
        image: Option<String>,
        text: Option<String>,
    ) {
        self.push(Role::User, MessageBody::Composed { color, image, text });
    }

    /// Append a playlist reply.
    pub fn add_playlist(&mut self, reply: BotReply) {
        self.push(Role::Bot, MessageBody::Playlist(reply));
    }

    /// Append a notice (help text, errors, system messages).
    pub fn add_notice(&mut self, content: String) {
        self.push(Role::Bot, MessageBody::Notice(content));
    }

    /// Append the searching placeholder for a dispatched request.
    pub fn begin_pending(&mut self, request_id: Uuid) {
        self.push_with_id(request_id, Role::Bot, MessageBody::Pending);
    }

    /// Remove the placeholder belonging to `request_id`. Returns whether
    /// one was actually removed.
    pub fn resolve_pending(&mut self, request_id: Uuid) -> bool {
        let before = self.messages.len();
        self.messages
            .retain(|message| !(message.is_pending() && message.id == request_id));
        self.messages.len() != before
    }

    #[allow(dead_code)]
    pub fn has_pending(&self) -> bool {
        self.messages.iter().any(Message::is_pending)
    }

    /// Clear all messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    #[allow(dead_code)]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)]
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

impl Widget for Transcript {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("🎵 Mood Playlist Chat");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled(
                    "Tell me how you feel and I'll find you a playlist.",
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Type a message, pick a mood color with /color, or /attach an image.",
                    Style::default().fg(Color::Gray),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Press Enter to send. /help lists all commands.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
        } else {
            let mut all_lines: Vec<Line> = Vec::new();
            for message in self.messages.iter() {
                let mut lines = self.render_message(message, inner_area.width);
                all_lines.append(&mut lines);
                // spacing between messages
                all_lines.push(Line::from(vec![Span::raw("")]));
            }

            // Bottom-anchored: the latest entry is always visible.
            let height = inner_area.height as usize;
            let total = all_lines.len();
            let start = total.saturating_sub(height);
            let visible = &all_lines[start..];

            for (i, line) in visible.iter().enumerate() {
                buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
            }
        }
    }
}

impl Transcript {
    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let role_icon = match message.role {
            Role::User => "👤",
            Role::Bot => "🎧",
        };

        let timestamp = message.timestamp.format("%H:%M:%S").to_string();
        let header = format!("{} {} {}", role_icon, timestamp, "─".repeat(20));
        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )]));

        let wrap_width = width.saturating_sub(2) as usize;
        match &message.body {
            MessageBody::Composed { color, image, text } => {
                let mut spans: Vec<Span<'static>> = vec![Span::raw("  ")];
                if let Some(tag) = color {
                    spans.push(Span::styled(
                        "■ ",
                        Style::default().fg(swatch_color(*tag)),
                    ));
                }
                if let Some(name) = image {
                    spans.push(Span::styled(
                        format!("🖼 {} ", name),
                        Style::default().fg(Color::Cyan),
                    ));
                }
                if let Some(body) = text {
                    spans.push(Span::styled(
                        body.clone(),
                        Style::default().fg(Color::Blue),
                    ));
                }
                lines.push(Line::from(spans));
            }
            MessageBody::Playlist(reply) => {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        reply.emotion.clone(),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        " - here's a playlist for you:",
                        Style::default().fg(Color::Green),
                    ),
                ]));

                for song in &reply.recommended_songs {
                    lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(
                            format!("🎵 {} - {}", song.artist, song.title),
                            Style::default().fg(Color::White),
                        ),
                    ]));
                    lines.push(Line::from(vec![
                        Span::raw("     "),
                        Span::styled(
                            format!("▶ {}", song.youtube_link),
                            Style::default()
                                .fg(Color::Blue)
                                .add_modifier(Modifier::UNDERLINED),
                        ),
                    ]));
                }
            }
            MessageBody::Notice(content) => {
                for content_line in content.split('\n') {
                    for wrapped in wrap_text(content_line, wrap_width) {
                        lines.push(Line::from(vec![
                            Span::raw("  "),
                            Span::styled(wrapped, Style::default().fg(Color::Yellow)),
                        ]));
                    }
                }
            }
            MessageBody::Pending => {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        "Searching for your playlist…",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::ITALIC),
                    ),
                ]));
            }
        }

        lines
    }
}

/// Wrap text to fit within the given width, measured in chars so
/// non-ASCII text does not over-wrap.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.chars().count() + word.chars().count() + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
