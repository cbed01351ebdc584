use crate::attachment::Attachment;
use crate::client::Submission;
use crate::events::ColorTag;
use crate::ui::chat::commands::{CommandEntry, ParsedCommand, command_entries, parse_slash_command};
use crate::ui::chat::transcript::swatch_color;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::cell::{Cell, RefCell};
use strum::IntoEnumIterator;

/// Result returned when the user interacts with the chat composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// Snapshot of the pending composition; the caller resets the
    /// composer once the submission is actually dispatched.
    Submitted(Submission),
    Command(ParsedCommand),
    None,
}

/// State for the text area within the composer.
///
/// `cursor_position` counts chars, not bytes; edits go through
/// [`byte_index`] so multibyte input lands on char boundaries.
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    pub cursor_position: usize,
}

/// Byte offset of the `char_position`-th char, clamped to the end.
fn byte_index(content: &str, char_position: usize) -> usize {
    content
        .char_indices()
        .nth(char_position)
        .map(|(at, _)| at)
        .unwrap_or(content.len())
}

/// Chat composer holding the pending selection: message text, at most one
/// mood color, and at most one image attachment.
#[derive(Clone)]
pub struct ChatComposer {
    state: RefCell<TextAreaState>,
    color: Cell<Option<ColorTag>>,
    image: RefCell<Option<Attachment>>,
    placeholder: String,
    has_focus: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: RefCell<Vec<CommandEntry>>,
    show_command_palette: Cell<bool>,
    selected_command: Cell<Option<usize>>,
}

impl ChatComposer {
    pub fn new(placeholder: String) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            color: Cell::new(None),
            image: RefCell::new(None),
            placeholder,
            has_focus: false,
            command_entries: command_entries(),
            filtered_commands: RefCell::new(Vec::new()),
            show_command_palette: Cell::new(false),
            selected_command: Cell::new(None),
        }
    }

    /// Handle key input
    pub fn handle_key(&self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char(&mut state, '\n');
                } else if self.show_command_palette.get() {
                    if self.apply_selected_command(&mut state) {
                        return ComposerResult::None;
                    }
                } else if let Some(command) = parse_slash_command(state.content.trim()) {
                    state.content.clear();
                    state.cursor_position = 0;
                    self.close_command_palette();
                    return ComposerResult::Command(command);
                } else {
                    drop(state);
                    let submission = self.submission();
                    if !submission.is_empty() {
                        return ComposerResult::Submitted(submission);
                    }
                }
            }
            KeyCode::Up => {
                if self.show_command_palette.get() {
                    self.move_command_selection(-1);
                    return ComposerResult::None;
                }
            }
            KeyCode::Down => {
                if self.show_command_palette.get() {
                    self.move_command_selection(1);
                    return ComposerResult::None;
                }
            }
            KeyCode::Esc => {
                if self.show_command_palette.get() {
                    self.close_command_palette();
                    return ComposerResult::None;
                }
            }
            KeyCode::Tab => {
                if self.show_command_palette.get() {
                    if self.apply_selected_command(&mut state) {
                        return ComposerResult::None;
                    }
                }
            }
            KeyCode::Char(c) => {
                if c == '/' && state.content.is_empty() {
                    self.insert_char(&mut state, c);
                    self.open_command_palette(&state);
                    return ComposerResult::None;
                }

                self.insert_char(&mut state, c);

                if self.show_command_palette.get() {
                    if state.content.starts_with('/') {
                        if c.is_whitespace() {
                            self.close_command_palette();
                        } else {
                            self.refresh_command_palette(&state);
                        }
                    } else {
                        self.close_command_palette();
                    }
                }
            }
            KeyCode::Backspace => {
                if self.backspace(&mut state) && self.show_command_palette.get() {
                    if state.content.starts_with('/') {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                }
            }
            KeyCode::Delete => {
                if self.delete(&mut state) && self.show_command_palette.get() {
                    if state.content.starts_with('/') {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                }
            }
            KeyCode::Left => {
                if state.cursor_position > 0 {
                    state.cursor_position -= 1;
                }
            }
            KeyCode::Right => {
                if state.cursor_position < state.content.chars().count() {
                    state.cursor_position += 1;
                }
            }
            KeyCode::Home => {
                state.cursor_position = 0;
            }
            KeyCode::End => {
                state.cursor_position = state.content.chars().count();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Single-select with toggle-off: picking the active color clears it,
    /// picking another replaces it.
    pub fn toggle_color(&self, tag: ColorTag) {
        if self.color.get() == Some(tag) {
            self.color.set(None);
        } else {
            self.color.set(Some(tag));
        }
    }

    #[allow(dead_code)]
    pub fn selected_color(&self) -> Option<ColorTag> {
        self.color.get()
    }

    /// Replace any pending attachment with a new one.
    pub fn set_attachment(&self, attachment: Attachment) {
        *self.image.borrow_mut() = Some(attachment);
    }

    /// Remove the pending attachment; the same file can be attached again.
    pub fn clear_attachment(&self) {
        *self.image.borrow_mut() = None;
    }

    pub fn attachment_preview(&self) -> Option<String> {
        self.image.borrow().as_ref().map(Attachment::preview)
    }

    /// Snapshot the pending selection without mutating it.
    pub fn submission(&self) -> Submission {
        let text = {
            let state = self.state.borrow();
            let trimmed = state.content.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        };

        Submission {
            text,
            color: self.color.get(),
            image: self.image.borrow().clone(),
        }
    }

    /// Return the pending selection to the idle state: text, color, and
    /// attachment all cleared.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.content.clear();
        state.cursor_position = 0;
        drop(state);
        self.color.set(None);
        self.clear_attachment();
        self.close_command_palette();
    }

    /// One-line strip showing the color controls and attachment preview.
    pub fn selection_line(&self) -> Line<'static> {
        let selected = self.color.get();
        let mut spans: Vec<Span<'static>> = Vec::new();

        for tag in ColorTag::iter() {
            let style = if selected == Some(tag) {
                Style::default()
                    .fg(swatch_color(tag))
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(swatch_color(tag))
            };
            spans.push(Span::styled(format!("■ {}", tag.wire_name()), style));
            spans.push(Span::raw("  "));
        }

        if let Some(preview) = self.attachment_preview() {
            spans.push(Span::styled(
                format!("🖼 {}", preview),
                Style::default().fg(Color::Cyan),
            ));
            spans.push(Span::styled(
                "  (/detach to remove)",
                Style::default().fg(Color::DarkGray),
            ));
        }

        Line::from(spans)
    }

    /// Insert a character at the cursor position
    fn insert_char(&self, state: &mut TextAreaState, c: char) {
        let at = byte_index(&state.content, state.cursor_position);
        state.content.insert(at, c);
        state.cursor_position += 1;
    }

    /// Delete character before cursor
    fn backspace(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position > 0 {
            state.cursor_position -= 1;
            let at = byte_index(&state.content, state.cursor_position);
            state.content.remove(at);
            true
        } else {
            false
        }
    }

    /// Delete character at cursor
    fn delete(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position < state.content.chars().count() {
            let at = byte_index(&state.content, state.cursor_position);
            state.content.remove(at);
            true
        } else {
            false
        }
    }

    fn open_command_palette(&self, state: &TextAreaState) {
        self.show_command_palette.set(true);
        self.refresh_command_palette(state);
        self.selected_command.set(Some(0));
    }

    fn close_command_palette(&self) {
        self.show_command_palette.set(false);
        self.filtered_commands.borrow_mut().clear();
        self.selected_command.set(None);
    }

    fn refresh_command_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered_commands.borrow_mut();
        filtered.clear();

        for entry in &self.command_entries {
            if query.is_empty() || entry.keyword.starts_with(&query) {
                filtered.push(*entry);
            }
        }

        if filtered.is_empty() {
            self.selected_command.set(None);
        } else {
            let index = self.selected_command.get().unwrap_or(0);
            let clamped = index.min(filtered.len() - 1);
            self.selected_command.set(Some(clamped));
        }
    }

    fn move_command_selection(&self, delta: isize) {
        let filtered = self.filtered_commands.borrow();
        if filtered.is_empty() {
            self.selected_command.set(None);
            return;
        }

        let current = self.selected_command.get().unwrap_or(0) as isize;
        let len = filtered.len() as isize;
        let mut next = current + delta;

        if next < 0 {
            next = len - 1;
        } else if next >= len {
            next = 0;
        }

        self.selected_command.set(Some(next as usize));
    }

    fn apply_selected_command(&self, state: &mut TextAreaState) -> bool {
        let filtered = self.filtered_commands.borrow();
        let Some(index) = self.selected_command.get() else {
            return false;
        };

        if index >= filtered.len() {
            return false;
        }

        let entry = filtered[index];
        state.content = format!("/{} ", entry.keyword);
        state.cursor_position = state.content.chars().count();
        drop(filtered);
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }
}

impl Widget for ChatComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state.borrow();

        let block = Block::default()
            .borders(Borders::ALL)
            .title("🎧 What's your mood?")
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                &self.placeholder,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = state.content.clone();
            if self.has_focus {
                let at = byte_index(&content, state.cursor_position);
                content.insert(at, '▌');
            }

            for (i, line_text) in content.split('\n').enumerate() {
                if i < inner_area.height as usize {
                    let line = Line::from(vec![Span::raw(line_text)]);
                    buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
                }
            }
        }

        if self.show_command_palette.get() {
            let filtered = self.filtered_commands.borrow();
            let palette_height = (filtered.len().min(6) + 2) as u16;
            let palette_area = Rect {
                x: inner_area.x,
                y: inner_area.y.saturating_sub(palette_height),
                width: inner_area.width,
                height: palette_height,
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            let selected = self.selected_command.get();
            for (index, entry) in filtered.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let is_selected = selected == Some(index);
                let style = if is_selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::chat::commands::SlashCommand;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &ChatComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn toggling_the_same_color_twice_clears_it() {
        let composer = ChatComposer::new("".to_string());
        for tag in ColorTag::iter() {
            composer.toggle_color(tag);
            assert_eq!(composer.selected_color(), Some(tag));
            composer.toggle_color(tag);
            assert_eq!(composer.selected_color(), None);
        }
    }

    #[test]
    fn selecting_a_second_color_replaces_the_first() {
        let composer = ChatComposer::new("".to_string());
        composer.toggle_color(ColorTag::Red);
        composer.toggle_color(ColorTag::Blue);
        assert_eq!(composer.selected_color(), Some(ColorTag::Blue));
    }

    #[test]
    fn enter_with_nothing_pending_is_a_no_op() {
        let composer = ChatComposer::new("".to_string());
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ComposerResult::None);

        // Whitespace-only text counts as empty too.
        type_text(&composer, "   ");
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ComposerResult::None);
    }

    #[test]
    fn enter_submits_a_trimmed_snapshot() {
        let composer = ChatComposer::new("".to_string());
        type_text(&composer, "  driving at night  ");
        composer.toggle_color(ColorTag::Purple);

        match composer.handle_key(key(KeyCode::Enter)) {
            ComposerResult::Submitted(submission) => {
                assert_eq!(submission.text.as_deref(), Some("driving at night"));
                assert_eq!(submission.color, Some(ColorTag::Purple));
                assert!(submission.image.is_none());
            }
            other => panic!("expected a submission, got {other:?}"),
        }

        // The snapshot does not clear the pending state; the manager
        // resets only once the dispatch actually happens.
        assert_eq!(composer.selected_color(), Some(ColorTag::Purple));
    }

    #[test]
    fn a_color_alone_is_submittable() {
        let composer = ChatComposer::new("".to_string());
        composer.toggle_color(ColorTag::Green);

        match composer.handle_key(key(KeyCode::Enter)) {
            ComposerResult::Submitted(submission) => {
                assert_eq!(submission.text, None);
                assert_eq!(submission.color, Some(ColorTag::Green));
            }
            other => panic!("expected a submission, got {other:?}"),
        }
    }

    #[test]
    fn attaching_replaces_and_detaching_allows_reattach() {
        let composer = ChatComposer::new("".to_string());
        let first = Attachment {
            bytes: vec![1],
            filename: "a.png".to_string(),
            mime: "image/png".to_string(),
        };
        let second = Attachment {
            bytes: vec![2],
            filename: "b.png".to_string(),
            mime: "image/png".to_string(),
        };

        composer.set_attachment(first.clone());
        composer.set_attachment(second);
        assert!(composer.attachment_preview().unwrap().starts_with("b.png"));

        composer.clear_attachment();
        assert_eq!(composer.attachment_preview(), None);

        composer.set_attachment(first);
        assert!(composer.attachment_preview().unwrap().starts_with("a.png"));
    }

    #[test]
    fn reset_returns_the_selection_to_idle() {
        let composer = ChatComposer::new("".to_string());
        type_text(&composer, "rainy afternoon");
        composer.toggle_color(ColorTag::Blue);
        composer.set_attachment(Attachment {
            bytes: vec![0],
            filename: "rain.jpg".to_string(),
            mime: "image/jpeg".to_string(),
        });

        composer.reset();

        assert!(composer.submission().is_empty());
        assert_eq!(composer.selected_color(), None);
        assert_eq!(composer.attachment_preview(), None);
    }

    #[test]
    fn slash_input_becomes_a_command_and_clears_the_editor() {
        let composer = ChatComposer::new("".to_string());
        type_text(&composer, "/color blue");

        match composer.handle_key(key(KeyCode::Enter)) {
            ComposerResult::Command(parsed) => {
                assert_eq!(parsed.command, SlashCommand::Color);
                assert_eq!(parsed.color_target(), Some(ColorTag::Blue));
            }
            other => panic!("expected a command, got {other:?}"),
        }

        assert!(composer.submission().is_empty());
    }

    #[test]
    fn multibyte_text_can_be_typed_and_submitted() {
        let composer = ChatComposer::new("".to_string());
        type_text(&composer, "밤하늘 드라이브");

        match composer.handle_key(key(KeyCode::Enter)) {
            ComposerResult::Submitted(submission) => {
                assert_eq!(submission.text.as_deref(), Some("밤하늘 드라이브"));
            }
            other => panic!("expected a submission, got {other:?}"),
        }
    }

    #[test]
    fn multibyte_text_edits_at_char_boundaries() {
        let composer = ChatComposer::new("".to_string());
        type_text(&composer, "기분이 좋아");

        // Backspace removes the last char, not the last byte.
        composer.handle_key(key(KeyCode::Backspace));
        assert_eq!(composer.submission().text.as_deref(), Some("기분이 좋"));

        // Move into the middle and insert there.
        composer.handle_key(key(KeyCode::Left));
        composer.handle_key(key(KeyCode::Left));
        type_text(&composer, "참");
        assert_eq!(composer.submission().text.as_deref(), Some("기분이참 좋"));

        // Delete removes the char under the cursor.
        composer.handle_key(key(KeyCode::Delete));
        assert_eq!(composer.submission().text.as_deref(), Some("기분이참좋"));

        // Home/End and Right stay within char counts.
        composer.handle_key(key(KeyCode::End));
        composer.handle_key(key(KeyCode::Right));
        type_text(&composer, "다");
        assert_eq!(composer.submission().text.as_deref(), Some("기분이참좋다"));
    }

    #[test]
    fn byte_index_clamps_past_the_end() {
        assert_eq!(byte_index("밤", 0), 0);
        assert_eq!(byte_index("밤", 1), 3);
        assert_eq!(byte_index("밤", 7), 3);
    }

    #[test]
    fn selection_line_marks_only_the_active_color() {
        let composer = ChatComposer::new("".to_string());
        composer.toggle_color(ColorTag::Yellow);

        let line = composer.selection_line();
        let highlighted: Vec<_> = line
            .spans
            .iter()
            .filter(|span| span.style.bg == Some(Color::DarkGray))
            .collect();

        assert_eq!(highlighted.len(), 1);
        assert!(highlighted[0].content.contains("yellow"));
    }
}
