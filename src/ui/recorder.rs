//! Terminal recorder screen.
//!
//! [`RecorderView`] is the presentation state the session controller talks to:
//! toggle label, elapsed time, the last waveform ribbon, the recordings list
//! and playback. [`RecorderScreen`] owns the terminal and paints a view.

use crate::playback::Player;
use crate::recording::{Presenter, WaveformSurface};
use crate::storage::{Recording, RecordingId};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, HighlightSpacing, List, ListItem, ListState, Padding, Paragraph,
    },
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const DIM_FG: Color = Color::Rgb(100, 100, 100);
const HIGHLIGHT_BG: Color = Color::Rgb(20, 20, 20);
const RECORD_FG: Color = Color::Rgb(255, 70, 70);
const NOTICE_TTL: Duration = Duration::from_secs(4);

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    /// Start or stop recording
    Toggle,
    /// Delete the given recording
    Delete(RecordingId),
    /// Leave the recorder
    Quit,
}

/// Presentation state of the recorder.
pub struct RecorderView {
    canvas_size: (f32, f32),
    fill: Color,
    recording: bool,
    elapsed: String,
    ribbon: Vec<(f32, f32)>,
    entries: Vec<Recording>,
    list_state: ListState,
    notice: Option<(String, Instant)>,
    player: Player,
}

impl RecorderView {
    /// Creates an empty view with a logical canvas of `width` x `height`.
    pub fn new(width: f32, height: f32, fill: Color) -> Self {
        Self {
            canvas_size: (width, height),
            fill,
            recording: false,
            elapsed: "00:00".to_string(),
            ribbon: Vec::new(),
            entries: Vec::new(),
            list_state: ListState::default(),
            notice: None,
            player: Player::new(),
        }
    }

    /// Entries currently listed, in display order.
    pub fn entries(&self) -> &[Recording] {
        &self.entries
    }

    /// Id of the highlighted entry.
    pub fn selected(&self) -> Option<RecordingId> {
        self.list_state
            .selected()
            .and_then(|index| self.entries.get(index))
            .map(|entry| entry.id)
    }

    /// Maps a key press to an action, handling list navigation and playback
    /// itself. The list ignores everything but the toggle while recording.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                tracing::debug!("Ctrl+C pressed: leaving recorder");
                Some(UiAction::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                tracing::debug!("Escape or 'q' pressed: leaving recorder");
                Some(UiAction::Quit)
            }
            KeyCode::Char('r') | KeyCode::Char(' ') => Some(UiAction::Toggle),
            _ if self.recording => None,
            KeyCode::Up => {
                self.list_state.select_previous();
                None
            }
            KeyCode::Down => {
                self.list_state.select_next();
                None
            }
            KeyCode::Enter => {
                self.toggle_selected_playback();
                None
            }
            KeyCode::Char('d') | KeyCode::Delete => self.selected().map(UiAction::Delete),
            _ => None,
        }
    }

    fn toggle_selected_playback(&mut self) {
        let Some(index) = self.list_state.selected() else {
            return;
        };
        let Some(entry) = self.entries.get(index) else {
            return;
        };

        match self.player.toggle(entry) {
            Ok(state) => tracing::debug!("Recording {} is now {:?}", entry.id, state),
            Err(e) => {
                tracing::warn!("Playback failed: {}", e);
                self.notify(format!("Playback failed: {e}"));
            }
        }
    }

    fn notify(&mut self, message: String) {
        self.notice = Some((message, Instant::now()));
    }

    fn active_notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|(_, shown)| shown.elapsed() < NOTICE_TTL)
            .map(|(message, _)| message.as_str())
    }
}

impl WaveformSurface for RecorderView {
    fn size(&self) -> (f32, f32) {
        self.canvas_size
    }

    fn clear(&mut self) {
        self.ribbon.clear();
    }

    fn fill_ribbon(&mut self, outline: &[(f32, f32)]) {
        self.ribbon.clear();
        self.ribbon.extend_from_slice(outline);
    }
}

impl Presenter for RecorderView {
    fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    fn show_elapsed(&mut self, label: &str) {
        self.elapsed = label.to_string();
    }

    fn halt_playback(&mut self) {
        self.player.halt_all();
    }

    fn render_recording(&mut self, recording: &Recording) {
        self.entries.push(recording.clone());
        self.list_state.select(Some(self.entries.len() - 1));
    }

    fn remove_recording(&mut self, id: RecordingId) {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return;
        };
        self.entries.remove(index);
        self.player.forget(id);

        let selected = if self.entries.is_empty() {
            None
        } else {
            Some(index.min(self.entries.len() - 1))
        };
        self.list_state.select(selected);
    }

    fn show_error(&mut self, message: &str) {
        self.notify(message.to_string());
    }
}

/// Columns of the filled outline, as `(x, top, bottom)` in canvas coordinates.
///
/// Each column is sampled at its centre and filled between alternating edge
/// crossings, so any simple closed outline fills correctly.
pub fn fill_columns(outline: &[(f32, f32)], width: f32) -> Vec<(f32, f32, f32)> {
    let mut columns = Vec::new();
    if outline.len() < 3 {
        return columns;
    }

    let mut crossings = Vec::new();
    for column in 0..width.max(0.0) as usize {
        let x = column as f32 + 0.5;
        crossings.clear();

        for (i, &(x1, y1)) in outline.iter().enumerate() {
            let (x2, y2) = outline[(i + 1) % outline.len()];
            if (x1 <= x && x < x2) || (x2 <= x && x < x1) {
                let t = (x - x1) / (x2 - x1);
                crossings.push(y1 + t * (y2 - y1));
            }
        }

        crossings.sort_by(f32::total_cmp);
        for pair in crossings.chunks_exact(2) {
            columns.push((x, pair[0], pair[1]));
        }
    }
    columns
}

/// Parses `#rrggbb` or `#rrggbbaa`. Alpha is blended against the black
/// background since terminals have no translucency.
pub fn parse_color(text: &str) -> Option<Color> {
    let hex = text.trim().strip_prefix('#')?;
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };

    let blend = |c: u8| ((c as u16 * alpha as u16 + 127) / 255) as u8;
    Some(Color::Rgb(blend(r), blend(g), blend(b)))
}

/// Terminal owner that paints a [`RecorderView`].
pub struct RecorderScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl RecorderScreen {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal })
    }

    /// Paints the whole recorder.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(&mut self, view: &mut RecorderView) -> anyhow::Result<()> {
        let (width, height) = view.canvas_size;
        let columns = fill_columns(&view.ribbon, width);
        let notice = view.active_notice().map(str::to_string);

        self.terminal.draw(|frame| {
            let area = frame.area();

            let padding_block = Block::default()
                .padding(Padding::uniform(1))
                .style(Style::default().bg(BG).fg(FG));
            frame.render_widget(&padding_block, area);
            let inner = padding_block.inner(area);

            let [header_area, wave_area, list_area, footer_area] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Percentage(40),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .areas(inner);

            let toggle = if view.recording {
                Span::styled("■ Stop", Style::default().fg(RECORD_FG).bold())
            } else {
                Span::styled("● Record", Style::default().fg(FG).bold())
            };
            let header = ratatui::text::Line::from(vec![
                toggle,
                Span::raw("   "),
                Span::raw(view.elapsed.clone()),
            ]);
            frame.render_widget(Paragraph::new(header), header_area);

            let fill = view.fill;
            let canvas = Canvas::default()
                .marker(Marker::Braille)
                .x_bounds([0.0, width as f64])
                .y_bounds([0.0, height as f64])
                .paint(|ctx| {
                    for &(x, top, bottom) in &columns {
                        ctx.draw(&CanvasLine::new(
                            x as f64,
                            (height - top) as f64,
                            x as f64,
                            (height - bottom) as f64,
                            fill,
                        ));
                    }
                });
            frame.render_widget(canvas, wave_area);

            let list_fg = if view.recording { DIM_FG } else { FG };
            let items: Vec<ListItem> = view
                .entries
                .iter()
                .map(|entry| {
                    let marker = if view.player.is_playing(entry.id) {
                        "▶ "
                    } else {
                        "  "
                    };
                    ListItem::new(ratatui::text::Line::from(vec![
                        Span::styled(marker, Style::default().fg(fill)),
                        Span::styled(entry.duration_label.clone(), Style::default().fg(list_fg)),
                        Span::raw("  "),
                        Span::styled(entry.created_at.clone(), Style::default().fg(DIM_FG)),
                    ]))
                })
                .collect();

            let list = List::new(items)
                .block(Block::default().title(" Recordings ").borders(Borders::ALL))
                .highlight_style(Style::default().bg(HIGHLIGHT_BG))
                .highlight_symbol("> ")
                .highlight_spacing(HighlightSpacing::Always);
            frame.render_stateful_widget(list, list_area, &mut view.list_state);

            let footer = match notice {
                Some(message) => Paragraph::new(message).style(Style::default().fg(RECORD_FG)),
                None => Paragraph::new("r record/stop, ↑↓ select, ↵ play/pause, d delete, q quit")
                    .style(Style::default().fg(DIM_FG)),
            };
            frame.render_widget(footer.alignment(Alignment::Center), footer_area);
        })?;

        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecorderScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
