//! Full-screen notice for errors that stop the recorder from starting.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ERROR_BG: Color = Color::Rgb(150, 0, 0);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);

/// Red full-screen message that waits for a key press.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }

    /// Shows `title` and `message` centred until any key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering or event polling fails
    pub fn show(&mut self, title: &str, message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                frame.render_widget(Block::default().style(Style::default().bg(ERROR_BG)), area);

                let [_, body, _] = Layout::horizontal([
                    Constraint::Percentage(10),
                    Constraint::Percentage(80),
                    Constraint::Percentage(10),
                ])
                .areas(area);
                let [_, text_area] =
                    Layout::vertical([Constraint::Percentage(40), Constraint::Min(0)]).areas(body);

                let mut text = vec![
                    ratatui::text::Line::from(title.to_string()).bold(),
                    ratatui::text::Line::from(""),
                ];
                text.extend(message.lines().map(|line| ratatui::text::Line::from(line.to_string())));
                text.push(ratatui::text::Line::from(""));
                text.push(ratatui::text::Line::from("Press any key to exit.").italic());

                let paragraph = Paragraph::new(text)
                    .style(Style::default().fg(ERROR_FG).bg(ERROR_BG))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                frame.render_widget(paragraph, text_area);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
