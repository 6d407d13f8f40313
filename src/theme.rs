use ratatui::style::{Color, Modifier, Style};

use crate::projection::ResolveStatus;

/// Theme configuration for the puzzle view
#[derive(Clone, Debug)]
pub struct Theme {
    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the solved/total counter in the status bar
    pub progress_color: Color,

    /// Color for the `[` and `]` around a clue
    pub delimiter_fg: Color,

    /// Color for clue text
    pub clue_fg: Color,

    /// Background for the clue under the mouse
    pub hover_bg: Color,

    /// Color for a guess with nothing unsolved beneath it
    pub resolved_fg: Color,

    /// Color for a guess that still hides unsolved clues
    pub partial_fg: Color,

    /// Foreground color for the guess input field
    pub input_fg: Color,

    /// Background color for the guess input field
    pub input_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            progress_color: Color::LightYellow,
            delimiter_fg: Color::Reset,
            clue_fg: Color::Reset,
            hover_bg: Color::DarkGray,
            resolved_fg: Color::LightGreen,
            partial_fg: Color::LightYellow,
            input_fg: Color::Black,
            input_bg: Color::Gray,
        }
    }
}

impl Theme {
    /// Get the style for the status bar
    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    /// Get the style for the progress counter in the status bar
    pub fn progress_style(&self) -> Style {
        Style::default().fg(self.progress_color)
    }

    /// Get the style for clue delimiters
    pub fn delimiter_style(&self) -> Style {
        Style::default()
            .fg(self.delimiter_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn clue_style(&self) -> Style {
        Style::default().fg(self.clue_fg)
    }

    /// Patch applied on top of whatever the hovered clue contains
    pub fn hover_style(&self) -> Style {
        Style::default().bg(self.hover_bg)
    }

    /// Get the style for a visible guess
    pub fn guess_style(&self, status: ResolveStatus) -> Style {
        let color = match status {
            ResolveStatus::FullyResolved => self.resolved_fg,
            ResolveStatus::PartiallyResolved => self.partial_fg,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Get the style for the guess input field
    pub fn input_style(&self) -> Style {
        Style::default()
            .fg(self.input_fg)
            .bg(self.input_bg)
            .add_modifier(Modifier::UNDERLINED)
    }
}
