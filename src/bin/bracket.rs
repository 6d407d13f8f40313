use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bracket_tui::display::PuzzleDisplay;
use bracket_tui::render::RenderResult;
use bracket_tui::session::{PuzzleSession, SessionConfig};
use bracket_tui::source::clean_puzzle_text;
use bracket_tui::theme::Theme;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const MOUSE_SCROLL_LINES: usize = 3;

#[derive(Parser, Debug)]
#[command(
    name = "bracket",
    about = "Solve nested bracket word puzzles in the terminal"
)]
struct Args {
    /// Puzzle file; the puzzle is read from stdin when omitted
    file: Option<PathBuf>,

    /// How long a click waits for a second click, in milliseconds
    #[arg(long, default_value_t = 250)]
    double_click_ms: u64,

    /// Use the puzzle text as-is instead of cleaning up pasted page text
    #[arg(long)]
    raw: bool,

    /// Write logs to this file (filtered by RUST_LOG, default info)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    run(args)
}

/// The terminal belongs to the UI, so logs only go somewhere when a file is
/// given.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn puzzle_wrap_configuration(width: usize) -> (usize, usize) {
    if width == 0 {
        return (1, 0);
    }
    if width < 40 {
        return (width, 0);
    }
    if width < 80 {
        let padding = 2.min(width / 2);
        let wrap_width = width.saturating_sub(padding.saturating_mul(2)).max(1);
        return (wrap_width, padding);
    }
    let mut left_padding = width.saturating_sub(80) / 2 + 4;
    let max_padding = width.saturating_sub(1) / 2;
    if left_padding > max_padding {
        left_padding = max_padding;
    }
    let wrap_width = width.saturating_sub(left_padding.saturating_mul(2)).max(1);
    (wrap_width, left_padding)
}

/// Where the puzzle text came from, so that it can be read again.
struct PuzzleSource {
    path: Option<PathBuf>,
    raw: bool,
    /// Prepared text of the last successful read.
    text: String,
}

impl PuzzleSource {
    fn load(path: Option<PathBuf>, raw: bool) -> Result<Self> {
        let content = match &path {
            Some(path) => read_file(path)?,
            None => {
                let mut content = String::new();
                io::stdin()
                    .read_to_string(&mut content)
                    .context("failed to read puzzle from stdin")?;
                content
            }
        };
        Ok(Self {
            text: prepare(&content, raw),
            path,
            raw,
        })
    }

    /// Reads the file again. Stdin can only be read once, so a puzzle piped
    /// in is reloaded from the text already read.
    fn reload(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            let content = read_file(path)?;
            self.text = prepare(&content, self.raw);
        }
        Ok(())
    }

    fn label(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "<stdin>".to_string(),
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn prepare(content: &str, raw: bool) -> String {
    if raw {
        content.to_string()
    } else {
        clean_puzzle_text(content)
    }
}

fn run(args: Args) -> Result<()> {
    let source = PuzzleSource::load(args.file, args.raw)?;
    let config = SessionConfig::default()
        .with_double_click_window(Duration::from_millis(args.double_click_ms));
    let session = PuzzleSession::with_puzzle(config, &source.text);
    let mut app = App::new(session, source);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )
    .context("failed to initialize terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    while !app.should_quit() {
        if needs_redraw {
            terminal
                .draw(|frame| app.draw(frame))
                .context("failed to draw frame")?;
            needs_redraw = false;
        }

        // Wake up in time for a pending single click.
        let mut timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if let Some(deadline) = app.display.pending_deadline() {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            if let Event::Resize(_, _) = evt {
                needs_redraw = true;
                continue;
            }
            if app.handle_event(evt, Instant::now())? {
                needs_redraw = true;
            }
        }

        if app.display.tick(Instant::now()) {
            app.after_change();
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            let had_message_before = app.has_status_message();
            app.on_tick();
            last_tick = Instant::now();
            if had_message_before && !app.has_status_message() {
                needs_redraw = true;
            }
        }
    }

    Ok(())
}

struct App {
    display: PuzzleDisplay,
    theme: Theme,
    source: PuzzleSource,
    scroll_top: usize,
    should_quit: bool,
    was_solved: bool,
    status_message: Option<(String, Instant)>,
}

impl App {
    fn new(session: PuzzleSession, source: PuzzleSource) -> Self {
        let initial_status = if session.tree().bracket_count() == 0 {
            Some(("No brackets in this puzzle".to_string(), Instant::now()))
        } else {
            None
        };
        Self {
            was_solved: session.tree().is_solved(),
            display: PuzzleDisplay::new(session),
            theme: Theme::default(),
            source,
            scroll_top: 0,
            should_quit: false,
            status_message: initial_status,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn has_status_message(&self) -> bool {
        self.status_message.is_some()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message
            && instant.elapsed() > STATUS_TIMEOUT
        {
            self.status_message = None;
        }
    }

    /// Announces the moment the last bracket gets a guess.
    fn after_change(&mut self) {
        let solved = self.display.tree().is_solved();
        if solved && !self.was_solved {
            info!("puzzle solved");
            self.set_status("Every bracket has a guess!");
        }
        self.was_solved = solved;
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let text_area = vertical[0];
        let status_area = vertical[1];

        let width = text_area.width.max(1) as usize;
        let (wrap_width, left_padding) = puzzle_wrap_configuration(width);
        let render = self.display.render(wrap_width, left_padding, &self.theme);
        self.display
            .update_after_render(text_area, render.total_lines);
        let viewport_height = text_area.height as usize;
        self.adjust_scroll(&render, viewport_height);

        let cursor = render.cursor;
        let paragraph = Paragraph::new(Text::from(render.lines))
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        if let Some(cursor) = cursor
            && cursor.line >= self.scroll_top
            && cursor.line < self.scroll_top + viewport_height
            && text_area.width > 0
        {
            let cursor_y = text_area.y + (cursor.line - self.scroll_top) as u16;
            let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
            frame.set_cursor_position(Position::new(cursor_x, cursor_y));
        }

        let status_line = self.status_line(status_area.width as usize);
        let status_widget = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::NONE))
            .style(self.theme.status_bar_style());
        frame.render_widget(status_widget, status_area);
    }

    fn status_line(&mut self, terminal_width: usize) -> Line<'static> {
        self.prune_status_message();

        let (guessed, total) = self.display.tree().progress();
        let progress = format!("{guessed}/{total}");

        if let Some((message, _)) = &self.status_message {
            return Line::from(vec![
                Span::styled(format!("{progress} "), self.theme.progress_style()),
                Span::raw(message.clone()),
            ]);
        }

        let undo_steps = self.display.history().len().saturating_sub(1);
        let editing = self.display.is_editing();

        // Shortcuts ordered from least to most important
        let all_shortcuts: Vec<&str> = if editing {
            vec!["Esc:Cancel", "Enter:Done", "^Q:Quit"]
        } else {
            vec!["^R:Reload", "u:Undo", "^Q:Quit"]
        };

        let mut spans = vec![
            Span::styled(progress, self.theme.progress_style()),
            Span::raw(" "),
            Span::raw(self.source.label()),
            Span::raw(format!(", {undo_steps} undo steps")),
        ];

        let left_width: usize = spans.iter().map(|span| span.content.chars().count()).sum();

        let min_padding = 1;
        let mut shortcuts_to_show = Vec::new();
        let mut shortcuts_width = 0;

        // Most important first; stop at the first one that no longer fits.
        for shortcut in all_shortcuts.iter().rev() {
            let test_width = if shortcuts_to_show.is_empty() {
                shortcut.chars().count()
            } else {
                shortcuts_width + 1 + shortcut.chars().count()
            };
            if left_width + min_padding + test_width <= terminal_width {
                shortcuts_to_show.insert(0, *shortcut);
                shortcuts_width = test_width;
            } else {
                break;
            }
        }

        if !shortcuts_to_show.is_empty() {
            let padding_needed = terminal_width
                .saturating_sub(left_width)
                .saturating_sub(shortcuts_width)
                .max(min_padding);
            spans.push(Span::raw(" ".repeat(padding_needed)));
            spans.push(Span::raw(shortcuts_to_show.join(" ")));
        }

        Line::from(spans)
    }

    fn adjust_scroll(&mut self, render: &RenderResult, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = render.total_lines.saturating_sub(viewport);
        if let Some(cursor) = render.cursor {
            self.scroll_top = self.scroll_top_for_cursor(cursor.line, viewport, max_scroll);
        }
        if self.scroll_top > max_scroll {
            self.scroll_top = max_scroll;
        }
    }

    fn scroll_top_for_cursor(
        &self,
        cursor_line: usize,
        viewport: usize,
        max_scroll: usize,
    ) -> usize {
        let mut scroll = self.scroll_top.min(max_scroll);
        if cursor_line < scroll {
            scroll = cursor_line;
        } else if cursor_line >= scroll.saturating_add(viewport) {
            scroll = cursor_line.saturating_sub(viewport.saturating_sub(1));
        }
        scroll.min(max_scroll)
    }

    fn scroll_by_lines(&mut self, delta: isize) -> bool {
        let viewport = self.display.last_view_height().max(1);
        let max_scroll = self.display.last_total_lines().saturating_sub(viewport) as isize;
        let new_scroll = (self.scroll_top as isize + delta).clamp(0, max_scroll.max(0)) as usize;
        let changed = new_scroll != self.scroll_top;
        self.scroll_top = new_scroll;
        changed
    }

    fn reload(&mut self) {
        if let Err(err) = self.source.reload() {
            warn!("reload failed: {err:#}");
            self.set_status(format!("Reload failed: {err:#}"));
            return;
        }
        self.display.load_puzzle(&self.source.text);
        self.scroll_top = 0;
        self.was_solved = self.display.tree().is_solved();
        self.set_status("Puzzle reloaded");
    }

    fn handle_mouse_event(&mut self, event: MouseEvent, now: Instant) -> bool {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll_by_lines(-(MOUSE_SCROLL_LINES as isize)),
            MouseEventKind::ScrollDown => self.scroll_by_lines(MOUSE_SCROLL_LINES as isize),
            MouseEventKind::Moved => {
                self.display
                    .hover_at(event.column, event.row, self.scroll_top)
            }
            MouseEventKind::Down(MouseButton::Left) => self.handle_mouse_down(event, now),
            _ => false,
        }
    }

    fn handle_mouse_down(&mut self, event: MouseEvent, now: Instant) -> bool {
        let target = self
            .display
            .node_from_mouse(event.column, event.row, self.scroll_top);
        let editing = self.display.editing().map(|edit| edit.id());
        match target {
            // Clicking into the open field keeps it open.
            Some(id) if editing == Some(id) => false,
            Some(id) => self.display.activate(id, now),
            None => self.display.focus_lost(),
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Enter => return self.display.commit_edit(),
            KeyCode::Esc => return self.display.cancel_edit(),
            _ => {}
        }
        let Some(edit) = self.display.editing_mut() else {
            return false;
        };
        match code {
            KeyCode::Backspace => edit.backspace(),
            KeyCode::Delete => edit.delete(),
            KeyCode::Left => edit.move_left(),
            KeyCode::Right => edit.move_right(),
            KeyCode::Home => {
                edit.move_home();
                true
            }
            KeyCode::End => {
                edit.move_end();
                true
            }
            KeyCode::Char(ch)
                if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                edit.insert_char(ch);
                true
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match (code, modifiers) {
            (KeyCode::Char('q'), m) | (KeyCode::Char('c'), m)
                if m.contains(KeyModifiers::CONTROL) =>
            {
                self.should_quit = true;
                false
            }
            (KeyCode::Char('z'), m) if m.contains(KeyModifiers::CONTROL) => self.display.undo(),
            (KeyCode::Char('r'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.reload();
                true
            }
            _ if self.display.is_editing() => self.handle_edit_key(code, modifiers),
            (KeyCode::Char('u'), m) if !m.contains(KeyModifiers::CONTROL) => self.display.undo(),
            (KeyCode::Up, _) => self.scroll_by_lines(-1),
            (KeyCode::Down, _) => self.scroll_by_lines(1),
            (KeyCode::PageUp, _) => {
                let page = self.display.last_view_height() as isize;
                self.scroll_by_lines(-page)
            }
            (KeyCode::PageDown, _) => {
                let page = self.display.last_view_height() as isize;
                self.scroll_by_lines(page)
            }
            _ => false,
        }
    }

    /// Returns whether the screen needs to be redrawn.
    fn handle_event(&mut self, event: Event, now: Instant) -> Result<bool> {
        let changed = match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse, now),
            Event::FocusLost => self.display.focus_lost(),
            _ => false,
        };
        if changed {
            self.after_change();
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_terminals_use_the_full_width() {
        assert_eq!(puzzle_wrap_configuration(0), (1, 0));
        assert_eq!(puzzle_wrap_configuration(30), (30, 0));
    }

    #[test]
    fn medium_terminals_get_a_small_margin() {
        assert_eq!(puzzle_wrap_configuration(60), (56, 2));
    }

    #[test]
    fn wide_terminals_center_the_text() {
        let (wrap_width, left_padding) = puzzle_wrap_configuration(120);
        assert_eq!(left_padding, 24);
        assert_eq!(wrap_width, 72);
    }

    #[test]
    fn raw_text_is_kept_verbatim() {
        assert_eq!(prepare("  a → [b] ", true), "  a → [b] ");
        assert_eq!(prepare("  a → [b] ", false), "[b]");
    }

    #[test]
    fn args_parse_defaults() {
        let args = Args::parse_from(["bracket", "puzzle.txt"]);
        assert_eq!(args.file, Some(PathBuf::from("puzzle.txt")));
        assert_eq!(args.double_click_ms, 250);
        assert!(!args.raw);
        assert!(args.log_file.is_none());
    }
}
