use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::projection::Instruction;
use crate::puzzle::NodeId;
use crate::session::EditSession;
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

/// Columns `start..end` of `line` belong to bracket `id`. Every column is
/// owned by the innermost bracket drawn there, so regions never overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitRegion {
    pub line: usize,
    pub start: u16,
    pub end: u16,
    pub id: NodeId,
}

impl HitRegion {
    pub fn contains(&self, line: usize, column: u16) -> bool {
        self.line == line && column >= self.start && column < self.end
    }
}

/// Interaction state that changes how instructions are drawn without being
/// part of the projection.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOverlay<'a> {
    pub hovered: Option<NodeId>,
    pub editing: Option<&'a EditSession>,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    pub regions: Vec<HitRegion>,
}

impl RenderResult {
    pub fn node_at(&self, line: usize, column: u16) -> Option<NodeId> {
        node_at(&self.regions, line, column)
    }
}

/// The bracket owning `column` of `line`, if any.
pub fn node_at(regions: &[HitRegion], line: usize, column: u16) -> Option<NodeId> {
    regions
        .iter()
        .find(|region| region.contains(line, column))
        .map(|region| region.id)
}

pub fn render_instructions(
    instructions: &[Instruction],
    width: usize,
    left_padding: usize,
    overlay: RenderOverlay<'_>,
    theme: &Theme,
) -> RenderResult {
    let mut renderer = Renderer::new(width.max(1), left_padding, overlay, theme);
    renderer.render(instructions);
    renderer.finish()
}

struct Renderer<'a> {
    wrap_width: usize,
    prefix: String,
    overlay: RenderOverlay<'a>,
    theme: &'a Theme,
    fragments: Vec<FragmentItem>,
    cursor: Option<CursorVisualPosition>,
    lines: Vec<Line<'static>>,
    regions: Vec<HitRegion>,
}

impl<'a> Renderer<'a> {
    fn new(
        wrap_width: usize,
        left_padding: usize,
        overlay: RenderOverlay<'a>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            wrap_width: wrap_width.saturating_add(left_padding),
            prefix: " ".repeat(left_padding),
            overlay,
            theme,
            fragments: Vec::new(),
            cursor: None,
            lines: Vec::new(),
            regions: Vec::new(),
        }
    }

    fn render(&mut self, instructions: &[Instruction]) {
        self.collect(instructions, self.theme.clue_style(), None);
        let fragments = std::mem::take(&mut self.fragments);
        let lines = wrap_fragments(&fragments, &self.prefix, self.wrap_width);
        self.consume_lines(lines);
    }

    fn collect(&mut self, instructions: &[Instruction], style: Style, owner: Option<NodeId>) {
        for instruction in instructions {
            match instruction {
                Instruction::Text(content) => {
                    tokenize_text(content, style, owner, &mut self.fragments);
                }
                Instruction::Solved { id, word, status } => {
                    if self.push_input_field(*id) {
                        continue;
                    }
                    let guess_style = style.patch(self.theme.guess_style(*status));
                    tokenize_text(word, guess_style, Some(*id), &mut self.fragments);
                }
                Instruction::Clue { id, children } => {
                    if self.push_input_field(*id) {
                        continue;
                    }
                    let mut inner = style;
                    if self.overlay.hovered == Some(*id) {
                        inner = inner.patch(self.theme.hover_style());
                    }
                    let delimiter = style.patch(self.theme.delimiter_style());
                    self.push_delimiter("[", delimiter, *id);
                    self.collect(children, inner, Some(*id));
                    self.push_delimiter("]", delimiter, *id);
                }
            }
        }
    }

    fn push_delimiter(&mut self, text: &str, style: Style, id: NodeId) {
        self.fragments.push(FragmentItem::Token(Fragment {
            text: text.to_string(),
            style,
            kind: FragmentKind::Word,
            width: visible_width(text),
            owner: Some(id),
            events: Vec::new(),
        }));
    }

    /// Draws the open input field in place of bracket `id`. The field is one
    /// unbreakable token with a trailing cell for the cursor.
    fn push_input_field(&mut self, id: NodeId) -> bool {
        let Some(edit) = self.overlay.editing.filter(|edit| edit.id() == id) else {
            return false;
        };
        let text: String = edit
            .buffer()
            .chars()
            .map(|ch| if ch == '\n' || ch == '\t' { ' ' } else { ch })
            .chain(std::iter::once(' '))
            .collect();
        let cursor_offset: usize = edit
            .buffer()
            .chars()
            .take(edit.cursor())
            .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
            .sum();
        self.fragments.push(FragmentItem::Token(Fragment {
            width: visible_width(&text),
            text,
            style: self.theme.input_style(),
            kind: FragmentKind::Word,
            owner: Some(id),
            events: vec![TextEvent {
                offset: cursor_offset,
            }],
        }));
        true
    }

    fn consume_lines(&mut self, outputs: Vec<LineOutput>) {
        for output in outputs {
            let line_index = self.lines.len();
            let mut spans: Vec<Span<'static>> = Vec::with_capacity(output.spans.len());
            let mut column = 0usize;
            for segment in output.spans {
                let width = visible_width(&segment.text);
                if let Some(id) = segment.owner {
                    self.push_region(line_index, column, column + width, id);
                }
                column += width;
                spans.push(Span::styled(segment.text, segment.style));
            }
            if let Some(event) = output.events.first() {
                self.cursor = Some(CursorVisualPosition {
                    line: line_index,
                    column: event.column,
                });
            }
            self.lines.push(Line::from(spans));
        }
    }

    /// Extends the previous region when the same bracket continues on the
    /// same line.
    fn push_region(&mut self, line: usize, start: usize, end: usize, id: NodeId) {
        if end <= start {
            return;
        }
        let start = start.min(u16::MAX as usize) as u16;
        let end = end.min(u16::MAX as usize) as u16;
        if let Some(last) = self.regions.last_mut()
            && last.line == line
            && last.id == id
            && last.end == start
        {
            last.end = end;
            return;
        }
        self.regions.push(HitRegion {
            line,
            start,
            end,
            id,
        });
    }

    fn finish(mut self) -> RenderResult {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        let total_lines = self.lines.len();

        RenderResult {
            lines: self.lines,
            cursor: self.cursor,
            total_lines,
            regions: self.regions,
        }
    }
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
    owner: Option<NodeId>,
}

#[derive(Clone)]
struct LineOutput {
    spans: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
}

#[derive(Clone, Copy)]
struct LocatedEvent {
    column: u16,
}

#[derive(Clone)]
struct Fragment {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
    owner: Option<NodeId>,
    events: Vec<TextEvent>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    Word,
    Whitespace,
}

#[derive(Clone)]
enum FragmentItem {
    Token(Fragment),
    LineBreak,
}

/// Cursor position inside a fragment, in columns.
#[derive(Clone)]
struct TextEvent {
    offset: usize,
}

fn tokenize_text(
    text: &str,
    style: Style,
    owner: Option<NodeId>,
    fragments: &mut Vec<FragmentItem>,
) {
    let mut builder: Option<TokenBuilder> = None;
    for ch in text.chars() {
        if ch == '\r' {
            continue;
        }
        if ch == '\n' {
            if let Some(token) = builder.take() {
                fragments.push(FragmentItem::Token(token.finish()));
            }
            fragments.push(FragmentItem::LineBreak);
            continue;
        }

        let (actual, repeat) = if ch == '\t' { (' ', 4) } else { (ch, 1) };
        for _ in 0..repeat {
            let is_whitespace = actual.is_whitespace();
            if builder
                .as_ref()
                .is_some_and(|existing| existing.kind_matches(is_whitespace))
            {
                if let Some(current) = builder.as_mut() {
                    current.push_char(actual);
                }
            } else {
                if let Some(existing) = builder.take() {
                    fragments.push(FragmentItem::Token(existing.finish()));
                }
                let mut new_builder = TokenBuilder::new(style, owner, is_whitespace);
                new_builder.push_char(actual);
                builder = Some(new_builder);
            }
        }
    }

    if let Some(token) = builder {
        fragments.push(FragmentItem::Token(token.finish()));
    }
}

struct TokenBuilder {
    text: String,
    style: Style,
    owner: Option<NodeId>,
    kind: FragmentKind,
    width: usize,
}

impl TokenBuilder {
    fn new(style: Style, owner: Option<NodeId>, is_whitespace: bool) -> Self {
        Self {
            text: String::new(),
            style,
            owner,
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            text: self.text,
            style: self.style,
            kind: self.kind,
            width: self.width,
            owner: self.owner,
            events: Vec::new(),
        }
    }
}

/// Line-wrapping unit: words with no whitespace between them stay together,
/// so `x[y]` is never split between `x` and `[`.
enum WrapItem {
    Chunk(Vec<Fragment>, usize),
    Whitespace(Fragment),
    LineBreak,
}

fn chunk_fragments(fragments: &[FragmentItem]) -> Vec<WrapItem> {
    let mut items = Vec::new();
    let mut chunk: Vec<Fragment> = Vec::new();
    let mut chunk_width = 0;
    for fragment in fragments {
        match fragment {
            FragmentItem::Token(token) if token.kind == FragmentKind::Word => {
                chunk_width += token.width;
                chunk.push(token.clone());
                continue;
            }
            _ => {}
        }
        if !chunk.is_empty() {
            items.push(WrapItem::Chunk(std::mem::take(&mut chunk), chunk_width));
            chunk_width = 0;
        }
        match fragment {
            FragmentItem::Token(token) => items.push(WrapItem::Whitespace(token.clone())),
            FragmentItem::LineBreak => items.push(WrapItem::LineBreak),
        }
    }
    if !chunk.is_empty() {
        items.push(WrapItem::Chunk(chunk, chunk_width));
    }
    items
}

fn wrap_fragments(fragments: &[FragmentItem], prefix: &str, width: usize) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new(prefix);
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for item in chunk_fragments(fragments) {
        match item {
            WrapItem::LineBreak => {
                builder.consume_pending(&mut pending_whitespace);
                outputs.push(builder.build_line());
                builder = LineBuilder::new(prefix);
            }
            WrapItem::Whitespace(token) => {
                pending_whitespace.push(token);
            }
            WrapItem::Chunk(words, chunk_width) => {
                let whitespace_width: usize =
                    pending_whitespace.iter().map(|item| item.width).sum();
                if builder.has_content()
                    && builder.current_width() + whitespace_width + chunk_width > width
                {
                    builder.consume_pending(&mut pending_whitespace);
                    outputs.push(builder.build_line());
                    builder = LineBuilder::new(prefix);
                }
                builder.consume_pending(&mut pending_whitespace);

                // A chunk wider than a whole line breaks between its words.
                for word in words {
                    if builder.has_content() && builder.current_width() + word.width > width {
                        outputs.push(builder.build_line());
                        builder = LineBuilder::new(prefix);
                    }
                    builder.append_token(word);
                }
            }
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
    width: usize,
    prefix_width: usize,
}

impl LineBuilder {
    fn new(prefix: &str) -> Self {
        let prefix_width = visible_width(prefix);
        let mut segments = Vec::new();
        if !prefix.is_empty() {
            segments.push(LineSegment {
                text: prefix.to_string(),
                style: Style::default(),
                owner: None,
            });
        }
        Self {
            segments,
            events: Vec::new(),
            width: prefix_width,
            prefix_width,
        }
    }

    fn current_width(&self) -> usize {
        self.width
    }

    fn has_content(&self) -> bool {
        self.width > self.prefix_width
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        let start = self.width;
        if !fragment.text.is_empty() {
            self.segments.push(LineSegment {
                text: fragment.text,
                style: fragment.style,
                owner: fragment.owner,
            });
            self.width += fragment.width;
        }

        for event in fragment.events {
            self.events.push(LocatedEvent {
                column: (start + event.offset) as u16,
            });
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
                owner: None,
            });
        }
        self.events.sort_by_key(|event| event.column);
        LineOutput {
            spans: self.segments,
            events: self.events,
        }
    }
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod render_tests;
