use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::history::History;
use crate::projection::{Instruction, project};
use crate::puzzle::{NodeId, PuzzleTree, parse};

pub const DEFAULT_DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a first activation waits for a second one before it is
    /// handled as a single activation.
    pub double_click_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            double_click_window: DEFAULT_DOUBLE_CLICK_WINDOW,
        }
    }
}

impl SessionConfig {
    pub fn with_double_click_window(mut self, window: Duration) -> Self {
        self.double_click_window = window;
        self
    }
}

/// Text typed into the input field of a bracket. Nothing reaches the tree
/// until the session is committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    id: NodeId,
    prior: Option<String>,
    buffer: String,
    /// Cursor position in chars.
    cursor: usize,
}

impl EditSession {
    fn new(id: NodeId, prior: Option<String>) -> Self {
        let buffer = prior.clone().unwrap_or_default();
        let cursor = buffer.chars().count();
        Self {
            id,
            prior,
            buffer,
            cursor,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The guess the field was seeded with, if it was opened for correction.
    pub fn prior(&self) -> Option<&str> {
        self.prior.as_deref()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert_char(&mut self, ch: char) {
        let byte_idx = self.byte_index(self.cursor);
        self.buffer.insert(byte_idx, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let byte_idx = self.byte_index(self.cursor);
        self.buffer.remove(byte_idx);
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let byte_idx = self.byte_index(self.cursor);
        self.buffer.remove(byte_idx);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn set_buffer(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.char_len();
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(idx, _)| idx)
            .unwrap_or(self.buffer.len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    /// A first activation is waiting to see whether a second one follows.
    AwaitingDoubleClick { id: NodeId, deadline: Instant },
    Editing(EditSession),
}

/// One loaded puzzle together with its undo history and the interaction
/// state machine that edits it.
///
/// Event methods return `true` when the visible output changed and the
/// caller should redraw. Time is passed in by the caller so that the
/// double-click window is checked against the event loop's clock.
#[derive(Debug)]
pub struct PuzzleSession {
    config: SessionConfig,
    tree: PuzzleTree,
    history: History,
    state: InteractionState,
    hovered: Option<NodeId>,
    projection: Vec<Instruction>,
}

impl Default for PuzzleSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl PuzzleSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            tree: PuzzleTree::default(),
            history: History::new(),
            state: InteractionState::Idle,
            hovered: None,
            projection: Vec::new(),
        }
    }

    pub fn with_puzzle(config: SessionConfig, text: &str) -> Self {
        let mut session = Self::new(config);
        session.load_puzzle(text);
        session
    }

    /// Replaces the live tree with a fresh parse and starts a new history
    /// whose only entry is the unsolved puzzle.
    pub fn load_puzzle(&mut self, text: &str) {
        self.tree = parse(text);
        self.history.reset();
        self.history.push(&self.tree);
        self.state = InteractionState::Idle;
        self.hovered = None;
        self.refresh_projection();
        info!(brackets = self.tree.bracket_count(), "puzzle loaded");
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tree(&self) -> &PuzzleTree {
        &self.tree
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn projection(&self) -> &[Instruction] {
        &self.projection
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn editing(&self) -> Option<&EditSession> {
        match &self.state {
            InteractionState::Editing(edit) => Some(edit),
            _ => None,
        }
    }

    pub fn editing_mut(&mut self) -> Option<&mut EditSession> {
        match &mut self.state {
            InteractionState::Editing(edit) => Some(edit),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, InteractionState::Editing(_))
    }

    /// When the pending single activation fires, if one is pending.
    pub fn pending_deadline(&self) -> Option<Instant> {
        match self.state {
            InteractionState::AwaitingDoubleClick { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// A click on the bracket `id`. The first click only arms the
    /// double-click window; a second click inside the window is a double
    /// activation of the bracket it lands on. Clicking while an input field
    /// is open commits the field first.
    pub fn activate(&mut self, id: NodeId, now: Instant) -> bool {
        // An overdue first click counts as a single activation before this
        // one is looked at.
        let mut changed = self.tick(now);
        if self.tree.bracket(id).is_none() {
            debug!(id, "activation of unknown bracket ignored");
            return changed;
        }

        match self.state {
            InteractionState::Editing(_) => {
                changed |= self.commit_edit();
            }
            InteractionState::AwaitingDoubleClick { .. } => {
                self.state = InteractionState::Idle;
                debug!(id, "double activation");
                return self.double_activate(id);
            }
            InteractionState::Idle => {}
        }

        let deadline = now + self.config.double_click_window;
        self.state = InteractionState::AwaitingDoubleClick { id, deadline };
        debug!(id, "single activation scheduled");
        changed
    }

    /// Fires the pending single activation once its window has elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            InteractionState::AwaitingDoubleClick { id, deadline } if now >= deadline => {
                self.state = InteractionState::Idle;
                debug!(id, "single activation");
                self.single_activate(id)
            }
            _ => false,
        }
    }

    fn single_activate(&mut self, id: NodeId) -> bool {
        let Some(bracket) = self.tree.bracket(id) else {
            debug!(id, "activation of unknown bracket ignored");
            return false;
        };
        if bracket.is_guessed() {
            self.tree.toggle_guess_visibility(id);
            self.snapshot();
        } else {
            self.state = InteractionState::Editing(EditSession::new(id, None));
            debug!(id, "editing new guess");
        }
        true
    }

    fn double_activate(&mut self, id: NodeId) -> bool {
        let Some(word) = self
            .tree
            .bracket(id)
            .and_then(|bracket| bracket.guessed_word())
        else {
            return false;
        };
        self.state = InteractionState::Editing(EditSession::new(id, Some(word.to_string())));
        debug!(id, "correcting guess");
        true
    }

    /// Applies the open input field to its bracket. Does nothing when no
    /// field is open, so a commit that follows another commit is harmless.
    pub fn commit_edit(&mut self) -> bool {
        let InteractionState::Editing(edit) =
            std::mem::replace(&mut self.state, InteractionState::Idle)
        else {
            return false;
        };
        if !self.tree.commit_guess(edit.id, &edit.buffer) {
            debug!(id = edit.id, "commit for unknown bracket ignored");
            return true;
        }
        debug!(
            id = edit.id,
            cleared = edit.buffer.trim().is_empty(),
            "guess committed"
        );
        self.snapshot();
        true
    }

    /// Closes the input field without touching the tree.
    pub fn cancel_edit(&mut self) -> bool {
        if !self.is_editing() {
            return false;
        }
        self.state = InteractionState::Idle;
        debug!("edit cancelled");
        true
    }

    /// Losing focus commits the open field, at most once per field.
    pub fn focus_lost(&mut self) -> bool {
        self.commit_edit()
    }

    /// Returns to the previous snapshot. An open input field is committed
    /// first, the same as when it loses focus to the undo control.
    pub fn undo(&mut self) -> bool {
        let committed = self.commit_edit();
        match self.history.undo() {
            Some(previous) => {
                self.tree = previous;
                self.refresh_projection();
                info!(remaining = self.history.len(), "undo");
                true
            }
            None => committed,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.is_editing()
    }

    /// Hover is display state only; it never reaches the tree or the history.
    pub fn hover(&mut self, id: Option<NodeId>) -> bool {
        if self.hovered == id {
            return false;
        }
        self.hovered = id;
        true
    }

    fn snapshot(&mut self) {
        self.history.push(&self.tree);
        self.refresh_projection();
    }

    fn refresh_projection(&mut self) {
        self.projection = project(&self.tree);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
