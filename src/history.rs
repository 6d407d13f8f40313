use crate::puzzle::PuzzleTree;

/// Linear undo over full tree snapshots.
///
/// The top entry always mirrors the state currently on screen, so undoing
/// drops the top and hands back a copy of the entry beneath it. Entries are
/// owned clones, so nothing a caller does to a returned tree reaches the
/// stack.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<PuzzleTree>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tree: &PuzzleTree) {
        self.snapshots.push(tree.clone());
    }

    /// Steps back one snapshot. A history with one entry or none is left as
    /// it is.
    pub fn undo(&mut self) -> Option<PuzzleTree> {
        if self.snapshots.len() <= 1 {
            return None;
        }
        self.snapshots.pop();
        self.snapshots.last().cloned()
    }

    pub fn reset(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.len() > 1
    }
}
