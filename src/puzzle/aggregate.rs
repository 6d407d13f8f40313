use super::BracketNode;

/// What the brackets nested inside a bracket look like.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescendantState {
    pub has_bracket_descendants: bool,
    /// Vacuously true when there are no bracket descendants.
    pub all_guessed: bool,
}

impl DescendantState {
    /// A guess only counts as fully resolved once nothing beneath it is
    /// still a clue.
    pub fn is_fully_resolved(&self) -> bool {
        !self.has_bracket_descendants || self.all_guessed
    }
}

/// Walks every bracket below `node` (not `node` itself). Stops at the first
/// unguessed descendant since the answer cannot change after that.
pub fn descendant_state(node: &BracketNode) -> DescendantState {
    let mut descendants = node.descendants().peekable();
    let has_bracket_descendants = descendants.peek().is_some();
    let all_guessed = descendants.all(BracketNode::is_guessed);
    DescendantState {
        has_bracket_descendants,
        all_guessed,
    }
}
