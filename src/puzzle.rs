use std::slice;

mod aggregate;
mod parse;

pub use aggregate::{DescendantState, descendant_state};
pub use parse::parse;

/// Identifier of a bracket node, unique within one parsed tree.
pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guess {
    pub word: String,
    pub visible: bool,
}

impl Guess {
    fn shown(word: String) -> Self {
        Self {
            word,
            visible: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Bracket(BracketNode),
}

impl Node {
    pub fn as_bracket(&self) -> Option<&BracketNode> {
        match self {
            Node::Bracket(bracket) => Some(bracket),
            Node::Text(_) => None,
        }
    }
}

/// A bracketed clue. Its children keep the clue text exactly as parsed; only
/// the guess changes after parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BracketNode {
    id: NodeId,
    children: Vec<Node>,
    guess: Option<Guess>,
}

impl BracketNode {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            children: Vec::new(),
            guess: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn guess(&self) -> Option<&Guess> {
        self.guess.as_ref()
    }

    pub fn guessed_word(&self) -> Option<&str> {
        self.guess.as_ref().map(|guess| guess.word.as_str())
    }

    /// False whenever there is no guess.
    pub fn is_guessed_word_visible(&self) -> bool {
        self.guess.as_ref().is_some_and(|guess| guess.visible)
    }

    pub fn is_guessed(&self) -> bool {
        self.guess.is_some()
    }

    /// Stores `text` as the guess after trimming. Whitespace-only text clears
    /// the guess instead.
    pub fn commit_guess(&mut self, text: &str) {
        let trimmed = text.trim();
        self.guess = if trimmed.is_empty() {
            None
        } else {
            Some(Guess::shown(trimmed.to_string()))
        };
    }

    /// Flips between showing the guess and showing the clue. Returns false
    /// when there is no guess to toggle.
    pub fn toggle_guess_visibility(&mut self) -> bool {
        match self.guess.as_mut() {
            Some(guess) => {
                guess.visible = !guess.visible;
                true
            }
            None => false,
        }
    }

    /// Every bracket nested below this one, in document order.
    pub fn descendants(&self) -> Brackets<'_> {
        Brackets::new(&self.children)
    }
}

/// Root of a parsed puzzle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PuzzleTree {
    children: Vec<Node>,
    bracket_count: usize,
}

impl PuzzleTree {
    pub(crate) fn from_parts(children: Vec<Node>, bracket_count: usize) -> Self {
        Self {
            children,
            bracket_count,
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn bracket_count(&self) -> usize {
        self.bracket_count
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// All brackets in the order their opening delimiter appears.
    pub fn brackets(&self) -> Brackets<'_> {
        Brackets::new(&self.children)
    }

    pub fn bracket(&self, id: NodeId) -> Option<&BracketNode> {
        self.brackets().find(|bracket| bracket.id == id)
    }

    pub fn bracket_mut(&mut self, id: NodeId) -> Option<&mut BracketNode> {
        let mut stack: Vec<&mut Node> = self.children.iter_mut().rev().collect();
        while let Some(node) = stack.pop() {
            let Node::Bracket(bracket) = node else {
                continue;
            };
            if bracket.id == id {
                return Some(bracket);
            }
            stack.extend(bracket.children.iter_mut().rev());
        }
        None
    }

    /// Applies a trimmed guess to the bracket. Returns false for unknown ids.
    pub fn commit_guess(&mut self, id: NodeId, text: &str) -> bool {
        match self.bracket_mut(id) {
            Some(bracket) => {
                bracket.commit_guess(text);
                true
            }
            None => false,
        }
    }

    pub fn toggle_guess_visibility(&mut self, id: NodeId) -> bool {
        self.bracket_mut(id)
            .is_some_and(|bracket| bracket.toggle_guess_visibility())
    }

    /// Number of guessed brackets and total brackets.
    pub fn progress(&self) -> (usize, usize) {
        let guessed = self.brackets().filter(|bracket| bracket.is_guessed()).count();
        (guessed, self.bracket_count)
    }

    pub fn is_solved(&self) -> bool {
        self.brackets().all(BracketNode::is_guessed)
    }

    /// Rebuilds the parsed text with `[` and `]` at every bracket boundary.
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        write_source(&self.children, &mut out);
        out
    }

    /// The text as currently shown: visible guesses replace their clues.
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        write_display(&self.children, &mut out);
        out
    }
}

fn write_source(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(content) => out.push_str(content),
            Node::Bracket(bracket) => {
                out.push('[');
                write_source(&bracket.children, out);
                out.push(']');
            }
        }
    }
}

fn write_display(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(content) => out.push_str(content),
            Node::Bracket(bracket) => match bracket.guess() {
                Some(guess) if guess.visible => out.push_str(&guess.word),
                _ => {
                    out.push('[');
                    write_display(&bracket.children, out);
                    out.push(']');
                }
            },
        }
    }
}

/// Pre-order iterator over bracket nodes.
pub struct Brackets<'a> {
    stack: Vec<slice::Iter<'a, Node>>,
}

impl<'a> Brackets<'a> {
    fn new(nodes: &'a [Node]) -> Self {
        Self {
            stack: vec![nodes.iter()],
        }
    }
}

impl<'a> Iterator for Brackets<'a> {
    type Item = &'a BracketNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(Node::Bracket(bracket)) => {
                    self.stack.push(bracket.children.iter());
                    return Some(bracket);
                }
                Some(Node::Text(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "puzzle_tests.rs"]
mod puzzle_tests;
