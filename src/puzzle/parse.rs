use super::{BracketNode, Node, NodeId, PuzzleTree};

/// Builds a puzzle tree from text that uses `[` and `]` as clue delimiters.
///
/// The scan keeps open brackets on an explicit stack, so arbitrarily deep
/// nesting never recurses. A `]` without a matching `[` is dropped and the
/// scan carries on; a `[` that is never closed stays open until the end of
/// the input and takes all remaining text. Parsing never fails.
pub fn parse(text: &str) -> PuzzleTree {
    let mut parser = Parser::new(text);
    parser.run();
    parser.finish()
}

struct Parser<'a> {
    text: &'a str,
    root: Vec<Node>,
    open: Vec<BracketNode>,
    pending_start: usize,
    next_id: NodeId,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            root: Vec::new(),
            open: Vec::new(),
            pending_start: 0,
            next_id: 0,
        }
    }

    fn run(&mut self) {
        for (idx, byte) in self.text.bytes().enumerate() {
            match byte {
                b'[' => {
                    self.flush_text(idx);
                    self.open.push(BracketNode::new(self.next_id));
                    self.next_id += 1;
                    self.pending_start = idx + 1;
                }
                b']' => {
                    self.flush_text(idx);
                    if let Some(closed) = self.open.pop() {
                        self.current_children().push(Node::Bracket(closed));
                    }
                    self.pending_start = idx + 1;
                }
                _ => {}
            }
        }
    }

    fn finish(mut self) -> PuzzleTree {
        self.flush_text(self.text.len());
        while let Some(unclosed) = self.open.pop() {
            self.current_children().push(Node::Bracket(unclosed));
        }
        PuzzleTree::from_parts(self.root, self.next_id)
    }

    /// Text between the last delimiter and `end` becomes a child of the
    /// innermost open bracket.
    fn flush_text(&mut self, end: usize) {
        if end > self.pending_start {
            let content = self.text[self.pending_start..end].to_string();
            self.current_children().push(Node::Text(content));
        }
    }

    fn current_children(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(bracket) => bracket.children_mut(),
            None => &mut self.root,
        }
    }
}
