use crate::puzzle::{BracketNode, Node, NodeId, PuzzleTree, descendant_state};

/// How settled a visible guess is, given the brackets nested inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveStatus {
    /// No sub-brackets, or every sub-bracket has a guess.
    FullyResolved,
    /// At least one sub-bracket is still unguessed.
    PartiallyResolved,
}

/// Display-independent description of what to draw. A `Clue` is drawn as an
/// opening delimiter, its children, and a closing delimiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Text(String),
    Solved {
        id: NodeId,
        word: String,
        status: ResolveStatus,
    },
    Clue {
        id: NodeId,
        children: Vec<Instruction>,
    },
}

impl Instruction {
    pub fn id(&self) -> Option<NodeId> {
        match self {
            Instruction::Text(_) => None,
            Instruction::Solved { id, .. } | Instruction::Clue { id, .. } => Some(*id),
        }
    }
}

pub fn project(tree: &PuzzleTree) -> Vec<Instruction> {
    project_nodes(tree.children())
}

fn project_nodes(nodes: &[Node]) -> Vec<Instruction> {
    nodes.iter().map(project_node).collect()
}

fn project_node(node: &Node) -> Instruction {
    match node {
        Node::Text(content) => Instruction::Text(content.clone()),
        Node::Bracket(bracket) => project_bracket(bracket),
    }
}

fn project_bracket(bracket: &BracketNode) -> Instruction {
    match bracket.guess() {
        Some(guess) if guess.visible => {
            let status = if descendant_state(bracket).is_fully_resolved() {
                ResolveStatus::FullyResolved
            } else {
                ResolveStatus::PartiallyResolved
            };
            Instruction::Solved {
                id: bracket.id(),
                word: guess.word.clone(),
                status,
            }
        }
        _ => Instruction::Clue {
            id: bracket.id(),
            children: project_nodes(bracket.children()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::parse;

    fn clue(id: NodeId, text: &str) -> Instruction {
        Instruction::Clue {
            id,
            children: vec![Instruction::Text(text.to_string())],
        }
    }

    fn solved(id: NodeId, word: &str, status: ResolveStatus) -> Instruction {
        Instruction::Solved {
            id,
            word: word.to_string(),
            status,
        }
    }

    #[test]
    fn fresh_puzzle_projects_to_clues() {
        let tree = parse("The [CAPITAL] of [FRANCE] is [PARIS].");
        assert_eq!(
            project(&tree),
            vec![
                Instruction::Text("The ".into()),
                clue(0, "CAPITAL"),
                Instruction::Text(" of ".into()),
                clue(1, "FRANCE"),
                Instruction::Text(" is ".into()),
                clue(2, "PARIS"),
                Instruction::Text(".".into()),
            ]
        );
    }

    #[test]
    fn guessed_leaf_is_fully_resolved() {
        let mut tree = parse("The [CAPITAL] of [FRANCE] is [PARIS].");
        tree.commit_guess(2, "Paris");
        let projected = project(&tree);
        assert_eq!(projected[1], clue(0, "CAPITAL"));
        assert_eq!(projected[3], clue(1, "FRANCE"));
        assert_eq!(
            projected[5],
            solved(2, "Paris", ResolveStatus::FullyResolved)
        );
    }

    #[test]
    fn nested_status_follows_descendants() {
        let mut tree = parse("[outer [inner] end]");
        tree.commit_guess(0, "X");
        assert_eq!(
            project(&tree),
            vec![solved(0, "X", ResolveStatus::PartiallyResolved)]
        );

        tree.commit_guess(1, "Y");
        assert_eq!(
            project(&tree),
            vec![solved(0, "X", ResolveStatus::FullyResolved)]
        );
    }

    #[test]
    fn hidden_guess_shows_the_clue_with_nested_state() {
        let mut tree = parse("[outer [inner] end]");
        tree.commit_guess(1, "Y");
        tree.commit_guess(0, "X");
        tree.toggle_guess_visibility(0);
        assert_eq!(
            project(&tree),
            vec![Instruction::Clue {
                id: 0,
                children: vec![
                    Instruction::Text("outer ".into()),
                    solved(1, "Y", ResolveStatus::FullyResolved),
                    Instruction::Text(" end".into()),
                ],
            }]
        );
    }

    #[test]
    fn projection_is_repeatable_and_read_only() {
        let mut tree = parse("[a [b] [c [d]]] tail");
        tree.commit_guess(2, "C");
        let before = tree.clone();
        let first = project(&tree);
        let second = project(&tree);
        assert_eq!(first, second);
        assert_eq!(tree, before);
    }

    #[test]
    fn instruction_ids_point_back_to_brackets() {
        let tree = parse("x [a] y");
        let ids: Vec<_> = project(&tree).iter().map(Instruction::id).collect();
        assert_eq!(ids, vec![None, Some(0), None]);
    }
}
