use std::fmt::{self, Display};

use strum::IntoStaticStr;

/// What produced a node of the parse tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum NodeKind {
    /// Expansion of a grammar rule; its token is the rule's left-hand side.
    Rule,
    /// Matched input text, an epsilon (empty token), or in partial parsing a
    /// literal non-terminal marker.
    Leaf,
    /// Text of one capture group of a regex terminal.
    Capture,
}

/// A node of a parse tree. Children are owned exclusively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    token: String,
    value: Option<String>,
    kind: NodeKind,
    children: Vec<ParseNode>,
}

impl ParseNode {
    /// A leaf holding matched text.
    pub fn new(token: impl Into<String>) -> ParseNode {
        ParseNode {
            token: token.into(),
            value: None,
            kind: NodeKind::Leaf,
            children: Vec::new(),
        }
    }

    /// A rule node; its value repeats the left-hand side.
    pub fn rule(lhs: impl Into<String>) -> ParseNode {
        let lhs = lhs.into();
        ParseNode {
            value: Some(lhs.clone()),
            token: lhs,
            kind: NodeKind::Rule,
            children: Vec::new(),
        }
    }

    pub fn capture(text: impl Into<String>) -> ParseNode {
        ParseNode {
            kind: NodeKind::Capture,
            ..ParseNode::new(text)
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: ParseNode) -> ParseNode {
        self.children.push(child);
        self
    }

    pub fn push_child(&mut self, child: ParseNode) {
        self.children.push(child);
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    /// The value if there is one, otherwise the token.
    pub fn label(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.token)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn children(&self) -> &[ParseNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(ParseNode::size).sum::<usize>()
    }

    /// Visits this node, then each child subtree left to right, then leaves it.
    pub fn prefix_accept<V: ParseNodeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit(self)?;
        for child in &self.children {
            child.prefix_accept(visitor)?;
        }
        visitor.pop();
        Ok(())
    }

    /// Visits each child subtree left to right, then this node, then leaves it.
    pub fn postfix_accept<V: ParseNodeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        for child in &self.children {
            child.postfix_accept(visitor)?;
        }
        visitor.visit(self)?;
        visitor.pop();
        Ok(())
    }
}

/// Receives the nodes of a tree walked by [`ParseNode::prefix_accept`] or
/// [`ParseNode::postfix_accept`].
///
/// Each `visit` is matched by exactly one `pop`, issued once the node (post-order)
/// or its whole subtree (pre-order) has been processed. An error from `visit`
/// stops the walk.
pub trait ParseNodeVisitor {
    type Error;

    fn visit(&mut self, node: &ParseNode) -> Result<(), Self::Error>;

    fn pop(&mut self) {}
}

impl Display for ParseNode {
    /// One line per node, indented by one space per level.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter<'_>, node: &ParseNode, depth: usize) -> fmt::Result {
            writeln!(f, "{:depth$}{}", "", node.label())?;
            node.children
                .iter()
                .try_for_each(|child| write_node(f, child, depth + 1))
        }
        write_node(f, self, 0)
    }
}
