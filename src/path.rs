//! Dotted-path lookup of subtrees, e.g. `<S>.<selection>.<criterion>`.
//!
//! Each `.`-separated segment names a node token. The first segment is matched
//! against the root itself and every later one against the children of the nodes
//! selected so far. `name[k]` keeps only the `k`-th (0-based) child called `name`
//! among its siblings, and `*` selects every child.

use crate::nodes::ParseNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'p> {
    Any,
    Named { name: &'p str, index: Option<usize> },
}

impl<'p> Segment<'p> {
    fn parse(text: &'p str) -> Segment<'p> {
        if text == "*" {
            return Segment::Any;
        }
        let indexed = text
            .strip_suffix(']')
            .and_then(|t| t.rsplit_once('['))
            .and_then(|(name, k)| Some((name, k.parse().ok()?)));
        match indexed {
            Some((name, k)) => Segment::Named {
                name,
                index: Some(k),
            },
            None => Segment::Named {
                name: text,
                index: None,
            },
        }
    }

    fn select<'n>(self, siblings: &'n [ParseNode]) -> impl Iterator<Item = &'n ParseNode> {
        let mut seen = 0;
        siblings.iter().filter(move |node| match self {
            Segment::Any => true,
            Segment::Named { name, index } => {
                if node.token() != name {
                    return false;
                }
                seen += 1;
                index.is_none_or(|k| k + 1 == seen)
            }
        })
    }
}

impl ParseNode {
    /// Every node reached by `path`, in tree order.
    pub fn path(&self, path: &str) -> Vec<&ParseNode> {
        let mut segments = path.split('.').map(Segment::parse);
        let mut current: Vec<&ParseNode> = match segments.next() {
            Some(first) => first.select(std::slice::from_ref(self)).collect(),
            None => vec![self],
        };
        for segment in segments {
            current = current
                .into_iter()
                .flat_map(|node| segment.select(node.children()))
                .collect();
        }
        current
    }

    /// The first node reached by `path`.
    pub fn path_first(&self, path: &str) -> Option<&ParseNode> {
        self.path(path).into_iter().next()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tree() -> ParseNode {
        ParseNode::rule("<list>")
            .with_child(ParseNode::rule("<item>").with_child(ParseNode::new("a")))
            .with_child(ParseNode::new(","))
            .with_child(ParseNode::rule("<item>").with_child(ParseNode::new("b")))
            .with_child(ParseNode::new(","))
            .with_child(ParseNode::rule("<item>").with_child(ParseNode::new("c")))
    }

    fn tokens(nodes: &[&ParseNode]) -> Vec<String> {
        nodes.iter().map(|n| n.token().to_owned()).collect()
    }

    #[test]
    fn all_matching_children() {
        let t = tree();
        let found = t.path("<list>.<item>.*");
        insta::assert_compact_debug_snapshot!(tokens(&found), @r#"["a", "b", "c"]"#);
    }

    #[test]
    fn indexed_segment() {
        let t = tree();
        let second = t.path_first("<list>.<item>[1].*").unwrap();
        assert_eq!(second.token(), "b");
        assert!(t.path("<list>.<item>[3]").is_empty());
    }

    #[test]
    fn root_must_match() {
        let t = tree();
        assert!(t.path("<item>").is_empty());
        assert_eq!(t.path("*").len(), 1);
        assert_eq!(t.path("<list>.*").len(), 5);
    }
}
