//! Renderers turning a parse tree into text.

use std::{convert::Infallible, fmt::Write};

use strum::{Display, EnumString, IntoStaticStr, VariantNames};

use crate::nodes::{NodeKind, ParseNode, ParseNodeVisitor};

/// Which walk a renderer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Prefix,
    Postfix,
}

/// A visitor that accumulates a textual rendering of the tree it walks.
pub trait OutputFormatVisitor: ParseNodeVisitor<Error = Infallible> {
    fn traversal(&self) -> Traversal;

    fn to_output_string(&self) -> String;
}

/// Walks `tree` in the order `visitor` asks for and returns its output.
pub fn render(visitor: &mut dyn OutputFormatVisitor, tree: &ParseNode) -> String {
    let Ok(()) = match visitor.traversal() {
        Traversal::Prefix => tree.prefix_accept(visitor),
        Traversal::Postfix => tree.postfix_accept(visitor),
    };
    visitor.to_output_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    /// Graphviz
    Dot,
    Xml,
    /// Indented plain text
    Txt,
}

impl OutputFormat {
    pub fn visitor(self) -> Box<dyn OutputFormatVisitor> {
        match self {
            OutputFormat::Dot => Box::new(Graphviz::new()),
            OutputFormat::Xml => Box::new(Xml::new()),
            OutputFormat::Txt => Box::new(IndentedPlainText::new()),
        }
    }

    pub fn render(self, tree: &ParseNode) -> String {
        render(self.visitor().as_mut(), tree)
    }
}

/// One line per node, indented by one space per ancestor.
#[derive(Debug, Default, Clone)]
pub struct IndentedPlainText {
    output: String,
    depth: usize,
}

impl IndentedPlainText {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParseNodeVisitor for IndentedPlainText {
    type Error = Infallible;

    fn visit(&mut self, node: &ParseNode) -> Result<(), Infallible> {
        let depth = self.depth;
        let _ = writeln!(self.output, "{:depth$}{}", "", node.label());
        self.depth += 1;
        Ok(())
    }

    fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl OutputFormatVisitor for IndentedPlainText {
    fn traversal(&self) -> Traversal {
        Traversal::Prefix
    }

    fn to_output_string(&self) -> String {
        self.output.clone()
    }
}

/// A DOT digraph with one statement per node and one per edge.
#[derive(Debug, Default, Clone)]
pub struct Graphviz {
    output: String,
    parents: Vec<usize>,
    node_count: usize,
}

impl Graphviz {
    pub fn new() -> Self {
        Self::default()
    }

    fn escape(label: &str) -> String {
        label.replace('\\', "\\\\").replace('"', "&quot;")
    }
}

impl ParseNodeVisitor for Graphviz {
    type Error = Infallible;

    fn visit(&mut self, node: &ParseNode) -> Result<(), Infallible> {
        let id = self.node_count;
        self.node_count += 1;

        let (fontcolor, fillcolor, shape) = match node.kind() {
            NodeKind::Rule => ("white", "blue", "oval"),
            NodeKind::Leaf => ("black", "white", "rect"),
            NodeKind::Capture => ("black", "lightgrey", "note"),
        };
        let _ = writeln!(
            self.output,
            "  {id} [fontcolor=\"{fontcolor}\",style=\"filled\",fillcolor=\"{fillcolor}\",shape=\"{shape}\",label=\"{}\"];",
            Graphviz::escape(node.label())
        );
        if let Some(parent) = self.parents.last() {
            let _ = writeln!(self.output, "  {parent} -> {id};");
        }
        self.parents.push(id);
        Ok(())
    }

    fn pop(&mut self) {
        self.parents.pop();
    }
}

impl OutputFormatVisitor for Graphviz {
    fn traversal(&self) -> Traversal {
        Traversal::Prefix
    }

    fn to_output_string(&self) -> String {
        format!(
            "# File auto-generated by {}\n\ndigraph G {{\n{}}}\n",
            env!("CARGO_PKG_NAME"),
            self.output
        )
    }
}

/// Nested XML elements. A node with children becomes a "top" element holding a
/// `<name>` and its children, a childless node a "token" element holding its text.
///
/// Built bottom-up: each visited node gathers the fragments its children left.
#[derive(Debug, Clone)]
pub struct Xml {
    top_element: String,
    token_element: String,
    fragments: Vec<String>,
}

impl Default for Xml {
    fn default() -> Self {
        Xml {
            top_element: String::from("node"),
            token_element: String::from("token"),
            fragments: Vec::new(),
        }
    }
}

impl Xml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_top_element_name(&mut self, name: impl Into<String>) {
        self.top_element = name.into();
    }

    pub fn set_token_element_name(&mut self, name: impl Into<String>) {
        self.token_element = name.into();
    }

    fn escape(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&apos;"),
                c => out.push(c),
            }
        }
        out
    }
}

impl ParseNodeVisitor for Xml {
    type Error = Infallible;

    fn visit(&mut self, node: &ParseNode) -> Result<(), Infallible> {
        let split = self.fragments.len().saturating_sub(node.children().len());
        let children = self.fragments.split_off(split);

        let fragment = if children.is_empty() {
            let tag = &self.token_element;
            format!("<{tag}>{}</{tag}>", Xml::escape(node.token()))
        } else {
            let tag = &self.top_element;
            let mut out = format!("<{tag}>\n  <name>{}</name>\n", Xml::escape(node.label()));
            for line in children.iter().flat_map(|c| c.lines()) {
                let _ = writeln!(out, "  {line}");
            }
            let _ = write!(out, "</{tag}>");
            out
        };
        self.fragments.push(fragment);
        Ok(())
    }
}

impl OutputFormatVisitor for Xml {
    fn traversal(&self) -> Traversal {
        Traversal::Postfix
    }

    fn to_output_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        for fragment in &self.fragments {
            out.push_str(fragment);
            out.push('\n');
        }
        out
    }
}
