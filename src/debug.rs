use std::fmt::{self, Formatter};

use display_tree::{AsTree, DisplayTree, Style};

use crate::nodes::{NodeKind, ParseNode};

impl DisplayTree for ParseNode {
    fn fmt(&self, f: &mut Formatter, style: Style) -> fmt::Result {
        let kind: &str = self.kind().into();
        match self.kind() {
            NodeKind::Rule => write!(f, "{} {}", style.leaf_style.apply(kind), self.label())?,
            NodeKind::Leaf | NodeKind::Capture => write!(
                f,
                "{} '{}'",
                style.leaf_style.apply(kind),
                self.token().escape_debug()
            )?,
        }
        if self.children().is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        write_children(f, style, self.children())
    }
}

/// Writes `children` as numbered blocks under their parent. Continuation lines of
/// every block but the last carry a vertical bar.
fn write_children(f: &mut Formatter, style: Style, children: &[ParseNode]) -> fmt::Result {
    let width = children.len().saturating_sub(1).to_string().len();
    let rest = style.indentation as usize - 1;
    let spacer = " ".repeat(rest + 1);
    let vertical = style
        .branch_style
        .apply(&style.char_set.vertical.to_string());

    for (n, child) in children.iter().enumerate() {
        let lead = if n == 0 {
            format!(
                "{}{:rest$}",
                style.char_set.end_connector, style.char_set.horizontal
            )
        } else {
            spacer.clone()
        };
        let bar = if n + 1 < children.len() { vertical.as_str() } else { " " };

        let rendered = AsTree::with_style(child, style).to_string();
        for (i, line) in rendered.lines().enumerate() {
            let line = style.leaf_style.apply(line);
            if i == 0 {
                writeln!(f, "{lead}{n:0width$}: {line}")?;
            } else {
                writeln!(f, "{spacer}{bar} {:width$}{line}", "")?;
            }
        }
    }
    Ok(())
}
