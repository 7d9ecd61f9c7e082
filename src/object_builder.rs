//! Builds a value of the caller's type from a parse tree.
//!
//! The tree is walked in post-order over an explicit value stack. Matched text is
//! pushed as [`StackValue::Token`]; each rule node whose name has a registered
//! handler is then reduced by that handler. Rule nodes without a handler leave
//! their children's values where they are. Capture groups are not pushed.

use std::{collections::HashMap, fmt};

use crate::nodes::{NodeKind, ParseNode, ParseNodeVisitor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackValue<T> {
    Token(String),
    Built(T),
}

impl<T> StackValue<T> {
    pub fn token(&self) -> Option<&str> {
        match self {
            StackValue::Token(s) => Some(s),
            StackValue::Built(_) => None,
        }
    }

    pub fn into_built(self) -> Option<T> {
        match self {
            StackValue::Built(t) => Some(t),
            StackValue::Token(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("rule {rule} needs {expected} values on the stack, found {found}")]
    StackUnderflow {
        rule: String,
        expected: usize,
        found: usize,
    },
    #[error("{0}")]
    Invalid(String),
    #[error("building finished without a value")]
    Empty,
}

type StackHandler<T> = Box<dyn FnMut(&mut Vec<StackValue<T>>) -> Result<(), BuildError>>;
type PopHandler<T> = Box<dyn FnMut(Vec<StackValue<T>>) -> Result<T, BuildError>>;

enum Handler<T> {
    Stack(StackHandler<T>),
    Pop { handler: PopHandler<T>, clean: bool },
}

/// Registry from rule names to the handlers reducing them.
pub struct ObjectBuilder<T> {
    handlers: HashMap<String, Handler<T>>,
}

impl<T> Default for ObjectBuilder<T> {
    fn default() -> Self {
        ObjectBuilder {
            handlers: HashMap::new(),
        }
    }
}

impl<T> fmt::Debug for ObjectBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rules: Vec<&String> = self.handlers.keys().collect();
        rules.sort();
        f.debug_struct("ObjectBuilder").field("rules", &rules).finish()
    }
}

impl<T> ObjectBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler that is given the whole stack.
    #[must_use]
    pub fn on_stack(
        mut self,
        rule: impl Into<String>,
        handler: impl FnMut(&mut Vec<StackValue<T>>) -> Result<(), BuildError> + 'static,
    ) -> Self {
        self.handlers
            .insert(rule.into(), Handler::Stack(Box::new(handler)));
        self
    }

    /// Registers a handler that is given the values of the node's children, in
    /// order, and whose result replaces them.
    #[must_use]
    pub fn on_pop(
        self,
        rule: impl Into<String>,
        handler: impl FnMut(Vec<StackValue<T>>) -> Result<T, BuildError> + 'static,
    ) -> Self {
        self.insert_pop(rule.into(), Box::new(handler), false)
    }

    /// Like [`ObjectBuilder::on_pop`], but values of children that are not rule
    /// nodes are dropped before the handler sees them.
    #[must_use]
    pub fn on_pop_clean(
        self,
        rule: impl Into<String>,
        handler: impl FnMut(Vec<StackValue<T>>) -> Result<T, BuildError> + 'static,
    ) -> Self {
        self.insert_pop(rule.into(), Box::new(handler), true)
    }

    fn insert_pop(mut self, rule: String, handler: PopHandler<T>, clean: bool) -> Self {
        self.handlers.insert(rule, Handler::Pop { handler, clean });
        self
    }

    /// Reduces `tree` and returns the value left on top of the stack.
    pub fn build(&mut self, tree: &ParseNode) -> Result<T, BuildError> {
        let mut walker = Walker {
            handlers: &mut self.handlers,
            stack: Vec::new(),
        };
        tree.postfix_accept(&mut walker)?;
        match walker.stack.pop() {
            Some(StackValue::Built(value)) => Ok(value),
            Some(StackValue::Token(text)) => Err(BuildError::Invalid(format!(
                "building finished on the token '{text}'"
            ))),
            None => Err(BuildError::Empty),
        }
    }
}

struct Walker<'b, T> {
    handlers: &'b mut HashMap<String, Handler<T>>,
    stack: Vec<StackValue<T>>,
}

impl<T> ParseNodeVisitor for Walker<'_, T> {
    type Error = BuildError;

    fn visit(&mut self, node: &ParseNode) -> Result<(), BuildError> {
        match node.kind() {
            NodeKind::Capture => Ok(()),
            NodeKind::Leaf => {
                self.stack.push(StackValue::Token(node.token().to_owned()));
                Ok(())
            }
            NodeKind::Rule => match self.handlers.get_mut(node.token()) {
                None => Ok(()),
                Some(Handler::Stack(handler)) => handler(&mut self.stack),
                Some(Handler::Pop { handler, clean }) => {
                    let children = node.children();
                    if self.stack.len() < children.len() {
                        return Err(BuildError::StackUnderflow {
                            rule: node.token().to_owned(),
                            expected: children.len(),
                            found: self.stack.len(),
                        });
                    }
                    let values = self.stack.split_off(self.stack.len() - children.len());
                    let args = values
                        .into_iter()
                        .zip(children)
                        .filter(|(_, child)| !*clean || child.kind() == NodeKind::Rule)
                        .map(|(value, _)| value)
                        .collect();
                    let built = handler(args)?;
                    self.stack.push(StackValue::Built(built));
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::BnfParserBuilder;

    const ARITHMETIC: &str = "
<exp> := <add> | <neg> | <num>
<add> := ( <exp> + <exp> )
<neg> := - <exp>
<num> := ^[0-9]+
";

    fn evaluator() -> ObjectBuilder<i64> {
        ObjectBuilder::new()
            .on_pop("<num>", |args| {
                let text = args[0].token().unwrap_or_default();
                text.parse()
                    .map_err(|e| BuildError::Invalid(format!("{text}: {e}")))
            })
            .on_pop_clean("<add>", |args| {
                let mut sum = 0;
                for value in args {
                    sum += value.into_built().ok_or(BuildError::Empty)?;
                }
                Ok(sum)
            })
            .on_stack("<neg>", |stack| {
                let Some(StackValue::Built(v)) = stack.pop() else {
                    return Err(BuildError::Invalid("expected a number".into()));
                };
                stack.pop();
                stack.push(StackValue::Built(-v));
                Ok(())
            })
    }

    #[test]
    fn evaluates_expression() {
        let parser = BnfParserBuilder::new()
            .add_grammar(ARITHMETIC)
            .unwrap()
            .build()
            .unwrap();
        let tree = parser.parse("( 3 + ( - 4 + 10 ) )").unwrap();
        assert_eq!(evaluator().build(&tree), Ok(9));
    }

    #[test]
    fn token_left_on_top() {
        let tree = ParseNode::rule("<x>").with_child(ParseNode::new("a"));
        let err = ObjectBuilder::<i64>::new().build(&tree).unwrap_err();
        assert_eq!(err, BuildError::Invalid("building finished on the token 'a'".into()));
    }

    #[test]
    fn underflow_is_reported() {
        let tree = ParseNode::rule("<two>")
            .with_child(ParseNode::rule("<eat>").with_child(ParseNode::new("a")))
            .with_child(ParseNode::new("b"));
        let mut builder = ObjectBuilder::<i64>::new()
            .on_stack("<eat>", |stack| {
                stack.clear();
                Ok(())
            })
            .on_pop("<two>", |_| Ok(2));
        insta::assert_snapshot!(builder.build(&tree).unwrap_err(), @"rule <two> needs 2 values on the stack, found 1");
        insta::assert_debug_snapshot!(builder, @r#"
        ObjectBuilder {
            rules: [
                "<eat>",
                "<two>",
            ],
        }
        "#);
    }
}
