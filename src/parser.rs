use std::{
    fmt::{self, Display},
    sync::Arc,
};

use log::{Level, LevelFilter};

use crate::{
    alternative::Alternative,
    error::BnfError,
    grammar::Grammar,
    nodes::ParseNode,
    rule::Rule,
    token::Token,
};

const LOG_TARGET: &str = "bnf_interp::parser";

/// Interprets a grammar against input strings by recursive descent with
/// backtracking over each rule's alternatives.
///
/// Cloning is cheap: clones share the same rule set.
#[derive(Debug, Clone)]
pub struct BnfParser {
    grammar: Arc<Grammar>,
    start: usize,
    max_recursion_steps: usize,
    partial_parsing: bool,
    log_level: LevelFilter,
}

/// Outcome of one alternative.
enum Attempt<'i> {
    /// All tokens matched; `rest` is what remains of the input.
    Matched {
        node: ParseNode,
        rest: &'i str,
        read_epsilon: bool,
    },
    Failed,
}

impl BnfParser {
    pub(crate) fn new(
        grammar: Arc<Grammar>,
        start: usize,
        max_recursion_steps: usize,
        partial_parsing: bool,
        log_level: LevelFilter,
    ) -> BnfParser {
        BnfParser {
            grammar,
            start,
            max_recursion_steps,
            partial_parsing,
            log_level,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn start_rule(&self) -> &Rule {
        &self.grammar.rules()[self.start]
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.grammar.rule(name)
    }

    pub fn max_recursion_steps(&self) -> usize {
        self.max_recursion_steps
    }

    pub fn partial_parsing(&self) -> bool {
        self.partial_parsing
    }

    /// Parses the whole of `input` with the start rule.
    pub fn parse(&self, input: &str) -> Result<ParseNode, BnfError> {
        self.try_parse(input)?.ok_or(BnfError::ParsingFailed)
    }

    /// Like [`BnfParser::parse`], but an input the grammar does not describe is
    /// `Ok(None)`. Errors are only returned for defects in the grammar.
    pub fn try_parse(&self, input: &str) -> Result<Option<ParseNode>, BnfError> {
        let mut cursor = input;
        self.parse_rule(self.start_rule(), &mut cursor, 0)
    }

    /// Tries the alternatives of `rule` against `input`, which is advanced past the
    /// consumed text on success and left untouched on failure.
    fn parse_rule<'i>(
        &self,
        rule: &Rule,
        input: &mut &'i str,
        depth: usize,
    ) -> Result<Option<ParseNode>, BnfError> {
        if depth > self.max_recursion_steps {
            return Err(BnfError::MaximumRecursionReached(self.max_recursion_steps));
        }
        self.log(Level::Debug, depth, format_args!("considering '{input}' with rule {rule}"));

        let before: &'i str = *input;
        let mut chosen = None;
        for alternative in rule.alternatives() {
            self.log(Level::Trace, depth, format_args!("alternative {alternative}"));
            match self.parse_alternative(rule.lhs(), alternative, before, depth)? {
                Attempt::Matched { rest, .. } if depth == 0 && !rest.trim().is_empty() => {
                    self.log(
                        Level::Debug,
                        depth,
                        format_args!("'{}' left over after {alternative}", rest.trim()),
                    );
                }
                Attempt::Matched {
                    node,
                    rest,
                    read_epsilon,
                } => {
                    chosen = Some((node, rest, read_epsilon));
                    break;
                }
                Attempt::Failed => {}
            }
        }

        let Some((node, rest, read_epsilon)) = chosen else {
            self.log(Level::Debug, depth, format_args!("FAILED: no alternative of {} matched", rule.lhs()));
            return Ok(None);
        };
        if rest.len() == before.len() && !read_epsilon {
            self.log(
                Level::Debug,
                depth,
                format_args!("FAILED: {} matched without consuming input", rule.lhs()),
            );
            return Ok(None);
        }
        *input = rest;
        Ok(Some(node))
    }

    fn parse_alternative<'i>(
        &self,
        lhs: &str,
        alternative: &Alternative,
        input: &'i str,
        depth: usize,
    ) -> Result<Attempt<'i>, BnfError> {
        let mut node = ParseNode::rule(lhs);
        let mut cursor = input;

        for token in alternative.iter() {
            cursor = cursor.trim_start();
            match token {
                Token::Epsilon => {
                    node.push_child(ParseNode::new(""));
                    // the alternative counts as complete, whatever follows
                    return Ok(Attempt::Matched {
                        node,
                        rest: cursor,
                        read_epsilon: true,
                    });
                }
                Token::NonTerminal(name) => {
                    if self.partial_parsing && cursor.starts_with(name.as_str()) {
                        cursor = &cursor[name.len()..];
                        node.push_child(ParseNode::new(name.as_str()));
                        continue;
                    }
                    let Some(rule) = self.grammar.rule(name) else {
                        return Err(BnfError::MissingRule(name.clone()));
                    };
                    match self.parse_rule(rule, &mut cursor, depth + 1)? {
                        Some(child) => node.push_child(child),
                        None => {
                            self.log(
                                Level::Debug,
                                depth,
                                format_args!("FAILED: {name} in {alternative}"),
                            );
                            return Ok(Attempt::Failed);
                        }
                    }
                }
                terminal => {
                    if cursor.is_empty() {
                        return Ok(Attempt::Failed);
                    }
                    let Some(len) = terminal.match_prefix(cursor).consumed() else {
                        self.log(
                            Level::Trace,
                            depth,
                            format_args!("FAILED: {terminal} does not match in {alternative}"),
                        );
                        return Ok(Attempt::Failed);
                    };
                    let (matched, rest) = cursor.split_at(len);
                    let mut leaf = ParseNode::new(matched);
                    for group in terminal.capture_groups(matched) {
                        leaf.push_child(ParseNode::capture(group));
                    }
                    node.push_child(leaf);
                    cursor = rest;
                }
            }
        }
        Ok(Attempt::Matched {
            node,
            rest: cursor,
            read_epsilon: false,
        })
    }

    fn log(&self, level: Level, depth: usize, message: fmt::Arguments<'_>) {
        if level <= self.log_level {
            log::log!(target: LOG_TARGET, level, "{:indent$}{message}", "", indent = depth * 2);
        }
    }
}

impl Display for BnfParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grammar)
    }
}
