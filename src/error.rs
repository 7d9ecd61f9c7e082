use std::{
    fmt::{self, Display},
    io,
    ops::Range,
};

use ariadne::{Config, Label, Report, ReportKind, Source};
use strum::{EnumDiscriminants, IntoStaticStr};

/// Every way compiling a grammar or parsing an input can fail.
///
/// [`BnfError::ParsingFailed`] is the ordinary outcome for an input the grammar
/// does not describe. `MissingRule` and `MaximumRecursionReached` point at a defect
/// in the grammar (or its configuration) and abort a parse immediately.
#[derive(Debug, thiserror::Error, EnumDiscriminants)]
#[strum_discriminants(name(ErrorKind), derive(Hash, strum::Display, IntoStaticStr))]
pub enum BnfError {
    #[error(transparent)]
    InvalidRule(#[from] InvalidRule),
    #[error("cannot find rule for token {0}")]
    MissingRule(String),
    #[error(
        "maximum recursion steps of {0} reached; if the input string is indeed valid, try increasing the limit"
    )]
    MaximumRecursionReached(usize),
    #[error("parsing failed: the start rule does not match the entire input")]
    ParsingFailed,
    #[error("no start rule could be found: the grammar is empty")]
    NoStartRule,
    #[error("start rule {0} is not defined in the grammar")]
    UnknownStartRule(String),
    #[error("could not read grammar: {0}")]
    Io(#[from] io::Error),
}

impl BnfError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from(self)
    }
}

/// A grammar line that could not be compiled into a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRule {
    /// 1-based line in the grammar source, when the rule came from one.
    pub line_number: Option<usize>,
    pub rule: String,
    /// Byte range inside `rule` that the error is about.
    pub span: Range<usize>,
    pub reason: InvalidRuleReason,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRuleReason {
    #[error("cannot find left- and right-hand side of BNF rule")]
    MissingSeparator,
    #[error("rule contains more than one `:=` separator")]
    MultipleSeparators,
    #[error("left-hand side of BNF rule is empty")]
    EmptyLeftHandSide,
    #[error("right-hand side of BNF rule is empty")]
    EmptyRightHandSide,
    #[error("alternative of BNF rule is empty")]
    EmptyAlternative,
    #[error("trying to create an empty terminal token")]
    EmptyTerminal,
    #[error("the expression '{0}' contains tokens that are not separated by spaces")]
    UnseparatedTokens(String),
    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),
    #[error("malformed \\uxxxx escape in '{0}'")]
    MalformedEscape(String),
}

impl InvalidRule {
    pub(crate) fn new(rule: &str, span: Range<usize>, reason: InvalidRuleReason) -> InvalidRule {
        InvalidRule {
            line_number: None,
            rule: rule.to_owned(),
            span,
            reason,
        }
    }

    #[must_use]
    pub fn at_line(mut self, line_number: usize) -> InvalidRule {
        self.line_number = Some(line_number);
        self
    }

    /// Renders a caret diagnostic pointing into the offending rule text.
    pub fn report(&self) -> String {
        // ariadne counts characters, spans here are bytes
        let to_char = |byte: usize| {
            self.rule
                .get(..byte.min(self.rule.len()))
                .map_or(0, |s| s.chars().count())
        };
        let span = to_char(self.span.start)..to_char(self.span.end);
        let id = match self.line_number {
            Some(n) => format!("line {n}"),
            None => String::from("rule"),
        };

        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, (id.as_str(), span.clone()))
            .with_config(Config::default().with_color(false))
            .with_message(&self.reason)
            .with_label(Label::new((id.as_str(), span)).with_message(self.reason.hint()))
            .finish()
            .write((id.as_str(), Source::from(self.rule.as_str())), &mut out);

        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl Display for InvalidRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(n) => write!(
                f,
                "On line {n}, with rule '{}', encountered error: {}",
                self.rule, self.reason
            ),
            None => write!(
                f,
                "With rule '{}', encountered error: {}",
                self.rule, self.reason
            ),
        }
    }
}

impl std::error::Error for InvalidRule {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

impl InvalidRuleReason {
    fn hint(&self) -> &'static str {
        match self {
            InvalidRuleReason::MissingSeparator => "expected `<name> := ...`",
            InvalidRuleReason::MultipleSeparators => "second `:=` here",
            InvalidRuleReason::EmptyLeftHandSide => "no rule name before `:=`",
            InvalidRuleReason::EmptyRightHandSide => "nothing after `:=`",
            InvalidRuleReason::EmptyAlternative => "empty case",
            InvalidRuleReason::EmptyTerminal => "doubled space",
            InvalidRuleReason::UnseparatedTokens(_) => "separate tokens with a space",
            InvalidRuleReason::InvalidRegex(_) => "pattern does not compile",
            InvalidRuleReason::MalformedEscape(_) => "expected four hex digits",
        }
    }
}
