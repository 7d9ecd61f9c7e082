use std::{
    fmt::{self, Debug, Display},
    hash::{Hash, Hasher},
    sync::LazyLock,
};

use regex::Regex;
use strum::{EnumDiscriminants, IntoStaticStr};

/// Canonical spelling of the empty-string token.
pub const EPSILON: &str = "\u{03B5}";

/// Both code points that have been used for a lowercase epsilon in grammar files.
pub(crate) const EPSILON_SPELLINGS: [&str; 2] = ["\u{03B5}", "\u{CEB5}"];

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .unwrap_or_else(|e| unreachable!("number pattern is valid: {e}"))
});

/// How a token relates to the front of the remaining input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    /// The input ends before a literal could be compared in full.
    InsufficientInput,
    /// The first `n` bytes of the input belong to the token.
    Matched(usize),
}

impl MatchResult {
    /// Number of bytes to consume, if the match is strictly positive.
    pub fn consumed(self) -> Option<usize> {
        match self {
            MatchResult::Matched(n) if n > 0 => Some(n),
            _ => None,
        }
    }
}

/// A grammar symbol.
#[derive(Clone, EnumDiscriminants)]
#[strum_discriminants(name(TokenKind), derive(Hash, IntoStaticStr))]
pub enum Token {
    Terminal(Terminal),
    Epsilon,
    /// Reference to a rule, named with its angle brackets (`<expr>`).
    NonTerminal(String),
    Regex(RegexTerminal),
    /// Matches a floating-point literal.
    Number(String),
    /// Matches everything up to the next space.
    Text(String),
}

impl Token {
    pub fn terminal(literal: impl Into<String>) -> Token {
        Token::Terminal(Terminal::new(literal))
    }

    pub fn non_terminal(name: impl Into<String>) -> Token {
        Token::NonTerminal(name.into())
    }

    pub fn regex(pattern: &str) -> Result<Token, regex::Error> {
        RegexTerminal::new(pattern).map(Token::Regex)
    }

    pub fn kind(&self) -> TokenKind {
        TokenKind::from(self)
    }

    pub fn name(&self) -> &str {
        match self {
            Token::Terminal(t) => t.literal(),
            Token::Epsilon => EPSILON,
            Token::NonTerminal(name) | Token::Number(name) | Token::Text(name) => name,
            Token::Regex(r) => r.pattern(),
        }
    }

    /// Every kind except a non-terminal is matched directly against input.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Token::NonTerminal(_))
    }

    /// Compares the token against the front of `input`, which the parser has
    /// already stripped of leading whitespace.
    pub fn match_prefix(&self, input: &str) -> MatchResult {
        match self {
            Token::Terminal(t) => t.match_prefix(input),
            Token::Epsilon => MatchResult::Matched(0),
            Token::NonTerminal(_) => MatchResult::NoMatch,
            Token::Regex(r) => r.match_prefix(input),
            Token::Number(_) => NUMBER
                .find(input)
                .map_or(MatchResult::NoMatch, |m| MatchResult::Matched(m.end())),
            Token::Text(_) => MatchResult::Matched(input.find(' ').unwrap_or(input.len())),
        }
    }

    /// The contents of each capture group, for regex terminals only.
    pub fn capture_groups(&self, matched: &str) -> Vec<String> {
        match self {
            Token::Regex(r) => r.capture_groups(matched),
            _ => Vec::new(),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.name() == other.name()
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.name().hash(state);
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind: &'static str = self.kind().into();
        write!(f, "{kind}({:?})", self.name())
    }
}

/// A literal terminal. Equality and hashing only look at the literal.
#[derive(Debug, Clone)]
pub struct Terminal {
    literal: String,
    case_sensitive: bool,
}

impl Terminal {
    pub fn new(literal: impl Into<String>) -> Terminal {
        Terminal {
            literal: literal.into(),
            case_sensitive: true,
        }
    }

    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Terminal {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn match_prefix(&self, input: &str) -> MatchResult {
        let len = self.literal.len();
        if input.len() < len {
            return MatchResult::InsufficientInput;
        }
        let Some(prefix) = input.get(..len) else {
            return MatchResult::NoMatch;
        };
        let equal = if self.case_sensitive {
            prefix == self.literal
        } else {
            prefix.to_lowercase() == self.literal.to_lowercase()
        };
        if equal {
            MatchResult::Matched(len)
        } else {
            MatchResult::NoMatch
        }
    }
}

impl PartialEq for Terminal {
    fn eq(&self, other: &Self) -> bool {
        self.literal == other.literal
    }
}

impl Eq for Terminal {}

impl Hash for Terminal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.literal.hash(state);
    }
}

/// A terminal described by a regular expression, searched (not anchored) in the
/// remaining input.
#[derive(Debug, Clone)]
pub struct RegexTerminal {
    pattern: Regex,
}

impl RegexTerminal {
    pub fn new(pattern: &str) -> Result<RegexTerminal, regex::Error> {
        Ok(RegexTerminal {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Replaces the pattern, recompiling it. On error the old pattern is kept.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<(), regex::Error> {
        self.pattern = Regex::new(pattern)?;
        Ok(())
    }

    pub fn match_prefix(&self, input: &str) -> MatchResult {
        self.pattern
            .find(input)
            .map_or(MatchResult::NoMatch, |m| MatchResult::Matched(m.end()))
    }

    pub fn capture_groups(&self, matched: &str) -> Vec<String> {
        let Some(captures) = self.pattern.captures(matched) else {
            return Vec::new();
        };
        captures
            .iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
            .collect()
    }
}

impl PartialEq for RegexTerminal {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl Eq for RegexTerminal {}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn terminal_prefix() {
        let t = Token::terminal("SELECT");
        assert_eq!(t.match_prefix("SELECT a"), MatchResult::Matched(6));
        assert_eq!(t.match_prefix("select a"), MatchResult::NoMatch);
        assert_eq!(t.match_prefix("SEL"), MatchResult::InsufficientInput);
    }

    #[test]
    fn terminal_ignoring_case() {
        let t = Token::Terminal(Terminal::new("select").case_sensitive(false));
        assert_eq!(t.match_prefix("SELECT a"), MatchResult::Matched(6));
    }

    #[test]
    fn terminal_inside_multibyte_char() {
        let t = Token::terminal("ab");
        assert_eq!(t.match_prefix("a\u{e9}"), MatchResult::NoMatch);
    }

    #[test]
    fn epsilon_matches_nothing() {
        assert_eq!(Token::Epsilon.match_prefix("abc"), MatchResult::Matched(0));
        assert_eq!(Token::Epsilon.match_prefix(""), MatchResult::Matched(0));
        assert_eq!(MatchResult::Matched(0).consumed(), None);
    }

    #[test]
    fn regex_finds_anywhere() {
        let r = Token::regex("[0-9]+").unwrap();
        assert_eq!(r.match_prefix("ab12 c"), MatchResult::Matched(4));
        assert_eq!(r.match_prefix("abc"), MatchResult::NoMatch);

        let anchored = Token::regex("^[0-9]+").unwrap();
        assert_eq!(anchored.match_prefix("ab12"), MatchResult::NoMatch);
    }

    #[test]
    fn regex_capture_groups() {
        let r = Token::regex(r"^(\w+) is a (\w+)").unwrap();
        insta::assert_compact_debug_snapshot!(r.capture_groups("tomato is a fruit"), @r#"["tomato", "fruit"]"#);
        assert!(Token::terminal("x").capture_groups("x").is_empty());
    }

    #[test]
    fn regex_rename_recompiles() {
        let mut r = RegexTerminal::new("a+").unwrap();
        r.set_pattern("b+").unwrap();
        assert_eq!(r.pattern(), "b+");
        assert_eq!(r.match_prefix("bbb"), MatchResult::Matched(3));
        assert!(r.set_pattern("(").is_err());
        assert_eq!(r.pattern(), "b+");
    }

    #[test]
    fn number_and_text() {
        let n = Token::Number("<number>".into());
        assert_eq!(n.match_prefix("3.5 apples"), MatchResult::Matched(3));
        assert_eq!(n.match_prefix("-2e10"), MatchResult::Matched(5));
        assert_eq!(n.match_prefix("x"), MatchResult::NoMatch);

        let s = Token::Text("<text>".into());
        assert_eq!(s.match_prefix("hello world"), MatchResult::Matched(5));
        assert_eq!(s.match_prefix("hello"), MatchResult::Matched(5));
    }

    #[test]
    fn terminals_deduplicate_by_literal() {
        let set: HashSet<Token> = [
            Token::terminal("a"),
            Token::Terminal(Terminal::new("a").case_sensitive(false)),
            Token::terminal("A"),
            Token::non_terminal("a"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 3);
    }
}
