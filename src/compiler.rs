//! Turns one grammar line into a [`Rule`].
//!
//! A line has the shape `<lhs> := rhs`. A right-hand side starting with `^` is a
//! single regular expression; anything else is a list of alternatives separated by
//! ` | ` (and, with sticky rules enabled, a try-last group after ` || `). Words
//! inside an alternative are split on single spaces: `<name>` is a non-terminal,
//! a lone epsilon is the empty production and every other word is a literal
//! terminal with `\uXXXX` escapes resolved.

use std::ops::Range;

use crate::{
    alternative::Alternative,
    error::{InvalidRule, InvalidRuleReason},
    lexing::{Word, expand_optionals, split_alternatives},
    rule::Rule,
    token::{EPSILON_SPELLINGS, RegexTerminal, Terminal, Token},
};

const SEPARATOR: &str = ":=";

/// Settings that change how grammar text is turned into rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Honour ` || ` as the start of a try-last group.
    pub sticky_rules: bool,
    /// Compare literal terminals case-sensitively.
    pub case_sensitive: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            sticky_rules: false,
            case_sensitive: true,
        }
    }
}

/// Compiles a single rule line. The line must not contain a comment.
pub fn compile_rule(line: &str, options: CompileOptions) -> Result<Rule, InvalidRule> {
    let fail = |span: Range<usize>, reason| InvalidRule::new(line, span, reason);

    let mut separators = line.match_indices(SEPARATOR).map(|(i, _)| i);
    let Some(sep) = separators.next() else {
        return Err(fail(0..line.len(), InvalidRuleReason::MissingSeparator));
    };
    if let Some(second) = separators.next() {
        return Err(fail(
            second..second + SEPARATOR.len(),
            InvalidRuleReason::MultipleSeparators,
        ));
    }

    let lhs = line[..sep].trim();
    if lhs.is_empty() {
        return Err(fail(0..sep, InvalidRuleReason::EmptyLeftHandSide));
    }

    let after = &line[sep + SEPARATOR.len()..];
    let rhs_offset = sep + SEPARATOR.len() + (after.len() - after.trim_start().len());
    let rhs = after.trim();

    if rhs.starts_with('^') {
        let span = rhs_offset..rhs_offset + rhs.len();
        let pattern = unescape(rhs)
            .map_err(|bad| fail(span.clone(), InvalidRuleReason::MalformedEscape(bad)))?;
        let regex = RegexTerminal::new(&pattern)
            .map_err(|e| fail(span, InvalidRuleReason::InvalidRegex(e.to_string())))?;
        let alternative = Alternative::new(vec![Token::Regex(regex)]);
        return Ok(Rule::new(lhs, vec![alternative]));
    }

    if rhs.is_empty() {
        let end = line.len();
        return Err(fail(
            (sep + SEPARATOR.len()).min(end)..end,
            InvalidRuleReason::EmptyRightHandSide,
        ));
    }

    let raw = split_alternatives(rhs, options.sticky_rules).map_err(|(reason, span)| {
        fail(span.start + rhs_offset..span.end + rhs_offset, reason)
    })?;

    let mut alternatives = vec![];
    for group in raw {
        for words in expand_optionals(&group.words) {
            let mut alternative = compile_words(&words, options)
                .map_err(|(reason, span)| {
                    fail(span.start + rhs_offset..span.end + rhs_offset, reason)
                })?;
            alternative.set_try_last(group.sticky);
            alternatives.push(alternative);
        }
    }
    Ok(Rule::new(lhs, alternatives))
}

/// Compiles the text of a single alternative, as used when injecting a case into
/// an existing rule. Separators inside `text` are taken literally.
pub fn compile_alternative(text: &str, options: CompileOptions) -> Result<Alternative, InvalidRule> {
    let words: Vec<Word<'_>> = text
        .trim()
        .split(' ')
        .scan(0, |offset, piece| {
            let start = *offset;
            *offset += piece.len() + 1;
            Some(Word {
                text: piece,
                span: start..start + piece.len(),
            })
        })
        .collect();
    if words.iter().all(|w| w.text.is_empty()) {
        return Err(InvalidRule::new(
            text,
            0..text.len(),
            InvalidRuleReason::EmptyAlternative,
        ));
    }
    compile_words(&words, options)
        .map_err(|(reason, span)| InvalidRule::new(text.trim(), span, reason))
}

fn compile_words(
    words: &[Word<'_>],
    options: CompileOptions,
) -> Result<Alternative, (InvalidRuleReason, Range<usize>)> {
    if words.is_empty() {
        // every symbol was optional and has been left out
        return Ok(Alternative::new(vec![Token::Epsilon]));
    }
    words
        .iter()
        .map(|word| classify(word, options).map_err(|reason| (reason, word.span.clone())))
        .collect::<Result<Vec<_>, _>>()
        .map(Alternative::new)
}

fn classify(word: &Word<'_>, options: CompileOptions) -> Result<Token, InvalidRuleReason> {
    let text = word.text;
    if text.starts_with('<') {
        return Ok(Token::non_terminal(text));
    }
    if text.contains('<') {
        return Err(InvalidRuleReason::UnseparatedTokens(text.to_owned()));
    }
    if EPSILON_SPELLINGS.contains(&text) {
        return Ok(Token::Epsilon);
    }
    if text.is_empty() {
        return Err(InvalidRuleReason::EmptyTerminal);
    }
    let literal = unescape(text).map_err(InvalidRuleReason::MalformedEscape)?;
    Ok(Token::Terminal(
        Terminal::new(literal).case_sensitive(options.case_sensitive),
    ))
}

/// Resolves `\uXXXX` escapes, leaving every other backslash in place. A `\\` pair
/// is kept as-is and never starts an escape. Surrogate pairs written as two escapes
/// are combined; lone surrogates become U+FFFD.
///
/// On a malformed escape, returns the offending text.
pub(crate) fn unescape(text: &str) -> Result<String, String> {
    if !text.contains('\\') {
        return Ok(text.to_owned());
    }
    let mut out = String::with_capacity(text.len());
    let mut units: Vec<u16> = vec![];
    let mut rest = text;

    while let Some(pos) = rest.find('\\') {
        let (before, tail) = rest.split_at(pos);
        if !before.is_empty() {
            flush_units(&mut units, &mut out);
            out.push_str(before);
        }
        if let Some(after) = tail.strip_prefix("\\u") {
            let hex = after.get(..4).filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()));
            let Some(unit) = hex.and_then(|h| u16::from_str_radix(h, 16).ok()) else {
                let shown = tail.get(..6).unwrap_or(tail);
                return Err(shown.to_owned());
            };
            units.push(unit);
            rest = &after[4..];
        } else {
            flush_units(&mut units, &mut out);
            let keep = if tail.starts_with("\\\\") { 2 } else { 1 };
            out.push_str(&tail[..keep]);
            rest = &tail[keep..];
        }
    }
    flush_units(&mut units, &mut out);
    out.push_str(rest);
    Ok(out)
}

fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    out.extend(
        char::decode_utf16(units.drain(..)).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}
