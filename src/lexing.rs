use std::ops::Range;

use logos::Logos;

use crate::error::InvalidRuleReason;

/// Pieces of a rule's right-hand side. Separators only count as such when
/// surrounded by spaces; anywhere else they are plain words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
pub(crate) enum RhsPiece<'a> {
    #[token("|")]
    Bar,
    #[token("||")]
    DoubleBar,
    #[regex(" +")]
    Gap,
    #[regex("[^ ]+", |lex| lex.slice(), priority = 1)]
    Word(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Word<'a> {
    pub(crate) text: &'a str,
    pub(crate) span: Range<usize>,
}

impl<'a> Word<'a> {
    /// `<name>?`
    pub(crate) fn is_optional(&self) -> bool {
        self.text.len() > 2 && self.text.starts_with('<') && self.text.ends_with(">?")
    }

    pub(crate) fn without_marker(&self) -> Word<'a> {
        let text = self.text.strip_suffix('?').unwrap_or(self.text);
        Word {
            text,
            span: self.span.start..self.span.start + text.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawAlternative<'a> {
    pub(crate) words: Vec<Word<'a>>,
    pub(crate) sticky: bool,
}

type LexError = (InvalidRuleReason, Range<usize>);

/// Splits a trimmed right-hand side into alternatives of words. Spans are relative
/// to `rhs`.
pub(crate) fn split_alternatives(
    rhs: &str,
    sticky_rules: bool,
) -> Result<Vec<RawAlternative<'_>>, LexError> {
    let mut pieces = vec![];
    for (piece, span) in RhsPiece::lexer(rhs).spanned() {
        match piece {
            Ok(piece) => pieces.push((piece, span)),
            Err(()) => {
                let text = rhs[span.clone()].to_owned();
                return Err((InvalidRuleReason::UnseparatedTokens(text), span));
            }
        }
    }

    let mut alternatives = vec![];
    let mut current = RawAlternative {
        words: vec![],
        sticky: false,
    };
    let mut in_sticky_group = false;

    for (n, (piece, span)) in pieces.iter().enumerate() {
        let spaced = n > 0
            && matches!(pieces[n - 1].0, RhsPiece::Gap)
            && matches!(pieces.get(n + 1), Some((RhsPiece::Gap, _)));

        match piece {
            RhsPiece::Bar if spaced => {
                close_alternative(&mut alternatives, &mut current, in_sticky_group, span)?;
            }
            RhsPiece::DoubleBar if spaced && sticky_rules => {
                close_alternative(&mut alternatives, &mut current, in_sticky_group, span)?;
                in_sticky_group = true;
            }
            RhsPiece::Bar | RhsPiece::DoubleBar => current.words.push(Word {
                text: &rhs[span.clone()],
                span: span.clone(),
            }),
            RhsPiece::Word(text) => current.words.push(Word {
                text,
                span: span.clone(),
            }),
            RhsPiece::Gap => {
                let between_words = n > 0
                    && !is_separator(&pieces[n - 1].0, sticky_rules)
                    && pieces
                        .get(n + 1)
                        .is_some_and(|(p, _)| !is_separator(p, sticky_rules));
                if span.len() > 1 && between_words {
                    // a doubled space leaves an empty word behind
                    return Err((InvalidRuleReason::EmptyTerminal, span.clone()));
                }
            }
        }
    }
    let end = rhs.len()..rhs.len();
    close_alternative(&mut alternatives, &mut current, in_sticky_group, &end)?;
    Ok(alternatives)
}

fn is_separator(piece: &RhsPiece<'_>, sticky_rules: bool) -> bool {
    match piece {
        RhsPiece::Bar => true,
        RhsPiece::DoubleBar => sticky_rules,
        RhsPiece::Gap | RhsPiece::Word(_) => false,
    }
}

fn close_alternative<'a>(
    alternatives: &mut Vec<RawAlternative<'a>>,
    current: &mut RawAlternative<'a>,
    sticky: bool,
    span: &Range<usize>,
) -> Result<(), LexError> {
    if current.words.is_empty() {
        return Err((InvalidRuleReason::EmptyAlternative, span.clone()));
    }
    let words = std::mem::take(&mut current.words);
    alternatives.push(RawAlternative { words, sticky });
    Ok(())
}

/// Expands every `<name>?` marker into a variant without the symbol and one with
/// it, producing the cross product in that order.
pub(crate) fn expand_optionals<'a>(words: &[Word<'a>]) -> Vec<Vec<Word<'a>>> {
    let Some(pos) = words.iter().position(Word::is_optional) else {
        return vec![words.to_vec()];
    };
    let head = &words[..pos];
    let kept = words[pos].without_marker();
    let tails = expand_optionals(&words[pos + 1..]);

    let without = tails.iter().map(|tail| [head, tail].concat());
    let with = tails.iter().map(|tail| {
        let mut v = head.to_vec();
        v.push(kept.clone());
        v.extend_from_slice(tail);
        v
    });
    without.chain(with).collect()
}

#[cfg(test)]
mod test {
    use insta::assert_compact_debug_snapshot;

    use super::*;

    fn texts(alternatives: &[RawAlternative<'_>]) -> Vec<(Vec<String>, bool)> {
        alternatives
            .iter()
            .map(|a| (a.words.iter().map(|w| w.text.to_owned()).collect(), a.sticky))
            .collect()
    }

    #[test]
    fn pieces() {
        let lexed: Vec<_> = RhsPiece::lexer("a | b||c || <d>").map(Result::unwrap).collect();
        assert_compact_debug_snapshot!(lexed, @r#"[Word("a"), Gap, Bar, Gap, Word("b||c"), Gap, DoubleBar, Gap, Word("<d>")]"#);
    }

    #[test]
    fn split_on_spaced_bars() {
        let alts = split_alternatives("SELECT <c> | a|b | ( <S> )", false).unwrap();
        assert_compact_debug_snapshot!(texts(&alts), @r#"[(["SELECT", "<c>"], false), (["a|b"], false), (["(", "<S>", ")"], false)]"#);
    }

    #[test]
    fn sticky_group() {
        let alts = split_alternatives("a | b || c | d", true).unwrap();
        assert_compact_debug_snapshot!(texts(&alts), @r#"[(["a"], false), (["b"], false), (["c"], true), (["d"], true)]"#);
    }

    #[test]
    fn double_bar_is_a_word_without_sticky_rules() {
        let alts = split_alternatives("a || b", false).unwrap();
        assert_compact_debug_snapshot!(texts(&alts), @r#"[(["a", "||", "b"], false)]"#);
    }

    #[test]
    fn doubled_space_is_an_error() {
        let err = split_alternatives("a  b", false).unwrap_err();
        assert_eq!(err, (InvalidRuleReason::EmptyTerminal, 1..3));
    }

    #[test]
    fn empty_case_is_an_error() {
        let err = split_alternatives("a |  | b", false).unwrap_err();
        assert_eq!(err.0, InvalidRuleReason::EmptyAlternative);
    }

    #[test]
    fn optional_expansion_order() {
        let alts = split_alternatives("<a>? <b>? c", false).unwrap();
        let expanded: Vec<Vec<&str>> = expand_optionals(&alts[0].words)
            .iter()
            .map(|v| v.iter().map(|w| w.text).collect())
            .collect();
        assert_compact_debug_snapshot!(expanded, @r#"[["c"], ["<b>", "c"], ["<a>", "c"], ["<a>", "<b>", "c"]]"#);
    }
}
