use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display},
    io::BufRead,
};

use crate::{
    alternative::Alternative,
    compiler::{CompileOptions, compile_rule},
    error::{BnfError, InvalidRule},
    rule::Rule,
    token::Token,
};

/// An ordered set of rules, at most one per left-hand side.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Grammar {
    rules: Vec<Rule>,
    by_name: HashMap<String, usize>,
}

impl Grammar {
    pub fn new() -> Grammar {
        Grammar::default()
    }

    /// Compiles every rule line of `text`.
    pub fn parse(text: &str, options: CompileOptions) -> Result<Grammar, InvalidRule> {
        let mut grammar = Grammar::new();
        for rule in compile_lines(text.lines(), options)? {
            grammar.add_rule(rule);
        }
        Ok(grammar)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.by_name.get(name).map(|&i| &self.rules[i])
    }

    pub fn rule_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.by_name.get(name).map(|&i| &mut self.rules[i])
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Adds a rule, appending its alternatives to an existing rule with the same
    /// left-hand side if there is one.
    pub fn add_rule(&mut self, rule: Rule) {
        match self.rule_mut(rule.lhs()) {
            Some(existing) => existing.add_alternatives(rule.raw_alternatives().iter().cloned()),
            None => self.push(rule),
        }
    }

    /// Like [`Grammar::add_rule`], but merged alternatives are inserted at `position`
    /// of the existing rule's list.
    pub fn insert_rule(&mut self, position: usize, rule: Rule) {
        match self.rule_mut(rule.lhs()) {
            Some(existing) => {
                existing.insert_alternatives(position, rule.raw_alternatives().iter().cloned());
            }
            None => self.push(rule),
        }
    }

    /// Inserts one alternative into the rule called `name`. Returns `false` if there
    /// is no such rule.
    pub fn add_case_to_rule(&mut self, index: usize, name: &str, case: Alternative) -> bool {
        match self.rule_mut(name) {
            Some(rule) => {
                rule.insert_alternative(index, case);
                true
            }
            None => false,
        }
    }

    fn push(&mut self, rule: Rule) {
        self.by_name.insert(rule.lhs().to_owned(), self.rules.len());
        self.rules.push(rule);
    }

    /// Every terminal used anywhere in the grammar, de-duplicated.
    pub fn terminal_tokens(&self) -> HashSet<&Token> {
        self.rules.iter().flat_map(Rule::terminal_tokens).collect()
    }

    /// The first reference to an undefined rule, as `(referencing rule, missing name)`.
    pub fn dangling_reference(&self) -> Option<(&str, &str)> {
        self.rules.iter().find_map(|rule| {
            rule.non_terminals()
                .into_iter()
                .find(|name| self.rule(name).is_none())
                .map(|name| (rule.lhs(), name))
        })
    }
}

impl FromIterator<Rule> for Grammar {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        let mut g = Self::default();
        g.extend(iter);
        g
    }
}

impl Extend<Rule> for Grammar {
    fn extend<T: IntoIterator<Item = Rule>>(&mut self, iter: T) {
        for rule in iter {
            self.add_rule(rule);
        }
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, rule) in self.rules.iter().enumerate() {
            if n > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}

/// Reads and compiles every rule line from `reader`.
pub fn read_rules(reader: impl BufRead, options: CompileOptions) -> Result<Vec<Rule>, BnfError> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    Ok(compile_lines(lines.iter().map(String::as_str), options)?)
}

fn compile_lines<'a>(
    lines: impl Iterator<Item = &'a str>,
    options: CompileOptions,
) -> Result<Vec<Rule>, InvalidRule> {
    let mut rules = vec![];
    for (n, line) in lines.enumerate() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }
        rules.push(compile_rule(line, options).map_err(|e| e.at_line(n + 1))?);
    }
    Ok(rules)
}

/// Removes everything from the first `#` onwards, regex rules included.
fn strip_comment(line: &str) -> &str {
    line.find('#').map_or(line, |hash| &line[..hash])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::MatchResult;

    const SELECT: &str = "\
# queries
<S> := <selection> | <tablename>
<selection> := SELECT <criterion> FROM <S>   # nested

<criterion> := ^[0-9]+ # digits
<tablename> := ^[a-zA-Z0-9]+
";

    #[test]
    fn reads_lines_and_comments() {
        let grammar = Grammar::parse(SELECT, CompileOptions::default()).unwrap();
        assert_eq!(grammar.len(), 4);
        insta::assert_snapshot!(grammar, @r"
        <S> := <selection> | <tablename>
        <selection> := SELECT <criterion> FROM <S>
        <criterion> := ^[0-9]+
        <tablename> := ^[a-zA-Z0-9]+
        ");
    }

    #[test]
    fn comments_end_every_rule() {
        let grammar = Grammar::parse(
            "<a> := x ; # tail\n<n> := ^[0-9]+   # digits\n  # only a comment",
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(grammar.len(), 2);
        assert_eq!(grammar.rule("<a>").unwrap().to_string(), "<a> := x ;");
        let pattern = &grammar.rule("<n>").unwrap().alternatives()[0][0];
        assert_eq!(pattern.name(), "^[0-9]+");
        assert_eq!(pattern.match_prefix("42"), MatchResult::Matched(2));
    }

    #[test]
    fn error_carries_line_number() {
        let err = Grammar::parse("<a> := b\n\n<c> := x<d>\n", CompileOptions::default()).unwrap_err();
        assert_eq!(err.line_number, Some(3));
        assert_eq!(err.rule, "<c> := x<d>");
    }

    #[test]
    fn merges_by_lhs() {
        let grammar = Grammar::parse("<a> := x\n<b> := y\n<a> := z", CompileOptions::default()).unwrap();
        assert_eq!(grammar.len(), 2);
        assert_eq!(grammar.rule("<a>").unwrap().to_string(), "<a> := x | z");

        let mut inserted = grammar.clone();
        inserted.insert_rule(0, Rule::parse("<a> := p | q").unwrap());
        assert_eq!(inserted.rule("<a>").unwrap().to_string(), "<a> := p | q | x | z");
    }

    #[test]
    fn case_injection() {
        let mut grammar = Grammar::parse("<a> := x", CompileOptions::default()).unwrap();
        let case = Alternative::new(vec![Token::terminal("y")]);
        assert!(grammar.add_case_to_rule(0, "<a>", case.clone()));
        assert!(!grammar.add_case_to_rule(0, "<nope>", case));
        assert_eq!(grammar.to_string(), "<a> := y | x");
    }

    #[test]
    fn diagnostics() {
        let grammar = Grammar::parse(
            "<a> := x <b> | y\n<b> := x | <c>",
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(grammar.dangling_reference(), Some(("<b>", "<c>")));
        assert_eq!(grammar.terminal_tokens().len(), 2);
    }

    #[test]
    fn reader_source() {
        let rules = read_rules(SELECT.as_bytes(), CompileOptions::default()).unwrap();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[1].lhs(), "<selection>");
    }
}
