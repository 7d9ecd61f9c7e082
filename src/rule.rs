use std::{
    collections::HashSet,
    fmt::{self, Display},
};

use crate::{
    alternative::Alternative,
    compiler::{CompileOptions, compile_rule},
    error::InvalidRule,
    token::Token,
};

/// A non-terminal together with the alternatives it can expand to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    lhs: String,
    alternatives: Vec<Alternative>,
}

impl Rule {
    pub fn new(lhs: impl Into<String>, alternatives: Vec<Alternative>) -> Rule {
        Rule {
            lhs: lhs.into(),
            alternatives,
        }
    }

    /// Compiles one grammar line with the default options.
    pub fn parse(line: &str) -> Result<Rule, InvalidRule> {
        compile_rule(line, CompileOptions::default())
    }

    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    /// Alternatives in the order they are tried: ordinary ones first, then try-last
    /// ones, each group keeping its original order.
    pub fn alternatives(&self) -> Vec<&Alternative> {
        let (normal, last): (Vec<_>, Vec<_>) =
            self.alternatives.iter().partition(|a| !a.try_last());
        normal.into_iter().chain(last).collect()
    }

    /// Alternatives in the order they were added.
    pub fn raw_alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn add_alternative(&mut self, alternative: Alternative) {
        self.alternatives.push(alternative);
    }

    /// Inserts at `index`, or appends if `index` is past the end.
    pub fn insert_alternative(&mut self, index: usize, alternative: Alternative) {
        let index = index.min(self.alternatives.len());
        self.alternatives.insert(index, alternative);
    }

    pub fn add_alternatives(&mut self, alternatives: impl IntoIterator<Item = Alternative>) {
        self.alternatives.extend(alternatives);
    }

    /// Inserts all of `alternatives` starting at `index`, keeping their order.
    pub fn insert_alternatives(
        &mut self,
        index: usize,
        alternatives: impl IntoIterator<Item = Alternative>,
    ) {
        let index = index.min(self.alternatives.len());
        self.alternatives.splice(index..index, alternatives);
    }

    pub fn terminal_tokens(&self) -> HashSet<&Token> {
        self.alternatives
            .iter()
            .flat_map(Alternative::terminal_tokens)
            .collect()
    }

    /// Names of referenced rules, in order of first appearance.
    pub fn non_terminals(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.alternatives
            .iter()
            .flat_map(|a| a.iter())
            .filter_map(|t| match t {
                Token::NonTerminal(name) => Some(name.as_str()),
                _ => None,
            })
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} := ", self.lhs)?;
        let mut first = true;
        let mut in_last_group = false;
        for alternative in self.alternatives() {
            if !first {
                if alternative.try_last() && !in_last_group {
                    f.write_str(" || ")?;
                } else {
                    f.write_str(" | ")?;
                }
            }
            in_last_group |= alternative.try_last();
            first = false;
            write!(f, "{alternative}")?;
        }
        Ok(())
    }
}
