use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::Arc,
};

use log::LevelFilter;

use crate::{
    compiler::{CompileOptions, compile_alternative, compile_rule},
    error::BnfError,
    grammar::{Grammar, read_rules},
    parser::BnfParser,
    rule::Rule,
    token::Token,
};

/// Recursion depth a parser allows unless configured otherwise.
pub const DEFAULT_MAX_RECURSION_STEPS: usize = 50;

/// Assembles a [`Grammar`] from text sources and configures the resulting parser.
///
/// Compile options (sticky rules, case sensitivity) apply to the sources added
/// after they are set.
///
/// ```
/// # use bnf_interp::BnfParserBuilder;
/// let parser = BnfParserBuilder::new()
///     .add_grammar("<S> := hello <who>\n<who> := world | there")?
///     .build()?;
/// assert_eq!(parser.parse("hello world")?.size(), 4);
/// # Ok::<(), bnf_interp::BnfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BnfParserBuilder {
    grammar: Grammar,
    start_rule: Option<String>,
    max_recursion_steps: usize,
    partial_parsing: bool,
    options: CompileOptions,
    log_level: LevelFilter,
}

impl Default for BnfParserBuilder {
    fn default() -> Self {
        BnfParserBuilder {
            grammar: Grammar::new(),
            start_rule: None,
            max_recursion_steps: DEFAULT_MAX_RECURSION_STEPS,
            partial_parsing: false,
            options: CompileOptions::default(),
            log_level: LevelFilter::Off,
        }
    }
}

impl BnfParserBuilder {
    pub fn new() -> BnfParserBuilder {
        BnfParserBuilder::default()
    }

    pub fn add_grammar(self, grammar: &str) -> Result<Self, BnfError> {
        self.add_grammar_reader(grammar.as_bytes())
    }

    pub fn add_grammar_reader(mut self, reader: impl BufRead) -> Result<Self, BnfError> {
        let rules = read_rules(reader, self.options)?;
        self.grammar.extend(rules);
        Ok(self)
    }

    pub fn add_grammar_file(self, path: impl AsRef<Path>) -> Result<Self, BnfError> {
        let file = File::open(path)?;
        self.add_grammar_reader(BufReader::new(file))
    }

    /// Compiles a single rule line and adds it.
    pub fn add_rule(mut self, rule: &str) -> Result<Self, BnfError> {
        let rule = compile_rule(rule.trim(), self.options)?;
        self.grammar.add_rule(rule);
        Ok(self)
    }

    #[must_use]
    pub fn add_compiled_rule(mut self, rule: Rule) -> Self {
        self.grammar.add_rule(rule);
        self
    }

    #[must_use]
    pub fn add_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.grammar.extend(rules);
        self
    }

    /// Adds `rule`; if its left-hand side already exists, its alternatives are
    /// inserted at `position` instead of appended.
    #[must_use]
    pub fn insert_rule(mut self, position: usize, rule: Rule) -> Self {
        self.grammar.insert_rule(position, rule);
        self
    }

    /// Puts `case` in front of the existing alternatives of `rule`.
    pub fn add_case_to_rule(self, rule: &str, case: &str) -> Result<Self, BnfError> {
        self.insert_case_to_rule(0, rule, case)
    }

    /// Inserts `case` as a new alternative of `rule` at `index`. Unknown rules are
    /// left alone.
    pub fn insert_case_to_rule(
        mut self,
        index: usize,
        rule: &str,
        case: &str,
    ) -> Result<Self, BnfError> {
        let alternative = compile_alternative(case, self.options)?;
        if !self.grammar.add_case_to_rule(index, rule, alternative) {
            log::warn!("cannot add case '{case}': no rule named {rule}");
        }
        Ok(self)
    }

    /// Rule the parse starts from. Defaults to the first rule added.
    #[must_use]
    pub fn start_rule(mut self, name: impl Into<String>) -> Self {
        self.start_rule = Some(name.into());
        self
    }

    /// Like [`start_rule`](Self::start_rule), taking the non-terminal that names the rule.
    #[must_use]
    pub fn start_token(self, token: &Token) -> Self {
        self.start_rule(token.name())
    }

    /// Zero is ignored.
    #[must_use]
    pub fn max_recursion_steps(mut self, steps: usize) -> Self {
        if steps > 0 {
            self.max_recursion_steps = steps;
        }
        self
    }

    /// Lets the input contain non-terminal markers such as `<A>`, which then match
    /// literally instead of being expanded.
    #[must_use]
    pub fn partial_parsing(mut self, partial_parsing: bool) -> Self {
        self.partial_parsing = partial_parsing;
        self
    }

    #[must_use]
    pub fn sticky_rules(mut self, sticky_rules: bool) -> Self {
        self.options.sticky_rules = sticky_rules;
        self
    }

    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.options.case_sensitive = case_sensitive;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn build(self) -> Result<BnfParser, BnfError> {
        let start = match &self.start_rule {
            Some(name) => self
                .grammar
                .position(name)
                .ok_or_else(|| BnfError::UnknownStartRule(name.clone()))?,
            None if self.grammar.is_empty() => return Err(BnfError::NoStartRule),
            None => 0,
        };
        Ok(BnfParser::new(
            Arc::new(self.grammar),
            start,
            self.max_recursion_steps,
            self.partial_parsing,
            self.log_level,
        ))
    }
}
