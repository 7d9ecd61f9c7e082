#![forbid(unsafe_code)]
#![warn(explicit_outlives_requirements)]
#![warn(missing_debug_implementations)]
#![warn(clippy::pedantic)]
#![warn(missing_copy_implementations)]
#![warn(redundant_lifetimes)]
//#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_qualifications)]
#![allow(clippy::must_use_candidate)]

//! Parses strings against a BNF grammar that is read at run time, without
//! generating any code.
//!
//! ```
//! use bnf_interp::{BnfParserBuilder, OutputFormat};
//!
//! let parser = BnfParserBuilder::new()
//!     .add_grammar("<S> := hello <who>\n<who> := ^[a-z]+")?
//!     .build()?;
//! let tree = parser.parse("hello world")?;
//! assert_eq!(OutputFormat::Txt.render(&tree), "<S>\n hello\n <who>\n  world\n");
//! # Ok::<(), bnf_interp::BnfError>(())
//! ```

// Only the command-line binary uses these.
use clap as _;
use pretty_env_logger as _;

mod alternative;
mod builder;
mod compiler;
mod debug;
mod error;
mod grammar;
mod lexing;
mod nodes;
mod object_builder;
mod output;
mod parser;
mod path;
mod proptesting;
mod rule;
mod token;

pub use alternative::Alternative;
pub use builder::{BnfParserBuilder, DEFAULT_MAX_RECURSION_STEPS};
pub use compiler::{CompileOptions, compile_alternative, compile_rule};
pub use error::{BnfError, ErrorKind, InvalidRule, InvalidRuleReason};
pub use grammar::{Grammar, read_rules};
pub use nodes::{NodeKind, ParseNode, ParseNodeVisitor};
pub use object_builder::{BuildError, ObjectBuilder, StackValue};
pub use output::{Graphviz, IndentedPlainText, OutputFormat, OutputFormatVisitor, Traversal, Xml, render};
pub use parser::BnfParser;
pub use rule::Rule;
pub use token::{EPSILON, MatchResult, RegexTerminal, Terminal, Token, TokenKind};
