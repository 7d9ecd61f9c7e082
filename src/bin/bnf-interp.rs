#![warn(clippy::pedantic)]
//! Parses an input against a grammar file and prints the parse tree.
use std::{
    ffi::OsString,
    fs,
    io::{self, Read, Write},
    path::PathBuf,
    process::ExitCode,
    str::FromStr,
};

use bnf_interp::{BnfError, BnfParserBuilder, ErrorKind, OutputFormat};
use clap::{Parser, error::ErrorKind as ClapErrorKind};
use log::LevelFilter;
use strum::VariantNames;

#[derive(Parser, Debug)]
#[command(name = "bnf-interp", version, about = "Parse text against a BNF grammar")]
struct Cli {
    /// Grammar file
    #[arg(short, long)]
    grammar: PathBuf,
    /// Input file; standard input when absent
    #[arg(short, long)]
    input_file: Option<PathBuf>,
    /// Output format (dot, xml or txt)
    #[arg(short, long, default_value = "xml")]
    format: String,
    /// Rule to start parsing from, instead of the first one
    #[arg(short, long)]
    start_rule: Option<String>,
    /// Let non-terminal names in the input stand for themselves
    #[arg(long)]
    set_partial: bool,
    /// Alternatives after `||` are only tried once the others fail
    #[arg(long)]
    sticky: bool,
    #[arg(long)]
    max_recursion: Option<usize>,
    /// Log more (may be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Bnf(#[from] BnfError),
    #[error("unknown output format '{0}', expected one of: {variants}", variants = OutputFormat::VARIANTS.join(", "))]
    UnknownFormat(String),
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Read { .. } | CliError::Io(_) => 3,
            CliError::UnknownFormat(_) => 5,
            CliError::Bnf(e) => match e.kind() {
                ErrorKind::ParsingFailed => 2,
                ErrorKind::Io => 3,
                ErrorKind::MissingRule => 6,
                ErrorKind::InvalidRule => 7,
                ErrorKind::MaximumRecursionReached => 8,
                ErrorKind::NoStartRule | ErrorKind::UnknownStartRule => 9,
            },
        }
    }
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn interpret(cli: Cli, stdin: &mut dyn Read, stdout: &mut dyn Write) -> Result<(), CliError> {
    let format =
        OutputFormat::from_str(&cli.format).map_err(|_| CliError::UnknownFormat(cli.format.clone()))?;

    let mut builder = BnfParserBuilder::new()
        .sticky_rules(cli.sticky)
        .add_grammar_file(&cli.grammar)?
        .partial_parsing(cli.set_partial)
        .log_level(level(cli.verbose));
    if let Some(steps) = cli.max_recursion {
        builder = builder.max_recursion_steps(steps);
    }
    if let Some(start) = cli.start_rule {
        builder = builder.start_rule(start);
    }
    let parser = builder.build()?;
    log::info!("grammar {} has {} rules", cli.grammar.display(), parser.grammar().len());

    let input = match &cli.input_file {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut text = String::new();
            stdin.read_to_string(&mut text)?;
            text
        }
    };

    let tree = parser.parse(&input)?;
    stdout.write_all(format.render(&tree).as_bytes())?;
    Ok(())
}

fn run<I, T>(args: I, stdin: &mut dyn Read, stdout: &mut dyn Write, stderr: &mut dyn Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{e}");
            return 0;
        }
        Err(e) => {
            let _ = write!(stderr, "{e}");
            return 4;
        }
    };

    let _ = pretty_env_logger::formatted_builder()
        .filter_level(level(cli.verbose))
        .try_init();

    match interpret(cli, stdin, stdout) {
        Ok(()) => 0,
        Err(e) => {
            let _ = match &e {
                CliError::Bnf(BnfError::InvalidRule(rule)) => write!(stderr, "{}", rule.report()),
                e => writeln!(stderr, "error: {e}"),
            };
            e.exit_code()
        }
    }
}

fn main() -> ExitCode {
    ExitCode::from(run(
        std::env::args_os(),
        &mut io::stdin(),
        &mut io::stdout(),
        &mut io::stderr(),
    ))
}
