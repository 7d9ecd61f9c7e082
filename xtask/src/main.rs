#![warn(clippy::pedantic)]
#![warn(unused_crate_dependencies)]
/// This file has no public functionality - it runs developer tasks for the workspace
use std::env::set_current_dir;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Error, bail};
use bnf_interp::{CompileOptions, Grammar, read_rules};
use clap::{Parser, Subcommand};
use colored::{Color, Colorize};
use duct::cmd;
use fs_extra::dir::{create_all, get_dir_content};
use fs_extra::file::remove;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    subcommand: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tests and compile coverage reports
    Coverage {
        /// Output coverage results as HTML rather than .lcov
        #[arg(short, long)]
        readable: bool,
        /// Whether to open HTML reports - only used if `readable` is true.
        #[arg(short, long)]
        open_report: bool,
    },
    /// Compile every fixture grammar and report rules that reference missing ones
    Grammars {
        /// Compile with sticky rules enabled
        #[arg(short, long)]
        sticky: bool,
    },
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    match cli.subcommand {
        Commands::Coverage {
            readable,
            open_report,
        } => coverage(readable, open_report),
        Commands::Grammars { sticky } => grammars(sticky),
    }
}

fn grammars(sticky: bool) -> Result<(), Error> {
    let options = CompileOptions {
        sticky_rules: sticky,
        ..CompileOptions::default()
    };
    let fixtures = root_crate_dir().join("tests").join("grammars");

    let mut failures = 0;
    let mut files: Vec<String> = get_dir_content(&fixtures)?
        .files
        .into_iter()
        .filter(|f| f.ends_with(".bnf"))
        .collect();
    files.sort();

    for file in &files {
        let name = Path::new(file)
            .file_name()
            .map_or_else(|| file.clone(), |n| n.to_string_lossy().into_owned());
        print!("{name}... ");
        let rules = match read_rules(BufReader::new(File::open(file)?), options) {
            Ok(rules) => rules,
            Err(e) => {
                println!("{}", "failed".color(Color::Red));
                eprintln!("{e}");
                failures += 1;
                continue;
            }
        };
        let grammar: Grammar = rules.into_iter().collect();
        match grammar.dangling_reference() {
            None => println!(
                "{} ({} rules, {} terminals)",
                "ok".color(Color::Green),
                grammar.len(),
                grammar.terminal_tokens().len()
            ),
            Some((rule, missing)) => {
                println!("{}", "dangling".color(Color::Yellow));
                eprintln!("{rule} refers to {missing}, which has no rule");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} grammars have problems", files.len());
    }
    Ok(())
}

fn coverage(readable: bool, open_report: bool) -> Result<(), Error> {
    set_current_dir(root_crate_dir())?;

    create_all("coverage", true)?;

    print!("Running tests... ");
    cmd!("cargo", "test")
        .env("CARGO_INCREMENTAL", "0")
        .env("RUSTFLAGS", "-Cinstrument-coverage")
        .env("LLVM_PROFILE_FILE", "coverage/cargo-test-%p-%m.profraw")
        .run()?;
    println!("{}", "ok".color(Color::Green));

    let (fmt, file) = if readable {
        ("html", "coverage/html")
    } else {
        ("lcov", "coverage/tests.lcov")
    };

    let (option_text, hash) =
        if let Ok(result) = cmd!("git", "rev-parse", "HEAD").stdout_capture().run() {
            (
                "--commit-sha",
                String::from_utf8_lossy(&result.stdout).trim().to_owned(),
            )
        } else {
            ("", String::new())
        };

    print!("Generating reports as {fmt}... ");
    cmd!(
        "grcov",
        ".",
        "--binary-path",
        "./target/debug/deps",
        "-s",
        ".",
        option_text,
        hash,
        "-t",
        fmt,
        "-o",
        file,
        "--branch",
        "--llvm",
        "--ignore-not-existing",
        "--ignore",
        "**/tests/*",
        "--ignore",
        "xtask/*",
        "--ignore",
        "src/bin/*",
        "--excl-start",
        "mod test",
        "--excl-line",
        "derive|unreachable",
    )
    .run()?;
    println!("{}", "ok".color(Color::Green));

    if readable {
        let index_file = format!("{file}/index.html");

        if open_report {
            match open::that(&index_file) {
                Ok(()) => {
                    println!("{}", "Opened".color(Color::Green));
                }
                Err(e) => {
                    eprintln!("{e}\n{} to open reports", "Failure".color(Color::Red));
                }
            }
        } else {
            let abs_path = Path::new(&index_file).canonicalize()?;
            println!("report location: {}", abs_path.to_string_lossy());
        }
    }
    print!("Cleaning up... ");
    let dir_content = get_dir_content(".")?;
    for prof_file in dir_content.files.iter().filter(|s| s.ends_with("profraw")) {
        remove(prof_file)?;
    }
    println!("{}", "ok".color(Color::Green));
    Ok(())
}

/// Get the root folder of the larger crate, assuming this is part of a
/// workspace
fn root_crate_dir() -> PathBuf {
    let mut xtask_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    xtask_dir.pop();
    xtask_dir
}
