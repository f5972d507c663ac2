//! CLI entry point, built on clap 4's derive API: reads a file (or an
//! inline `-i`/`--input` override), parses it, builds a net, reduces it,
//! prints the result, and optionally prints stats via `-s`/`--stats`.

use std::fs;
use std::io;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "optiscope", version, about = "Evaluates lambda terms via optimal sharing reduction")]
struct Cli {
    /// Source file to evaluate.
    file: String,

    /// Inline source text, used in place of `file`'s contents.
    #[arg(short, long, value_name = "SOURCE")]
    input: Option<String>,

    /// Print reduction statistics (rule counts) to stderr after the result.
    #[arg(short, long)]
    stats: bool,
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let source = match cli.input {
        Some(text) => text,
        None => fs::read_to_string(&cli.file)
            .map_err(|e| format!("reading {}: {e}", cli.file))?,
    };

    let term = optiscope::surface::parse(&source)?;

    let mut guard = optiscope::open_pools();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stats = optiscope::run(&mut guard, &mut out, &term).map_err(|e| e.to_string())?;
    use std::io::Write;
    writeln!(out).map_err(|e| e.to_string())?;

    if cli.stats {
        eprintln!("{stats:?}");
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("optiscope: {msg}");
            ExitCode::FAILURE
        }
    }
}
