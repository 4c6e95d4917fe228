//! Demonstration CLI for the `dfc` library.
//!
//! Loads a pattern file, builds a [`crate::scan::CompiledIndex`], scans an
//! input file (or stdin), and prints matches as text or `--json`. This is
//! an external-collaborator surface: pattern-file parsing and file I/O
//! live here, not in the core library.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde::Serialize;

use crate::error::MAX_PATTERN_LENGTH;
use crate::pattern::PatternSet;
use crate::scan::CompiledIndex;

/// Direct Filter + Compact Table multi-pattern matcher.
#[derive(Parser, Debug)]
#[command(
    name = "dfc",
    version,
    about = "Direct Filter + Compact Table multi-pattern matcher",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Emit match records as JSON to stdout instead of plain text.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compile a pattern file and scan an input file (or stdin).
    Scan(ScanArgs),
    /// Compile a pattern file and report its build diagnostics without scanning.
    Compile(CompileArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Pattern file: one `id<TAB>ci|cs<TAB>bytes` record per line.
    #[arg(long, short = 'p', value_hint = ValueHint::FilePath)]
    patterns: PathBuf,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Pattern file: one `id<TAB>ci|cs<TAB>bytes` record per line.
    #[arg(value_hint = ValueHint::FilePath)]
    patterns: PathBuf,
}

// ---------------------------------------------------------------------------
// Pattern file parsing
// ---------------------------------------------------------------------------

/// Unescape `\xHH`, `\n`, `\t`, and `\\` in a pattern-file bytes field.
fn unescape_bytes(s: &str) -> Result<Vec<u8>, String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'x') => {
                let hex = bytes
                    .get(i + 2..i + 4)
                    .ok_or_else(|| "truncated \\x escape".to_string())?;
                let hex = std::str::from_utf8(hex).map_err(|_| "invalid \\x escape".to_string())?;
                let v = u8::from_str_radix(hex, 16)
                    .map_err(|_| format!("invalid hex escape \\x{hex}"))?;
                out.push(v);
                i += 4;
            }
            Some(b'n') => {
                out.push(b'\n');
                i += 2;
            }
            Some(b't') => {
                out.push(b'\t');
                i += 2;
            }
            Some(b'\\') => {
                out.push(b'\\');
                i += 2;
            }
            Some(other) => return Err(format!("unknown escape \\{}", *other as char)),
            None => return Err("trailing backslash".to_string()),
        }
    }
    Ok(out)
}

/// Parse one non-blank, non-comment pattern-file line into `(id, case_insensitive, bytes)`.
fn parse_pattern_line(line: &str) -> Result<(u32, bool, Vec<u8>), String> {
    let mut parts = line.splitn(3, '\t');
    let id = parts
        .next()
        .ok_or("missing id field")?
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid id: {e}"))?;
    let case = parts.next().ok_or("missing case field")?.trim();
    let case_insensitive = match case {
        "ci" => true,
        "cs" => false,
        other => return Err(format!("case field must be \"ci\" or \"cs\", got {other:?}")),
    };
    let bytes_field = parts.next().ok_or("missing bytes field")?;
    let bytes = unescape_bytes(bytes_field)?;
    Ok((id, case_insensitive, bytes))
}

/// Read a pattern file and build a [`PatternSet`] from it.
fn read_patterns(path: &PathBuf) -> Result<PatternSet, String> {
    let file = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut set = PatternSet::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("{}:{}: {e}", path.display(), lineno + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (id, ci, bytes) = parse_pattern_line(trimmed)
            .map_err(|e| format!("{}:{}: {e}", path.display(), lineno + 1))?;
        set.add_pattern(&bytes, ci, id)
            .map_err(|e| format!("{}:{}: {e}", path.display(), lineno + 1))?;
    }
    Ok(set)
}

/// Read the scan input, either from a file or from stdin, padded with
/// `MAX_PATTERN_LENGTH` zero bytes so [`CompiledIndex::scan`]'s read-ahead
/// contract is satisfied.
fn read_input(path: Option<&PathBuf>) -> Result<(Vec<u8>, usize), String> {
    let mut buf = Vec::new();
    match path {
        Some(p) => {
            File::open(p)
                .map_err(|e| format!("{}: {e}", p.display()))?
                .read_to_end(&mut buf)
                .map_err(|e| format!("{}: {e}", p.display()))?;
        }
        None => {
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| format!("stdin: {e}"))?;
        }
    }
    let length = buf.len();
    buf.extend(std::iter::repeat(0u8).take(MAX_PATTERN_LENGTH));
    Ok((buf, length))
}

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MatchRecord {
    bytes: String,
    length: usize,
    external_ids: Vec<u32>,
}

#[derive(Serialize)]
struct ScanReport {
    pattern_count: usize,
    match_count: usize,
    matches: Vec<MatchRecord>,
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn cmd_scan(args: &ScanArgs, json_output: bool, verbose: u8) -> i32 {
    let set = match read_patterns(&args.patterns) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("dfc: {e}");
            return 1;
        }
    };
    let pattern_count = set.len();
    let index: CompiledIndex = match set.compile() {
        Ok(i) => i,
        Err(e) => {
            eprintln!("dfc: compile failed: {e}");
            return 1;
        }
    };

    let (input, length) = match read_input(args.input.as_ref()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("dfc: {e}");
            return 1;
        }
    };

    let mut matches = Vec::new();
    let match_count = index.scan(&input, length, |m| {
        matches.push(MatchRecord {
            bytes: String::from_utf8_lossy(m.bytes).into_owned(),
            length: m.length,
            external_ids: m.external_ids.to_vec(),
        });
    });

    if verbose > 0 && !json_output {
        eprintln!("dfc: compiled {pattern_count} patterns, scanned {length} bytes");
    }

    if json_output {
        let report = ScanReport {
            pattern_count,
            match_count,
            matches,
        };
        match serde_json::to_writer_pretty(io::stdout(), &report) {
            Ok(()) => println!(),
            Err(e) => {
                eprintln!("dfc: failed to write json: {e}");
                return 1;
            }
        }
    } else {
        for m in &matches {
            println!("match: {:?} (len {}, eids {:?})", m.bytes, m.length, m.external_ids);
        }
        println!("{match_count} match(es)");
    }

    0
}

fn cmd_compile(args: &CompileArgs) -> i32 {
    let set = match read_patterns(&args.patterns) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("dfc: {e}");
            return 1;
        }
    };
    let pattern_count = set.len();
    match set.compile() {
        Ok(index) => {
            println!(
                "ok: {} distinct patterns, {} compiled",
                pattern_count,
                index.pattern_count()
            );
            0
        }
        Err(e) => {
            eprintln!("dfc: compile failed: {e}");
            1
        }
    }
}

/// Parse arguments, initialize logging, and run the requested subcommand.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let exit_code = match &cli.command {
        Cmd::Scan(args) => cmd_scan(args, cli.json_output, cli.verbose),
        Cmd::Compile(args) => cmd_compile(args),
    };

    io::stdout().flush().ok();
    process::exit(exit_code);
}

/// Fuzz entry point: try parsing one pattern-file line. Must never panic,
/// only return `Err`.
#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_line(line: &str) {
    let _ = parse_pattern_line(line);
}

/// Fuzz entry point: try parsing a CLI argument vector. Must never panic.
#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("dfc".to_string())
        .chain(args.iter().cloned())
        .collect();
    let _ = Cli::try_parse_from(argv);
}
