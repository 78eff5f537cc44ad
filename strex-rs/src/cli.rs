//! Command-line argument parsing.
//!
//! Usage:
//!   strex [-vc] [-s<symbols>]... [-D<name>=<value>]... <expression>
//!   strex [-vc] [-s<symbols>]... [-D<name>=<value>]... -f<file>

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Log at debug level, including parse tree dumps (`-v`).
    pub verbose: bool,
    /// Reject expressions that use fields no symbol source defines (`-c`).
    pub check_symbols: bool,
    /// Symbol files to load, in order (`-s<file>`).
    pub symbol_files: Vec<PathBuf>,
    /// `name=value` field assignments (`-D<name>=<value>`), applied after the
    /// symbol files.
    pub defines: Vec<String>,
    /// Where the expression comes from.
    pub source: Source,
}

/// Where to read the expression from.
#[derive(Debug, Default, PartialEq)]
pub enum Source {
    /// No expression given.
    #[default]
    Missing,
    /// Expression text on the command line.
    Inline(String),
    /// `-f<file>`: expression stored in a file.
    File(PathBuf),
}

pub const USAGE: &str = "Usage: strex [-vc] [-s<symbols>]... [-D<name>=<value>]... <expression>\n       \
                         strex [-vc] [-s<symbols>]... [-D<name>=<value>]... -f<file>";

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut file: Option<PathBuf> = None;
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.  A lone `-` or a leading minus sign followed by
        // a digit is an expression, not a flag.
        if !arg.starts_with('-') || arg == "-" || arg[1..].starts_with(|c: char| c.is_ascii_digit()) {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'v' => args.verbose = true,
                'c' => args.check_symbols = true,

                // Flags taking a value, either embedded (`-s<file>`) or as the
                // next argument (`-s <file>`).
                flag @ ('s' | 'D' | 'f') => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{flag} requires an argument"));
                    };
                    match flag {
                        's' => args.symbol_files.push(PathBuf::from(value)),
                        'D' => {
                            if !value.contains('=') {
                                return Err(format!("-D expects name=value, got '{value}'"));
                            }
                            args.defines.push(value);
                        }
                        _ => {
                            if file.is_some() {
                                return Err("-f given more than once".to_owned());
                            }
                            file = Some(PathBuf::from(value));
                        }
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    args.source = match (file, positional.len()) {
        (None, 0) => Source::Missing,
        (None, 1) => Source::Inline(positional.remove(0)),
        (Some(path), 0) => Source::File(path),
        (Some(_), _) => return Err("give either -f<file> or an expression, not both".to_owned()),
        (None, n) => {
            return Err(format!(
                "too many arguments ({n}); quote the expression as one argument"
            ))
        }
    };

    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
