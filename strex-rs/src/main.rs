use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use strex::cli::{self, CliArgs, Source};
use strex::{Evaluator, Parser, StrexError, SymbolTable};

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("strex: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    // ── Logging to stderr; stdout carries only the result ────────────────────
    let default_filter = if args.verbose { "strex=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.source == Source::Missing {
        eprintln!("strex: no expression given");
        eprintln!("{}", cli::USAGE);
        std::process::exit(1);
    }

    match run(&args) {
        Ok(result) => println!("{result}"),
        Err(e) => {
            eprintln!("strex: {e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &CliArgs) -> Result<String, StrexError> {
    // ── Build the record ──────────────────────────────────────────────────────
    let mut record = SymbolTable::new();
    for path in &args.symbol_files {
        let (loaded, errors) = SymbolTable::load_file(path)?;
        for e in &errors {
            eprintln!("strex: warning: {}: {e}", path.display());
        }
        tracing::debug!(file = %path.display(), fields = loaded.len(), "loaded symbols");
        for (name, value) in loaded.iter() {
            record.set(name.as_str(), value.as_str());
        }
    }
    for define in &args.defines {
        if let Err(e) = record.assign(define) {
            eprintln!("strex: warning: -D{define}: {e}");
        }
    }

    // ── Parse ─────────────────────────────────────────────────────────────────
    let source;
    let parser = match &args.source {
        Source::Inline(text) => Parser::new(text, "command line", 1),
        Source::Missing => Parser::new("", "command line", 1),
        Source::File(path) => {
            source = std::fs::read_to_string(path).map_err(|e| StrexError::Io {
                path: path.clone(),
                source: e,
            })?;
            Parser::new(&source, &path.display().to_string(), 1).file_mode()
        }
    };
    let parser = if args.check_symbols {
        parser.check_symbols(&record)
    } else {
        parser
    };
    let tree = parser.parse()?;

    // ── Evaluate ──────────────────────────────────────────────────────────────
    let result = Evaluator::new(&record)
        .on_warning(|message: &str| eprintln!("{message}"))
        .eval(&tree);
    result
}
