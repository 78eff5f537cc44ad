//! strex: a small string-expression language for deriving output fields
//! from the fields of an input record.
//!
//! ```rust
//! use strex::{evaluate, parse};
//!
//! let tree = parse("trim(between(raw, '[', ']'))", "inline", 1).unwrap();
//! let out = evaluate(&tree, "raw", |_: &str, name: &str| {
//!     (name == "raw").then(|| "id [ 42 ] end".to_owned())
//! })
//! .unwrap();
//! assert_eq!(out, "42");
//! ```

pub mod cli;
pub mod error;
pub mod strex;
pub mod symbols;

pub use error::StrexError;
pub use strex::{evaluate, parse, parse_file, Evaluator, Node, Parser, Type, Value};
pub use symbols::{SymbolTable, Symbols};
