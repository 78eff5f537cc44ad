//! The strex expression language.
//!
//! A strex expression computes one string from the fields of a record:
//!
//! ```rust
//! use strex::{parse, Evaluator, SymbolTable};
//!
//! let tree = parse("upper(split(name, 0)) + ' #' + (count + 1)", "example", 1).unwrap();
//! let mut record = SymbolTable::new();
//! record.set("name", "ada lovelace");
//! record.set("count", "41");
//! assert_eq!(Evaluator::new(&record).eval(&tree).unwrap(), "ADA #411");
//! ```
//!
//! Parsing produces a fully typed [`Node`] tree in which every conversion
//! is an explicit cast node.  The tree is immutable and may be evaluated
//! against any number of records.

pub mod ast;
pub mod builtins;
pub mod csv;
pub mod eval;
pub mod parser;
pub mod tokenizer;
pub mod value;

pub use ast::{CastOp, Literal, Node, NodeKind};
pub use builtins::{Builtin, BUILTINS};
pub use eval::{evaluate, Evaluator};
pub use parser::{parse, parse_file, Parser, DEFAULT_MAX_DEPTH};
pub use value::{Type, Value};
