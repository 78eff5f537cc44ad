//! Records that strex expressions are evaluated against.
//!
//! The evaluator only needs to look field values up by name; anything that
//! implements [`Symbols`] will do.  [`SymbolTable`] is the concrete record
//! the `strex` driver fills from `-D` options and `-s` symbol files.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::StrexError;

/// Field lookup for one record.
pub trait Symbols {
    /// Value of field `name`, or `None` when the record has no such field.
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl Symbols for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl Symbols for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl<T: Symbols + ?Sized> Symbols for &T {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).lookup(name)
    }
}

// ── SymbolTable ───────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a symbol file.
#[derive(Debug)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// String-valued record keyed by (possibly dotted) field name.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    vars: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Set a field from a `name=value` assignment.
    pub fn assign(&mut self, assignment: &str) -> Result<(), String> {
        let Some((name, value)) = assignment.split_once('=') else {
            return Err(format!("expected name=value, got '{assignment}'"));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing field name in '{assignment}'"));
        }
        self.set(name, value.trim());
        Ok(())
    }

    /// Parse symbol-file text: one `name=value` per line, `#` comments and
    /// blank lines ignored.
    ///
    /// Returns the table and a list of the lines that could not be parsed.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut table = SymbolTable::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(message) = table.assign(line) {
                errors.push(ConfigError { line: i + 1, message });
            }
        }

        (table, errors)
    }

    /// Read and parse a symbol file from disk.
    pub fn load_file(path: &Path) -> Result<(Self, Vec<ConfigError>), StrexError> {
        let s = std::fs::read_to_string(path).map_err(|source| StrexError::Io {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::load_str(&s))
    }
}

impl Symbols for SymbolTable {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(Cow::Borrowed)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = SymbolTable::new();
        for (k, v) in iter {
            table.set(k, v);
        }
        table
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
