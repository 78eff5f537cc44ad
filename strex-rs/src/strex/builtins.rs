//! Built-in strex functions.
//!
//! [`BUILTINS`] is the one registry of functions the language knows about.
//! Every function has a fixed parameter list; the parser looks calls up with
//! [`lookup`], checks the argument count and coerces each argument to the
//! declared parameter type.  [`call_builtin`] therefore receives arguments
//! that already have the right types and never re-checks them.

use std::borrow::Cow;
use std::fmt::Write as _;

use md5::{Digest, Md5};
use tracing::{error, trace, warn};

use super::csv;
use super::value::{Type, Value};
use crate::error::StrexError;

/// Which built-in a [`Builtin`] descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFn {
    Trim,
    Between,
    Split,
    Now,
    Md5,
    Separate,
    Uncsv,
    Untsv,
    Replace,
    Fix,
    Strip,
    Len,
    Upper,
    Lower,
    Symbol,
    Tidy,
    LetterRange,
    WordRange,
    ChopRange,
    Warn,
    Error,
}

/// Descriptor of one built-in function.
#[derive(Debug, PartialEq, Eq)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
    pub return_type: Type,
    pub params: &'static [Type],
}

impl Builtin {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

const NONE: &[Type] = &[];
const STRING: &[Type] = &[Type::String];
const STRING_2: &[Type] = &[Type::String, Type::String];
const STRING_3: &[Type] = &[Type::String, Type::String, Type::String];
const STRING_INT: &[Type] = &[Type::String, Type::Integer];
const STRING_INT_INT: &[Type] = &[Type::String, Type::Integer, Type::Integer];
const STRING_STRING_INT: &[Type] = &[Type::String, Type::String, Type::Integer];
const STRING_STRING_INT_INT: &[Type] = &[Type::String, Type::String, Type::Integer, Type::Integer];

macro_rules! builtin {
    ($name:literal, $func:ident, $ret:ident, $params:ident) => {
        Builtin {
            name: $name,
            func: BuiltinFn::$func,
            return_type: Type::$ret,
            params: $params,
        }
    };
}

/// Every built-in function, by name.
pub static BUILTINS: &[Builtin] = &[
    builtin!("trim", Trim, String, STRING),
    builtin!("between", Between, String, STRING_3),
    builtin!("split", Split, String, STRING_INT),
    builtin!("now", Now, String, NONE),
    builtin!("md5", Md5, String, STRING),
    builtin!("separate", Separate, String, STRING_STRING_INT),
    builtin!("uncsv", Uncsv, String, STRING_INT),
    builtin!("untsv", Untsv, String, STRING_INT),
    builtin!("replace", Replace, String, STRING_3),
    builtin!("fix", Fix, String, STRING_3),
    builtin!("strip", Strip, String, STRING_2),
    builtin!("len", Len, Integer, STRING),
    builtin!("upper", Upper, String, STRING),
    builtin!("lower", Lower, String, STRING),
    builtin!("symbol", Symbol, String, STRING_2),
    builtin!("tidy", Tidy, String, STRING_3),
    builtin!("letter_range", LetterRange, String, STRING_INT_INT),
    builtin!("word_range", WordRange, String, STRING_INT_INT),
    builtin!("chop_range", ChopRange, String, STRING_STRING_INT_INT),
    builtin!("warn", Warn, String, STRING),
    builtin!("error", Error, String, STRING),
];

/// Find a built-in by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Pulls already-typed arguments off the front of the list.
struct Args<'a>(std::vec::IntoIter<Value<'a>>);

impl<'a> Args<'a> {
    fn text(&mut self) -> Cow<'a, str> {
        self.0.next().unwrap_or_default().into_text()
    }

    fn int(&mut self) -> i64 {
        self.0.next().map_or(0, |v| v.as_int())
    }
}

/// Run a built-in on its evaluated arguments.
///
/// `report` receives the messages produced by `warn()` and `error()`.
pub fn call_builtin<'a>(
    builtin: &Builtin,
    args: Vec<Value<'a>>,
    report: &dyn Fn(&str),
) -> Result<Value<'a>, StrexError> {
    trace!(builtin = builtin.name, args = args.len(), "calling builtin");
    let mut a = Args(args.into_iter());
    Ok(match builtin.func {
        BuiltinFn::Trim => Value::Str(slice(a.text(), str::trim)),
        BuiltinFn::Between => {
            let (s, start, end) = (a.text(), a.text(), a.text());
            Value::Str(slice(s, |s| between(s, &start, &end)))
        }
        BuiltinFn::Split => {
            let (s, ix) = (a.text(), a.int());
            Value::Str(try_slice(s, |s| split_word(s, ix))?)
        }
        BuiltinFn::Now => {
            let now = chrono::Local::now();
            Value::from(now.format("%Y-%m-%dT%H:%M:%S%z").to_string())
        }
        BuiltinFn::Md5 => Value::from(md5_hex(&a.text())),
        BuiltinFn::Separate => {
            let (s, sep, ix) = (a.text(), a.text(), a.int());
            let c = single_char("separate", &sep)?;
            Value::Str(try_slice(s, |s| separate(s, c, ix))?)
        }
        BuiltinFn::Uncsv => {
            let (s, ix) = (a.text(), a.int());
            let field = usize::try_from(ix).ok().and_then(|ix| csv::field(&s, ix));
            Value::from(field.unwrap_or_default())
        }
        BuiltinFn::Untsv => {
            let (s, ix) = (a.text(), a.int());
            Value::Str(slice(s, |s| separate(s, '\t', ix).unwrap_or("")))
        }
        BuiltinFn::Replace => {
            let (s, old, new) = (a.text(), a.text(), a.text());
            Value::Str(replace(s, &old, new))
        }
        BuiltinFn::Fix => {
            let (s, old, new) = (a.text(), a.text(), a.text());
            Value::Str(if s == old { new } else { s })
        }
        BuiltinFn::Strip => {
            let (s, remove) = (a.text(), a.text());
            Value::from(s.chars().filter(|c| !remove.contains(*c)).collect::<String>())
        }
        BuiltinFn::Len => Value::Int(a.text().chars().count() as i64),
        BuiltinFn::Upper => Value::from(a.text().to_uppercase()),
        BuiltinFn::Lower => Value::from(a.text().to_lowercase()),
        BuiltinFn::Symbol => {
            let (prefix, original) = (a.text(), a.text());
            Value::Str(symbolify(&prefix, original))
        }
        BuiltinFn::Tidy => {
            let (before, s, after) = (a.text(), a.text(), a.text());
            Value::Str(slice(s, |s| tidy(&before, s, &after)))
        }
        BuiltinFn::LetterRange => {
            let (s, start, end) = (a.text(), a.int(), a.int());
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = python_ends(start, end, chars.len());
            Value::from(chars[start..end].iter().collect::<String>())
        }
        BuiltinFn::WordRange => {
            let (s, start, end) = (a.text(), a.int(), a.int());
            let words: Vec<&str> = s.split_whitespace().collect();
            let (start, end) = python_ends(start, end, words.len());
            Value::from(words[start..end].join(" "))
        }
        BuiltinFn::ChopRange => {
            let (s, sep, start, end) = (a.text(), a.text(), a.int(), a.int());
            let c = single_char("chop_range", &sep)?;
            let parts: Vec<&str> = s.split(c).collect();
            let (start, end) = python_ends(start, end, parts.len());
            Value::from(parts[start..end].join(&sep[..]))
        }
        BuiltinFn::Warn => {
            let message = format!("WARNING: {}", a.text());
            warn!("{message}");
            report(&message);
            Value::from(message)
        }
        BuiltinFn::Error => {
            let message = format!("ERROR: {}", a.text());
            error!("{message}");
            report(&message);
            return Err(StrexError::Aborted(message));
        }
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Apply a sub-slicing function to `s`, keeping the borrow when `s` is
/// borrowed.
fn slice<'a>(s: Cow<'a, str>, f: impl for<'b> Fn(&'b str) -> &'b str) -> Cow<'a, str> {
    match s {
        Cow::Borrowed(b) => Cow::Borrowed(f(b)),
        Cow::Owned(o) => Cow::Owned(f(&o).to_owned()),
    }
}

fn try_slice<'a>(
    s: Cow<'a, str>,
    f: impl for<'b> Fn(&'b str) -> Result<&'b str, StrexError>,
) -> Result<Cow<'a, str>, StrexError> {
    Ok(match s {
        Cow::Borrowed(b) => Cow::Borrowed(f(b)?),
        Cow::Owned(o) => Cow::Owned(f(&o)?.to_owned()),
    })
}

fn between<'s>(s: &'s str, start: &str, end: &str) -> &'s str {
    let Some(i) = s.find(start) else { return "" };
    let rest = &s[i + start.len()..];
    match rest.find(end) {
        Some(j) => &rest[..j],
        None => "",
    }
}

/// Resolve a possibly negative index against `count` items.
fn resolve_index(ix: i64, count: usize) -> Option<usize> {
    let resolved = if ix < 0 { count as i64 + ix } else { ix };
    usize::try_from(resolved).ok().filter(|&i| i < count)
}

fn split_word(s: &str, ix: i64) -> Result<&str, StrexError> {
    let count = s.split_whitespace().count();
    match resolve_index(ix, count) {
        Some(i) => Ok(s.split_whitespace().nth(i).unwrap_or("")),
        None => Err(StrexError::IndexOutOfRange {
            function: "split",
            index: ix,
            count,
        }),
    }
}

fn separate(s: &str, sep: char, ix: i64) -> Result<&str, StrexError> {
    let count = s.split(sep).count();
    match resolve_index(ix, count) {
        Some(i) => Ok(s.split(sep).nth(i).unwrap_or("")),
        None => Err(StrexError::IndexOutOfRange {
            function: "separate",
            index: ix,
            count,
        }),
    }
}

fn single_char(function: &'static str, sep: &str) -> Result<char, StrexError> {
    let mut chars = sep.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(StrexError::BadSeparator {
            function,
            separator: sep.to_owned(),
        }),
    }
}

fn replace<'a>(s: Cow<'a, str>, old: &str, new: Cow<'a, str>) -> Cow<'a, str> {
    if s == old {
        new
    } else if old.is_empty() {
        s
    } else {
        Cow::Owned(s.replace(old, &new))
    }
}

fn tidy<'s>(before: &str, s: &'s str, after: &str) -> &'s str {
    let mut start = 0;
    if !before.is_empty() {
        if let Some(i) = s.find(before) {
            start = i + before.len();
        }
    }
    let rest = &s[start..];
    let mut end = rest.len();
    if !after.is_empty() {
        if let Some(j) = rest.rfind(after) {
            end = j;
        }
    }
    &rest[..end]
}

pub(crate) fn md5_hex(s: &str) -> String {
    format!("{:x}", Md5::digest(s.as_bytes()))
}

fn symbolify<'a>(prefix: &str, original: Cow<'a, str>) -> Cow<'a, str> {
    if original.is_empty() {
        return original;
    }
    let mut body = String::with_capacity(original.len());
    for c in original.trim_start().chars() {
        if c.is_whitespace() || c == '-' || c == '.' {
            body.push('_');
        } else if c.is_ascii_alphanumeric() || c == '_' {
            body.push(c);
        } else {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(body, "{b:02X}");
            }
        }
    }
    if body.len() > 32 {
        body = md5_hex(&original);
    }
    Cow::Owned(format!("{prefix}{body}"))
}

/// Clip a Python-style `[start:end)` range, where negative numbers count
/// from the end, to `0..=len`.
pub(crate) fn python_ends(start: i64, end: i64, len: usize) -> (usize, usize) {
    let len_i = len as i64;
    let fix = |n: i64| if n < 0 { len_i + n } else { n };
    let start = fix(start).clamp(0, len_i);
    let end = fix(end).clamp(start, len_i);
    (start as usize, end as usize)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
