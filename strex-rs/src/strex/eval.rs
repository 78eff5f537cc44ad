//! Tree-walking evaluator.
//!
//! Every node was typed and every conversion made explicit by the parser, so
//! evaluation is a single post-order walk with no type checks.  Evaluation
//! holds no state between calls; one tree may be evaluated against any
//! number of records.

use std::borrow::Cow;

use super::ast::{Node, NodeKind};
use super::builtins::{call_builtin, python_ends};
use super::csv;
use super::value::{Type, Value};
use crate::error::StrexError;
use crate::symbols::Symbols;

/// Evaluate `tree` against `record`, fetching fields through `lookup`.
///
/// Fields `lookup` does not know evaluate to the empty string.
pub fn evaluate<R, F>(tree: &Node, record: &R, lookup: F) -> Result<String, StrexError>
where
    R: ?Sized,
    F: Fn(&R, &str) -> Option<String>,
{
    let symbols = Callback { record, lookup };
    let out = Evaluator::new(&symbols).eval(tree);
    out
}

/// Adapts a lookup callback to [`Symbols`].
struct Callback<'r, R: ?Sized, F> {
    record: &'r R,
    lookup: F,
}

impl<R: ?Sized, F> Symbols for Callback<'_, R, F>
where
    F: Fn(&R, &str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        (self.lookup)(self.record, name).map(Cow::Owned)
    }
}

/// Evaluates parsed trees against one record.
pub struct Evaluator<'a> {
    symbols: &'a dyn Symbols,
    on_warning: Option<Box<dyn Fn(&str) + 'a>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(symbols: &'a dyn Symbols) -> Self {
        Evaluator {
            symbols,
            on_warning: None,
        }
    }

    /// Send messages from `warn()` and `error()` to `handler` as well as to
    /// the log.
    pub fn on_warning(mut self, handler: impl Fn(&str) + 'a) -> Self {
        self.on_warning = Some(Box::new(handler));
        self
    }

    /// Evaluate `tree` to its string result.
    pub fn eval(&self, tree: &Node) -> Result<String, StrexError> {
        Ok(self.eval_value(tree)?.into_text().into_owned())
    }

    /// Evaluate `tree` to a typed value.  Strings borrow from the tree and
    /// the record where they can.
    pub fn eval_value<'t>(&'t self, tree: &'t Node) -> Result<Value<'t>, StrexError> {
        let value = self.node(tree)?;
        debug_assert_eq!(value.type_of(), tree.ty, "{tree}");
        Ok(value)
    }

    fn report(&self, message: &str) {
        if let Some(handler) = &self.on_warning {
            handler(message);
        }
    }

    fn node<'t>(&'t self, node: &'t Node) -> Result<Value<'t>, StrexError> {
        Ok(match &node.kind {
            NodeKind::Literal(lit) => lit.value(),
            NodeKind::Symbol(name) => Value::Str(self.symbols.lookup(name).unwrap_or_default()),
            NodeKind::Cast(op, child) => self.node(child)?.cast(op.to_type()),
            NodeKind::NegInt(child) => Value::Int(self.node(child)?.as_int().wrapping_neg()),
            NodeKind::NegDouble(child) => Value::Double(-self.node(child)?.as_double()),
            NodeKind::Add(terms) => self.sum(node.ty, terms)?,
            NodeKind::ArrayIx(array, index) => {
                let array = self.node(array)?.into_text();
                let index = self.node(index)?.as_int();
                Value::from(array_field(&array, index))
            }
            NodeKind::ArrayRange(array, start, end) => {
                let array = self.node(array)?.into_text();
                let start = self.node(start)?.as_int();
                let end = match end {
                    Some(end) => Some(self.node(end)?.as_int()),
                    None => None,
                };
                Value::Str(char_range(array, start, end))
            }
            NodeKind::Call(builtin, args) => {
                let args = args
                    .iter()
                    .map(|a| self.node(a))
                    .collect::<Result<Vec<_>, _>>()?;
                call_builtin(builtin, args, &|m: &str| self.report(m))?
            }
        })
    }

    /// Fold the terms of a sum left to right in one loop.
    fn sum<'t>(&'t self, ty: Type, terms: &'t [Node]) -> Result<Value<'t>, StrexError> {
        Ok(match ty {
            Type::String => {
                let mut out = String::new();
                for term in terms {
                    out.push_str(&self.node(term)?.into_text());
                }
                Value::from(out)
            }
            Type::Integer => {
                let mut n = 0i64;
                for term in terms {
                    n = n.wrapping_add(self.node(term)?.as_int());
                }
                Value::Int(n)
            }
            Type::Double => {
                // -0.0 is the identity, so `-0.0 + -0.0` keeps its sign.
                let mut x = -0.0;
                for term in terms {
                    x += self.node(term)?.as_double();
                }
                Value::Double(x)
            }
            Type::Boolean => {
                let mut b = false;
                for term in terms {
                    b |= self.node(term)?.as_bool();
                }
                Value::Boolean(b)
            }
        })
    }
}

/// Field `index` of a comma-separated string; empty when there is none.
fn array_field(array: &str, index: i64) -> String {
    usize::try_from(index)
        .ok()
        .and_then(|ix| csv::field(array, ix))
        .unwrap_or_default()
}

/// Characters `start..end` of `s`, with negative positions counted from the
/// end and both ends clipped to the string.
fn char_range(s: Cow<'_, str>, start: i64, end: Option<i64>) -> Cow<'_, str> {
    let len = s.chars().count();
    let (start, end) = python_ends(start, end.unwrap_or(len as i64), len);
    let byte = |n: usize| s.char_indices().nth(n).map_or(s.len(), |(b, _)| b);
    let (from, to) = (byte(start), byte(end));
    match s {
        Cow::Borrowed(b) => Cow::Borrowed(&b[from..to]),
        Cow::Owned(o) => Cow::Owned(o[from..to].to_owned()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
