//! Typed syntax tree produced by the parser.
//!
//! Trees are built once and never mutated afterwards; any number of
//! evaluations may share one tree.

use std::fmt;

use super::builtins::Builtin;
use super::value::{Type, Value};

/// A constant appearing in source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Str(String),
    Int(i64),
    Double(f64),
}

impl Literal {
    pub fn type_of(&self) -> Type {
        match self {
            Literal::Boolean(_) => Type::Boolean,
            Literal::Str(_) => Type::String,
            Literal::Int(_) => Type::Integer,
            Literal::Double(_) => Type::Double,
        }
    }

    /// Runtime value, borrowing the literal's text.
    pub fn value(&self) -> Value<'_> {
        match self {
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Str(s) => Value::from(s.as_str()),
            Literal::Int(n) => Value::Int(*n),
            Literal::Double(x) => Value::Double(*x),
        }
    }
}

/// A type conversion inserted by the parser, named by its (from, to) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastOp {
    StringToBoolean,
    IntToBoolean,
    DoubleToBoolean,
    StringToInt,
    DoubleToInt,
    BooleanToInt,
    StringToDouble,
    BooleanToDouble,
    IntToDouble,
    BooleanToString,
    IntToString,
    DoubleToString,
}

impl CastOp {
    /// The cast converting `from` into `to`, or `None` when they are equal.
    pub fn between(from: Type, to: Type) -> Option<CastOp> {
        use Type::*;
        Some(match (from, to) {
            (String, Boolean) => CastOp::StringToBoolean,
            (Integer, Boolean) => CastOp::IntToBoolean,
            (Double, Boolean) => CastOp::DoubleToBoolean,
            (String, Integer) => CastOp::StringToInt,
            (Double, Integer) => CastOp::DoubleToInt,
            (Boolean, Integer) => CastOp::BooleanToInt,
            (String, Double) => CastOp::StringToDouble,
            (Boolean, Double) => CastOp::BooleanToDouble,
            (Integer, Double) => CastOp::IntToDouble,
            (Boolean, String) => CastOp::BooleanToString,
            (Integer, String) => CastOp::IntToString,
            (Double, String) => CastOp::DoubleToString,
            (Boolean, Boolean) | (String, String) | (Integer, Integer) | (Double, Double) => {
                return None
            }
        })
    }

    pub fn from_type(self) -> Type {
        match self {
            CastOp::StringToBoolean | CastOp::StringToInt | CastOp::StringToDouble => Type::String,
            CastOp::IntToBoolean | CastOp::IntToDouble | CastOp::IntToString => Type::Integer,
            CastOp::DoubleToBoolean | CastOp::DoubleToInt | CastOp::DoubleToString => Type::Double,
            CastOp::BooleanToInt | CastOp::BooleanToDouble | CastOp::BooleanToString => Type::Boolean,
        }
    }

    pub fn to_type(self) -> Type {
        match self {
            CastOp::StringToBoolean | CastOp::IntToBoolean | CastOp::DoubleToBoolean => Type::Boolean,
            CastOp::StringToInt | CastOp::DoubleToInt | CastOp::BooleanToInt => Type::Integer,
            CastOp::StringToDouble | CastOp::BooleanToDouble | CastOp::IntToDouble => Type::Double,
            CastOp::BooleanToString | CastOp::IntToString | CastOp::DoubleToString => Type::String,
        }
    }
}

/// One node of a parsed strex expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Static type of the value this node produces.
    pub ty: Type,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal(Literal),
    /// A (possibly dotted) field name resolved against the record.
    Symbol(String),
    Cast(CastOp, Box<Node>),
    NegInt(Box<Node>),
    NegDouble(Box<Node>),
    /// `a + b + ...`, summed left to right.  Every operand has the node's
    /// own type; a chain of any length stays one node.
    Add(Vec<Node>),
    /// `array[index]`: comma-separated field of a string.
    ArrayIx(Box<Node>, Box<Node>),
    /// `array[start:end]`: characters of a string.  No end means the end of
    /// the string.
    ArrayRange(Box<Node>, Box<Node>, Option<Box<Node>>),
    Call(&'static Builtin, Vec<Node>),
}

impl Node {
    pub fn literal(lit: Literal) -> Node {
        Node {
            ty: lit.type_of(),
            kind: NodeKind::Literal(lit),
        }
    }

    /// Symbols are strings until something coerces them.
    pub fn symbol(name: impl Into<String>) -> Node {
        Node {
            ty: Type::String,
            kind: NodeKind::Symbol(name.into()),
        }
    }

    /// Sum of `terms`, all of type `ty`.  A single term is returned as is.
    pub fn sum(ty: Type, terms: Vec<Node>) -> Node {
        match <[Node; 1]>::try_from(terms) {
            Ok([only]) => only,
            Err(terms) => Node {
                ty,
                kind: NodeKind::Add(terms),
            },
        }
    }

    /// Wrap `self` in a cast to `ty` unless it already has that type.
    pub fn coerce(self, ty: Type) -> Node {
        match CastOp::between(self.ty, ty) {
            None => self,
            Some(op) => Node {
                ty,
                kind: NodeKind::Cast(op, Box::new(self)),
            },
        }
    }

    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Literal(_) | NodeKind::Symbol(_) => Vec::new(),
            NodeKind::Cast(_, c) | NodeKind::NegInt(c) | NodeKind::NegDouble(c) => vec![&**c],
            NodeKind::ArrayIx(l, r) => vec![&**l, &**r],
            NodeKind::ArrayRange(a, start, end) => {
                let mut v = vec![&**a, &**start];
                v.extend(end.as_deref());
                v
            }
            NodeKind::Add(args) | NodeKind::Call(_, args) => args.iter().collect(),
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }

    /// Check that every node agrees with the types its parent expects.
    ///
    /// The parser only ever builds trees for which this holds.
    pub fn is_well_typed(&self) -> bool {
        let own = match &self.kind {
            NodeKind::Literal(lit) => lit.type_of() == self.ty,
            NodeKind::Symbol(_) => self.ty == Type::String,
            NodeKind::Cast(op, c) => op.from_type() == c.ty && op.to_type() == self.ty,
            NodeKind::NegInt(c) => self.ty == Type::Integer && c.ty == Type::Integer,
            NodeKind::NegDouble(c) => self.ty == Type::Double && c.ty == Type::Double,
            NodeKind::Add(terms) => terms.len() >= 2 && terms.iter().all(|t| t.ty == self.ty),
            NodeKind::ArrayIx(a, i) => {
                self.ty == Type::String && a.ty == Type::String && i.ty == Type::Integer
            }
            NodeKind::ArrayRange(a, start, end) => {
                self.ty == Type::String
                    && a.ty == Type::String
                    && start.ty == Type::Integer
                    && end.as_ref().map_or(true, |e| e.ty == Type::Integer)
            }
            NodeKind::Call(b, args) => {
                self.ty == b.return_type
                    && args.len() == b.params.len()
                    && args.iter().zip(b.params).all(|(a, p)| a.ty == *p)
            }
        };
        own && self.children().iter().all(|c| c.is_well_typed())
    }

    fn op_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Literal(_) => "Literal",
            NodeKind::Symbol(_) => "Symbol",
            NodeKind::Cast(op, _) => match op {
                CastOp::StringToBoolean => "StringToBoolean",
                CastOp::IntToBoolean => "IntToBoolean",
                CastOp::DoubleToBoolean => "DoubleToBoolean",
                CastOp::StringToInt => "StringToInt",
                CastOp::DoubleToInt => "DoubleToInt",
                CastOp::BooleanToInt => "BooleanToInt",
                CastOp::StringToDouble => "StringToDouble",
                CastOp::BooleanToDouble => "BooleanToDouble",
                CastOp::IntToDouble => "IntToDouble",
                CastOp::BooleanToString => "BooleanToString",
                CastOp::IntToString => "IntToString",
                CastOp::DoubleToString => "DoubleToString",
            },
            NodeKind::NegInt(_) => "NegInt",
            NodeKind::NegDouble(_) => "NegDouble",
            NodeKind::Add(..) => "Add",
            NodeKind::ArrayIx(..) => "ArrayIx",
            NodeKind::ArrayRange(..) => "ArrayRange",
            NodeKind::Call(..) => "Call",
        }
    }

    fn dump(&self, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}{} ", "", self.op_name(), width = 3 * depth)?;
        match &self.kind {
            NodeKind::Literal(Literal::Str(s)) => write!(f, "{s:?}")?,
            NodeKind::Literal(lit) => write!(f, "{}", lit.value())?,
            NodeKind::Symbol(name) => f.write_str(name)?,
            NodeKind::Call(b, _) => f.write_str(b.name)?,
            _ => f.write_str(self.ty.name())?,
        }
        writeln!(f)?;
        for child in self.children() {
            child.dump(depth + 1, f)?;
        }
        Ok(())
    }
}

/// Indented dump of the tree, one node per line.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(0, f)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
