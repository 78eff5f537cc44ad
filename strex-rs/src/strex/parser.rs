//! Recursive-descent parser for strex expressions.
//!
//! Precedence, loosest to tightest:
//!
//! ```text
//! expr    := sum
//! sum     := unary ('+' unary)*
//! unary   := '-'? index
//! index   := call ('[' (expr | expr? ':' expr?) ']')?
//! call    := atom ('(' (expr (',' expr)*)? ')')?
//! atom    := STRING | NUMBER | SYMBOL | '(' expr ')'
//! ```
//!
//! The parser types every node as it builds it and wraps an operand in a
//! cast node wherever its type differs from what the context needs, so a
//! finished tree never needs type checks at evaluation time.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use super::ast::{Literal, Node, NodeKind};
use super::builtins;
use super::tokenizer::{Token, Tokenizer};
use super::value::Type;
use crate::error::StrexError;
use crate::symbols::Symbols;

/// Default limit on how deeply expressions may nest.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parse the expression in `source`.  `file_name` and `start_line` say where
/// the text came from, for error messages.
pub fn parse(source: &str, file_name: &str, start_line: usize) -> Result<Node, StrexError> {
    Parser::new(source, file_name, start_line).parse()
}

/// Parse an expression stored in a file.  `#` starts a comment.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Node, StrexError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| StrexError::Io {
        path: path.to_owned(),
        source,
    })?;
    Parser::new(&source, &path.display().to_string(), 1)
        .file_mode()
        .parse()
}

pub struct Parser<'a> {
    tkz: Tokenizer<'a>,
    symbols: Option<&'a dyn Symbols>,
    max_depth: usize,
    depth: usize,
    /// Trees of files already pulled in by `import()`, by file name.
    imports: HashMap<String, Node>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file_name: &str, start_line: usize) -> Self {
        Parser {
            tkz: Tokenizer::new(source, file_name, start_line),
            symbols: None,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
            imports: HashMap::new(),
        }
    }

    /// Require every field referenced by the expression to exist in
    /// `symbols`.
    pub fn check_symbols(mut self, symbols: &'a dyn Symbols) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Source is a whole file: allow `#` comments.
    pub fn file_mode(mut self) -> Self {
        self.tkz = self.tkz.shell_comments(true);
        self
    }

    /// Parse the whole input as one expression.
    pub fn parse(mut self) -> Result<Node, StrexError> {
        let tree = self.parse_to_end()?;
        debug!("parse tree for {}:\n{tree}", self.tkz.file());
        Ok(tree)
    }

    fn parse_to_end(&mut self) -> Result<Node, StrexError> {
        let tree = self.parse_expression()?;
        if let Some(tok) = self.tkz.next()? {
            return Err(self
                .tkz
                .error(format!("Extra input starting with '{}'", tok.text)));
        }
        Ok(tree)
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn expecting(&self, expecting: &str, got: Option<&Token>) -> StrexError {
        let got = got.map_or("end of input", |t| t.text.as_str());
        self.tkz.error(format!("Expecting {expecting}, got {got}"))
    }

    /// Consume the next token, which must be `expected`.
    fn skip_over_required(&mut self, expected: &str) -> Result<(), StrexError> {
        match self.tkz.next()? {
            Some(tok) if tok.is(expected) => Ok(()),
            other => Err(self.expecting(expected, other.as_ref())),
        }
    }

    /// Consume the next token if it is `text`; otherwise leave it in place.
    fn accept(&mut self, text: &str) -> Result<bool, StrexError> {
        match self.tkz.next()? {
            Some(tok) if tok.is(text) => Ok(true),
            _ => {
                self.tkz.reuse();
                Ok(false)
            }
        }
    }

    /// Consume a `.` that directly follows the previous token.
    fn accept_glued_dot(&mut self) -> Result<bool, StrexError> {
        match self.tkz.next()? {
            Some(tok) if tok.is(".") && !tok.spaced => Ok(true),
            _ => {
                self.tkz.reuse();
                Ok(false)
            }
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Node, StrexError> {
        if self.depth >= self.max_depth {
            return Err(self.tkz.error("Expression nested too deeply"));
        }
        self.depth += 1;
        let result = self.parse_sum();
        self.depth -= 1;
        result
    }

    /// Terms are collected into one flat sum.  When a term widens the type,
    /// the sum so far is closed and becomes the first term of the wider one,
    /// so `1 + 2 + 'x'` still adds before it concatenates.
    fn parse_sum(&mut self) -> Result<Node, StrexError> {
        let first = self.parse_unary()?;
        let mut ty = first.ty;
        let mut terms = vec![first];
        while self.accept("+")? {
            let rhs = self.parse_unary()?;
            let common = Type::common(ty, rhs.ty);
            if common != ty {
                let sum = Node::sum(ty, std::mem::take(&mut terms));
                terms.push(sum.coerce(common));
                ty = common;
            }
            terms.push(rhs.coerce(ty));
        }
        Ok(Node::sum(ty, terms))
    }

    fn parse_unary(&mut self) -> Result<Node, StrexError> {
        if !self.accept("-")? {
            return self.parse_index();
        }
        let operand = self.parse_index()?;
        Ok(if operand.ty == Type::Integer {
            Node {
                ty: Type::Integer,
                kind: NodeKind::NegInt(Box::new(operand)),
            }
        } else {
            Node {
                ty: Type::Double,
                kind: NodeKind::NegDouble(Box::new(operand.coerce(Type::Double))),
            }
        })
    }

    fn parse_index(&mut self) -> Result<Node, StrexError> {
        let array = self.parse_call()?;
        if !self.accept("[")? {
            return Ok(array);
        }
        let array = Box::new(array.coerce(Type::String));

        let start = if self.accept(":")? {
            None
        } else {
            let index = self.parse_expression()?.coerce(Type::Integer);
            if !self.accept(":")? {
                self.skip_over_required("]")?;
                return Ok(Node {
                    ty: Type::String,
                    kind: NodeKind::ArrayIx(array, Box::new(index)),
                });
            }
            Some(index)
        };
        let end = if self.accept("]")? {
            None
        } else {
            let end = self.parse_expression()?.coerce(Type::Integer);
            self.skip_over_required("]")?;
            Some(Box::new(end))
        };

        // `s[:]` is the whole string.
        if start.is_none() && end.is_none() {
            return Ok(*array);
        }
        let start = start.unwrap_or_else(|| Node::literal(Literal::Int(0)));
        Ok(Node {
            ty: Type::String,
            kind: NodeKind::ArrayRange(array, Box::new(start), end),
        })
    }

    fn parse_call(&mut self) -> Result<Node, StrexError> {
        let (atom, bare) = self.parse_atom()?;
        let is_call = self.accept("(")?;
        let name = match atom.kind {
            NodeKind::Symbol(ref name) if bare => name.clone(),
            _ if is_call => return Err(self.tkz.error("Unexpected '('")),
            _ => return Ok(atom),
        };

        if !is_call {
            if let Some(symbols) = self.symbols {
                if symbols.lookup(&name).is_none() {
                    return Err(self.tkz.error(format!("No field {name} exists")));
                }
            }
            return Ok(atom);
        }

        if name == "import" {
            return self.parse_import();
        }

        let Some(builtin) = builtins::lookup(&name) else {
            return Err(self
                .tkz
                .error(format!("No built in function {name} exists")));
        };

        let mut args = Vec::new();
        if !self.accept(")")? {
            loop {
                args.push(self.parse_expression()?);
                let tok = self.tkz.must_have_next()?;
                if tok.is(")") {
                    break;
                }
                if !tok.is(",") {
                    return Err(self
                        .tkz
                        .error(format!("Error in parameter list for {name}")));
                }
            }
        }

        if args.len() != builtin.arity() {
            return Err(self.tkz.error(format!(
                "Function {name} has {} parameters but needs {}",
                args.len(),
                builtin.arity()
            )));
        }

        let args = args
            .into_iter()
            .zip(builtin.params)
            .map(|(arg, &ty)| arg.coerce(ty))
            .collect();
        Ok(Node {
            ty: builtin.return_type,
            kind: NodeKind::Call(builtin, args),
        })
    }

    /// `import("file")` is replaced by the tree parsed from that file.
    fn parse_import(&mut self) -> Result<Node, StrexError> {
        let (file_exp, _) = self.parse_atom()?;
        let NodeKind::Literal(Literal::Str(file_name)) = file_exp.kind else {
            return Err(self
                .tkz
                .error("Parameter to import needs to be a quoted file name"));
        };
        self.skip_over_required(")")?;

        if let Some(tree) = self.imports.get(&file_name) {
            return Ok(tree.clone());
        }
        let source = std::fs::read_to_string(&file_name).map_err(|source| StrexError::Io {
            path: file_name.clone().into(),
            source,
        })?;

        let mut inner = Parser::new(&source, &file_name, 1).file_mode();
        inner.symbols = self.symbols;
        inner.max_depth = self.max_depth;
        inner.depth = self.depth;
        inner.imports = std::mem::take(&mut self.imports);
        let result = inner.parse_to_end();
        self.imports = std::mem::take(&mut inner.imports);

        let tree = result?;
        debug!(file = %file_name, nodes = tree.size(), "imported strex expression");
        self.imports.insert(file_name, tree.clone());
        Ok(tree)
    }

    /// Returns the atom and whether it was a bare symbol, the only thing
    /// that may be called like a function.
    fn parse_atom(&mut self) -> Result<(Node, bool), StrexError> {
        let tok = self.tkz.must_have_next()?;
        if tok.is_quoted() {
            // Strip the outer quote pair; no escape processing.
            let text = &tok.text[1..tok.text.len() - 1];
            Ok((Node::literal(Literal::Str(text.to_owned())), false))
        } else if tok.is_ident() {
            let name = self.parse_dotted_symbol(tok)?;
            Ok((Node::symbol(name), true))
        } else if tok.is_number() {
            Ok((self.parse_number(tok)?, false))
        } else if tok.is("(") {
            let inner = self.parse_expression()?;
            self.skip_over_required(")")?;
            Ok((inner, false))
        } else {
            Err(self.tkz.error(format!("Unexpected {}", tok.text)))
        }
    }

    /// Glue `a.b.c` into one symbol name.  The dots and names must touch.
    fn parse_dotted_symbol(&mut self, first: Token) -> Result<String, StrexError> {
        let mut name = first.text;
        while self.accept_glued_dot()? {
            let part = self.tkz.next()?;
            match part {
                Some(ref p) if !p.spaced && (p.is_ident() || p.is_number()) => {
                    name.push('.');
                    name.push_str(&p.text);
                }
                _ => return Err(self.expecting("field name after '.'", part.as_ref())),
            }
        }
        Ok(name)
    }

    /// Digits are an integer; digits glued to `.` glued to digits are a
    /// double.
    fn parse_number(&mut self, whole: Token) -> Result<Node, StrexError> {
        let int: i64 = whole
            .text
            .parse()
            .map_err(|_| self.tkz.error(format!("Number {} is too large", whole.text)))?;
        if !self.accept_glued_dot()? {
            return Ok(Node::literal(Literal::Int(int)));
        }
        let frac = self.tkz.next()?;
        match frac {
            Some(ref f) if !f.spaced && f.is_number() => {
                let text = format!("{}.{}", whole.text, f.text);
                let x: f64 = text
                    .parse()
                    .map_err(|_| self.tkz.error(format!("Bad number {text}")))?;
                Ok(Node::literal(Literal::Double(x)))
            }
            _ => Err(self.expecting("digits after decimal point", frac.as_ref())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
