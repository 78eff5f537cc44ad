//! Token stream for the strex parser.
//!
//! Produces identifiers, digit runs, quoted strings (quotes left on) and
//! single punctuation characters.  The parser drives it one token at a time
//! and may push back exactly one token with [`Tokenizer::reuse`].

use crate::error::StrexError;

/// One token of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Raw text.  Quoted strings keep their quote characters.
    pub text: String,
    /// Line the token starts on.
    pub line: usize,
    /// White space or a comment separated this token from the previous one.
    pub spaced: bool,
}

impl Token {
    pub fn is(&self, s: &str) -> bool {
        self.text == s
    }

    pub fn first_char(&self) -> char {
        self.text.chars().next().unwrap_or('\0')
    }

    pub fn is_ident(&self) -> bool {
        let c = self.first_char();
        c.is_alphabetic() || c == '_'
    }

    pub fn is_number(&self) -> bool {
        self.first_char().is_ascii_digit()
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self.first_char(), '"' | '\'')
    }
}

pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    file: String,
    shell_comments: bool,
    current: Option<Token>,
    reuse: bool,
}

impl<'a> Tokenizer<'a> {
    /// Tokenize `src`.  `file` and `start_line` are only used for error
    /// messages.
    pub fn new(src: &'a str, file: &str, start_line: usize) -> Self {
        Tokenizer {
            src,
            pos: 0,
            line: start_line,
            file: file.to_owned(),
            shell_comments: false,
            current: None,
            reuse: false,
        }
    }

    /// Treat `#` through end of line as a comment.
    pub fn shell_comments(mut self, on: bool) -> Self {
        self.shell_comments = on;
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Line of the most recent token, or of the scan position before the
    /// first one.
    pub fn line(&self) -> usize {
        self.current.as_ref().map_or(self.line, |t| t.line)
    }

    /// Build a parse error located at the current token.
    pub fn error(&self, message: impl Into<String>) -> StrexError {
        StrexError::parse(message, &self.file, self.line())
    }

    /// Push the last token back so the next call to [`next`](Self::next)
    /// returns it again.  Also works after end of input.
    pub fn reuse(&mut self) {
        self.reuse = true;
    }

    /// Return the next token, or `None` at end of input.
    pub fn next(&mut self) -> Result<Option<Token>, StrexError> {
        if self.reuse {
            self.reuse = false;
            return Ok(self.current.clone());
        }
        self.current = self.scan()?;
        Ok(self.current.clone())
    }

    /// Like [`next`](Self::next) but end of input is an error.
    pub fn must_have_next(&mut self) -> Result<Token, StrexError> {
        match self.next()? {
            Some(tok) => Ok(tok),
            None => Err(self.error("Unexpected end of input")),
        }
    }

    // ── Scanning ──────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skip white space and comments, reporting whether anything was skipped.
    fn skip_space(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' && self.shell_comments {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
        self.pos > start
    }

    fn scan(&mut self) -> Result<Option<Token>, StrexError> {
        let spaced = self.skip_space();
        let line = self.line;
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        if c == '"' || c == '\'' {
            loop {
                match self.bump() {
                    None => {
                        return Err(StrexError::parse(
                            format!("Unterminated quote starting {}", &self.src[start..]),
                            &self.file,
                            line,
                        ))
                    }
                    Some('\\') => {
                        self.bump();
                    }
                    Some(q) if q == c => break,
                    Some(_) => {}
                }
            }
        } else if c.is_alphabetic() || c == '_' {
            while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
                self.bump();
            }
        } else if c.is_ascii_digit() {
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }

        Ok(Some(Token {
            text: self.src[start..self.pos].to_owned(),
            line,
            spaced,
        }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(src: &str) -> Vec<String> {
        let mut tkz = Tokenizer::new(src, "test", 1);
        let mut out = Vec::new();
        while let Some(tok) = tkz.next().unwrap() {
            out.push(tok.text);
        }
        out
    }

    #[test]
    fn basic_tokens() {
        assert_eq!(
            texts("trim(a.b) + 'x y'[12]"),
            vec!["trim", "(", "a", ".", "b", ")", "+", "'x y'", "[", "12", "]"]
        );
    }

    #[test]
    fn digits_and_letters_split() {
        assert_eq!(texts("3.14"), vec!["3", ".", "14"]);
        assert_eq!(texts("12abc"), vec!["12", "abc"]);
    }

    #[test]
    fn spaced_flag() {
        let mut tkz = Tokenizer::new("a .b", "test", 1);
        assert!(!tkz.next().unwrap().unwrap().spaced);
        assert!(tkz.next().unwrap().unwrap().spaced);
        assert!(!tkz.next().unwrap().unwrap().spaced);
    }

    #[test]
    fn reuse_returns_same_token() {
        let mut tkz = Tokenizer::new("x y", "test", 1);
        assert_eq!(tkz.next().unwrap().unwrap().text, "x");
        tkz.reuse();
        assert_eq!(tkz.next().unwrap().unwrap().text, "x");
        assert_eq!(tkz.next().unwrap().unwrap().text, "y");
        assert!(tkz.next().unwrap().is_none());
        tkz.reuse();
        assert!(tkz.next().unwrap().is_none());
    }

    #[test]
    fn escaped_quote_stays_in_string() {
        assert_eq!(texts(r#""a\"b" c"#), vec![r#""a\"b""#, "c"]);
    }

    #[test]
    fn unterminated_quote_is_error() {
        let mut tkz = Tokenizer::new("'oops", "f.strex", 3);
        let err = tkz.next().unwrap_err();
        assert!(err.to_string().contains("line 3 of f.strex"), "{err}");
    }

    #[test]
    fn shell_comments_only_when_enabled() {
        let mut tkz = Tokenizer::new("a # note\nb", "test", 1).shell_comments(true);
        assert_eq!(tkz.next().unwrap().unwrap().text, "a");
        let b = tkz.next().unwrap().unwrap();
        assert_eq!(b.text, "b");
        assert_eq!(b.line, 2);
        assert_eq!(texts("a # b"), vec!["a", "#", "b"]);
    }

    #[test]
    fn must_have_next_at_end() {
        let mut tkz = Tokenizer::new("", "test", 7);
        let err = tkz.must_have_next().unwrap_err();
        assert_eq!(err.to_string(), "Unexpected end of input line 7 of test");
    }
}
