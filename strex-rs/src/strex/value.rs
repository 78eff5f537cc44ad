//! Static types and runtime values of the strex language.
//!
//! Every node of a parsed tree has exactly one [`Type`].  At run time each
//! node produces a [`Value`] of that same type; conversions between types
//! only ever happen where the parser inserted a cast node.

use std::borrow::Cow;
use std::fmt;

/// The four static types a strex expression can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Boolean,
    String,
    Integer,
    Double,
}

impl Type {
    /// Human-readable name used in error messages and tree dumps.
    pub fn name(self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::String => "string",
            Type::Integer => "integer",
            Type::Double => "floating point",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Type::Boolean => 0,
            Type::Integer => 1,
            Type::Double => 2,
            Type::String => 3,
        }
    }

    /// Type both operands of `+` are coerced to.
    ///
    /// String beats Double beats Integer beats Boolean, regardless of which
    /// side each operand is on.
    pub fn common(a: Type, b: Type) -> Type {
        if a.rank() >= b.rank() {
            a
        } else {
            b
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A strex runtime value.
///
/// Strings borrow from the parse tree or the record wherever they can; an
/// evaluation only allocates when an operation produces new text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Boolean(bool),
    Str(Cow<'a, str>),
    Int(i64),
    Double(f64),
}

impl Default for Value<'_> {
    fn default() -> Self {
        Value::Str(Cow::Borrowed(""))
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Double(x) => f.write_str(&format_g(*x)),
        }
    }
}

impl<'a> Value<'a> {
    pub fn type_of(&self) -> Type {
        match self {
            Value::Boolean(_) => Type::Boolean,
            Value::Str(_) => Type::String,
            Value::Int(_) => Type::Integer,
            Value::Double(_) => Type::Double,
        }
    }

    /// Strings are true when non-empty, numbers when non-zero.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::Int(n) => *n != 0,
            Value::Double(x) => *x != 0.0,
        }
    }

    /// Integer view; strings parse their leading digits and default to 0.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Boolean(b) => i64::from(*b),
            Value::Str(s) => leading_int(s),
            Value::Int(n) => *n,
            Value::Double(x) => *x as i64,
        }
    }

    /// Floating point view; strings parse their leading number and default
    /// to 0.0.
    pub fn as_double(&self) -> f64 {
        match self {
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Str(s) => leading_double(s),
            Value::Int(n) => *n as f64,
            Value::Double(x) => *x,
        }
    }

    /// Text form, without copying when the value already is a string.
    pub fn into_text(self) -> Cow<'a, str> {
        match self {
            Value::Str(s) => s,
            Value::Boolean(b) => Cow::Borrowed(if b { "true" } else { "false" }),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Convert to `to`.  A value already of that type is returned unchanged.
    pub fn cast(self, to: Type) -> Value<'a> {
        if self.type_of() == to {
            return self;
        }
        match to {
            Type::Boolean => Value::Boolean(self.as_bool()),
            Type::Integer => Value::Int(self.as_int()),
            Type::Double => Value::Double(self.as_double()),
            Type::String => Value::Str(self.into_text()),
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value<'_> {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value<'_> {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::Str(Cow::Owned(s))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Str(Cow::Borrowed(s))
    }
}

// ── Permissive numeric parsing ────────────────────────────────────────────────

/// Parse the leading integer of `s`: optional whitespace, optional sign,
/// digits.  Anything unparseable yields 0; overflow saturates.
pub fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        n = n.saturating_mul(10);
        n = if negative {
            n.saturating_sub(d)
        } else {
            n.saturating_add(d)
        };
    }
    n
}

/// Parse the leading floating point number of `s`, accepting the longest
/// prefix of the form `[+-]digits[.digits][e[+-]digits]`.  Yields 0.0 when
/// there is no such prefix.
pub fn leading_double(s: &str) -> f64 {
    let s = s.trim_start();
    let b = s.as_bytes();
    let mut end = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while b.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if b.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while b.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return 0.0;
    }
    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(b.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while b.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

// ── Double formatting ─────────────────────────────────────────────────────────

/// Format like C's `%g`: six significant digits, trailing zeros dropped,
/// scientific notation for very large or very small magnitudes.
pub fn format_g(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_owned();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }
    let sci = format!("{x:.5e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return x.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return x.to_string();
    };
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = (5 - exp) as usize;
        trim_fraction(&format!("{x:.decimals$}")).to_owned()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_type_precedence() {
        use Type::*;
        assert_eq!(Type::common(String, Integer), String);
        assert_eq!(Type::common(Integer, String), String);
        assert_eq!(Type::common(Integer, Double), Double);
        assert_eq!(Type::common(Boolean, Integer), Integer);
        assert_eq!(Type::common(Boolean, Boolean), Boolean);
        assert_eq!(Type::common(Double, Boolean), Double);
    }

    #[test]
    fn display_values() {
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::Double(3.5).to_string(), "3.5");
        assert_eq!(Value::Double(3.0).to_string(), "3");
    }

    #[test]
    fn g_formatting() {
        assert_eq!(format_g(0.1 + 0.2), "0.3");
        assert_eq!(format_g(123456.0), "123456");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(-2.5), "-2.5");
        assert_eq!(format_g(1e20), "1e+20");
        assert_eq!(format_g(0.0), "0");
    }

    #[test]
    fn string_to_number_is_permissive() {
        assert_eq!(leading_int("42"), 42);
        assert_eq!(leading_int("  -17xyz"), -17);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int(""), 0);
        assert_eq!(leading_int("99999999999999999999"), i64::MAX);
        assert_eq!(leading_double("2.5kg"), 2.5);
        assert_eq!(leading_double(" -1e3x"), -1000.0);
        assert_eq!(leading_double(".5"), 0.5);
        assert_eq!(leading_double("7e"), 7.0);
        assert_eq!(leading_double("nope"), 0.0);
        assert_eq!(leading_double("-"), 0.0);
    }

    #[test]
    fn casts() {
        assert_eq!(Value::from("").cast(Type::Boolean), Value::Boolean(false));
        assert_eq!(Value::from("x").cast(Type::Boolean), Value::Boolean(true));
        assert_eq!(Value::Double(0.0).cast(Type::Boolean), Value::Boolean(false));
        assert_eq!(Value::Int(3).cast(Type::Boolean), Value::Boolean(true));
        assert_eq!(Value::Boolean(true).cast(Type::Integer), Value::Int(1));
        assert_eq!(Value::Double(3.9).cast(Type::Integer), Value::Int(3));
        assert_eq!(Value::Int(2).cast(Type::Double), Value::Double(2.0));
        assert_eq!(Value::Boolean(false).cast(Type::String), Value::from("false"));
        assert_eq!(Value::Int(12).cast(Type::String), Value::from("12"));
        assert_eq!(Value::from("12abc").cast(Type::Integer), Value::Int(12));
    }

    #[test]
    fn cast_to_same_type_is_identity() {
        let v = Value::from("keep");
        assert_eq!(v.clone().cast(Type::String), v);
    }
}
