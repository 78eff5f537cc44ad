//! End-to-end behaviour through the public API.

use std::collections::{BTreeMap, HashMap};

use strex::strex::ast::NodeKind;
use strex::{evaluate, parse, parse_file, Evaluator, Parser, StrexError, SymbolTable, Type};

fn no_fields(_: &(), _: &str) -> Option<String> {
    None
}

fn eval_str(src: &str) -> Result<String, StrexError> {
    let tree = parse(src, "test", 1)?;
    evaluate(&tree, &(), no_fields)
}

fn ok(src: &str) -> String {
    eval_str(src).unwrap_or_else(|e| panic!("{src}: {e}"))
}

// ── Core language ─────────────────────────────────────────────────────────────

#[test]
fn documented_examples() {
    assert_eq!(ok(r#""a" + "b""#), "ab");
    assert_eq!(ok("1 + 2"), "3");
    assert_eq!(ok("1 + 2.5"), "3.5");
    assert_eq!(ok(r#"trim(" x ")"#), "x");
    assert_eq!(ok(r#"split("a b c", 1)"#), "b");
    assert_eq!(ok(r#"separate("a,b,c", ",", 2)"#), "c");
    assert_eq!(ok("missingSymbol"), "");
    assert_eq!(ok(r#""a,b,c"[1]"#), "b");
    assert_eq!(ok(r#""a,b,c"[9]"#), "");
    assert_eq!(ok(r#"between("[hello]", "[", "]")"#), "hello");
    assert_eq!(ok(r#"between("hello", "[", "]")"#), "");
}

#[test]
fn runtime_index_errors_are_recoverable() {
    let e = eval_str(r#"split("a b c", 5)"#).unwrap_err();
    assert!(matches!(
        e,
        StrexError::IndexOutOfRange { function: "split", index: 5, count: 3 }
    ));
    let e = eval_str(r#"separate("a,b,c", ",,", 0)"#).unwrap_err();
    assert!(matches!(e, StrexError::BadSeparator { function: "separate", .. }));
    let e = eval_str(r#"separate("a,b,c", ",", 3)"#).unwrap_err();
    assert!(e.to_string().starts_with("separate: index 3 out of range"), "{e}");
}

#[test]
fn evaluation_is_deterministic() {
    let tree = parse("md5(x) + split(x, -1) + x[0]", "test", 1).unwrap();
    let rec: SymbolTable = [("x", "alpha,beta gamma")].into_iter().collect();
    let first = Evaluator::new(&rec).eval(&tree).unwrap();
    for _ in 0..3 {
        assert_eq!(Evaluator::new(&rec).eval(&tree).unwrap(), first);
    }
    assert!(first.ends_with("gammaalpha"), "{first}");
}

#[test]
fn long_flat_sums() {
    assert_eq!(ok(&vec!["1"; 10_000].join(" + ")), "10000");
    let text = ok(&vec!["'xy'"; 10_000].join(" + "));
    assert_eq!(text.len(), 20_000);
    // Widening part way through still adds before concatenating.
    let src = format!("{} + '|' + {}", vec!["2"; 5_000].join(" + "), vec!["3"; 5_000].join(" + "));
    assert_eq!(ok(&src), format!("10000|{}", "3".repeat(5_000)));
}

#[test]
fn character_ranges() {
    assert_eq!(ok("'strex'[1:3]"), "tr");
    assert_eq!(ok("'strex'[:3]"), "str");
    assert_eq!(ok("'strex'[3:]"), "ex");
    assert_eq!(ok("'strex'[:]"), "strex");
    assert_eq!(ok("'strex'[-3:-1]"), "re");
    assert_eq!(ok("('a' + 'bc')[1:]"), "bc");
}

#[test]
fn string_conversions_of_numbers() {
    assert_eq!(ok("'' + 2.5"), "2.5");
    assert_eq!(ok("1.0 + 0"), "1");
    assert_eq!(ok("'' + 1234567.0"), "1.23457e+06");
    assert_eq!(ok("0 + 0.00001"), "1e-05");
    assert_eq!(ok("'n=' + -3"), "n=-3");
}

#[test]
fn numeric_conversion_of_text_is_lenient() {
    // Leading digits count, the rest is ignored.
    assert_eq!(ok("-'12abc'"), "-12");
    assert_eq!(ok("split('a b c', '1st')"), "b");
    assert_eq!(ok("split('a b c', 'none')"), "a");
}

// ── Records ───────────────────────────────────────────────────────────────────

#[test]
fn any_map_is_a_record() {
    let tree = parse("first + ' ' + last", "test", 1).unwrap();

    let mut h = HashMap::new();
    h.insert("first".to_owned(), "Grace".to_owned());
    h.insert("last".to_owned(), "Hopper".to_owned());
    assert_eq!(Evaluator::new(&h).eval(&tree).unwrap(), "Grace Hopper");

    let b: BTreeMap<String, String> = h.into_iter().collect();
    assert_eq!(Evaluator::new(&b).eval(&tree).unwrap(), "Grace Hopper");
}

#[test]
fn callback_record() {
    struct Row {
        cols: Vec<&'static str>,
    }
    let tree = parse("uncsv(row.2, 1) + '|' + row.0", "test", 1).unwrap();
    let row = Row {
        cols: vec!["id7", "ignored", "x,\"y, z\""],
    };
    let out = evaluate(&tree, &row, |r: &Row, name: &str| {
        let ix: usize = name.strip_prefix("row.")?.parse().ok()?;
        r.cols.get(ix).map(|s| s.to_string())
    })
    .unwrap();
    assert_eq!(out, "y, z|id7");
}

#[test]
fn callback_borrowing_local_state() {
    let tree = parse("greeting + ', ' + who + '!'", "test", 1).unwrap();
    let names = vec!["world".to_owned(), "strex".to_owned()];
    for name in &names {
        let prefix = String::from("hello");
        let out = evaluate(&tree, name, |who: &String, field: &str| match field {
            "greeting" => Some(prefix.clone()),
            "who" => Some(who.clone()),
            _ => None,
        })
        .unwrap();
        assert_eq!(out, format!("hello, {name}!"));
    }
}

#[test]
fn symbol_checking_at_parse_time() {
    let rec: SymbolTable = [("name", "n")].into_iter().collect();
    let e = Parser::new("name + nmae", "fields.strex", 3)
        .check_symbols(&rec)
        .parse()
        .unwrap_err();
    assert_eq!(e.to_string(), "No field nmae exists line 3 of fields.strex");
    assert!(e.is_parse_error());
    // Function names are not fields.
    assert!(Parser::new("trim(name)", "t", 1).check_symbols(&rec).parse().is_ok());
}

// ── Files ─────────────────────────────────────────────────────────────────────

#[test]
fn parse_file_with_comments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("label.strex");
    std::fs::write(
        &path,
        "# Build a display label\nupper(split(name, 0)) # first word\n  + ':' + id\n",
    )
    .unwrap();
    let tree = parse_file(&path).unwrap();
    assert_eq!(tree.ty, Type::String);
    let rec: SymbolTable = [("name", "widget large"), ("id", "9")].into_iter().collect();
    assert_eq!(Evaluator::new(&rec).eval(&tree).unwrap(), "WIDGET:9");
}

#[test]
fn parse_file_missing() {
    let e = parse_file("/definitely/not/here.strex").unwrap_err();
    assert!(matches!(e, StrexError::Io { .. }));
    assert!(e.to_string().contains("/definitely/not/here.strex"));
}

#[test]
fn import_is_parsed_once_and_spliced() {
    let dir = tempfile::tempdir().unwrap();
    let inner = dir.path().join("clean.strex");
    std::fs::write(&inner, "# normalise\nlower(trim(x))\n").unwrap();
    let src = format!(
        "import('{p}') + '/' + import('{p}')",
        p = inner.display()
    );
    let tree = parse(&src, "outer", 1).unwrap();
    let NodeKind::Add(terms) = &tree.kind else {
        panic!("{tree}");
    };
    assert_eq!(terms.len(), 3);
    assert!(matches!(terms[0].kind, NodeKind::Call(..)));
    assert_eq!(terms[0], terms[2]);
    let rec: SymbolTable = [("x", "  MiXed ")].into_iter().collect();
    assert_eq!(Evaluator::new(&rec).eval(&tree).unwrap(), "mixed/mixed");
}

#[test]
fn error_inside_import_names_imported_file() {
    let dir = tempfile::tempdir().unwrap();
    let inner = dir.path().join("broken.strex");
    std::fs::write(&inner, "\n\ntrim(x\n").unwrap();
    let e = parse(&format!("import('{}')", inner.display()), "outer", 1).unwrap_err();
    let msg = e.to_string();
    assert!(msg.contains("broken.strex"), "{msg}");
    assert!(msg.contains("line 4"), "{msg}");
}

#[test]
fn self_import_hits_depth_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loop.strex");
    let src = format!("import('{}')", path.display());
    std::fs::write(&path, &src).unwrap();
    let e = Parser::new(&src, "loop", 1).max_depth(16).parse().unwrap_err();
    assert!(e.to_string().contains("nested too deeply"), "{e}");
}

// ── Warning handler ───────────────────────────────────────────────────────────

#[test]
fn warn_and_error_builtins() {
    let seen = std::cell::RefCell::new(Vec::<String>::new());
    let rec = SymbolTable::new();

    let tree = parse("warn('check me')", "t", 1).unwrap();
    let out = Evaluator::new(&rec)
        .on_warning(|m: &str| seen.borrow_mut().push(m.to_owned()))
        .eval(&tree)
        .unwrap();
    assert_eq!(out, "WARNING: check me");

    let tree = parse("error('stop')", "t", 1).unwrap();
    let e = Evaluator::new(&rec)
        .on_warning(|m: &str| seen.borrow_mut().push(m.to_owned()))
        .eval(&tree)
        .unwrap_err();
    assert!(matches!(e, StrexError::Aborted(ref m) if m == "ERROR: stop"));
    assert_eq!(seen.borrow().len(), 2);
}
