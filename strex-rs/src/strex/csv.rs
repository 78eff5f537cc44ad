//! Comma-separated value field extraction.
//!
//! Fields may be double-quoted, in which case commas inside the quotes are
//! part of the field and `""` stands for one literal quote.  White space
//! around fields is ignored.  Only the first line of the text is read.

/// Return field `ix` (0-based) of `line`, or `None` if there is no such
/// field.
pub fn field(line: &str, ix: usize) -> Option<String> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(line.as_bytes());
    let record = reader.records().next()?.ok()?;
    record.get(ix).map(str::to_owned)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
