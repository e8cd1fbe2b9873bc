//! CSV loading with encoding and delimiter auto-detection.
//!
//! Cells are typed per column: all integers → `Int`, all numbers → `Float`,
//! all `true`/`false` → `Bool`, anything else → `Text`. Empty cells are null
//! and text keeps its surrounding spaces.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::normalize_headers;
use crate::error::{SourceError, SourceResult};
use crate::logs::{log_info, log_success};
use crate::models::{Column, Scalar, Table};

static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"));
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid regex")
});

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes using the given encoding; unknown encodings and invalid
/// UTF-8 fall back to lossy UTF-8. A leading BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ';';
    let mut best_count = 0;
    for sep in [';', ',', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }
    best_sep
}

/// Load a CSV file.
pub fn load_csv(path: &Path) -> SourceResult<Table> {
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes(bytes: &[u8]) -> SourceResult<Table> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    log_info(format!(
        "Detected encoding {} and separator '{}'",
        encoding,
        delimiter.escape_default()
    ));
    let table = parse_str(&content, delimiter)?;
    log_success(format!("Read {} CSV rows", table.num_rows()));
    Ok(table)
}

/// Parse CSV text with an explicit delimiter.
///
/// Short rows are padded with nulls; cells beyond the header are ignored.
pub fn parse_str(content: &str, delimiter: char) -> SourceResult<Table> {
    let delimiter = u8::try_from(delimiter).map_err(|_| {
        SourceError::InvalidFormat(format!("delimiter '{}' is not a single byte", delimiter))
    })?;

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = normalize_headers(reader.headers()?.iter());
    if headers.is_empty() {
        return Err(SourceError::InvalidFormat("no header row".to_string()));
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) && record.len() <= 1 {
            continue;
        }
        for (position, column) in cells.iter_mut().enumerate() {
            let cell = record
                .get(position)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            column.push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, infer_column(raw)))
        .collect();
    Ok(Table::from_columns(columns)?)
}

/// Type one column of raw cells. Numbers and booleans may be padded with
/// spaces; text cells keep theirs.
pub fn infer_column(raw: Vec<Option<String>>) -> Vec<Scalar> {
    let present = || raw.iter().flatten().map(|c| c.trim());

    if present().all(|c| INT_RE.is_match(c) && c.parse::<i64>().is_ok()) {
        return raw
            .iter()
            .map(|c| c.as_ref().and_then(|c| c.trim().parse().ok()).map_or(Scalar::Null, Scalar::Int))
            .collect();
    }
    if present().all(|c| FLOAT_RE.is_match(c)) {
        return raw
            .iter()
            .map(|c| c.as_ref().and_then(|c| c.trim().parse().ok()).map_or(Scalar::Null, Scalar::float))
            .collect();
    }
    let is_bool = |c: &str| c.eq_ignore_ascii_case("true") || c.eq_ignore_ascii_case("false");
    if present().all(is_bool) {
        return raw
            .iter()
            .map(|c| c.as_ref().map_or(Scalar::Null, |c| Scalar::Bool(c.trim().eq_ignore_ascii_case("true"))))
            .collect();
    }
    raw.into_iter().map(|c| c.map_or(Scalar::Null, Scalar::Text)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("name;age\nAlice;30\nBob;25", ';').unwrap();
        assert_eq!(
            table.to_records(),
            vec![json!({"name": "Alice", "age": 30}), json!({"name": "Bob", "age": 25})]
        );
    }

    #[test]
    fn test_column_typing() {
        let table = parse_str("i,f,b,t,e\n1,1.5,true,x,\n-2,3,FALSE,1,\n", ',').unwrap();
        assert_eq!(table.column("i").unwrap().values, vec![Scalar::Int(1), Scalar::Int(-2)]);
        assert_eq!(table.column("f").unwrap().values, vec![Scalar::Float(1.5), Scalar::Float(3.0)]);
        assert_eq!(table.column("b").unwrap().values, vec![Scalar::Bool(true), Scalar::Bool(false)]);
        assert_eq!(table.column("t").unwrap().values, vec![Scalar::from("x"), Scalar::from("1")]);
        assert_eq!(table.column("e").unwrap().values, vec![Scalar::Null, Scalar::Null]);
    }

    #[test]
    fn test_special_floats_stay_text() {
        let table = parse_str("v\ninf\nNaN\n", ',').unwrap();
        assert_eq!(table.column("v").unwrap().values, vec![Scalar::from("inf"), Scalar::from("NaN")]);
    }

    #[test]
    fn test_quoted_values_and_ragged_rows() {
        let table = parse_str("a;b;c\n\"Hello; World\";2\n1;2;3;4\n", ';').unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("a").unwrap().values[0], Scalar::from("Hello; World"));
        assert_eq!(table.column("c").unwrap().values, vec![Scalar::Null, Scalar::Int(3)]);
    }

    #[test]
    fn test_cell_padding() {
        let table = parse_str("name,qty
  Alice ,  3
Bob, 4 
", ',').unwrap();
        assert_eq!(
            table.column("name").unwrap().values,
            vec![Scalar::from("  Alice "), Scalar::from("Bob")]
        );
        assert_eq!(table.column("qty").unwrap().values, vec![Scalar::Int(3), Scalar::Int(4)]);
    }

    #[test]
    fn test_headers_normalized() {
        let table = parse_str("a,,a\n1,2,3\n", ',').unwrap();
        assert_eq!(table.column_names(), vec!["a", "Unnamed: 1", "a.1"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_str("a;b\n1;2\n\n3;4\n", ';').unwrap();
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ';');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Société");
    }

    #[test]
    fn test_bom_dropped() {
        let bytes = "\u{feff}a,b\n1,2\n".as_bytes();
        let table = parse_bytes(bytes).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_load_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "item,qty,price\nA,2,10\nB,1,20\n").unwrap();

        let table = load_csv(file.path()).unwrap();
        assert_eq!(table.column_names(), vec!["item", "qty", "price"]);
        assert_eq!(table.to_records()[1], json!({"item": "B", "qty": 1, "price": 20}));
    }
}
