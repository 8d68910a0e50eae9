//! Delimiter-separated values with quoted fields.
//!
//! Follows the usual CSV conventions: `"` opens a quoted field, `""` inside a
//! quoted field is a literal quote, and quoted fields may span lines. Records
//! end at `\n`, `\r\n` or a lone `\r`. The first record is the header.

use crate::table::DecodedTable;
use crate::value::infer_cell;

/// Split `text` into records of raw fields. Blank records are dropped.
pub fn parse_records(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut chars = text.chars().peekable();
    // True once the current record has seen any character (even a delimiter).
    let mut dirty = false;

    while let Some(c) = chars.next() {
        if c == '"' && field.is_empty() {
            dirty = true;
            // Quoted field: read until the closing quote.
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    Some('"') | None => break,
                    Some(other) => field.push(other),
                }
            }
            // Anything between the closing quote and the next delimiter is kept.
            while let Some(&next) = chars.peek() {
                if next == delimiter || next == '\n' || next == '\r' {
                    break;
                }
                field.push(next);
                chars.next();
            }
        } else if c == delimiter {
            dirty = true;
            record.push(std::mem::take(&mut field));
        } else if c == '\n' || c == '\r' {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            finish_record(&mut records, &mut record, &mut field, dirty);
            dirty = false;
        } else {
            dirty = true;
            field.push(c);
        }
    }
    finish_record(&mut records, &mut record, &mut field, dirty);

    records
}

fn finish_record(
    records: &mut Vec<Vec<String>>,
    record: &mut Vec<String>,
    field: &mut String,
    dirty: bool,
) {
    if dirty {
        record.push(std::mem::take(field));
        records.push(std::mem::take(record));
    } else {
        field.clear();
        record.clear();
    }
}

/// Parse a delimited payload into a typed table.
///
/// The first record names the columns; every other field goes through
/// [`infer_cell`].
pub fn parse_dsv(text: &str, delimiter: char) -> DecodedTable {
    let mut records = parse_records(text, delimiter).into_iter();
    let Some(columns) = records.next() else {
        return DecodedTable::default();
    };
    let rows = records
        .map(|record| record.iter().map(|raw| infer_cell(raw)).collect())
        .collect();
    DecodedTable::from_cells(columns, rows)
}
