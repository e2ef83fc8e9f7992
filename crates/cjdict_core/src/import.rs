//! Editable dictionary sources (CSV/TSV, JSON) → raw rows → normalized set.

use crate::errors::{DictError, Result};
use crate::normalize::{normalize_into, IssueCode, Normalized, NormalizeReport, RawRow, Severity};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

const HEADER_CELLS: [&str; 5] = ["char", "cangjie", "quick", "primary", "secondary"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text).trim()
}

fn split_line(line: &str) -> Vec<&str> {
    let delimiter = if line.contains('\t') && !line.contains(',') { '\t' } else { ',' };
    line.split(delimiter).map(str::trim).collect()
}

fn looks_like_header(cells: &[&str]) -> bool {
    cells.iter().any(|c| HEADER_CELLS.iter().any(|h| c.eq_ignore_ascii_case(h)))
}

/// Zero accepted entries fails the build.
fn finish(rows: Vec<RawRow>, report: NormalizeReport) -> Result<Normalized> {
    let out = normalize_into(rows, report);
    if out.entries.is_empty() {
        warn!(rejected = out.report.rejected_rows, "no valid entries after validation");
        return Err(DictError::NoValidEntries);
    }
    Ok(out)
}

/// `char,primary[,secondary]` lines; tab-separated when a line has tabs and no commas.
pub fn parse_csv(text: &str) -> Result<Normalized> {
    let text = strip_bom(text);
    if text.is_empty() {
        return Err(DictError::EmptyInput("CSV"));
    }

    let mut report = NormalizeReport::default();
    let mut rows = Vec::new();
    let mut header_consumed = false;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells = split_line(line);
        if !header_consumed && looks_like_header(&cells) {
            header_consumed = true;
            continue;
        }
        let row = index + 1;
        if cells.len() < 2 {
            report.push(
                IssueCode::RowTooShort,
                Severity::Warning,
                Some(row),
                None,
                "Row skipped: expected at least char and primary columns",
            );
            continue;
        }
        rows.push(RawRow::new(row, cells[0], cells[1], cells.get(2).copied()));
    }

    finish(rows, report)
}

fn str_field<'v>(obj: &'v serde_json::Map<String, Value>, keys: &[&str]) -> &'v str {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str)).unwrap_or("")
}

fn opt_field<'v>(obj: &'v serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'v str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

/// Array of row objects, or an object map keyed by character.
pub fn parse_json(text: &str) -> Result<Normalized> {
    let text = strip_bom(text);
    if text.is_empty() {
        return Err(DictError::EmptyInput("JSON"));
    }

    let mut report = NormalizeReport::default();
    let parsed: Value = serde_json::from_str(text)?;

    let mut rows = Vec::new();
    match parsed {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let Some(obj) = item.as_object() else {
                    report.push(IssueCode::RowTooShort, Severity::Warning, Some(index + 1), None, "Array entry skipped: not an object row");
                    continue;
                };
                rows.push(RawRow::new(
                    index + 1,
                    str_field(obj, &["char"]),
                    str_field(obj, &["cangjie", "primary"]),
                    opt_field(obj, &["quick", "secondary"]),
                ));
            }
        }
        Value::Object(map) => {
            for (index, (ch, value)) in map.iter().enumerate() {
                let Some(obj) = value.as_object() else {
                    report.push(
                        IssueCode::RowTooShort,
                        Severity::Warning,
                        Some(index + 1),
                        ch.chars().next(),
                        "Object-map entry skipped: value must be an object",
                    );
                    continue;
                };
                rows.push(RawRow::new(
                    index + 1,
                    ch.as_str(),
                    str_field(obj, &["cangjie", "primary"]),
                    opt_field(obj, &["quick", "secondary"]),
                ));
            }
        }
        _ => {}
    }

    finish(rows, report)
}

pub fn detect_format(filename: &str, text: &str) -> SourceFormat {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".csv") || lower.ends_with(".tsv") {
        return SourceFormat::Csv;
    }
    if lower.ends_with(".json") {
        return SourceFormat::Json;
    }
    let trimmed = strip_bom(text);
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        SourceFormat::Json
    } else {
        SourceFormat::Csv
    }
}

/// Dispatch on extension, falling back to content sniffing.
pub fn parse_text(filename: &str, text: &str) -> Result<Normalized> {
    match detect_format(filename, text) {
        SourceFormat::Csv => parse_csv(text),
        SourceFormat::Json => parse_json(text),
    }
}

/// `char,rank` lines into a rank map. Unparseable lines are skipped.
pub fn parse_frequency(text: &str) -> HashMap<char, u32> {
    let mut ranks = HashMap::new();
    for (index, line) in strip_bom(text).lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells = split_line(line);
        let parsed = match cells.as_slice() {
            [ch, rank, ..] => crate::code::canonical_char(ch).zip(rank.parse::<u32>().ok()),
            _ => None,
        };
        match parsed {
            Some((ch, rank)) => {
                ranks.insert(ch, rank);
            }
            None if index == 0 => {} // header
            None => warn!(row = index + 1, "frequency row skipped"),
        }
    }
    ranks
}
