//! Raw rows → codepoint-sorted, unique entry set.
//!
//! Rows are checked one by one; bad characters or primary codes drop the row,
//! bad or missing secondary codes are replaced by the derived one. Duplicates
//! are resolved last-write-wins in a single stable sort + compact pass.

use crate::code::{canonical_char, canonical_code, derive_secondary, is_valid_code};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Untrusted source row. `row` is the 1-based position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row: usize,
    pub character: String,
    pub primary: String,
    pub secondary: Option<String>,
}

impl RawRow {
    pub fn new(row: usize, character: impl Into<String>, primary: impl Into<String>, secondary: Option<&str>) -> Self {
        Self {
            row,
            character: character.into(),
            primary: primary.into(),
            secondary: secondary.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub codepoint: u32,
    pub primary: String,
    pub secondary: String,
}

impl Entry {
    pub fn new(ch: char, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self { codepoint: ch as u32, primary: primary.into(), secondary: secondary.into() }
    }

    /// Entry whose secondary code follows the derivation rule.
    pub fn derived(ch: char, primary: impl Into<String>) -> Self {
        let primary = primary.into();
        let secondary = derive_secondary(&primary);
        Self { codepoint: ch as u32, primary, secondary }
    }

    pub fn character(&self) -> Option<char> { char::from_u32(self.codepoint) }

    /// Whether the stored secondary code differs from the derived one.
    pub fn has_custom_secondary(&self) -> bool {
        self.secondary != derive_secondary(&self.primary)
    }
}

/// Entries strictly ascending by codepoint, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet(Vec<Entry>);

impl EntrySet {
    /// Sort by codepoint and keep the last entry for each codepoint.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let (set, _) = compact(entries.into_iter().map(|e| (0, e)).collect(), |_, _| {});
        set
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn as_slice(&self) -> &[Entry] { &self.0 }
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> { self.0.iter() }
    pub fn into_vec(self) -> Vec<Entry> { self.0 }

    pub fn get(&self, codepoint: u32) -> Option<&Entry> {
        self.0
            .binary_search_by_key(&codepoint, |e| e.codepoint)
            .ok()
            .map(|i| &self.0[i])
    }
}

impl<'a> IntoIterator for &'a EntrySet {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;
    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

/// Stable sort then fold equal codepoints into the later row.
fn compact(mut rows: Vec<(usize, Entry)>, mut on_override: impl FnMut(usize, &Entry)) -> (EntrySet, usize) {
    rows.sort_by_key(|(_, e)| e.codepoint);
    let mut out: Vec<Entry> = Vec::with_capacity(rows.len());
    let mut overrides = 0usize;
    for (row, e) in rows {
        match out.last_mut() {
            Some(prev) if prev.codepoint == e.codepoint => {
                overrides += 1;
                on_override(row, &e);
                *prev = e;
            }
            _ => out.push(e),
        }
    }
    (EntrySet(out), overrides)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    RowTooShort,
    InvalidChar,
    MissingPrimary,
    InvalidPrimary,
    InvalidSecondaryDerived,
    SecondaryDerived,
    DuplicateOverridden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub code: IssueCode,
    pub severity: Severity,
    pub row: Option<usize>,
    pub character: Option<char>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub total_rows: usize,
    pub accepted_rows: usize,
    pub rejected_rows: usize,
    pub duplicate_overrides: usize,
    pub cleaned_rows: usize,
    pub issues: Vec<Issue>,
}

impl NormalizeReport {
    pub fn push(&mut self, code: IssueCode, severity: Severity, row: Option<usize>, character: Option<char>, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => warn!(?code, ?row, ?character, "row rejected: {message}"),
            Severity::Warning => debug!(?code, ?row, ?character, "{message}"),
        }
        self.issues.push(Issue { code, severity, row, character, message });
    }

    pub fn count(&self, code: IssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub entries: EntrySet,
    pub report: NormalizeReport,
}

/// Canonicalize, validate and deduplicate rows. An empty result is not an
/// error here; callers decide whether that fails the build.
pub fn normalize(rows: impl IntoIterator<Item = RawRow>) -> Normalized {
    normalize_into(rows, NormalizeReport::default())
}

pub(crate) fn normalize_into(rows: impl IntoIterator<Item = RawRow>, mut report: NormalizeReport) -> Normalized {
    let mut accepted: Vec<(usize, Entry)> = Vec::new();

    for raw in rows {
        report.total_rows += 1;

        let Some(ch) = canonical_char(&raw.character) else {
            report.rejected_rows += 1;
            report.push(IssueCode::InvalidChar, Severity::Error, Some(raw.row), None, "Char must be exactly one Unicode character");
            continue;
        };

        let primary = canonical_code(&raw.primary);
        if primary.is_empty() {
            report.rejected_rows += 1;
            report.push(IssueCode::MissingPrimary, Severity::Error, Some(raw.row), Some(ch), "Primary code is required");
            continue;
        }
        if !is_valid_code(&primary) {
            report.rejected_rows += 1;
            report.push(IssueCode::InvalidPrimary, Severity::Error, Some(raw.row), Some(ch), "Primary code must be A-Z and 1-5 chars");
            continue;
        }

        let secondary = raw.secondary.as_deref().map(canonical_code).unwrap_or_default();
        let secondary = if secondary.is_empty() {
            report.cleaned_rows += 1;
            report.push(IssueCode::SecondaryDerived, Severity::Warning, Some(raw.row), Some(ch), "Secondary code missing, derived from primary");
            derive_secondary(&primary)
        } else if !is_valid_code(&secondary) {
            report.cleaned_rows += 1;
            report.push(IssueCode::InvalidSecondaryDerived, Severity::Warning, Some(raw.row), Some(ch), "Secondary code invalid, derived from primary");
            derive_secondary(&primary)
        } else {
            secondary
        };

        accepted.push((raw.row, Entry::new(ch, primary, secondary)));
    }

    let mut duplicates: Vec<(usize, char)> = Vec::new();
    let (entries, overrides) = compact(accepted, |row, e| {
        if let Some(ch) = e.character() {
            duplicates.push((row, ch));
        }
    });
    for (row, ch) in duplicates {
        report.push(
            IssueCode::DuplicateOverridden,
            Severity::Warning,
            Some(row),
            Some(ch),
            "Duplicate char found, latest row overrides previous row",
        );
    }
    // stable, so issues of one row keep their order
    report.issues.sort_by_key(|i| i.row);
    report.duplicate_overrides = overrides;
    report.accepted_rows = entries.len();

    debug!(
        total = report.total_rows,
        accepted = report.accepted_rows,
        rejected = report.rejected_rows,
        duplicates = report.duplicate_overrides,
        "normalized dictionary rows"
    );
    Normalized { entries, report }
}
