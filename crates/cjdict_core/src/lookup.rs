//! Character → codes queries over a decoded artifact or an in-memory index.

use crate::code::{derive_secondary, query_codepoint};
use crate::decoder::DecodedView;
use crate::errors::{DictError, Result};
use crate::normalize::EntrySet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codes {
    pub primary: String,
    pub secondary: String,
}

/// Storage-independent lookup. Unknown characters are `Ok(None)`; a query
/// that is not exactly one character is `InvalidLookupInput`.
pub trait DictionaryLookup {
    fn lookup(&self, query: &str) -> Result<Option<Codes>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Binary search over the codepoints table plus per-access slot decoding.
#[derive(Debug, Clone, Copy)]
pub struct BinaryLookup<'a> {
    view: DecodedView<'a>,
}

impl<'a> BinaryLookup<'a> {
    pub fn new(view: DecodedView<'a>) -> Self { Self { view } }

    pub fn view(&self) -> &DecodedView<'a> { &self.view }

    pub fn position(&self, codepoint: u32) -> Option<usize> {
        self.view.codepoints().binary_search(codepoint)
    }

    /// Decode both codes for table row `index`. Without a secondary table the
    /// secondary code is derived from the primary one.
    pub fn codes_at(&self, index: usize) -> Result<Codes> {
        let primary = self.view.primary_table().code(index)?;
        let secondary = match self.view.secondary_table() {
            Some(table) => table.code(index)?,
            None => derive_secondary(&primary),
        };
        Ok(Codes { primary, secondary })
    }

    /// Stored frequency rank, `None` for unknown characters or when the
    /// artifact carries no frequency table.
    pub fn rank(&self, query: &str) -> Result<Option<u32>> {
        let codepoint = query_codepoint(query)?;
        let Some(freq) = self.view.frequency() else { return Ok(None) };
        Ok(self.position(codepoint).and_then(|i| freq.get(i)))
    }

    /// Every entry in codepoint order, one item per table row. A stored
    /// codepoint that is not a scalar value is an error, not a skipped row.
    pub fn iter(&self) -> impl Iterator<Item = Result<(char, Codes)>> + '_ {
        self.view.codepoints().iter().enumerate().map(move |(index, codepoint)| {
            let ch = char::from_u32(codepoint).ok_or(DictError::CorruptCodepoint { index, codepoint })?;
            Ok((ch, self.codes_at(index)?))
        })
    }
}

impl DictionaryLookup for BinaryLookup<'_> {
    fn lookup(&self, query: &str) -> Result<Option<Codes>> {
        let codepoint = query_codepoint(query)?;
        match self.position(codepoint) {
            Some(index) => self.codes_at(index).map(Some),
            None => Ok(None),
        }
    }

    fn len(&self) -> usize { self.view.entry_count() }
}

/// Look up one character in a decoded artifact.
pub fn lookup(view: &DecodedView<'_>, query: &str) -> Result<Option<Codes>> {
    BinaryLookup::new(*view).lookup(query)
}

/// In-memory index straight from normalized entries; serves as the fallback
/// source when an artifact is rejected.
#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    entries: EntrySet,
}

impl EntryIndex {
    pub fn new(entries: EntrySet) -> Self { Self { entries } }
    pub fn entries(&self) -> &EntrySet { &self.entries }
}

impl DictionaryLookup for EntryIndex {
    fn lookup(&self, query: &str) -> Result<Option<Codes>> {
        let codepoint = query_codepoint(query)?;
        Ok(self.entries.get(codepoint).map(|e| Codes {
            primary: e.primary.clone(),
            secondary: e.secondary.clone(),
        }))
    }

    fn len(&self) -> usize { self.entries.len() }
}
