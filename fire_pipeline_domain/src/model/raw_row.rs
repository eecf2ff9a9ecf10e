// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Raw CSV row, carried unparsed from the source stage to the validator.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The marker key/value a `RawRow` carries to signal end-of-file, so a
/// consumer can tell "no more rows from this file" apart from "no rows
/// arrived yet". Mirrors the source's `{"_end_": true}` sentinel record.
const END_OF_FILE_KEY: &str = "_end_";

/// An ordered string/string map of one CSV record.
///
/// Order is preserved (via `IndexMap`) so re-serializing to JSON round-trips
/// the original column order, which matters for anyone replaying the raw
/// topic for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow(IndexMap<String, String>);

impl RawRow {
    pub fn new(fields: IndexMap<String, String>) -> Self {
        Self(fields)
    }

    /// The end-of-file sentinel row published once a CSV file has been
    /// fully read, so downstream stages can distinguish "no more rows from
    /// this file" from "file still open, no new rows yet".
    pub fn end_of_file() -> Self {
        let mut fields = IndexMap::with_capacity(1);
        fields.insert(END_OF_FILE_KEY.to_string(), "true".to_string());
        Self(fields)
    }

    pub fn is_end_of_file(&self) -> bool {
        self.0.get(END_OF_FILE_KEY).map(|v| v == "true").unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.0
    }
}

impl From<IndexMap<String, String>> for RawRow {
    fn from(fields: IndexMap<String, String>) -> Self {
        Self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_file_sentinel_is_recognized() {
        let row = RawRow::end_of_file();
        assert!(row.is_end_of_file());
    }

    #[test]
    fn test_ordinary_row_is_not_end_of_file() {
        let mut fields = IndexMap::new();
        fields.insert("Incident Number".to_string(), "19000001".to_string());
        let row = RawRow::new(fields);
        assert!(!row.is_end_of_file());
        assert_eq!(row.get("Incident Number"), Some("19000001"));
        assert_eq!(row.get("missing"), None);
    }
}
