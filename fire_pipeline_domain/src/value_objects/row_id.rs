// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Row id value object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a single CSV row (the `ID` column), used as the per-row
/// idempotency cursor key and for file-level watermark comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(String);

impl RowId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coerce to an ordinal `i64` for cursor comparisons. Non-numeric or
    /// absent ids default to `0`, matching the source stage's tolerant
    /// handling of malformed `ID` columns.
    pub fn as_ordinal(&self) -> i64 {
        self.0.trim().parse().unwrap_or(0)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_ordinal_parses_numeric_id() {
        assert_eq!(RowId::new("4213").as_ordinal(), 4213);
    }

    #[test]
    fn test_as_ordinal_defaults_to_zero_for_garbage() {
        assert_eq!(RowId::new("not-a-number").as_ordinal(), 0);
        assert_eq!(RowId::new("").as_ordinal(), 0);
    }
}
