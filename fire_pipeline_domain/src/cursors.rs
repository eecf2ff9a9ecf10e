// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Idempotency Cursors
//!
//! KV-resident state each stage consults before doing work, so restarts and
//! redeliveries don't reprocess or re-publish a row twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-row idempotency marker: has this row's id already been handled by
/// the current stage?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCursor {
    pub processed: bool,
}

impl RowCursor {
    pub fn processed() -> Self {
        Self { processed: true }
    }

    pub fn not_processed() -> Self {
        Self { processed: false }
    }
}

/// Per-file progress marker the source stage consults on restart, so a
/// partially-read file resumes instead of restarting from row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCursor {
    /// Highest row ordinal (`RowId::as_ordinal`) published so far from this file.
    pub latest_row: i64,
    /// Whether the file has been read to its end-of-file sentinel.
    pub completed: bool,
}

impl FileCursor {
    pub fn new(latest_row: i64, completed: bool) -> Self {
        Self { latest_row, completed }
    }

    pub fn start() -> Self {
        Self { latest_row: 0, completed: false }
    }

    /// `true` if `row_ordinal` is at or behind this cursor, i.e. already published.
    pub fn already_published(&self, row_ordinal: i64) -> bool {
        row_ordinal <= self.latest_row
    }
}

/// A stage's consumer watermark: the timestamp up to which its input has
/// been durably processed. Stored as a plain RFC3339 string value in the KV
/// store (not a hash), matching the upstream system's storage shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark(pub DateTime<Utc>);

impl Watermark {
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    pub fn parse(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value).ok().map(|dt| Watermark(dt.with_timezone(&Utc)))
    }

    /// Advance only if `candidate` is strictly newer, preserving monotonicity.
    pub fn advance(&mut self, candidate: DateTime<Utc>) {
        if candidate > self.0 {
            self.0 = candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_cursor_already_published() {
        let cursor = FileCursor::new(100, false);
        assert!(cursor.already_published(50));
        assert!(cursor.already_published(100));
        assert!(!cursor.already_published(101));
    }

    #[test]
    fn test_watermark_advance_is_monotonic() {
        let mut wm = Watermark(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        wm.advance(Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(wm.0.to_rfc3339(), Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap().to_rfc3339());

        // An older candidate does not move the watermark backwards.
        wm.advance(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(wm.0.to_rfc3339(), Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap().to_rfc3339());
    }

    #[test]
    fn test_watermark_round_trips_through_rfc3339() {
        let wm = Watermark(Utc.with_ymd_and_hms(2026, 7, 26, 12, 0, 0).unwrap());
        let parsed = Watermark::parse(&wm.to_rfc3339()).unwrap();
        assert_eq!(wm.0, parsed.0);
    }
}
