// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! CSV source trait contract.

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::model::RawRow;

/// One discoverable CSV file under the source stage's watched folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    /// Absolute path, used as the file cursor's key.
    pub path: String,
}

/// Enumerates and reads CSV files for the source stage.
///
/// An implementation lists the watched directory once per main-loop tick and
/// opens each file as a lazy row stream. The stream always ends with
/// [`RawRow::end_of_file`] so a caller can mark a [`crate::cursors::FileCursor`]
/// completed without special-casing EOF.
#[async_trait]
pub trait CsvSource: Send + Sync {
    /// List files currently present, in the order a directory listing
    /// returns them. Empty means the watched folder has nothing to read.
    async fn list_files(&self) -> Result<Vec<CsvFile>, PipelineError>;

    /// Read the next row of `file`, advancing an implementation-owned
    /// cursor over that file's underlying reader. Returns
    /// [`RawRow::end_of_file`] exactly once after the last real row, then
    /// `Ok(None)` on every call after that.
    async fn next_row(&self, file: &CsvFile) -> Result<Option<RawRow>, PipelineError>;
}
