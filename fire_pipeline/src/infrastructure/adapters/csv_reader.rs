// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CSV File Source Adapter
//!
//! [`CsvFileSource`] implements [`CsvSource`] over the `csv` crate: one
//! `csv::Reader` per open file, tracked behind a per-path mutex so
//! `next_row` can be called repeatedly without the caller managing file
//! handles. The row stream ends with [`RawRow::end_of_file`], matching
//! `csv_utils.from_csv_generator`'s sentinel.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use csv::Reader;
use indexmap::IndexMap;
use tokio::sync::Mutex;

use fire_pipeline_domain::error::PipelineError;
use fire_pipeline_domain::model::RawRow;
use fire_pipeline_domain::ports::csv_source::{CsvFile, CsvSource};

enum FileState {
    Open { reader: Reader<File>, headers: Vec<String> },
    Exhausted,
}

pub struct CsvFileSource {
    folder_path: String,
    readers: Mutex<HashMap<String, FileState>>,
}

impl CsvFileSource {
    pub fn new(folder_path: impl Into<String>) -> Self {
        Self { folder_path: folder_path.into(), readers: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl CsvSource for CsvFileSource {
    async fn list_files(&self) -> Result<Vec<CsvFile>, PipelineError> {
        let folder_path = self.folder_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&folder_path)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    files.push(CsvFile { path: entry.path().to_string_lossy().into_owned() });
                }
            }
            files.sort_by(|a, b| a.path.cmp(&b.path));
            Ok::<_, std::io::Error>(files)
        })
        .await
        .map_err(|e| PipelineError::Io(std::io::Error::other(e.to_string())))?
        .map_err(PipelineError::Io)
    }

    async fn next_row(&self, file: &CsvFile) -> Result<Option<RawRow>, PipelineError> {
        let mut readers = self.readers.lock().await;

        if !readers.contains_key(&file.path) {
            let path = Path::new(&file.path);
            let mut reader =
                Reader::from_path(path).map_err(|e| PipelineError::Io(std::io::Error::other(e.to_string())))?;
            let headers: Vec<String> = reader
                .headers()
                .map_err(|e| PipelineError::Decode(format!("CSV header error in {}: {e}", file.path)))?
                .iter()
                .map(String::from)
                .collect();
            readers.insert(file.path.clone(), FileState::Open { reader, headers });
        }

        match readers.get_mut(&file.path).expect("just inserted") {
            FileState::Exhausted => Ok(None),
            FileState::Open { reader, headers } => {
                let mut record = csv::StringRecord::new();
                let more =
                    reader.read_record(&mut record).map_err(|e| PipelineError::Decode(format!("CSV read error in {}: {e}", file.path)))?;

                if !more {
                    *readers.get_mut(&file.path).expect("checked above") = FileState::Exhausted;
                    return Ok(Some(RawRow::end_of_file()));
                }

                let mut fields: IndexMap<String, String> = IndexMap::new();
                for (name, value) in headers.iter().zip(record.iter()) {
                    fields.insert(name.clone(), value.to_string());
                }
                Ok(Some(RawRow::new(fields)))
            }
        }
    }
}
