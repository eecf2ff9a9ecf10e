// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Incident number value object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a fire incident (the CSV `Incident Number` column).
///
/// Used as the message bus partition key (so all rows of one incident are
/// ordered relative to each other) and as the serving-layer base key segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IncidentNumber(String);

impl IncidentNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for IncidentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IncidentNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for IncidentNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_inner_string() {
        let incident = IncidentNumber::new("19123456");
        assert_eq!(incident.to_string(), "19123456");
        assert_eq!(incident.as_str(), "19123456");
    }

    #[test]
    fn test_equality_and_ordering() {
        let a = IncidentNumber::new("19000001");
        let b = IncidentNumber::new("19000002");
        assert_ne!(a, b);
        assert!(a < b);
    }
}
