//! List file parsing
//!
//! Parsing is synchronous and runs on the blocking pool. A malformed record
//! is logged and skipped; only an unreadable file fails the cycle.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::RefreshError;
use crate::lists::{ListKind, RawLists};

/// Turns one list file into raw records
pub trait ListParser: Send + Sync {
    fn parse(&self, kind: ListKind, path: &Path) -> Result<RawLists, RefreshError>;
}

/// One JSON object per line. Blank lines are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesParser;

impl JsonLinesParser {
    fn read<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RefreshError> {
        let parse_err = |source| RefreshError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let reader = BufReader::new(File::open(path).map_err(parse_err)?);
        let mut records = Vec::new();
        let mut malformed = 0usize;

        for (n, line) in reader.lines().enumerate() {
            let line = line.map_err(parse_err)?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    malformed += 1;
                    tracing::warn!(
                        path = %path.display(),
                        line = n + 1,
                        error = %e,
                        "skipping malformed record"
                    );
                }
            }
        }

        tracing::debug!(
            path = %path.display(),
            records = records.len(),
            malformed,
            "parsed list file"
        );
        Ok(records)
    }
}

impl ListParser for JsonLinesParser {
    fn parse(&self, kind: ListKind, path: &Path) -> Result<RawLists, RefreshError> {
        let mut lists = RawLists::default();
        match kind {
            ListKind::Sdn => lists.entities = Self::read(path)?,
            ListKind::Addresses => lists.addresses = Self::read(path)?,
            ListKind::AlternateNames => lists.alt_names = Self::read(path)?,
            ListKind::DeniedPersons => lists.denied_persons = Self::read(path)?,
            ListKind::ScreeningList => lists.screening_list = Self::read(path)?,
        }
        Ok(lists)
    }
}
