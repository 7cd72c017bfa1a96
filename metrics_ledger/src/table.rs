//! In-memory ledger table and its CSV representation.
//!
//! A table file looks like:
//!
//! ```text
//! TestName,ExecutionTimeMs,UsedMemoryMb,...
//! testCreateDataClassFile,48211,,...
//! ```
//!
//! The first record is the header, every later record is one row keyed by
//! its first cell. Files written by older tooling may carry a shorter header,
//! short lines, or the same test appended more than once; loading tolerates
//! all three.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::{LedgerError, Result};
use crate::schema::{canonical_header, TEST_NAME_COLUMN};

/// One ledger row: the key plus one cell per non-key header column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub test_name: String,
    pub cells: Vec<String>,
}

impl Row {
    fn empty(test_name: &str, width: usize) -> Self {
        Self {
            test_name: test_name.to_string(),
            cells: vec![String::new(); width],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Row>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// Empty table with the canonical header.
    pub fn new() -> Self {
        Self {
            header: canonical_header(),
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Names of the non-key columns, in header order.
    pub fn metric_columns(&self) -> &[String] {
        &self.header[1..]
    }

    /// Cell index of `name` within a row, if the header carries it.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.metric_columns().iter().position(|column| column == name)
    }

    pub fn row(&self, test_name: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.test_name == test_name)
    }

    /// Stored text for `test_name`/`column`; `None` when the row or column is
    /// missing, `Some("")` when the cell is unset.
    pub fn cell(&self, test_name: &str, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.row(test_name).map(|row| row.cells[idx].as_str())
    }

    pub fn is_canonical(&self) -> bool {
        self.header == canonical_header()
    }

    /// Rebuild the header as the canonical one, moving every stored value to
    /// the column with the same name. Returns the old columns that have no
    /// canonical counterpart; their values are discarded.
    pub fn migrate_to_canonical(&mut self) -> Vec<String> {
        let new_header = canonical_header();
        let mut targets = Vec::with_capacity(self.header.len() - 1);
        let mut dropped = Vec::new();

        for old_column in self.metric_columns() {
            let target = new_header[1..].iter().position(|column| column == old_column);
            if target.is_none() {
                dropped.push(old_column.clone());
            }
            targets.push(target);
        }

        let width = new_header.len() - 1;
        for row in &mut self.rows {
            let mut cells = vec![String::new(); width];
            for (old_cell, target) in row.cells.drain(..).zip(targets.iter()) {
                if let Some(new_idx) = target {
                    cells[*new_idx] = old_cell;
                }
            }
            row.cells = cells;
        }
        self.header = new_header;
        dropped
    }

    /// Insert or merge a row. Only the given `(cell index, text)` pairs are
    /// written; every other cell keeps its value. Returns `true` when a new row
    /// was appended.
    pub fn upsert(&mut self, test_name: &str, updates: &[(usize, String)]) -> bool {
        let width = self.header.len() - 1;
        let (row, inserted) = match self.rows.iter().position(|row| row.test_name == test_name) {
            Some(idx) => (&mut self.rows[idx], false),
            None => {
                self.rows.push(Row::empty(test_name, width));
                let last = self.rows.len() - 1;
                (&mut self.rows[last], true)
            }
        };
        for (idx, text) in updates {
            if let Some(cell) = row.cells.get_mut(*idx) {
                cell.clone_from(text);
            }
        }
        inserted
    }

    /// Load a table file. A missing or blank file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Table>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LedgerError::io(path, err)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Self::from_csv(&bytes, path).map(Some)
    }

    /// Parse table text. `origin` is only used for diagnostics.
    pub fn from_csv(bytes: &[u8], origin: &Path) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);
        let mut records = reader.records();

        let header: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|err| LedgerError::csv(origin, err))?
                .iter()
                .map(|cell| cell.trim_start_matches('\u{feff}').trim().to_string())
                .collect(),
            None => return Ok(Table::new()),
        };
        if header.first().map(String::as_str) != Some(TEST_NAME_COLUMN) {
            return Err(LedgerError::CorruptTable {
                path: origin.to_path_buf(),
                reason: format!("first header column must be {}", TEST_NAME_COLUMN),
            });
        }

        let width = header.len() - 1;
        let mut rows: Vec<Row> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (line_idx, record) in records.enumerate() {
            let record = record.map_err(|err| LedgerError::csv(origin, err))?;
            let line = line_idx + 2;
            let mut fields = record.iter();
            let test_name = fields.next().unwrap_or_default().trim().to_string();
            if test_name.is_empty() {
                tracing::warn!("Skipping line {} of {:?}: empty {}", line, origin, TEST_NAME_COLUMN);
                continue;
            }

            let mut cells: Vec<String> = fields.map(str::to_string).collect();
            if cells.len() > width {
                tracing::warn!(
                    "Line {} of {:?} has {} cells, header has {}; extra cells ignored",
                    line,
                    origin,
                    cells.len() + 1,
                    width + 1
                );
                cells.truncate(width);
            }
            cells.resize(width, String::new());

            match positions.get(&test_name) {
                Some(&existing) => {
                    tracing::warn!(
                        "Duplicate row for {:?} at line {} of {:?}; merged into first occurrence",
                        test_name,
                        line,
                        origin
                    );
                    let target = &mut rows[existing].cells;
                    for (slot, cell) in target.iter_mut().zip(cells) {
                        if !cell.is_empty() {
                            *slot = cell;
                        }
                    }
                }
                None => {
                    positions.insert(test_name.clone(), rows.len());
                    rows.push(Row { test_name, cells });
                }
            }
        }

        Ok(Table { header, rows })
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let to_err = |err: csv::Error| LedgerError::csv("<memory>", err);
        writer.write_record(&self.header).map_err(to_err)?;
        for row in &self.rows {
            writer
                .write_record(std::iter::once(&row.test_name).chain(row.cells.iter()))
                .map_err(to_err)?;
        }
        writer
            .into_inner()
            .map_err(|err| LedgerError::io("<memory>", err.into_error()))
    }

    /// Persist the table: write a sibling temp file, then rename over `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_csv()?;
        write_atomic(path, &bytes)
    }
}

/// Write via temp file and rename so readers never observe a half-written file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, bytes).map_err(|err| LedgerError::io(&temp_path, err))?;
    fs::rename(&temp_path, path).map_err(|err| {
        let _ = fs::remove_file(&temp_path);
        LedgerError::io(path, err)
    })
}
