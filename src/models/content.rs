//! Competition page content blocks
//!
//! Blocks are kept as an ordered list of tagged values. Tables are normalized
//! on every edit so each row has exactly one cell per header and each column
//! has a kind. The database form ([`StoredBlock`]) keys row cells by column so
//! that no raw nested arrays are persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_TABLE_COLUMNS, MAX_TABLE_ROWS};

/// One block of a competition page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Title { text: String },
    Subtitle { text: String },
    Text { text: String },
    Contact { text: String },
    Table(TableBlock),
}

impl ContentBlock {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Title { .. } => "title",
            Self::Subtitle { .. } => "subtitle",
            Self::Text { .. } => "text",
            Self::Contact { .. } => "contact",
            Self::Table(_) => "table",
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableBlock> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Normalize tables; other blocks are left as they are
    pub fn normalize(&mut self) {
        if let Self::Table(table) = self {
            table.normalize();
        }
    }
}

/// What a table column holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Free text typed by the editor
    #[default]
    Text,
    /// Id of an approved application of the same competition
    Applicant,
}

/// A table with typed columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    pub headers: Vec<String>,
    #[serde(default)]
    pub column_kinds: Vec<ColumnKind>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    pub fn new(headers: Vec<String>) -> Self {
        let mut table = Self {
            headers,
            column_kinds: Vec::new(),
            rows: Vec::new(),
        };
        table.normalize();
        table
    }

    /// Pad or cut kinds and rows to the header count. Idempotent.
    pub fn normalize(&mut self) {
        let columns = self.headers.len();
        self.column_kinds.resize(columns, ColumnKind::Text);
        for row in &mut self.rows {
            row.resize(columns, String::new());
        }
    }

    pub fn check_limits(&self) -> Result<(), ContentError> {
        if self.headers.len() > MAX_TABLE_COLUMNS {
            return Err(ContentError::TooManyColumns(MAX_TABLE_COLUMNS));
        }
        if self.rows.len() > MAX_TABLE_ROWS {
            return Err(ContentError::TooManyRows(MAX_TABLE_ROWS));
        }
        Ok(())
    }

    pub fn add_column(&mut self, header: String, kind: ColumnKind) -> Result<(), ContentError> {
        if self.headers.len() >= MAX_TABLE_COLUMNS {
            return Err(ContentError::TooManyColumns(MAX_TABLE_COLUMNS));
        }
        self.normalize();
        self.headers.push(header);
        self.column_kinds.push(kind);
        for row in &mut self.rows {
            row.push(String::new());
        }
        Ok(())
    }

    pub fn remove_column(&mut self, column: usize) -> Result<(), ContentError> {
        self.check_column(column)?;
        self.normalize();
        self.headers.remove(column);
        self.column_kinds.remove(column);
        for row in &mut self.rows {
            row.remove(column);
        }
        Ok(())
    }

    pub fn rename_column(&mut self, column: usize, header: String) -> Result<(), ContentError> {
        self.check_column(column)?;
        self.headers[column] = header;
        Ok(())
    }

    /// Changing the kind clears the column, old values mean nothing under the new kind
    pub fn set_column_kind(&mut self, column: usize, kind: ColumnKind) -> Result<(), ContentError> {
        self.check_column(column)?;
        self.normalize();
        if self.column_kinds[column] != kind {
            self.column_kinds[column] = kind;
            for row in &mut self.rows {
                row[column].clear();
            }
        }
        Ok(())
    }

    pub fn add_row(&mut self) -> Result<(), ContentError> {
        if self.rows.len() >= MAX_TABLE_ROWS {
            return Err(ContentError::TooManyRows(MAX_TABLE_ROWS));
        }
        self.normalize();
        self.rows.push(vec![String::new(); self.headers.len()]);
        Ok(())
    }

    pub fn remove_row(&mut self, row: usize) -> Result<(), ContentError> {
        self.check_row(row)?;
        self.rows.remove(row);
        Ok(())
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: String) -> Result<(), ContentError> {
        self.check_row(row)?;
        self.check_column(column)?;
        self.normalize();
        self.rows[row][column] = value;
        Ok(())
    }

    pub fn column_kind(&self, column: usize) -> ColumnKind {
        self.column_kinds.get(column).copied().unwrap_or_default()
    }

    /// Non-empty cells of applicant columns
    pub fn applicant_cells(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().flat_map(move |row| {
            row.iter()
                .enumerate()
                .filter(move |(column, value)| {
                    self.column_kind(*column) == ColumnKind::Applicant && !value.is_empty()
                })
                .map(|(_, value)| value.as_str())
        })
    }

    fn check_column(&self, column: usize) -> Result<(), ContentError> {
        if column >= self.headers.len() {
            return Err(ContentError::ColumnOutOfRange {
                index: column,
                len: self.headers.len(),
            });
        }
        Ok(())
    }

    fn check_row(&self, row: usize) -> Result<(), ContentError> {
        if row >= self.rows.len() {
            return Err(ContentError::RowOutOfRange {
                index: row,
                len: self.rows.len(),
            });
        }
        Ok(())
    }
}

/// Content editing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("Block {index} does not exist (page has {len} blocks)")]
    BlockOutOfRange { index: usize, len: usize },

    #[error("Column {index} does not exist (table has {len} columns)")]
    ColumnOutOfRange { index: usize, len: usize },

    #[error("Row {index} does not exist (table has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Block {0} is not a table")]
    NotATable(usize),

    #[error("A page can have at most {0} blocks")]
    TooManyBlocks(usize),

    #[error("A table can have at most {0} columns")]
    TooManyColumns(usize),

    #[error("A table can have at most {0} rows")]
    TooManyRows(usize),

    #[error("'{0}' is not an approved applicant of this competition")]
    UnknownApplicant(String),
}

// =============================================================================
// STORED FORM
// =============================================================================

/// Database form of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredBlock {
    Title { text: String },
    Subtitle { text: String },
    Text { text: String },
    Contact { text: String },
    Table(StoredTable),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTable {
    pub headers: Vec<String>,
    pub column_kinds: Vec<ColumnKind>,
    pub rows: Vec<StoredRow>,
}

/// Row cells keyed `c0`, `c1`, ... by column position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    pub cells: BTreeMap<String, String>,
}

fn cell_key(column: usize) -> String {
    format!("c{column}")
}

impl From<&ContentBlock> for StoredBlock {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Title { text } => Self::Title { text: text.clone() },
            ContentBlock::Subtitle { text } => Self::Subtitle { text: text.clone() },
            ContentBlock::Text { text } => Self::Text { text: text.clone() },
            ContentBlock::Contact { text } => Self::Contact { text: text.clone() },
            ContentBlock::Table(table) => {
                let mut table = table.clone();
                table.normalize();
                let rows = table
                    .rows
                    .iter()
                    .map(|row| StoredRow {
                        cells: row
                            .iter()
                            .enumerate()
                            .filter(|(_, value)| !value.is_empty())
                            .map(|(column, value)| (cell_key(column), value.clone()))
                            .collect(),
                    })
                    .collect();
                Self::Table(StoredTable {
                    headers: table.headers,
                    column_kinds: table.column_kinds,
                    rows,
                })
            }
        }
    }
}

impl From<StoredBlock> for ContentBlock {
    fn from(block: StoredBlock) -> Self {
        match block {
            StoredBlock::Title { text } => Self::Title { text },
            StoredBlock::Subtitle { text } => Self::Subtitle { text },
            StoredBlock::Text { text } => Self::Text { text },
            StoredBlock::Contact { text } => Self::Contact { text },
            StoredBlock::Table(stored) => {
                let columns = stored.headers.len();
                let rows = stored
                    .rows
                    .into_iter()
                    .map(|mut row| {
                        (0..columns)
                            .map(|column| row.cells.remove(&cell_key(column)).unwrap_or_default())
                            .collect()
                    })
                    .collect();
                let mut table = TableBlock {
                    headers: stored.headers,
                    column_kinds: stored.column_kinds,
                    rows,
                };
                table.normalize();
                Self::Table(table)
            }
        }
    }
}

/// Convert a page to its database form
pub fn to_stored(blocks: &[ContentBlock]) -> Vec<StoredBlock> {
    blocks.iter().map(StoredBlock::from).collect()
}

/// Restore a page from its database form
pub fn from_stored(blocks: Vec<StoredBlock>) -> Vec<ContentBlock> {
    blocks.into_iter().map(ContentBlock::from).collect()
}
