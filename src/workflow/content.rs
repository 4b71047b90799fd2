//! Content block editing
//!
//! Edits are applied to a copy of the page. Every touched table is
//! normalized before the page is handed back.

use std::collections::HashSet;

use serde::Deserialize;

use crate::constants::MAX_CONTENT_BLOCKS;
use crate::models::{ColumnKind, ContentBlock, ContentError};

/// One editor action on a page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ContentEdit {
    Append { block: ContentBlock },
    Replace { index: usize, block: ContentBlock },
    /// Remove at `from`, then insert at `to`
    Move { from: usize, to: usize },
    Delete { index: usize },
    Table { index: usize, edit: TableEdit },
}

/// Table editing operations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TableEdit {
    AddColumn {
        header: String,
        #[serde(default)]
        kind: ColumnKind,
    },
    RemoveColumn { column: usize },
    RenameColumn { column: usize, header: String },
    SetColumnKind { column: usize, kind: ColumnKind },
    AddRow,
    RemoveRow { row: usize },
    SetCell { row: usize, column: usize, value: String },
}

fn check_index(index: usize, len: usize) -> Result<(), ContentError> {
    if index >= len {
        return Err(ContentError::BlockOutOfRange { index, len });
    }
    Ok(())
}

fn checked_block(mut block: ContentBlock) -> Result<ContentBlock, ContentError> {
    block.normalize();
    if let ContentBlock::Table(table) = &block {
        table.check_limits()?;
    }
    Ok(block)
}

/// Normalize a whole page supplied at once
pub fn prepare(page: Vec<ContentBlock>) -> Result<Vec<ContentBlock>, ContentError> {
    if page.len() > MAX_CONTENT_BLOCKS {
        return Err(ContentError::TooManyBlocks(MAX_CONTENT_BLOCKS));
    }
    page.into_iter().map(checked_block).collect()
}

/// Apply an edit, returning the new page
pub fn apply(page: &[ContentBlock], edit: ContentEdit) -> Result<Vec<ContentBlock>, ContentError> {
    let mut blocks = page.to_vec();

    match edit {
        ContentEdit::Append { block } => {
            if blocks.len() >= MAX_CONTENT_BLOCKS {
                return Err(ContentError::TooManyBlocks(MAX_CONTENT_BLOCKS));
            }
            blocks.push(checked_block(block)?);
        }
        ContentEdit::Replace { index, block } => {
            check_index(index, blocks.len())?;
            blocks[index] = checked_block(block)?;
        }
        ContentEdit::Move { from, to } => {
            check_index(from, blocks.len())?;
            check_index(to, blocks.len())?;
            let block = blocks.remove(from);
            blocks.insert(to, block);
        }
        ContentEdit::Delete { index } => {
            check_index(index, blocks.len())?;
            blocks.remove(index);
        }
        ContentEdit::Table { index, edit } => {
            check_index(index, blocks.len())?;
            let table = blocks[index]
                .as_table_mut()
                .ok_or(ContentError::NotATable(index))?;
            match edit {
                TableEdit::AddColumn { header, kind } => table.add_column(header, kind)?,
                TableEdit::RemoveColumn { column } => table.remove_column(column)?,
                TableEdit::RenameColumn { column, header } => table.rename_column(column, header)?,
                TableEdit::SetColumnKind { column, kind } => table.set_column_kind(column, kind)?,
                TableEdit::AddRow => table.add_row()?,
                TableEdit::RemoveRow { row } => table.remove_row(row)?,
                TableEdit::SetCell { row, column, value } => table.set_cell(row, column, value)?,
            }
            table.normalize();
        }
    }

    Ok(blocks)
}

/// Every applicant cell must name an approved application of the competition
pub fn check_applicant_cells(
    page: &[ContentBlock],
    approved: &HashSet<String>,
) -> Result<(), ContentError> {
    for block in page {
        if let ContentBlock::Table(table) = block {
            if let Some(unknown) = table.applicant_cells().find(|id| !approved.contains(*id)) {
                return Err(ContentError::UnknownApplicant(unknown.to_string()));
            }
        }
    }
    Ok(())
}

/// Whether the page references applicants at all
pub fn has_applicant_cells(page: &[ContentBlock]) -> bool {
    page.iter().any(|block| match block {
        ContentBlock::Table(table) => table.applicant_cells().next().is_some(),
        _ => false,
    })
}
