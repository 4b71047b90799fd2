//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod actor;
pub mod application;
pub mod competition;
pub mod content;
pub mod registration;
pub mod user;

pub use actor::*;
pub use application::*;
pub use competition::*;
pub use content::{ColumnKind, ContentBlock, ContentError, StoredBlock, TableBlock};
pub use registration::*;
pub use user::*;
