//! Decoding of OpenType metadata tables.
//!
//! A font container parser hands over `(tag, bytes)` pairs; a
//! [`TableRegistry`](tables::TableRegistry) dispatches each pair to the
//! decoder registered for its tag and returns a [`Table`](tables::Table).
//! The 'OS/2' and 'fvar' tables are decoded here, other tables are kept
//! as raw bytes unless a decoder is registered for them.

use buffer::BeBufReaderError;
use tables::{DecodeError, TableDecodeError};
use thiserror::Error;

pub mod buffer;
pub mod summary;
pub mod tables;
pub mod types;

#[cfg(test)]
mod test_helpers;

pub use summary::FontSummary;
pub use tables::{Table, TableKind, TableRegistry};
pub use types::{Fixed, NameId, Tag};

#[derive(Debug, Error)]
pub enum SfntError {
    #[error(transparent)]
    TableDecodeError(#[from] TableDecodeError),

    #[error(transparent)]
    DecodeError(#[from] DecodeError),

    #[error(transparent)]
    BeBufReaderError(#[from] BeBufReaderError),

    #[cfg(feature = "serde")]
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}
