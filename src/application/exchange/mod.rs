//! Export and import of posts and pages as XML feed documents.
//!
//! Exports are Atom documents extended with the `folio` namespace and packed
//! into a zip archive. Imports accept those documents back, or a WordPress
//! eXtended RSS file after a text repair pass.

pub mod archive;
pub mod document;
pub mod encode;
pub mod foreign;
pub mod hooks;
pub mod native;
pub mod repair;
pub mod request;
pub mod xml;

use thiserror::Error;

pub use archive::{ArchiveError, ArchiveFile, ExportArchive, archive_file_name, package};
pub use document::{FeedAuthor, FeedContent, FeedDocument, FeedEntry, Generator};
pub use encode::{ExportSource, FeedEncoder, render_document, tag_uri};
pub use foreign::{ForeignBatch, ForeignOptions, decode_foreign};
pub use hooks::{ExportHook, ExportHooks, ImportHook, ImportHooks};
pub use native::{NativeBatch, decode_native};
pub use request::{EntityCreationRequest, MediaMatcher, NewPage, NewPost};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const FOLIO_NS: &str = "http://folio.pub/export/1.0/";
pub const FOLIO_PREFIX: &str = "folio";
/// Generator text identifying native exports.
pub const GENERATOR_NAME: &str = "Folio";
pub const GENERATOR_URI: &str = "https://folio.pub/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("invalid document: {reason}")]
    InvalidDocument { reason: String },
    #[error("feed is still malformed after {passes} repair passes")]
    MalformedFeed { passes: usize },
}

impl ExchangeError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            reason: reason.into(),
        }
    }
}

/// Decode raw upload bytes, rejecting empty or non UTF-8 input.
pub(crate) fn document_text(bytes: &[u8]) -> Result<&str, ExchangeError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| ExchangeError::invalid(format!("document is not UTF-8: {err}")))?;
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(ExchangeError::invalid("document is empty"));
    }
    Ok(text)
}
