//! Zip packaging of export documents.

use std::io::Write;

use thiserror::Error;
use time::Date;
use time::macros::format_description;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const FALLBACK_SITE_NAME: &str = "Site";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl ArchiveFile {
    pub fn new(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }
}

/// Finished archive ready for download.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub entries: usize,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to write zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to write archive entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Pack `files` into a deflated zip, in the given order.
pub fn package(files: &[ArchiveFile]) -> Result<Vec<u8>, ArchiveError> {
    let buf = std::io::Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(buf);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        zip.start_file(file.name.as_str(), options)?;
        zip.write_all(&file.contents)?;
    }

    let finished = zip.finish()?;
    Ok(finished.into_inner())
}

/// `<SiteName>_Export_<YYYY-MM-DD>.zip`
pub fn archive_file_name(site_name: &str, date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    let date = date.format(format).unwrap_or_else(|_| date.to_string());
    format!("{}_Export_{date}.zip", sanitize_site_name(site_name))
}

/// Camel-case the words of `name`, keeping only ASCII alphanumerics.
pub fn sanitize_site_name(name: &str) -> String {
    let ascii = slug::slugify(name);
    let camel: String = ascii
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if camel.is_empty() {
        FALLBACK_SITE_NAME.to_string()
    } else {
        camel
    }
}
