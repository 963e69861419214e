//! Application services for the administrative surface.

pub mod export;
pub mod import;
pub mod search;

pub use export::{AdminExportError, AdminExportService, ExportRequest};
pub use import::{AdminImportError, AdminImportService, ImportSummary};
pub use search::{AdminSearchError, AdminSearchService};
