use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Folio content exchange and admin service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the admin HTTP service.
    Serve(Box<ServeArgs>),
    /// Write posts and/or pages to a zip archive of Atom documents.
    Export(ExportArgs),
    /// Create posts and pages from a native or WordPress export.
    Import(ImportArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the uploads directory.
    #[arg(long = "uploads-directory", value_name = "PATH")]
    pub uploads_directory: Option<PathBuf>,

    /// Override the maximum request size for import uploads in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Destination of the zip archive.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Export posts; when neither --posts nor --pages is supplied, both are exported.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub posts: bool,

    /// Export pages; when neither --posts nor --pages is supplied, both are exported.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub pages: bool,

    /// Search query restricting the exported posts.
    #[arg(long = "filter-posts", value_name = "QUERY", default_value = "")]
    pub filter_posts: String,

    /// Search query restricting the exported pages.
    #[arg(long = "filter-pages", value_name = "QUERY", default_value = "")]
    pub filter_pages: String,
}

impl ExportArgs {
    /// `(posts, pages)` with the "neither means both" default applied.
    pub fn selection(&self) -> (bool, bool) {
        if !self.posts && !self.pages {
            (true, true)
        } else {
            (self.posts, self.pages)
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Login of the user that entries without a known author are attributed to.
    #[arg(long, value_name = "LOGIN", global = true)]
    pub importer: Option<String>,

    #[command(subcommand)]
    pub source: ImportSource,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportSource {
    /// Import Atom documents produced by `folio export`.
    Native(NativeImportArgs),
    /// Import a WordPress eXtended RSS export.
    Foreign(ForeignImportArgs),
}

#[derive(Debug, Args, Clone)]
pub struct NativeImportArgs {
    /// Posts document (`posts.atom`).
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub posts: Option<PathBuf>,

    /// Pages document (`pages.atom`).
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub pages: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ForeignImportArgs {
    /// WordPress export file.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Base url of media to copy into local uploads.
    #[arg(long = "media-url", value_name = "URL")]
    pub media_url: Option<String>,
}
