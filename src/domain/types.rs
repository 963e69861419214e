//! Shared domain enumerations and small value types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Visibility status of a post.
///
/// Statuses arriving from foreign exports that have no local meaning are kept
/// verbatim in [`PostStatus::Other`] instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostStatus {
    Public,
    Draft,
    Private,
    RegisteredOnly,
    Scheduled,
    Other(String),
}

impl PostStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PostStatus::Public => "public",
            PostStatus::Draft => "draft",
            PostStatus::Private => "private",
            PostStatus::RegisteredOnly => "registered_only",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for PostStatus {
    fn from(value: &str) -> Self {
        match value {
            "public" => PostStatus::Public,
            "draft" => PostStatus::Draft,
            "private" => PostStatus::Private,
            "registered_only" => PostStatus::RegisteredOnly,
            "scheduled" => PostStatus::Scheduled,
            other => PostStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for PostStatus {
    fn from(value: String) -> Self {
        PostStatus::from(value.as_str())
    }
}

impl From<PostStatus> for String {
    fn from(value: PostStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two entity kinds that travel through export archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Posts,
    Pages,
}

impl FeedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedKind::Posts => "posts",
            FeedKind::Pages => "pages",
        }
    }

    /// File name used for this kind inside an export archive.
    pub fn file_name(self) -> &'static str {
        match self {
            FeedKind::Posts => "posts.atom",
            FeedKind::Pages => "pages.atom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedKind::Posts => "Posts",
            FeedKind::Pages => "Pages",
        }
    }
}

impl TryFrom<&str> for FeedKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "posts" => Ok(FeedKind::Posts),
            "pages" => Ok(FeedKind::Pages),
            _ => Err(()),
        }
    }
}

/// A calendar month used by archive-style listing filters (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearMonth {
    year: i32,
    month: u8,
}

impl YearMonth {
    pub fn new(year: i32, month: u8) -> Result<Self, DomainError> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(DomainError::invalid_month(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }
}

impl FromStr for YearMonth {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| DomainError::invalid_month(trimmed))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(DomainError::invalid_month(trimmed));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| DomainError::invalid_month(trimmed))?;
        let month: u8 = month
            .parse()
            .map_err(|_| DomainError::invalid_month(trimmed))?;
        YearMonth::new(year, month).map_err(|_| DomainError::invalid_month(trimmed))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parse the `1`/`0` style flags used by forms and export documents.
pub fn parse_flag(value: &str) -> Result<bool, DomainError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(DomainError::invalid_flag(value)),
    }
}
