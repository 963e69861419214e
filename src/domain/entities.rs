//! Domain entities mirrored from persistent storage.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::types::PostStatus;

/// Id used in search constraints when an `author:` filter names no known user.
pub const NO_SUCH_USER: i64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub login: String,
    pub full_name: Option<String>,
    pub email: String,
    pub website: Option<String>,
    pub group_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

impl UserRecord {
    /// Name shown for bylines: the full name when set, otherwise the login.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.login,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub feather: String,
    pub clean: String,
    pub url: String,
    pub pinned: bool,
    pub status: PostStatus,
    pub user_id: i64,
    /// Feather-specific payload, e.g. `title` and `body` for text posts.
    pub fields: BTreeMap<String, String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl PostRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Title of the post, falling back to `"<Feather> Post #<id>"`.
    pub fn display_title(&self) -> String {
        match self.field("title").map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("{} Post #{}", capitalize(&self.feather), self.id),
        }
    }

    /// `updated_at` when the post was ever edited, else `created_at`.
    pub fn effective_updated_at(&self) -> OffsetDateTime {
        self.updated_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub parent_id: Option<i64>,
    pub show_in_list: bool,
    pub list_order: i32,
    pub clean: String,
    pub url: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl PageRecord {
    pub fn effective_updated_at(&self) -> OffsetDateTime {
        self.updated_at.unwrap_or(self.created_at)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
