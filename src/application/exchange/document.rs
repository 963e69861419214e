//! Transient feed model built for one export and rendered once.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::domain::types::FeedKind;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    pub kind: FeedKind,
    pub title: String,
    pub subtitle: String,
    pub id: String,
    pub updated: OffsetDateTime,
    pub link: String,
    pub generator: Generator,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub name: String,
    pub uri: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub id: String,
    pub updated: OffsetDateTime,
    pub published: OffsetDateTime,
    pub link: String,
    /// `xml:base` of the entry, the unmodified permalink.
    pub base: String,
    pub author: FeedAuthor,
    pub content: FeedContent,
    pub extension_fields: Vec<(String, String)>,
    pub extension_attributes: Vec<(String, String)>,
}

impl FeedEntry {
    pub fn extension(&self, name: &str) -> Option<&str> {
        self.extension_fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace an extension field in place, or append it.
    pub fn set_extension(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.extension_fields.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.extension_fields.push((name.to_string(), value)),
        }
    }

    pub fn set_extension_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .extension_attributes
            .iter_mut()
            .find(|(key, _)| key == name)
        {
            Some((_, existing)) => *existing = value,
            None => self.extension_attributes.push((name.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedAuthor {
    pub name: String,
    pub uri: Option<String>,
    pub login: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedContent {
    /// Feather payload of a post, one element per field.
    Structured(BTreeMap<String, String>),
    Html(String),
}
