//! Creation requests produced by import decoding.

use std::collections::BTreeMap;

use regex::Regex;
use time::OffsetDateTime;

use crate::domain::types::{FeedKind, PostStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub feather: String,
    pub fields: BTreeMap<String, String>,
    pub clean: String,
    pub url: String,
    pub pinned: bool,
    pub status: PostStatus,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub author_login: Option<String>,
    /// Remote media references found in the body, in first-seen order.
    pub media: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPage {
    pub title: String,
    pub body: String,
    pub parent_id: Option<i64>,
    pub show_in_list: bool,
    pub list_order: i32,
    pub clean: String,
    pub url: String,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub author_login: Option<String>,
    pub media: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityCreationRequest {
    Post(NewPost),
    Page(NewPage),
}

impl EntityCreationRequest {
    pub fn kind(&self) -> FeedKind {
        match self {
            EntityCreationRequest::Post(_) => FeedKind::Posts,
            EntityCreationRequest::Page(_) => FeedKind::Pages,
        }
    }

    pub fn author_login(&self) -> Option<&str> {
        match self {
            EntityCreationRequest::Post(post) => post.author_login.as_deref(),
            EntityCreationRequest::Page(page) => page.author_login.as_deref(),
        }
    }

    pub fn media(&self) -> &[String] {
        match self {
            EntityCreationRequest::Post(post) => &post.media,
            EntityCreationRequest::Page(page) => &page.media,
        }
    }

    /// Substitute a remote media reference with its locally stored copy.
    pub fn replace_media(&mut self, remote: &str, local: &str) {
        if remote.is_empty() {
            return;
        }
        match self {
            EntityCreationRequest::Post(post) => {
                for value in post.fields.values_mut() {
                    if value.contains(remote) {
                        *value = value.replace(remote, local);
                    }
                }
            }
            EntityCreationRequest::Page(page) => {
                page.body = page.body.replace(remote, local);
            }
        }
    }
}

/// Finds references to media hosted under a base url.
#[derive(Debug, Clone)]
pub struct MediaMatcher {
    pattern: Regex,
}

impl MediaMatcher {
    /// `None` when `base` is blank.
    pub fn new(base: &str) -> Option<Self> {
        let base = base.trim();
        if base.is_empty() {
            return None;
        }
        let pattern = Regex::new(&format!(r#"{}[^\s"'<>]+"#, regex::escape(base))).ok()?;
        Some(Self { pattern })
    }

    pub fn find(&self, body: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for reference in self.pattern.find_iter(body) {
            let reference = reference.as_str();
            if !found.iter().any(|seen| seen == reference) {
                found.push(reference.to_string());
            }
        }
        found
    }
}
