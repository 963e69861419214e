//! Extension points around export and import.
//!
//! Hooks are called in registration order. Every method has a no-op default
//! so an extension implements only the points it cares about.

use std::sync::Arc;

use crate::application::exchange::archive::ArchiveFile;
use crate::application::exchange::document::FeedEntry;
use crate::application::exchange::request::{NewPage, NewPost};
use crate::domain::entities::{PageRecord, PostRecord};

pub trait ExportHook: Send + Sync {
    /// Rewrite the link exported for a post.
    fn post_export_url(&self, url: String, _post: &PostRecord) -> String {
        url
    }

    /// Rewrite the link exported for a page.
    fn page_export_url(&self, url: String, _page: &PageRecord) -> String {
        url
    }

    fn posts_export(&self, _entry: &mut FeedEntry, _post: &PostRecord) {}

    fn pages_export(&self, _entry: &mut FeedEntry, _page: &PageRecord) {}

    /// Add, replace or drop files before the archive is packed.
    fn export(&self, _files: &mut Vec<ArchiveFile>) {}
}

pub trait ImportHook: Send + Sync {
    fn post_imported(&self, _request: &NewPost, _post: &PostRecord) {}

    fn page_imported(&self, _request: &NewPage, _page: &PageRecord) {}
}

#[derive(Clone, Default)]
pub struct ExportHooks {
    hooks: Vec<Arc<dyn ExportHook>>,
}

impl ExportHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn ExportHook>) {
        self.hooks.push(hook);
    }

    pub fn with(mut self, hook: Arc<dyn ExportHook>) -> Self {
        self.register(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) fn post_url(&self, url: String, post: &PostRecord) -> String {
        self.hooks
            .iter()
            .fold(url, |url, hook| hook.post_export_url(url, post))
    }

    pub(crate) fn page_url(&self, url: String, page: &PageRecord) -> String {
        self.hooks
            .iter()
            .fold(url, |url, hook| hook.page_export_url(url, page))
    }

    pub(crate) fn post_entry(&self, entry: &mut FeedEntry, post: &PostRecord) {
        for hook in &self.hooks {
            hook.posts_export(entry, post);
        }
    }

    pub(crate) fn page_entry(&self, entry: &mut FeedEntry, page: &PageRecord) {
        for hook in &self.hooks {
            hook.pages_export(entry, page);
        }
    }

    pub(crate) fn archive(&self, files: &mut Vec<ArchiveFile>) {
        for hook in &self.hooks {
            hook.export(files);
        }
    }
}

#[derive(Clone, Default)]
pub struct ImportHooks {
    hooks: Vec<Arc<dyn ImportHook>>,
}

impl ImportHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn ImportHook>) {
        self.hooks.push(hook);
    }

    pub fn with(mut self, hook: Arc<dyn ImportHook>) -> Self {
        self.register(hook);
        self
    }

    pub(crate) fn post_imported(&self, request: &NewPost, post: &PostRecord) {
        for hook in &self.hooks {
            hook.post_imported(request, post);
        }
    }

    pub(crate) fn page_imported(&self, request: &NewPage, page: &PageRecord) {
        for hook in &self.hooks {
            hook.page_imported(request, page);
        }
    }
}
