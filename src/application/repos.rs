//! Repository traits describing persistence adapters.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::{PageRequest, Paginated};
use crate::application::search::FilterQuery;
use crate::domain::entities::{PageRecord, PostRecord, UserRecord};
use crate::domain::types::{PostStatus, YearMonth};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Filters for the admin post listing.
#[derive(Debug, Clone, Default)]
pub struct PostListFilter {
    pub query: FilterQuery,
    pub month: Option<YearMonth>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub feather: String,
    pub clean: String,
    pub url: String,
    pub pinned: bool,
    pub status: PostStatus,
    pub user_id: i64,
    pub fields: BTreeMap<String, String>,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct CreatePageParams {
    pub title: String,
    pub body: String,
    pub parent_id: Option<i64>,
    pub show_in_list: bool,
    pub list_order: i32,
    pub clean: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserRecord>, RepoError>;

    async fn search_users(
        &self,
        filter: &FilterQuery,
        page: PageRequest,
    ) -> Result<Paginated<UserRecord>, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn search_posts(
        &self,
        filter: &PostListFilter,
        page: PageRequest,
    ) -> Result<Paginated<PostRecord>, RepoError>;

    /// Every post matching `filter`, ascending by id.
    async fn list_for_export(&self, filter: &FilterQuery) -> Result<Vec<PostRecord>, RepoError>;

    async fn post_url_taken(&self, url: &str) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait PagesRepo: Send + Sync {
    async fn search_pages(
        &self,
        filter: &FilterQuery,
        page: PageRequest,
    ) -> Result<Paginated<PageRecord>, RepoError>;

    /// Every page matching `filter`, ascending by id.
    async fn list_for_export(&self, filter: &FilterQuery) -> Result<Vec<PageRecord>, RepoError>;

    async fn page_url_taken(&self, url: &str) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait PagesWriteRepo: Send + Sync {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError>;
}
