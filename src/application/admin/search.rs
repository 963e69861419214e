use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{PageRequest, Paginated};
use crate::application::repos::{PagesRepo, PostListFilter, PostsRepo, RepoError, UsersRepo};
use crate::application::search::{FilterQuery, FilterQueryParser, SearchError, SearchScope};
use crate::domain::entities::{PageRecord, PostRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::types::YearMonth;

#[derive(Debug, Error)]
pub enum AdminSearchError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Filtered, paginated admin listings of posts, pages and users.
#[derive(Clone)]
pub struct AdminSearchService {
    users: Arc<dyn UsersRepo>,
    posts: Arc<dyn PostsRepo>,
    pages: Arc<dyn PagesRepo>,
    per_page: u32,
}

impl AdminSearchService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        posts: Arc<dyn PostsRepo>,
        pages: Arc<dyn PagesRepo>,
        per_page: u32,
    ) -> Self {
        Self {
            users,
            posts,
            pages,
            per_page,
        }
    }

    pub async fn posts(
        &self,
        raw_query: &str,
        month: Option<&str>,
        page: u32,
    ) -> Result<Paginated<PostRecord>, AdminSearchError> {
        let query = self.parse(SearchScope::Posts, raw_query).await?;
        let month = month
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::parse::<YearMonth>)
            .transpose()?;

        let filter = PostListFilter { query, month };
        let result = self
            .posts
            .search_posts(&filter, PageRequest::new(page, self.per_page))
            .await?;
        Ok(result)
    }

    pub async fn pages(
        &self,
        raw_query: &str,
        page: u32,
    ) -> Result<Paginated<PageRecord>, AdminSearchError> {
        let query = self.parse(SearchScope::Pages, raw_query).await?;
        let result = self
            .pages
            .search_pages(&query, PageRequest::new(page, self.per_page))
            .await?;
        Ok(result)
    }

    pub async fn users(
        &self,
        raw_query: &str,
        page: u32,
    ) -> Result<Paginated<UserRecord>, AdminSearchError> {
        let query = self.parse(SearchScope::Users, raw_query).await?;
        let result = self
            .users
            .search_users(&query, PageRequest::new(page, self.per_page))
            .await?;
        Ok(result)
    }

    async fn parse(&self, scope: SearchScope, raw_query: &str) -> Result<FilterQuery, SearchError> {
        let query = FilterQueryParser::new(scope, self.users.as_ref())
            .parse(raw_query)
            .await?;
        debug!(
            target = "folio::admin::search",
            scope = scope.as_str(),
            constraints = query.constraints.len(),
            full_text = %query.full_text,
            "Parsed admin search query"
        );
        Ok(query)
    }
}
