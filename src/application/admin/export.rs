use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::Date;
use tracing::info;

use crate::application::exchange::{
    ArchiveError, ArchiveFile, ExportArchive, ExportHooks, ExportSource, FeedEncoder,
    archive_file_name, package,
};
use crate::application::repos::{PagesRepo, PostsRepo, RepoError, UsersRepo};
use crate::application::search::{FilterQuery, FilterQueryParser, SearchError, SearchScope};
use crate::application::site::SiteMetadata;
use crate::domain::entities::UserRecord;
use crate::domain::types::FeedKind;
use crate::infra::telemetry::METRIC_EXPORT_ENTRIES;

/// Which kinds to export, each with an optional search filter.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub posts: bool,
    pub pages: bool,
    pub posts_filter: String,
    pub pages_filter: String,
}

#[derive(Debug, Error)]
pub enum AdminExportError {
    #[error("select posts, pages or both to export")]
    NothingSelected,
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

#[derive(Clone)]
pub struct AdminExportService {
    users: Arc<dyn UsersRepo>,
    posts: Arc<dyn PostsRepo>,
    pages: Arc<dyn PagesRepo>,
    site: SiteMetadata,
    hooks: ExportHooks,
}

impl AdminExportService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        posts: Arc<dyn PostsRepo>,
        pages: Arc<dyn PagesRepo>,
        site: SiteMetadata,
        hooks: ExportHooks,
    ) -> Self {
        Self {
            users,
            posts,
            pages,
            site,
            hooks,
        }
    }

    pub fn site(&self) -> &SiteMetadata {
        &self.site
    }

    pub async fn export(
        &self,
        request: &ExportRequest,
        today: Date,
    ) -> Result<ExportArchive, AdminExportError> {
        if !request.posts && !request.pages {
            return Err(AdminExportError::NothingSelected);
        }

        let mut files = Vec::new();
        let mut entries = 0;

        if request.posts {
            let filter = self.filter(SearchScope::Posts, &request.posts_filter).await?;
            let posts = self.posts.list_for_export(&filter).await?;
            let authors = self.authors(posts.iter().map(|post| post.user_id)).await?;
            let encoder = FeedEncoder::new(&self.site, &self.hooks, &authors);
            files.push(ArchiveFile::new(
                FeedKind::Posts.file_name(),
                encoder.encode(ExportSource::Posts(&posts)),
            ));
            entries += posts.len();
        }

        if request.pages {
            let filter = self.filter(SearchScope::Pages, &request.pages_filter).await?;
            let pages = self.pages.list_for_export(&filter).await?;
            let authors = self.authors(pages.iter().map(|page| page.user_id)).await?;
            let encoder = FeedEncoder::new(&self.site, &self.hooks, &authors);
            files.push(ArchiveFile::new(
                FeedKind::Pages.file_name(),
                encoder.encode(ExportSource::Pages(&pages)),
            ));
            entries += pages.len();
        }

        self.hooks.archive(&mut files);
        let bytes = package(&files)?;
        let file_name = archive_file_name(&self.site.name, today);

        counter!(METRIC_EXPORT_ENTRIES).increment(entries as u64);
        info!(
            target = "folio::admin::export",
            file = %file_name,
            entries,
            files = files.len(),
            bytes = bytes.len(),
            "Built export archive"
        );

        Ok(ExportArchive {
            file_name,
            bytes,
            entries,
        })
    }

    async fn filter(&self, scope: SearchScope, raw: &str) -> Result<FilterQuery, SearchError> {
        FilterQueryParser::new(scope, self.users.as_ref())
            .parse(raw)
            .await
    }

    async fn authors(
        &self,
        ids: impl Iterator<Item = i64>,
    ) -> Result<HashMap<i64, UserRecord>, RepoError> {
        let mut ids: Vec<i64> = ids.collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = self.users.find_by_ids(&ids).await?;
        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }
}
