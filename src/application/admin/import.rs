use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::application::exchange::foreign::FOREIGN_FEATHER;
use crate::application::exchange::{
    EntityCreationRequest, ExchangeError, ForeignOptions, ImportHooks, NativeBatch, NewPage,
    NewPost, decode_foreign, decode_native,
};
use crate::application::media::{MediaError, MediaIngestor};
use crate::application::repos::{
    CreatePageParams, CreatePostParams, PagesRepo, PagesWriteRepo, PostsRepo, PostsWriteRepo,
    RepoError, UsersRepo,
};
use crate::domain::entities::UserRecord;
use crate::domain::slug::{SlugAsyncError, unique_slug};
use crate::domain::types::FeedKind;
use crate::infra::telemetry::{
    METRIC_IMPORT_ENTITIES, METRIC_IMPORT_SKIPPED, METRIC_REPAIR_PASSES,
};

#[derive(Debug, Error)]
pub enum AdminImportError {
    #[error("upload a posts file, a pages file or both")]
    NothingToImport,
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("the `{feather}` feather must be enabled to import WordPress exports")]
    MissingFeather { feather: &'static str },
    #[error("{file} holds {found}, expected {expected}")]
    KindMismatch {
        file: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("importing user `{login}` does not exist")]
    UnknownImporter { login: String },
    #[error("no free url left for `{url}`")]
    UrlExhausted { url: String },
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub posts: usize,
    pub pages: usize,
    pub skipped: usize,
    pub media: usize,
}

#[derive(Clone)]
pub struct AdminImportService {
    users: Arc<dyn UsersRepo>,
    posts: Arc<dyn PostsRepo>,
    post_writer: Arc<dyn PostsWriteRepo>,
    pages: Arc<dyn PagesRepo>,
    page_writer: Arc<dyn PagesWriteRepo>,
    media: Arc<dyn MediaIngestor>,
    hooks: ImportHooks,
    enabled_feathers: Vec<String>,
}

/// Per-import state: running totals and resolved author logins.
struct ImportRun<'a> {
    importer: &'a UserRecord,
    authors: HashMap<String, i64>,
    summary: ImportSummary,
}

impl AdminImportService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UsersRepo>,
        posts: Arc<dyn PostsRepo>,
        post_writer: Arc<dyn PostsWriteRepo>,
        pages: Arc<dyn PagesRepo>,
        page_writer: Arc<dyn PagesWriteRepo>,
        media: Arc<dyn MediaIngestor>,
        hooks: ImportHooks,
        enabled_feathers: Vec<String>,
    ) -> Self {
        Self {
            users,
            posts,
            post_writer,
            pages,
            page_writer,
            media,
            hooks,
            enabled_feathers,
        }
    }

    /// Look up the user imported entities fall back to.
    pub async fn resolve_importer(&self, login: &str) -> Result<UserRecord, AdminImportError> {
        self.users
            .find_by_login(login)
            .await?
            .ok_or_else(|| AdminImportError::UnknownImporter {
                login: login.to_string(),
            })
    }

    /// Import native posts and/or pages documents.
    ///
    /// Both documents are decoded before anything is written.
    pub async fn import_native(
        &self,
        posts: Option<&[u8]>,
        pages: Option<&[u8]>,
        importer: &UserRecord,
    ) -> Result<ImportSummary, AdminImportError> {
        if posts.is_none() && pages.is_none() {
            return Err(AdminImportError::NothingToImport);
        }

        let posts = posts
            .map(|xml| decode_kind(xml, FeedKind::Posts, "posts file"))
            .transpose()?;
        let pages = pages
            .map(|xml| decode_kind(xml, FeedKind::Pages, "pages file"))
            .transpose()?;

        let mut run = ImportRun::new(importer);
        for batch in [posts, pages].into_iter().flatten() {
            for request in batch {
                self.create(request, &mut run).await?;
            }
        }

        info!(
            target = "folio::admin::import",
            source = "native",
            posts = run.summary.posts,
            pages = run.summary.pages,
            "Native import completed"
        );
        Ok(run.summary)
    }

    /// Import a WordPress export, optionally ingesting media under `options.media_base`.
    pub async fn import_foreign(
        &self,
        xml: &[u8],
        options: &ForeignOptions,
        importer: &UserRecord,
    ) -> Result<ImportSummary, AdminImportError> {
        if !self
            .enabled_feathers
            .iter()
            .any(|feather| feather == FOREIGN_FEATHER)
        {
            return Err(AdminImportError::MissingFeather {
                feather: FOREIGN_FEATHER,
            });
        }

        let mut batch = decode_foreign(xml, options)?;
        histogram!(METRIC_REPAIR_PASSES).record(batch.repair_passes() as f64);

        let mut run = ImportRun::new(importer);
        for request in batch.by_ref() {
            self.create(request, &mut run).await?;
        }
        run.summary.skipped = batch.skipped();
        counter!(METRIC_IMPORT_SKIPPED).increment(run.summary.skipped as u64);

        info!(
            target = "folio::admin::import",
            source = "wordpress",
            posts = run.summary.posts,
            pages = run.summary.pages,
            skipped = run.summary.skipped,
            media = run.summary.media,
            repair_passes = batch.repair_passes(),
            "WordPress import completed"
        );
        Ok(run.summary)
    }

    async fn create(
        &self,
        mut request: EntityCreationRequest,
        run: &mut ImportRun<'_>,
    ) -> Result<(), AdminImportError> {
        let media = request.media().to_vec();
        for remote in media {
            let local = self.media.ingest(&remote).await?;
            debug!(target = "folio::admin::import", %remote, %local, "Ingested media");
            request.replace_media(&remote, &local);
            run.summary.media += 1;
        }

        let user_id = self.author_id(request.author_login(), run).await?;
        let now = OffsetDateTime::now_utc();

        match request {
            EntityCreationRequest::Post(post) => {
                let url = self.unique_post_url(&post.url).await?;
                let record = self
                    .post_writer
                    .create_post(post_params(&post, url, user_id, now))
                    .await?;
                self.hooks.post_imported(&post, &record);
                counter!(METRIC_IMPORT_ENTITIES, "kind" => "post").increment(1);
                run.summary.posts += 1;
            }
            EntityCreationRequest::Page(page) => {
                let url = self.unique_page_url(&page.url).await?;
                let record = self
                    .page_writer
                    .create_page(page_params(&page, url, user_id, now))
                    .await?;
                self.hooks.page_imported(&page, &record);
                counter!(METRIC_IMPORT_ENTITIES, "kind" => "page").increment(1);
                run.summary.pages += 1;
            }
        }

        Ok(())
    }

    /// The user named by `login` when one exists, else the importer.
    async fn author_id(
        &self,
        login: Option<&str>,
        run: &mut ImportRun<'_>,
    ) -> Result<i64, AdminImportError> {
        let Some(login) = login else {
            return Ok(run.importer.id);
        };
        if let Some(id) = run.authors.get(login) {
            return Ok(*id);
        }

        let id = self
            .users
            .find_by_login(login)
            .await?
            .map(|user| user.id)
            .unwrap_or(run.importer.id);
        run.authors.insert(login.to_string(), id);
        Ok(id)
    }

    async fn unique_post_url(&self, base: &str) -> Result<String, AdminImportError> {
        let posts = self.posts.clone();
        unique_slug(base, move |candidate| {
            let posts = posts.clone();
            async move { posts.post_url_taken(&candidate).await.map(|taken| !taken) }
        })
        .await
        .map_err(|err| url_error(err, base))
    }

    async fn unique_page_url(&self, base: &str) -> Result<String, AdminImportError> {
        let pages = self.pages.clone();
        unique_slug(base, move |candidate| {
            let pages = pages.clone();
            async move { pages.page_url_taken(&candidate).await.map(|taken| !taken) }
        })
        .await
        .map_err(|err| url_error(err, base))
    }
}

impl<'a> ImportRun<'a> {
    fn new(importer: &'a UserRecord) -> Self {
        Self {
            importer,
            authors: HashMap::new(),
            summary: ImportSummary::default(),
        }
    }
}

fn decode_kind(
    xml: &[u8],
    expected: FeedKind,
    file: &'static str,
) -> Result<NativeBatch, AdminImportError> {
    let batch = decode_native(xml)?;
    if batch.kind() != expected {
        return Err(AdminImportError::KindMismatch {
            file,
            expected: expected.as_str(),
            found: batch.kind().as_str(),
        });
    }
    Ok(batch)
}

fn url_error(err: SlugAsyncError<RepoError>, base: &str) -> AdminImportError {
    match err {
        SlugAsyncError::Slug(_) => AdminImportError::UrlExhausted {
            url: base.to_string(),
        },
        SlugAsyncError::Predicate(err) => AdminImportError::Repo(err),
    }
}

fn post_params(post: &NewPost, url: String, user_id: i64, now: OffsetDateTime) -> CreatePostParams {
    CreatePostParams {
        feather: post.feather.clone(),
        clean: post.clean.clone(),
        url,
        pinned: post.pinned,
        status: post.status.clone(),
        user_id,
        fields: post.fields.clone(),
        created_at: post.created_at.unwrap_or(now),
        updated_at: post.updated_at,
    }
}

fn page_params(page: &NewPage, url: String, user_id: i64, now: OffsetDateTime) -> CreatePageParams {
    CreatePageParams {
        title: page.title.clone(),
        body: page.body.clone(),
        parent_id: page.parent_id,
        show_in_list: page.show_in_list,
        list_order: page.list_order,
        clean: page.clean.clone(),
        url,
        user_id,
        created_at: page.created_at.unwrap_or(now),
        updated_at: page.updated_at,
    }
}
