#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Mutex;
use url::Url;

use folio::application::admin::{AdminExportService, AdminImportService, AdminSearchService};
use folio::application::exchange::{ExportHooks, ImportHooks};
use folio::application::media::{MediaError, MediaIngestor};
use folio::application::pagination::{PageRequest, Paginated};
use folio::application::repos::{
    CreatePageParams, CreatePostParams, PagesRepo, PagesWriteRepo, PostListFilter, PostsRepo,
    PostsWriteRepo, RepoError, UsersRepo,
};
use folio::application::search::FilterQuery;
use folio::application::site::SiteMetadata;
use folio::domain::entities::{PageRecord, PostRecord, UserRecord};
use folio::domain::types::PostStatus;

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    posts: Vec<PostRecord>,
    pages: Vec<PageRecord>,
}

/// In-memory stand-in for the Postgres repositories.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn with_users(users: Vec<UserRecord>) -> Arc<Self> {
        Arc::new(Self {
            tables: Mutex::new(Tables {
                users,
                ..Tables::default()
            }),
        })
    }

    pub async fn insert_post(&self, post: PostRecord) {
        self.tables.lock().await.posts.push(post);
    }

    pub async fn insert_page(&self, page: PageRecord) {
        self.tables.lock().await.pages.push(page);
    }

    pub async fn posts(&self) -> Vec<PostRecord> {
        self.tables.lock().await.posts.clone()
    }

    pub async fn pages(&self) -> Vec<PageRecord> {
        self.tables.lock().await.pages.clone()
    }
}

fn duplicate(constraint: &str) -> RepoError {
    RepoError::Duplicate {
        constraint: constraint.to_string(),
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|user| user.login == login).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn search_users(
        &self,
        filter: &FilterQuery,
        page: PageRequest,
    ) -> Result<Paginated<UserRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut users: Vec<UserRecord> = tables
            .users
            .iter()
            .filter(|user| filter.matches(*user))
            .cloned()
            .collect();
        users.sort_by_key(|user| user.id);
        Ok(Paginated::from_slice(&users, page))
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn search_posts(
        &self,
        filter: &PostListFilter,
        page: PageRequest,
    ) -> Result<Paginated<PostRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut posts: Vec<PostRecord> = tables
            .posts
            .iter()
            .filter(|post| filter.query.matches(*post))
            .filter(|post| match filter.month {
                Some(month) => {
                    post.created_at.year() == month.year()
                        && u8::from(post.created_at.month()) == month.month()
                }
                None => true,
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(Paginated::from_slice(&posts, page))
    }

    async fn list_for_export(&self, filter: &FilterQuery) -> Result<Vec<PostRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut posts: Vec<PostRecord> = tables
            .posts
            .iter()
            .filter(|post| filter.matches(*post))
            .cloned()
            .collect();
        posts.sort_by_key(|post| post.id);
        Ok(posts)
    }

    async fn post_url_taken(&self, url: &str) -> Result<bool, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.posts.iter().any(|post| post.url == url))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if tables.posts.iter().any(|post| post.url == params.url) {
            return Err(duplicate("posts_url_key"));
        }
        let id = tables.posts.iter().map(|post| post.id).max().unwrap_or(0) + 1;
        let record = PostRecord {
            id,
            feather: params.feather,
            clean: params.clean,
            url: params.url,
            pinned: params.pinned,
            status: params.status,
            user_id: params.user_id,
            fields: params.fields,
            created_at: params.created_at,
            updated_at: params.updated_at,
        };
        tables.posts.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl PagesRepo for MemoryStore {
    async fn search_pages(
        &self,
        filter: &FilterQuery,
        page: PageRequest,
    ) -> Result<Paginated<PageRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut pages: Vec<PageRecord> = tables
            .pages
            .iter()
            .filter(|page| filter.matches(*page))
            .cloned()
            .collect();
        pages.sort_by_key(|page| (page.list_order, page.id));
        Ok(Paginated::from_slice(&pages, page))
    }

    async fn list_for_export(&self, filter: &FilterQuery) -> Result<Vec<PageRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut pages: Vec<PageRecord> = tables
            .pages
            .iter()
            .filter(|page| filter.matches(*page))
            .cloned()
            .collect();
        pages.sort_by_key(|page| page.id);
        Ok(pages)
    }

    async fn page_url_taken(&self, url: &str) -> Result<bool, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.pages.iter().any(|page| page.url == url))
    }
}

#[async_trait]
impl PagesWriteRepo for MemoryStore {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if tables.pages.iter().any(|page| page.url == params.url) {
            return Err(duplicate("pages_url_key"));
        }
        let id = tables.pages.iter().map(|page| page.id).max().unwrap_or(0) + 1;
        let record = PageRecord {
            id,
            title: params.title,
            body: params.body,
            parent_id: params.parent_id,
            show_in_list: params.show_in_list,
            list_order: params.list_order,
            clean: params.clean,
            url: params.url,
            user_id: params.user_id,
            created_at: params.created_at,
            updated_at: params.updated_at,
        };
        tables.pages.push(record.clone());
        Ok(record)
    }
}

/// Media ingestor that "stores" everything under `/uploads/` without network access.
#[derive(Default)]
pub struct FakeMedia {
    pub fetched: Mutex<Vec<String>>,
    pub fail: bool,
}

impl FakeMedia {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MediaIngestor for FakeMedia {
    async fn ingest(&self, remote_url: &str) -> Result<String, MediaError> {
        if self.fail {
            return Err(MediaError::Fetch {
                url: remote_url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        self.fetched.lock().await.push(remote_url.to_string());
        let name = remote_url.rsplit('/').next().unwrap_or("media");
        Ok(format!("/uploads/{name}"))
    }
}

pub fn user(id: i64, login: &str, full_name: Option<&str>) -> UserRecord {
    UserRecord {
        id,
        login: login.to_string(),
        full_name: full_name.map(str::to_string),
        email: format!("{login}@example.com"),
        website: None,
        group_id: 1,
        joined_at: datetime!(2020-01-01 00:00 UTC),
    }
}

pub fn default_users() -> Vec<UserRecord> {
    vec![
        user(1, "admin", Some("Site Admin")),
        user(2, "ada", Some("Ada Lovelace")),
        user(3, "grace", None),
    ]
}

pub fn text_post(id: i64, url: &str, title: &str, body: &str, user_id: i64) -> PostRecord {
    PostRecord {
        id,
        feather: "text".to_string(),
        clean: url.to_string(),
        url: url.to_string(),
        pinned: false,
        status: PostStatus::Public,
        user_id,
        fields: BTreeMap::from([
            ("title".to_string(), title.to_string()),
            ("body".to_string(), body.to_string()),
        ]),
        created_at: datetime!(2024-03-10 09:30 UTC) + time::Duration::days(id),
        updated_at: None,
    }
}

pub fn page(id: i64, url: &str, title: &str, parent_id: Option<i64>, user_id: i64) -> PageRecord {
    PageRecord {
        id,
        title: title.to_string(),
        body: format!("<p>{title} body</p>"),
        parent_id,
        show_in_list: true,
        list_order: id as i32,
        clean: url.to_string(),
        url: url.to_string(),
        user_id,
        created_at: datetime!(2023-11-01 12:00 UTC),
        updated_at: Some(datetime!(2024-01-05 08:00 UTC)),
    }
}

pub fn site() -> SiteMetadata {
    SiteMetadata::new(
        "My Test Site",
        "Notes and pages",
        Url::parse("https://example.com/blog/").expect("site url"),
    )
}

pub fn search_service(store: &Arc<MemoryStore>) -> AdminSearchService {
    AdminSearchService::new(store.clone(), store.clone(), store.clone(), 25)
}

pub fn export_service(store: &Arc<MemoryStore>, hooks: ExportHooks) -> AdminExportService {
    AdminExportService::new(store.clone(), store.clone(), store.clone(), site(), hooks)
}

pub fn import_service(
    store: &Arc<MemoryStore>,
    media: Arc<dyn MediaIngestor>,
    hooks: ImportHooks,
    feathers: &[&str],
) -> AdminImportService {
    AdminImportService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        media,
        hooks,
        feathers.iter().map(|feather| feather.to_string()).collect(),
    )
}

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}
