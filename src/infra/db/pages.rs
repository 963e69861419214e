use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::pagination::{PageRequest, Paginated};
use crate::application::repos::{CreatePageParams, PagesRepo, PagesWriteRepo, RepoError};
use crate::application::search::{FilterQuery, SearchScope};
use crate::domain::entities::PageRecord;

use super::{PostgresRepositories, map_sqlx_error, push_filter_predicate};

const PAGE_COLUMNS: &str = "pg.id, pg.title, pg.body, pg.parent_id, pg.show_in_list, \
     pg.list_order, pg.clean, pg.url, pg.user_id, pg.created_at, pg.updated_at";

#[derive(sqlx::FromRow)]
struct PageRow {
    id: i64,
    title: String,
    body: String,
    parent_id: Option<i64>,
    show_in_list: bool,
    list_order: i32,
    clean: String,
    url: String,
    user_id: i64,
    created_at: OffsetDateTime,
    updated_at: Option<OffsetDateTime>,
}

impl From<PageRow> for PageRecord {
    fn from(row: PageRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            body: row.body,
            parent_id: row.parent_id,
            show_in_list: row.show_in_list,
            list_order: row.list_order,
            clean: row.clean,
            url: row.url,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn select_pages(filter: &FilterQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(PAGE_COLUMNS);
    qb.push(" FROM pages pg WHERE 1=1");
    push_filter_predicate(&mut qb, SearchScope::Pages, "pg", filter);
    qb
}

#[async_trait]
impl PagesRepo for PostgresRepositories {
    async fn search_pages(
        &self,
        filter: &FilterQuery,
        page: PageRequest,
    ) -> Result<Paginated<PageRecord>, RepoError> {
        let mut qb = select_pages(filter);
        qb.push(" ORDER BY pg.list_order ASC, pg.id ASC");
        Self::push_page_window(&mut qb, page);

        let rows = qb
            .build_query_as::<PageRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM pages pg WHERE 1=1");
        push_filter_predicate(&mut count_qb, SearchScope::Pages, "pg", filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(Paginated::new(
            rows.into_iter().map(PageRecord::from).collect(),
            page,
            Self::convert_count(total),
        ))
    }

    async fn list_for_export(&self, filter: &FilterQuery) -> Result<Vec<PageRecord>, RepoError> {
        let mut qb = select_pages(filter);
        qb.push(" ORDER BY pg.id ASC");

        let rows = qb
            .build_query_as::<PageRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PageRecord::from).collect())
    }

    async fn page_url_taken(&self, url: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM pages WHERE url = $1)")
            .bind(url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl PagesWriteRepo for PostgresRepositories {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
        let CreatePageParams {
            title,
            body,
            parent_id,
            show_in_list,
            list_order,
            clean,
            url,
            user_id,
            created_at,
            updated_at,
        } = params;

        let sql = format!(
            "INSERT INTO pages AS pg (title, body, parent_id, show_in_list, list_order, clean, url, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(title)
            .bind(body)
            .bind(parent_id)
            .bind(show_in_list)
            .bind(list_order)
            .bind(clean)
            .bind(url)
            .bind(user_id)
            .bind(created_at)
            .bind(updated_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PageRecord::from(row))
    }
}
