use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::application::pagination::{PageRequest, Paginated};
use crate::application::repos::{PostListFilter, PostsRepo, RepoError};
use crate::application::search::{FilterQuery, SearchScope};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::types::{POST_COLUMNS, PostRow};
use crate::infra::db::{map_sqlx_error, push_filter_predicate};

impl PostgresRepositories {
    fn push_post_list_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostListFilter) {
        push_filter_predicate(qb, SearchScope::Posts, "p", &filter.query);
        if let Some(month) = filter.month {
            qb.push(" AND to_char(p.created_at AT TIME ZONE 'UTC', 'YYYY-MM') = ");
            qb.push_bind(month.to_string());
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn search_posts(
        &self,
        filter: &PostListFilter,
        page: PageRequest,
    ) -> Result<Paginated<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(" FROM posts p WHERE 1=1");
        Self::push_post_list_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC");
        Self::push_page_window(&mut qb, page);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p WHERE 1=1");
        Self::push_post_list_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(Paginated::new(
            rows.into_iter().map(PostRecord::from).collect(),
            page,
            Self::convert_count(total),
        ))
    }

    async fn list_for_export(&self, filter: &FilterQuery) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(" FROM posts p WHERE 1=1");
        push_filter_predicate(&mut qb, SearchScope::Posts, "p", filter);
        qb.push(" ORDER BY p.id ASC");

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn post_url_taken(&self, url: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE url = $1)")
            .bind(url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
