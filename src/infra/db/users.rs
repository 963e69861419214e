use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::pagination::{PageRequest, Paginated};
use crate::application::repos::{RepoError, UsersRepo};
use crate::application::search::{FilterQuery, SearchScope};
use crate::domain::entities::UserRecord;

use super::{PostgresRepositories, map_sqlx_error, push_filter_predicate};

const USER_COLUMNS: &str =
    "SELECT u.id, u.login, u.full_name, u.email, u.website, u.group_id, u.joined_at FROM users u";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    login: String,
    full_name: Option<String>,
    email: String,
    website: Option<String>,
    group_id: i64,
    joined_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            login: row.login,
            full_name: row.full_name,
            email: row.email,
            website: row.website,
            group_id: row.group_id,
            joined_at: row.joined_at,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(USER_COLUMNS);
        qb.push(" WHERE u.login = ");
        qb.push_bind(login);

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(USER_COLUMNS);
        qb.push(" WHERE u.id = ANY(");
        qb.push_bind(ids.to_vec());
        qb.push(") ORDER BY u.id");

        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn search_users(
        &self,
        filter: &FilterQuery,
        page: PageRequest,
    ) -> Result<Paginated<UserRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(USER_COLUMNS);
        qb.push(" WHERE 1=1");
        push_filter_predicate(&mut qb, SearchScope::Users, "u", filter);
        qb.push(" ORDER BY u.id ASC");
        Self::push_page_window(&mut qb, page);

        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE 1=1");
        push_filter_predicate(&mut count_qb, SearchScope::Users, "u", filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(Paginated::new(
            rows.into_iter().map(UserRecord::from).collect(),
            page,
            Self::convert_count(total),
        ))
    }
}
