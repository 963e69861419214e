use async_trait::async_trait;
use sqlx::types::Json;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::types::{POST_COLUMNS, PostRow};
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            feather,
            clean,
            url,
            pinned,
            status,
            user_id,
            fields,
            created_at,
            updated_at,
        } = params;

        let sql = format!(
            "INSERT INTO posts AS p (feather, clean, url, pinned, status, user_id, fields, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(feather)
            .bind(clean)
            .bind(url)
            .bind(pinned)
            .bind(status.as_str())
            .bind(user_id)
            .bind(Json(fields))
            .bind(created_at)
            .bind(updated_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }
}
