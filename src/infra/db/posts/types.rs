use std::collections::BTreeMap;

use sqlx::types::Json;
use time::OffsetDateTime;

use crate::domain::entities::PostRecord;
use crate::domain::types::PostStatus;

pub(crate) const POST_COLUMNS: &str = "p.id, p.feather, p.clean, p.url, p.pinned, p.status, \
     p.user_id, p.fields, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i64,
    pub(crate) feather: String,
    pub(crate) clean: String,
    pub(crate) url: String,
    pub(crate) pinned: bool,
    pub(crate) status: String,
    pub(crate) user_id: i64,
    pub(crate) fields: Json<BTreeMap<String, String>>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: Option<OffsetDateTime>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            feather: row.feather,
            clean: row.clean,
            url: row.url,
            pinned: row.pinned,
            status: PostStatus::from(row.status),
            user_id: row.user_id,
            fields: row.fields.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
