use std::sync::Arc;

use async_trait::async_trait;

use crate::application::admin::{AdminExportService, AdminImportService, AdminSearchService};
use crate::infra::db::PostgresRepositories;

/// Connectivity check behind `/_health/db`.
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    async fn health_check(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl DatabaseHealth for PostgresRepositories {
    async fn health_check(&self) -> Result<(), sqlx::Error> {
        PostgresRepositories::health_check(self).await
    }
}

#[derive(Clone)]
pub struct AdminState {
    pub db: Arc<dyn DatabaseHealth>,
    pub search: Arc<AdminSearchService>,
    pub export: Arc<AdminExportService>,
    pub import: Arc<AdminImportService>,
    /// Login of the user imports are attributed to when an entry names no known author.
    pub importer_login: String,
}
