use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AdminState;
use super::errors::admin_search_error;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListingQuery {
    #[serde(default)]
    query: String,
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

impl ListingQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

pub(super) async fn admin_posts(
    State(state): State<AdminState>,
    Query(params): Query<ListingQuery>,
) -> Response {
    match state
        .search
        .posts(&params.query, params.month.as_deref(), params.page())
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(err) => admin_search_error("infra::http::admin_posts", err).into_response(),
    }
}

pub(super) async fn admin_pages(
    State(state): State<AdminState>,
    Query(params): Query<ListingQuery>,
) -> Response {
    match state.search.pages(&params.query, params.page()).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => admin_search_error("infra::http::admin_pages", err).into_response(),
    }
}

pub(super) async fn admin_users(
    State(state): State<AdminState>,
    Query(params): Query<ListingQuery>,
) -> Response {
    match state.search.users(&params.query, params.page()).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => admin_search_error("infra::http::admin_users", err).into_response(),
    }
}
