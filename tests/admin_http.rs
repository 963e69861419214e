mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use folio::application::exchange::{ExportHooks, ImportHooks};
use folio::infra::http::{AdminState, DatabaseHealth, build_admin_router};

use common::{
    FakeMedia, MemoryStore, default_users, export_service, import_service, page, search_service,
    text_post,
};

const BOUNDARY: &str = "folio-test-boundary";

struct StubDatabase {
    healthy: bool,
}

#[async_trait]
impl DatabaseHealth for StubDatabase {
    async fn health_check(&self) -> Result<(), sqlx::Error> {
        if self.healthy {
            Ok(())
        } else {
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

async fn router_with(healthy: bool, upload_limit: usize) -> (Router, Arc<MemoryStore>) {
    let store = MemoryStore::with_users(default_users());
    store
        .insert_post(text_post(1, "hello", "Hello", "First words", 2))
        .await;
    store
        .insert_post(text_post(2, "again", "Again", "More words", 1))
        .await;
    store.insert_page(page(1, "about", "About", None, 1)).await;

    let state = AdminState {
        db: Arc::new(StubDatabase { healthy }),
        search: Arc::new(search_service(&store)),
        export: Arc::new(export_service(&store, ExportHooks::new())),
        import: Arc::new(import_service(
            &store,
            Arc::new(FakeMedia::default()),
            ImportHooks::new(),
            &["text"],
        )),
        importer_login: "admin".to_string(),
    };
    (build_admin_router(state, upload_limit), store)
}

async fn router() -> (Router, Arc<MemoryStore>) {
    router_with(true, 1024 * 1024).await
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Body {
    let mut body = String::new();
    for (name, file_name, contents) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/xml\r\n\r\n"
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
            )),
        }
        body.push_str(contents);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Body::from(body)
}

fn upload(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart(parts))
        .expect("request")
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn post_listing_returns_json_page() {
    let (app, _) = router().await;

    let response = app
        .oneshot(get("/posts?query=author%3Aada"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(json["total"], 1);
    assert_eq!(json["page"], 1);
    assert_eq!(json["items"][0]["url"], "hello");
    assert_eq!(json["items"][0]["fields"]["title"], "Hello");
}

#[tokio::test]
async fn listing_rejects_unknown_fields_with_bad_request() {
    let (app, _) = router().await;

    let response = app
        .oneshot(get("/users?query=feather%3Atext"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(body_bytes(response).await).expect("utf-8");
    assert!(body.contains("feather"));
}

#[tokio::test]
async fn export_downloads_a_named_zip() {
    let (app, _) = router().await;

    let response = app
        .oneshot(form("/export", "posts=1&filter_posts=hello"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    let disposition = headers[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii header");
    assert!(disposition.starts_with("attachment; filename=\"MyTestSite_Export_"));
    assert!(disposition.ends_with(".zip\""));

    let bytes = body_bytes(response).await;
    assert_eq!(
        headers[header::CONTENT_LENGTH].to_str().expect("length"),
        bytes.len().to_string()
    );
    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("zip");
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.file_names().collect::<Vec<_>>(), ["posts.atom"]);
}

#[tokio::test]
async fn export_without_selection_is_rejected() {
    let (app, _) = router().await;

    let response = app
        .oneshot(form("/export", "filter_posts=hello"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn foreign_import_requires_a_file() {
    let (app, _) = router().await;

    let response = app
        .oneshot(upload("/import/foreign", &[("media_url", None, "")]))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn foreign_import_rejects_non_wordpress_feeds() {
    let (app, store) = router().await;

    let response = app
        .oneshot(upload(
            "/import/foreign",
            &[("xml_file", Some("blog.xml"), "<rss><channel><generator>Blogger</generator></channel></rss>")],
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.posts().await.len(), 2);
}

#[tokio::test]
async fn native_import_round_trips_through_http() {
    let (app, store) = router().await;

    let export = app
        .clone()
        .oneshot(form("/export", "posts=on&pages=on"))
        .await
        .expect("response");
    assert_eq!(export.status(), StatusCode::OK);
    let bytes = to_bytes(export.into_body(), usize::MAX).await.expect("body");

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).expect("zip");
    let mut posts = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("posts.atom").expect("posts"), &mut posts)
        .expect("read posts");

    let response = app
        .oneshot(upload(
            "/import/native",
            &[
                ("posts_file", Some("posts.atom"), posts.as_str()),
                ("pages_file", Some("pages.atom"), ""),
            ],
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let summary: Value = serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(summary["posts"], 2);
    assert_eq!(summary["pages"], 0);

    let urls: Vec<_> = store.posts().await.into_iter().map(|post| post.url).collect();
    assert_eq!(urls, ["hello", "again", "hello-2", "again-2"]);
}

#[tokio::test]
async fn oversized_uploads_are_refused() {
    let (app, _) = router_with(true, 64).await;
    let large = "x".repeat(1024);

    let response = app
        .oneshot(upload(
            "/import/native",
            &[("posts_file", Some("posts.atom"), large.as_str())],
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_reflects_database_state() {
    let (app, _) = router().await;
    let response = app.oneshot(get("/_health/db")).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (app, _) = router_with(false, 1024).await;
    let response = app.oneshot(get("/_health/db")).await.expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn request_ids_are_echoed_or_minted() {
    let (app, _) = router().await;
    let request = Request::builder()
        .uri("/pages")
        .header("x-request-id", "trace-42")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.headers()["x-request-id"], "trace-42");

    let response = app.oneshot(get("/pages")).await.expect("response");
    let minted = response.headers()["x-request-id"].to_str().expect("ascii");
    assert_eq!(minted.len(), 36);
}
