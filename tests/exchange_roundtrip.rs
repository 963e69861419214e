mod common;

use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};

use time::macros::{date, datetime};
use zip::ZipArchive;

use folio::application::admin::{AdminExportError, AdminImportError, ExportRequest};
use folio::application::exchange::{ArchiveFile, ExportHook, ExportHooks, ImportHooks};
use folio::application::media::MediaIngestor;
use folio::domain::entities::PostRecord;
use folio::domain::types::PostStatus;

use common::{
    FakeMedia, MemoryStore, default_users, export_service, import_service, page, text_post,
};

fn unzip(bytes: &[u8]) -> Vec<(String, String)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip archive");
    (0..archive.len())
        .map(|index| {
            let mut file = archive.by_index(index).expect("zip entry");
            let mut contents = String::new();
            file.read_to_string(&mut contents).expect("utf-8 entry");
            (file.name().to_string(), contents)
        })
        .collect()
}

async fn source_store() -> Arc<MemoryStore> {
    let store = MemoryStore::with_users(default_users());
    let mut pinned = text_post(1, "fish-and-chips", "Fish & chips", "<p>Salt & vinegar</p>", 2);
    pinned.pinned = true;
    pinned.updated_at = Some(datetime!(2024-05-01 18:00 UTC));
    store.insert_post(pinned).await;

    let mut draft = text_post(2, "draft-notes", "Draft notes", "Later", 3);
    draft.status = PostStatus::Draft;
    store.insert_post(draft).await;

    store.insert_page(page(1, "about", "About", None, 1)).await;
    store.insert_page(page(2, "team", "Team", Some(1), 2)).await;
    store
}

fn everything() -> ExportRequest {
    ExportRequest {
        posts: true,
        pages: true,
        ..ExportRequest::default()
    }
}

fn importer_for(store: &Arc<MemoryStore>) -> folio::application::admin::AdminImportService {
    let media: Arc<dyn MediaIngestor> = Arc::new(FakeMedia::default());
    import_service(store, media, ImportHooks::new(), &["text"])
}

#[tokio::test]
async fn export_packs_posts_and_pages_documents() {
    let store = source_store().await;
    let archive = export_service(&store, ExportHooks::new())
        .export(&everything(), date!(2024 - 06 - 02))
        .await
        .expect("archive");

    assert_eq!(archive.file_name, "MyTestSite_Export_2024-06-02.zip");
    assert_eq!(archive.entries, 4);

    let files = unzip(&archive.bytes);
    let names: Vec<_> = files.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["posts.atom", "pages.atom"]);

    let posts = &files[0].1;
    assert!(posts.contains("<generator uri=\"https://folio.pub/\""));
    assert!(posts.contains("<folio:kind>posts</folio:kind>"));
    assert!(posts.contains("<folio:login>ada</folio:login>"));
    assert!(posts.contains("Fish &amp; chips"));
}

#[tokio::test]
async fn export_respects_selection_and_filters() {
    let store = source_store().await;
    let service = export_service(&store, ExportHooks::new());

    let request = ExportRequest {
        posts: true,
        posts_filter: "status:draft".to_string(),
        ..ExportRequest::default()
    };
    let archive = service
        .export(&request, date!(2024 - 06 - 02))
        .await
        .expect("archive");
    assert_eq!(archive.entries, 1);
    let files = unzip(&archive.bytes);
    assert_eq!(files.len(), 1);
    assert!(files[0].1.contains("draft-notes"));
    assert!(!files[0].1.contains("fish-and-chips"));

    let err = service
        .export(&ExportRequest::default(), date!(2024 - 06 - 02))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminExportError::NothingSelected));

    let bad = ExportRequest {
        pages: true,
        pages_filter: "feather:text".to_string(),
        ..ExportRequest::default()
    };
    let err = service.export(&bad, date!(2024 - 06 - 02)).await.unwrap_err();
    assert!(matches!(err, AdminExportError::Search(_)));
}

struct Manifest {
    seen: Mutex<Vec<i64>>,
}

impl ExportHook for Manifest {
    fn post_export_url(&self, url: String, post: &PostRecord) -> String {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(post.id);
        }
        format!("{url}?via=mirror")
    }

    fn export(&self, files: &mut Vec<ArchiveFile>) {
        files.push(ArchiveFile::new("README.txt", b"exported".to_vec()));
    }
}

#[tokio::test]
async fn export_hooks_rewrite_links_and_add_files() {
    let store = source_store().await;
    let manifest = Arc::new(Manifest {
        seen: Mutex::new(Vec::new()),
    });
    let hooks = ExportHooks::new().with(manifest.clone());

    let archive = export_service(&store, hooks)
        .export(&everything(), date!(2024 - 06 - 02))
        .await
        .expect("archive");

    let files = unzip(&archive.bytes);
    let names: Vec<_> = files.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["posts.atom", "pages.atom", "README.txt"]);
    assert!(files[0].1.contains("?via=mirror"));
    assert!(!files[1].1.contains("?via=mirror"));
    assert_eq!(*manifest.seen.lock().expect("lock"), vec![1, 2]);
}

#[tokio::test]
async fn native_export_imports_into_an_empty_site() {
    let source = source_store().await;
    let archive = export_service(&source, ExportHooks::new())
        .export(&everything(), date!(2024 - 06 - 02))
        .await
        .expect("archive");
    let files = unzip(&archive.bytes);

    let target = MemoryStore::with_users(default_users());
    let service = importer_for(&target);
    let importer = service.resolve_importer("admin").await.expect("importer");
    let summary = service
        .import_native(
            Some(files[0].1.as_bytes()),
            Some(files[1].1.as_bytes()),
            &importer,
        )
        .await
        .expect("import");
    assert_eq!(summary.posts, 2);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.skipped, 0);

    let original = source.posts().await;
    let imported = target.posts().await;
    for (before, after) in original.iter().zip(imported.iter()) {
        assert_eq!(after.url, before.url);
        assert_eq!(after.clean, before.clean);
        assert_eq!(after.feather, before.feather);
        assert_eq!(after.fields, before.fields);
        assert_eq!(after.pinned, before.pinned);
        assert_eq!(after.status, before.status);
        assert_eq!(after.user_id, before.user_id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.updated_at, before.updated_at);
    }

    let pages = target.pages().await;
    assert_eq!(pages[1].url, "team");
    assert_eq!(pages[1].parent_id, Some(1));
    assert_eq!(pages[1].user_id, 2);
}

#[tokio::test]
async fn reimport_suffixes_taken_urls() {
    let store = source_store().await;
    let archive = export_service(&store, ExportHooks::new())
        .export(&everything(), date!(2024 - 06 - 02))
        .await
        .expect("archive");
    let files = unzip(&archive.bytes);

    let service = importer_for(&store);
    let importer = service.resolve_importer("admin").await.expect("importer");
    service
        .import_native(Some(files[0].1.as_bytes()), None, &importer)
        .await
        .expect("first reimport");
    service
        .import_native(Some(files[0].1.as_bytes()), None, &importer)
        .await
        .expect("second reimport");

    let urls: Vec<_> = store.posts().await.into_iter().map(|post| post.url).collect();
    assert_eq!(
        urls,
        [
            "fish-and-chips",
            "draft-notes",
            "fish-and-chips-2",
            "draft-notes-2",
            "fish-and-chips-3",
            "draft-notes-3",
        ]
    );
}

#[tokio::test]
async fn native_import_checks_documents_before_writing() {
    let store = source_store().await;
    let archive = export_service(&store, ExportHooks::new())
        .export(&everything(), date!(2024 - 06 - 02))
        .await
        .expect("archive");
    let files = unzip(&archive.bytes);

    let target = MemoryStore::with_users(default_users());
    let service = importer_for(&target);
    let importer = service.resolve_importer("admin").await.expect("importer");

    let err = service
        .import_native(Some(files[1].1.as_bytes()), None, &importer)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminImportError::KindMismatch { .. }));

    let err = service
        .import_native(Some(files[0].1.as_bytes()), Some(b"<feed/>"), &importer)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminImportError::Exchange(_)));
    assert!(target.posts().await.is_empty());

    let err = service.import_native(None, None, &importer).await.unwrap_err();
    assert!(matches!(err, AdminImportError::NothingToImport));

    let err = service.resolve_importer("ghost").await.unwrap_err();
    assert!(matches!(err, AdminImportError::UnknownImporter { .. }));
}
