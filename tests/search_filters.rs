mod common;

use folio::application::admin::AdminSearchError;
use folio::application::search::SearchError;
use folio::domain::types::PostStatus;

use common::{MemoryStore, default_users, page, search_service, text_post};

async fn seeded_store() -> std::sync::Arc<MemoryStore> {
    let store = MemoryStore::with_users(default_users());
    store
        .insert_post(text_post(1, "first-light", "First light", "Morning walk", 2))
        .await;
    store
        .insert_post(text_post(2, "harbour", "Harbour notes", "Boats at dusk", 3))
        .await;
    let mut draft = text_post(3, "unfinished", "Unfinished", "Work in progress", 2);
    draft.status = PostStatus::Draft;
    store.insert_post(draft).await;

    store.insert_page(page(1, "about", "About", None, 1)).await;
    store.insert_page(page(2, "team", "Team", Some(1), 1)).await;
    store.insert_page(page(3, "contact", "Contact", None, 2)).await;
    store
}

#[tokio::test]
async fn empty_query_lists_posts_newest_first() {
    let store = seeded_store().await;
    let search = search_service(&store);

    let result = search.posts("", None, 1).await.expect("listing");
    let urls: Vec<_> = result.items.iter().map(|post| post.url.as_str()).collect();
    assert_eq!(urls, ["unfinished", "harbour", "first-light"]);
    assert_eq!(result.total, 3);
    assert_eq!(result.per_page, 25);
}

#[tokio::test]
async fn author_keyword_resolves_login_to_user_id() {
    let store = seeded_store().await;
    let search = search_service(&store);

    let result = search.posts("author:ada", None, 1).await.expect("listing");
    assert_eq!(result.total, 2);
    assert!(result.items.iter().all(|post| post.user_id == 2));

    let none = search.posts("author:nobody", None, 1).await.expect("listing");
    assert_eq!(none.total, 0);
}

#[tokio::test]
async fn constraints_and_free_text_combine() {
    let store = seeded_store().await;
    let search = search_service(&store);

    let drafts = search
        .posts("status:draft progress", None, 1)
        .await
        .expect("listing");
    assert_eq!(drafts.total, 1);
    assert_eq!(drafts.items[0].url, "unfinished");

    let text = search.posts("BOATS", None, 1).await.expect("listing");
    assert_eq!(text.total, 1);
    assert_eq!(text.items[0].url, "harbour");
}

#[tokio::test]
async fn month_filter_limits_posts_to_that_month() {
    let store = seeded_store().await;
    let search = search_service(&store);

    let march = search.posts("", Some("2024-03"), 1).await.expect("listing");
    assert_eq!(march.total, 3);

    let april = search.posts("", Some("2024-04"), 1).await.expect("listing");
    assert_eq!(april.total, 0);

    let blank = search.posts("", Some("  "), 1).await.expect("listing");
    assert_eq!(blank.total, 3);

    let err = search.posts("", Some("2024-13"), 1).await.unwrap_err();
    assert!(matches!(err, AdminSearchError::Domain(_)));
}

#[tokio::test]
async fn page_parent_zero_selects_top_level_pages() {
    let store = seeded_store().await;
    let search = search_service(&store);

    let top = search.pages("parent_id:0", 1).await.expect("listing");
    let urls: Vec<_> = top.items.iter().map(|page| page.url.as_str()).collect();
    assert_eq!(urls, ["about", "contact"]);

    let children = search.pages("parent_id:1", 1).await.expect("listing");
    assert_eq!(children.items[0].url, "team");
}

#[tokio::test]
async fn user_free_text_matches_names_and_email() {
    let store = seeded_store().await;
    let search = search_service(&store);

    let by_name = search.users("lovelace", 1).await.expect("listing");
    assert_eq!(by_name.total, 1);
    assert_eq!(by_name.items[0].login, "ada");

    let by_mail = search.users("example.com", 1).await.expect("listing");
    assert_eq!(by_mail.total, 3);
}

#[tokio::test]
async fn fields_outside_the_scope_are_rejected() {
    let store = seeded_store().await;
    let search = search_service(&store);

    let err = search.pages("feather:text", 1).await.unwrap_err();
    assert!(matches!(
        err,
        AdminSearchError::Search(SearchError::InvalidFilterField { ref field, .. }) if field == "feather"
    ));

    let err = search.users("author:ada", 1).await.unwrap_err();
    assert!(matches!(
        err,
        AdminSearchError::Search(SearchError::InvalidFilterField { .. })
    ));

    let err = search.posts("pinned:maybe", None, 1).await.unwrap_err();
    assert!(matches!(
        err,
        AdminSearchError::Search(SearchError::InvalidFilterSyntax { .. })
    ));
}
