//! Live-database tests for the SQLite post and upload repositories.

use foglio::application::repos::{
    ListWindow, NewPost, NewUpload, PostChanges, PostFilter, PostsRepo, PostsWriteRepo, RepoError,
    UploadsRepo,
};
use foglio::domain::types::{PostFormat, PostStatus};
use foglio::infra::db::SqliteRepositories;
use tempfile::TempDir;

async fn test_repositories() -> (SqliteRepositories, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let pool = SqliteRepositories::connect(&url, 2).await.expect("connect");
    SqliteRepositories::run_migrations(&pool)
        .await
        .expect("migrations");
    (SqliteRepositories::new(pool), dir)
}

fn post(slug: &str, title: &str, tags: &str, status: PostStatus, created_at: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: format!("<p>{title}</p>"),
        slug: slug.to_string(),
        tags: tags.to_string(),
        status,
        format: PostFormat::Standard,
        created_at: created_at.to_string(),
    }
}

#[tokio::test]
async fn create_and_find_round_trip() {
    let (repos, _dir) = test_repositories().await;

    let created = repos
        .create_post(post(
            "first-light",
            "First Light",
            "photography, dawn",
            PostStatus::Published,
            "2025-01-05 08:00:00",
        ))
        .await
        .expect("create");

    let found = repos
        .find_by_slug("first-light")
        .await
        .expect("query")
        .expect("present");

    assert_eq!(found, created);
    assert_eq!(found.title, "First Light");
    assert_eq!(found.tags, "photography, dawn");
    assert_eq!(found.status, PostStatus::Published);
    assert_eq!(found.created_at, "2025-01-05 08:00:00");
}

#[tokio::test]
async fn duplicate_slug_is_rejected_and_first_post_survives() {
    let (repos, _dir) = test_repositories().await;

    repos
        .create_post(post(
            "taken",
            "Original",
            "",
            PostStatus::Draft,
            "2025-01-01 09:00:00",
        ))
        .await
        .expect("create");

    let err = repos
        .create_post(post(
            "taken",
            "Impostor",
            "",
            PostStatus::Draft,
            "2025-01-02 09:00:00",
        ))
        .await
        .expect_err("duplicate slug must fail");
    assert!(matches!(err, RepoError::Duplicate { .. }));

    let survivor = repos
        .find_by_slug("taken")
        .await
        .expect("query")
        .expect("present");
    assert_eq!(survivor.title, "Original");
    assert_eq!(repos.count_posts(&PostFilter::default()).await.expect("count"), 1);
}

#[tokio::test]
async fn deleting_a_missing_slug_is_a_noop() {
    let (repos, _dir) = test_repositories().await;

    repos
        .create_post(post(
            "keeper",
            "Keeper",
            "",
            PostStatus::Draft,
            "2025-01-01 09:00:00",
        ))
        .await
        .expect("create");

    repos.delete_post("never-existed").await.expect("idempotent");
    assert_eq!(repos.count_posts(&PostFilter::default()).await.expect("count"), 1);

    repos.delete_post("keeper").await.expect("delete");
    repos.delete_post("keeper").await.expect("still idempotent");
    assert_eq!(repos.count_posts(&PostFilter::default()).await.expect("count"), 0);
}

#[tokio::test]
async fn update_overwrites_fields_but_keeps_identity_and_timestamp() {
    let (repos, _dir) = test_repositories().await;

    let created = repos
        .create_post(post(
            "evolving",
            "Draft Title",
            "old",
            PostStatus::Draft,
            "2024-11-30 20:15:00",
        ))
        .await
        .expect("create");

    repos
        .update_post(
            "evolving",
            PostChanges {
                title: "Final Title".to_string(),
                content: "<p>rewritten</p>".to_string(),
                tags: "new, shiny".to_string(),
                status: PostStatus::Published,
                format: PostFormat::Html,
            },
        )
        .await
        .expect("update");

    let updated = repos
        .find_by_slug("evolving")
        .await
        .expect("query")
        .expect("present");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.slug, "evolving");
    assert_eq!(updated.created_at, "2024-11-30 20:15:00");
    assert_eq!(updated.title, "Final Title");
    assert_eq!(updated.tags, "new, shiny");
    assert_eq!(updated.status, PostStatus::Published);
    assert_eq!(updated.format, PostFormat::Html);
}

#[tokio::test]
async fn updating_an_unknown_slug_is_a_noop() {
    let (repos, _dir) = test_repositories().await;

    repos
        .update_post(
            "phantom",
            PostChanges {
                title: "Ghost".to_string(),
                content: "<p>boo</p>".to_string(),
                tags: String::new(),
                status: PostStatus::Draft,
                format: PostFormat::Standard,
            },
        )
        .await
        .expect("no-op");

    assert_eq!(repos.count_posts(&PostFilter::default()).await.expect("count"), 0);
}

#[tokio::test]
async fn search_matches_tags_and_respects_published_filter() {
    let (repos, _dir) = test_repositories().await;

    repos
        .create_post(post(
            "alpha",
            "Alpha",
            "rustlang, systems",
            PostStatus::Published,
            "2025-02-01 10:00:00",
        ))
        .await
        .expect("create");
    repos
        .create_post(post(
            "beta",
            "Beta",
            "cooking",
            PostStatus::Published,
            "2025-02-02 10:00:00",
        ))
        .await
        .expect("create");
    repos
        .create_post(post(
            "gamma",
            "Gamma",
            "rustlang",
            PostStatus::Draft,
            "2025-02-03 10:00:00",
        ))
        .await
        .expect("create");

    // `rustlang` appears only in tags, never in a title; the draft post is
    // excluded even though its tags match.
    let hits = repos.search_posts("rustlang").await.expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].slug, "alpha");

    let by_title = repos.search_posts("Beta").await.expect("search");
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].slug, "beta");
}

#[tokio::test]
async fn search_is_case_sensitive() {
    let (repos, _dir) = test_repositories().await;

    repos
        .create_post(post(
            "alpha",
            "Alpha",
            "rustlang",
            PostStatus::Published,
            "2025-02-01 10:00:00",
        ))
        .await
        .expect("create");

    assert_eq!(repos.search_posts("rustlang").await.expect("search").len(), 1);
    assert!(repos.search_posts("RUSTLANG").await.expect("search").is_empty());
}

#[tokio::test]
async fn listing_orders_newest_first_and_honours_windows() {
    let (repos, _dir) = test_repositories().await;

    for (slug, stamp) in [
        ("oldest", "2023-05-01 12:00:00"),
        ("middle", "2024-05-01 12:00:00"),
        ("newest", "2025-05-01 12:00:00"),
    ] {
        repos
            .create_post(post(slug, slug, "", PostStatus::Published, stamp))
            .await
            .expect("create");
    }

    let all = repos
        .list_posts(&PostFilter::default(), None)
        .await
        .expect("list");
    let slugs: Vec<_> = all.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, ["newest", "middle", "oldest"]);

    let windowed = repos
        .list_posts(
            &PostFilter::default(),
            Some(ListWindow {
                limit: 2,
                offset: 1,
            }),
        )
        .await
        .expect("list");
    let slugs: Vec<_> = windowed.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, ["middle", "oldest"]);
}

#[tokio::test]
async fn tag_filter_is_a_substring_match() {
    let (repos, _dir) = test_repositories().await;

    repos
        .create_post(post(
            "tagged",
            "Tagged",
            "rust, web",
            PostStatus::Published,
            "2025-03-01 10:00:00",
        ))
        .await
        .expect("create");
    repos
        .create_post(post(
            "other",
            "Other",
            "cooking",
            PostStatus::Published,
            "2025-03-02 10:00:00",
        ))
        .await
        .expect("create");

    let rust = repos
        .list_posts(&PostFilter::tagged("rust"), None)
        .await
        .expect("list");
    assert_eq!(rust.len(), 1);
    assert_eq!(rust[0].slug, "tagged");

    // Substring semantics: "us" is contained in "rust".
    let us = repos
        .list_posts(&PostFilter::tagged("us"), None)
        .await
        .expect("list");
    assert_eq!(us.len(), 1);

    assert_eq!(
        repos.count_posts(&PostFilter::tagged("rust")).await.expect("count"),
        1
    );
}

#[tokio::test]
async fn backfill_assigns_unique_slugs_exactly_once() {
    let (repos, _dir) = test_repositories().await;

    // Legacy rows: identical titles and timestamps, no slug.
    for _ in 0..2 {
        sqlx::query(
            "INSERT INTO posts (title, content, slug, tags, status, format, created_at) \
             VALUES ('Old Entry', '<p>old</p>', NULL, '', 'draft', 'standard', '2020-06-01 00:00:00')",
        )
        .execute(repos.pool())
        .await
        .expect("seed legacy row");
    }

    let assigned = repos.backfill_missing_slugs().await.expect("backfill");
    assert_eq!(assigned, 2);

    let rows = repos
        .list_posts(&PostFilter::default(), None)
        .await
        .expect("list");
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert!(row.slug.starts_with("old-entry-"), "slug: {}", row.slug);
    }
    assert_ne!(rows[0].slug, rows[1].slug);

    // Guarded by the NULL/empty predicate, so a second run touches nothing.
    assert_eq!(repos.backfill_missing_slugs().await.expect("backfill"), 0);
}

#[tokio::test]
async fn upload_index_round_trip_and_last_writer_wins() {
    let (repos, _dir) = test_repositories().await;

    repos
        .record_upload(NewUpload {
            filename: "sunset.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size_bytes: 1024,
            created_at: "2025-04-01 18:00:00".to_string(),
        })
        .await
        .expect("record");

    let replaced = repos
        .record_upload(NewUpload {
            filename: "sunset.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size_bytes: 2048,
            created_at: "2025-04-02 18:00:00".to_string(),
        })
        .await
        .expect("record again");
    assert_eq!(replaced.size_bytes, 2048);

    let listed = repos.list_uploads().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].size_bytes, 2048);

    assert!(
        repos
            .find_upload("sunset.jpg")
            .await
            .expect("find")
            .is_some()
    );

    repos.delete_upload("sunset.jpg").await.expect("delete");
    repos.delete_upload("sunset.jpg").await.expect("idempotent");
    assert!(repos.list_uploads().await.expect("list").is_empty());
}
