use axum::http::StatusCode;
use axum_test::TestServer;
use mekboard::{Config, create_app, posts::PostStore};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

async fn setup_test_server() -> (TempDir, PathBuf, TestServer) {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("posts.json");
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.app.name = "TestBoard".to_string();
    config.templates.directory = manifest_dir.join("templates");
    config.static_files.directory = manifest_dir.join("static");
    config.forum.store_path = store_path.clone();

    let app = create_app(config).await;
    let server = TestServer::new(app.into_make_service()).unwrap();

    (temp_dir, store_path, server)
}

async fn create_post(server: &TestServer, store_path: &Path, title: &str) -> String {
    let response = server
        .post("/create_post")
        .form(&[("title", title), ("content", "World"), ("author", "Alice")])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let posts = PostStore::new(store_path).read_all().await.unwrap();
    posts
        .iter()
        .find(|post| post.title == title)
        .map(|post| post.id.clone())
        .unwrap()
}

#[tokio::test]
async fn test_home_with_empty_store() {
    let (_temp_dir, _store_path, server) = setup_test_server().await;

    let response = server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("<title>Home - TestBoard</title>"));
    assert!(html.contains("No posts yet"));
}

#[tokio::test]
async fn test_create_post_form_renders() {
    let (_temp_dir, _store_path, server) = setup_test_server().await;

    let response = server.get("/create_post").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains(r#"action="/create_post""#));
    assert!(html.contains(r#"name="title""#));
    assert!(html.contains(r#"name="content""#));
    assert!(html.contains(r#"name="author""#));
}

#[tokio::test]
async fn test_create_post_redirects_and_persists() {
    let (_temp_dir, store_path, server) = setup_test_server().await;

    let response = server
        .post("/create_post")
        .form(&[("title", "Hello"), ("content", "World"), ("author", "Alice")])
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location").to_str().unwrap(), "/");

    let posts = PostStore::new(&store_path).read_all().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Hello");
    assert_eq!(posts[0].content, "World");
    assert_eq!(posts[0].author, "Alice");
    assert_eq!(posts[0].likes, 0);
    assert!(posts[0].comments.is_empty());

    let html = server.get("/").await.text();
    assert!(html.contains("Hello"));
    assert!(html.contains("by Alice"));
    assert!(html.contains("0 likes &middot; 0 comments"));
}

#[tokio::test]
async fn test_create_post_missing_field_is_rejected() {
    let (_temp_dir, store_path, server) = setup_test_server().await;

    let response = server
        .post("/create_post")
        .form(&[("title", "Hello"), ("content", "World")])
        .await;

    assert!(response.status_code().is_client_error());
    assert!(!store_path.exists());
}

#[tokio::test]
async fn test_view_and_comment_on_post() {
    let (_temp_dir, store_path, server) = setup_test_server().await;
    let id = create_post(&server, &store_path, "Hello").await;

    let response = server.get(&format!("/post/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("<h1>Hello</h1>"));
    assert!(html.contains("0 comments"));

    let response = server
        .post(&format!("/post/{}", id))
        .form(&[("comment", "Nice!"), ("author", "Bob")])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location").to_str().unwrap(),
        format!("/post/{}", id)
    );

    let html = server.get(&format!("/post/{}", id)).await.text();
    assert!(html.contains("1 comments"));
    assert!(html.contains("Nice!"));
    assert!(html.contains("Bob"));

    let html = server.get("/").await.text();
    assert!(html.contains("1 comments"));

    let posts = PostStore::new(&store_path).read_all().await.unwrap();
    assert_eq!(posts[0].comments.len(), 1);
    assert_eq!(posts[0].comments[0].author, "Bob");
    assert_eq!(posts[0].comments[0].text, "Nice!");
}

#[tokio::test]
async fn test_comment_without_author_is_anonymous() {
    let (_temp_dir, store_path, server) = setup_test_server().await;
    let id = create_post(&server, &store_path, "Hello").await;

    server
        .post(&format!("/post/{}", id))
        .form(&[("comment", "Who am I?")])
        .await;

    let posts = PostStore::new(&store_path).read_all().await.unwrap();
    assert_eq!(posts[0].comments[0].author, "Anonymous");
}

#[tokio::test]
async fn test_like_twice() {
    let (_temp_dir, store_path, server) = setup_test_server().await;
    let id = create_post(&server, &store_path, "Hello").await;

    for _ in 0..2 {
        let response = server
            .post(&format!("/post/{}", id))
            .form(&[("like", "1")])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    }

    let posts = PostStore::new(&store_path).read_all().await.unwrap();
    assert_eq!(posts[0].likes, 2);

    let html = server.get(&format!("/post/{}", id)).await.text();
    assert!(html.contains("Like (2)"));
}

#[tokio::test]
async fn test_empty_action_changes_nothing() {
    let (_temp_dir, store_path, server) = setup_test_server().await;
    let id = create_post(&server, &store_path, "Hello").await;
    let before = PostStore::new(&store_path).read_all().await.unwrap();

    let response = server
        .post(&format!("/post/{}", id))
        .form(&[("author", "Bob")])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let after = PostStore::new(&store_path).read_all().await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_unknown_post_is_not_found() {
    let (_temp_dir, store_path, server) = setup_test_server().await;

    let response = server.get("/post/no-such-post").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("Post not found"));

    let response = server
        .post("/post/no-such-post")
        .form(&[("like", "1")])
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(!store_path.exists());
}

#[tokio::test]
async fn test_user_text_is_escaped() {
    let (_temp_dir, store_path, server) = setup_test_server().await;
    let id = create_post(&server, &store_path, "<script>alert(1)</script>").await;

    let html = server.get("/").await.text();
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(html.contains("&lt;script&gt;"));

    let html = server.get(&format!("/post/{}", id)).await.text();
    assert!(!html.contains("<script>alert(1)</script>"));
}

#[tokio::test]
async fn test_listing_is_newest_first() {
    let (_temp_dir, store_path, server) = setup_test_server().await;

    fs::write(
        &store_path,
        r#"[
  {"id": "old", "title": "Older post", "content": "x", "author": "A",
   "timestamp": "01 Jan 2024 - 10:00:00"},
  {"id": "new", "title": "Newer post", "content": "y", "author": "B",
   "timestamp": "05 Mar 2024 - 14:30:00", "likes": 7,
   "comments": [{"author": "C", "text": "hi", "timestamp": "06 Mar 2024 - 09:00:00"}]}
]"#,
    )
    .unwrap();

    let html = server.get("/").await.text();
    let newer = html.find("Newer post").unwrap();
    let older = html.find("Older post").unwrap();
    assert!(newer < older);
    assert!(html.contains("7 likes &middot; 1 comments"));
}

#[tokio::test]
async fn test_corrupt_store_lists_nothing() {
    let (_temp_dir, store_path, server) = setup_test_server().await;
    fs::write(&store_path, "this is not json").unwrap();

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("No posts yet"));
}

#[tokio::test]
async fn test_create_post_refuses_to_replace_undecodable_store() {
    let (_temp_dir, store_path, server) = setup_test_server().await;
    let document = r#"[{"id": "keep1", "title": "Kept", "content": "C", "author": "A",
  "timestamp": "01 Jan 2024 - 10:00:00", "likes": 3}, "not a post"]"#;
    fs::write(&store_path, document).unwrap();

    let response = server
        .post("/create_post")
        .form(&[("title", "Hello"), ("content", "World"), ("author", "Alice")])
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(fs::read_to_string(&store_path).unwrap(), document);
}

#[tokio::test]
async fn test_bad_timestamp_fails_listing() {
    let (_temp_dir, store_path, server) = setup_test_server().await;
    fs::write(
        &store_path,
        r#"[{"id": "x", "title": "T", "content": "C", "author": "A", "timestamp": "yesterday"}]"#,
    )
    .unwrap();

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_stylesheet_is_served() {
    let (_temp_dir, _store_path, server) = setup_test_server().await;

    let response = server.get("/static/style.css").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "text/css"
    );
}
