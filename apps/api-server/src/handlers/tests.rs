//! HTTP-level tests over the in-memory store.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;
use uuid::Uuid;

use blogicum_core::domain::{Category, Post, User};
use blogicum_core::ports::{BaseRepository, MediaStorage, PostRepository, PostScope, TokenService};
use blogicum_core::BlogSettings;
use blogicum_infra::media::LocalMediaStorage;
use blogicum_infra::{InMemoryStore, JwtConfig, JwtTokenService};

use crate::config::{AppConfig, MediaConfig};
use crate::state::AppState;

struct TestApp {
    store: InMemoryStore,
    state: AppState,
    tokens: Arc<dyn TokenService>,
    _media_dir: TempDir,
}

fn setup() -> TestApp {
    let media_dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: None,
        jwt: JwtConfig {
            secret: "handler-tests".to_string(),
            expiration_hours: 1,
            issuer: "blogicum-test".to_string(),
        },
        media: MediaConfig {
            root: media_dir.path().to_path_buf(),
            url: "/media".to_string(),
            max_upload_bytes: 1024,
        },
        blog: BlogSettings::default(),
    };

    let store = InMemoryStore::new();
    let media: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(
        config.media.root.clone(),
        config.media.max_upload_bytes,
    ));
    let state = AppState::from_parts(store.repositories(), media, &config);
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

    TestApp {
        store,
        state,
        tokens,
        _media_dir: media_dir,
    }
}

macro_rules! init_app {
    ($t:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($t.state.clone()))
                .app_data(web::Data::new($t.tokens.clone()))
                .configure(|cfg| super::configure_routes(cfg, "/media")),
        )
        .await
    };
}

impl TestApp {
    /// Seed a user and return a bearer header value for them.
    async fn user(&self, username: &str) -> (User, String) {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "unused".to_string(),
        );
        let user = self.store.users().save(user).await.unwrap();
        let token = self
            .tokens
            .generate_token(user.id, &user.username)
            .unwrap();
        (user, format!("Bearer {token}"))
    }

    async fn post(&self, author: &User, title: &str, pub_date: DateTime<Utc>) -> Post {
        let post = Post::new(author.id, title.to_string(), format!("{title} text"), pub_date);
        self.store.posts().save(post).await.unwrap()
    }
}

fn location_of<B>(res: &actix_web::dev::ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn post_body(title: &str) -> Value {
    json!({
        "title": title,
        "text": "Body",
        "pub_date": (Utc::now() - TimeDelta::hours(1)).to_rfc3339(),
    })
}

#[actix_web::test]
async fn test_health() {
    let t = setup();
    let app = init_app!(t);

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_index_lists_only_public_posts() {
    let t = setup();
    let (author, auth) = t.user("author").await;
    t.post(&author, "Yesterday", Utc::now() - TimeDelta::days(1)).await;
    t.post(&author, "Tomorrow", Utc::now() + TimeDelta::days(1)).await;
    let app = init_app!(t);

    // The author's own scheduled post stays out of the index too.
    let req = test::TestRequest::get()
        .uri("/")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Yesterday"]);
    assert_eq!(body["items"][0]["comment_count"], 0);
    assert_eq!(body["items"][0]["author"], "author");
    assert_eq!(body["has_next"], false);
}

#[actix_web::test]
async fn test_scheduled_post_visible_to_author_only() {
    let t = setup();
    let (author, author_auth) = t.user("author").await;
    let (_, stranger_auth) = t.user("stranger").await;
    let post = t.post(&author, "Soon", Utc::now() + TimeDelta::days(1)).await;
    let app = init_app!(t);
    let uri = format!("/posts/{}/", post.id);

    let anonymous = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(anonymous.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, stranger_auth))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, author_auth.clone()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["post"]["title"], "Soon");

    let req = test::TestRequest::get()
        .uri("/profile/author/")
        .insert_header((header::AUTHORIZATION, author_auth))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"]["total_items"], 1);

    let req = test::TestRequest::get().uri("/profile/author/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"]["total_items"], 0);
    assert_eq!(body["profile"]["username"], "author");
}

#[actix_web::test]
async fn test_login_required_redirects_to_login() {
    let t = setup();
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .set_json(post_body("Anonymous"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&res), "/auth/login/?next=/posts/create/");
    assert!(t.store.posts().find_records(PostScope::All).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_bad_token_is_rejected() {
    let t = setup();
    let app = init_app!(t);

    let req = test::TestRequest::get()
        .uri("/auth/me/")
        .insert_header((header::AUTHORIZATION, "Bearer nonsense"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_post_redirects_to_profile() {
    let t = setup();
    let (_, auth) = t.user("author").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(post_body("Fresh"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&res), "/profile/author/");
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["data"]["title"], "Fresh");
    assert_eq!(body["redirect_to"], "/profile/author/");

    let index: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(index["total_items"], 1);
}

#[actix_web::test]
async fn test_invalid_post_is_unprocessable() {
    let t = setup();
    let (_, auth) = t.user("author").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({
            "title": "  ",
            "text": "Body",
            "pub_date": "1700-01-01T00:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(res).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"pub_date"));
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let t = setup();
    let (_, auth) = t.user("author").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, auth))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_non_author_edit_redirects_without_change() {
    let t = setup();
    let (author, _) = t.user("author").await;
    let (_, stranger_auth) = t.user("stranger").await;
    let post = t.post(&author, "Original", Utc::now() - TimeDelta::days(1)).await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header((header::AUTHORIZATION, stranger_auth.clone()))
        .set_json(post_body("Hijacked"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&res), format!("/posts/{}/", post.id));
    let stored = t.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Original");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .insert_header((header::AUTHORIZATION, stranger_auth))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(t.store.posts().find_by_id(post.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn test_comment_lifecycle_and_cascade() {
    let t = setup();
    let (author, author_auth) = t.user("author").await;
    let (_, reader_auth) = t.user("reader").await;
    let post = t.post(&author, "Talk", Utc::now() - TimeDelta::days(1)).await;
    let app = init_app!(t);
    let detail = format!("/posts/{}/", post.id);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header((header::AUTHORIZATION, reader_auth.clone()))
        .set_json(json!({ "text": "Nice post" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&res), detail);
    let body: Value = test::read_body_json(res).await;
    let comment_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    // The post author cannot edit the reader's comment.
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit_comment/{}/", post.id, comment_id))
        .insert_header((header::AUTHORIZATION, author_auth.clone()))
        .set_json(json!({ "text": "Censored" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&res), detail);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&detail).to_request())
            .await;
    assert_eq!(body["comments"][0]["text"], "Nice post");
    assert_eq!(body["comments"][0]["author"], "reader");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .insert_header((header::AUTHORIZATION, author_auth))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&res), "/profile/author/");

    assert!(t.store.comments().find_by_id(comment_id).await.unwrap().is_none());
    let gone = test::call_service(&app, test::TestRequest::get().uri(&detail).to_request()).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_unpublished_category_is_not_found() {
    let t = setup();
    let (author, _) = t.user("author").await;
    let mut category = Category::new("Hidden".into(), "Secret".into(), "hidden".into());
    category.is_published = false;
    let category = t.store.categories().save(category).await.unwrap();
    let mut post = Post::new(
        author.id,
        "Inside".into(),
        "Text".into(),
        Utc::now() - TimeDelta::days(1),
    );
    post.category_id = Some(category.id);
    t.store.posts().save(post).await.unwrap();
    let app = init_app!(t);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/hidden/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let index: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(index["total_items"], 0);
}

#[actix_web::test]
async fn test_page_bounds() {
    let t = setup();
    let (author, _) = t.user("author").await;
    for i in 0..11 {
        t.post(&author, &format!("Post {i}"), Utc::now() - TimeDelta::hours(i + 1))
            .await;
    }
    let app = init_app!(t);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/?page=2").to_request(),
    )
    .await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_previous"], true);

    let res = test::call_service(&app, test::TestRequest::get().uri("/?page=3").to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(&app, test::TestRequest::get().uri("/?page=abc").to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_register_then_login() {
    let t = setup();
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_json(json!({
            "username": "newbie",
            "email": "newbie@example.com",
            "password": "correct horse",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&res), "/");

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({ "username": "newbie", "password": "wrong horse" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({ "username": "newbie", "password": "correct horse" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/auth/me/")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "newbie");

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_json(json!({
            "username": "newbie",
            "email": "other@example.com",
            "password": "correct horse",
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );
}

#[actix_web::test]
async fn test_profile_edit_renames_user() {
    let t = setup();
    let (_, auth) = t.user("leo").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/profile/edit/")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({ "username": "lev", "first_name": "Lev", "last_name": "Tolstoy" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&res), "/profile/lev/");

    // The old token still identifies the account by id.
    let req = test::TestRequest::get()
        .uri("/profile/edit/")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "lev");

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/profile/lev/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["profile"]["full_name"], "Lev Tolstoy");
}

fn multipart(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "blogicum-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

#[actix_web::test]
async fn test_image_upload_and_serving() {
    let t = setup();
    let (author, auth) = t.user("author").await;
    let post = t.post(&author, "Pictured", Utc::now() - TimeDelta::days(1)).await;
    let app = init_app!(t);
    let png = b"\x89PNG\r\n\x1a\nfake";

    let (content_type, body) = multipart("image", "photo.png", "image/png", png);
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/image/", post.id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let body: Value = test::read_body_json(res).await;
    let image_url = body["data"]["image_url"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/media/posts_images/"));

    let res = test::call_service(&app, test::TestRequest::get().uri(&image_url).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(test::read_body(res).await.as_ref(), png);

    let (content_type, body) = multipart("image", "tool.exe", "application/octet-stream", b"MZ");
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/image/", post.id))
        .insert_header((header::AUTHORIZATION, auth))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_oversized_upload_is_rejected() {
    let t = setup();
    let (author, auth) = t.user("author").await;
    let post = t.post(&author, "Big", Utc::now() - TimeDelta::days(1)).await;
    let app = init_app!(t);

    let (content_type, body) = multipart("image", "big.png", "image/png", &[0u8; 4096]);
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/image/", post.id))
        .insert_header((header::AUTHORIZATION, auth))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let stored = t.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert!(stored.image.is_none());
}

#[actix_web::test]
async fn test_media_path_traversal_is_not_found() {
    let t = setup();
    let app = init_app!(t);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/media/..%2Fsecret").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_media_directory_is_not_found() {
    let t = setup();
    let (author, auth) = t.user("author").await;
    let post = t.post(&author, "Pictured", Utc::now() - TimeDelta::days(1)).await;
    let app = init_app!(t);

    let (content_type, body) = multipart("image", "photo.png", "image/png", b"\x89PNG");
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/image/", post.id))
        .insert_header((header::AUTHORIZATION, auth))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);

    for uri in ["/media/posts_images", "/media/posts_images/"] {
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}
