//! Categories, genres, and titles: CRUD, authorization, filters, and the
//! derived rating.

mod common;

use axum::http::StatusCode;
use rstest::rstest;
use serde_json::{Value, json};

use common::{TestApp, body_json};
use reviewd::models::Role;

async fn seed_admin(app: &TestApp) -> String {
    let admin = app.seed_user("admin", Role::Admin).await;
    app.token_for(&admin)
}

async fn create_category(app: &TestApp, token: &str, name: &str, slug: &str) {
    let response = app
        .request(
            "POST",
            "/api/v1/categories",
            Some(token),
            Some(json!({"name": name, "slug": slug})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn create_genre(app: &TestApp, token: &str, name: &str, slug: &str) {
    let response = app
        .request(
            "POST",
            "/api/v1/genres",
            Some(token),
            Some(json!({"name": name, "slug": slug})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn create_title(app: &TestApp, token: &str, payload: Value) -> Value {
    let response = app
        .request("POST", "/api/v1/titles", Some(token), Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[rstest]
#[tokio::test]
async fn category_write_surface_is_admin_only() {
    let app = TestApp::spawn().await;
    let admin_token = seed_admin(&app).await;
    let user = app.seed_user("reader", Role::User).await;
    let user_token = app.token_for(&user);
    let payload = json!({"name": "Movies", "slug": "movies"});

    let response = app
        .request("POST", "/api/v1/categories", None, Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            "POST",
            "/api/v1/categories",
            Some(&user_token),
            Some(payload.clone()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    create_category(&app, &admin_token, "Movies", "movies").await;

    // Duplicate slug maps to a field-level 400, not a 500.
    let response = app
        .request(
            "POST",
            "/api/v1/categories",
            Some(&admin_token),
            Some(json!({"name": "Films", "slug": "movies"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Anyone may list.
    let response = app.request("GET", "/api/v1/categories", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["slug"], "movies");

    let response = app
        .request(
            "DELETE",
            "/api/v1/categories/movies",
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app
        .request(
            "DELETE",
            "/api/v1/categories/movies",
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn genre_search_filters_by_name() {
    let app = TestApp::spawn().await;
    let admin_token = seed_admin(&app).await;
    create_genre(&app, &admin_token, "Drama", "drama").await;
    create_genre(&app, &admin_token, "Dramedy", "dramedy").await;
    create_genre(&app, &admin_token, "Comedy", "comedy").await;

    let response = app
        .request("GET", "/api/v1/genres?search=Dram", None, None)
        .await;
    let page = body_json(response).await;
    assert_eq!(page["count"], 2);
}

#[rstest]
#[tokio::test]
async fn title_create_hydrates_relations() {
    let app = TestApp::spawn().await;
    let admin_token = seed_admin(&app).await;
    create_category(&app, &admin_token, "Movies", "movies").await;
    create_genre(&app, &admin_token, "Drama", "drama").await;
    create_genre(&app, &admin_token, "Comedy", "comedy").await;

    let title = create_title(
        &app,
        &admin_token,
        json!({
            "name": "The Apartment",
            "year": 1960,
            "genre": ["drama", "comedy"],
            "category": "movies",
        }),
    )
    .await;
    assert_eq!(title["name"], "The Apartment");
    assert_eq!(title["rating"], Value::Null);
    assert_eq!(title["category"]["slug"], "movies");
    let slugs: Vec<&str> = title["genre"]
        .as_array()
        .expect("genre array")
        .iter()
        .map(|g| g["slug"].as_str().expect("slug"))
        .collect();
    assert_eq!(slugs, ["comedy", "drama"]);
}

#[rstest]
#[tokio::test]
async fn title_write_rejects_bad_fields() {
    let app = TestApp::spawn().await;
    let admin_token = seed_admin(&app).await;

    // A year in the future.
    let response = app
        .request(
            "POST",
            "/api/v1/titles",
            Some(&admin_token),
            Some(json!({"name": "Tomorrow", "year": 3000})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // An unknown genre slug on a write is an input error.
    let response = app
        .request(
            "POST",
            "/api/v1/titles",
            Some(&admin_token),
            Some(json!({"name": "Nowhere", "year": 2000, "genre": ["missing"]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["genre"][0].as_str().expect("message").contains("missing"));
}

#[rstest]
#[tokio::test]
async fn title_rating_is_the_rounded_mean() {
    let app = TestApp::spawn().await;
    let admin_token = seed_admin(&app).await;
    let title = create_title(
        &app,
        &admin_token,
        json!({"name": "Chinatown", "year": 1974}),
    )
    .await;
    let title_id = title["id"].as_i64().expect("id");

    for (username, score) in [("alice", 8), ("bob", 10)] {
        let reviewer = app.seed_user(username, Role::User).await;
        let token = app.token_for(&reviewer);
        let response = app
            .request(
                "POST",
                &format!("/api/v1/titles/{title_id}/reviews"),
                Some(&token),
                Some(json!({"text": "solid", "score": score})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request("GET", &format!("/api/v1/titles/{title_id}"), None, None)
        .await;
    let fetched = body_json(response).await;
    assert_eq!(fetched["rating"], 9);
}

#[rstest]
#[tokio::test]
async fn title_filters_and_unknown_slugs() {
    let app = TestApp::spawn().await;
    let admin_token = seed_admin(&app).await;
    create_category(&app, &admin_token, "Movies", "movies").await;
    create_genre(&app, &admin_token, "Drama", "drama").await;
    create_title(
        &app,
        &admin_token,
        json!({"name": "Chinatown", "year": 1974, "genre": ["drama"], "category": "movies"}),
    )
    .await;
    create_title(
        &app,
        &admin_token,
        json!({"name": "The Conversation", "year": 1974}),
    )
    .await;

    let page = body_json(
        app.request("GET", "/api/v1/titles?genre=drama", None, None)
            .await,
    )
    .await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["name"], "Chinatown");

    let page = body_json(
        app.request("GET", "/api/v1/titles?year=1974", None, None)
            .await,
    )
    .await;
    assert_eq!(page["count"], 2);

    // An unknown filter slug is an empty page, not an error.
    let page = body_json(
        app.request("GET", "/api/v1/titles?category=missing", None, None)
            .await,
    )
    .await;
    assert_eq!(page["count"], 0);
}

#[rstest]
#[tokio::test]
async fn title_ordering_by_rating_descending() {
    let app = TestApp::spawn().await;
    let admin_token = seed_admin(&app).await;
    let low = create_title(&app, &admin_token, json!({"name": "Low", "year": 2000})).await;
    let high = create_title(&app, &admin_token, json!({"name": "High", "year": 2000})).await;
    create_title(&app, &admin_token, json!({"name": "Unrated", "year": 2000})).await;

    let reviewer = app.seed_user("critic", Role::User).await;
    let token = app.token_for(&reviewer);
    for (title, score) in [(&low, 3), (&high, 9)] {
        let title_id = title["id"].as_i64().expect("id");
        app.request(
            "POST",
            &format!("/api/v1/titles/{title_id}/reviews"),
            Some(&token),
            Some(json!({"text": "seen it", "score": score})),
        )
        .await;
    }

    let page = body_json(
        app.request("GET", "/api/v1/titles?ordering=-rating", None, None)
            .await,
    )
    .await;
    let names: Vec<&str> = page["results"]
        .as_array()
        .expect("results")
        .iter()
        .map(|t| t["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["High", "Low", "Unrated"]);
}

#[rstest]
#[tokio::test]
async fn title_patch_can_clear_the_category() {
    let app = TestApp::spawn().await;
    let admin_token = seed_admin(&app).await;
    create_category(&app, &admin_token, "Movies", "movies").await;
    let title = create_title(
        &app,
        &admin_token,
        json!({"name": "Chinatown", "year": 1974, "category": "movies"}),
    )
    .await;
    let title_id = title["id"].as_i64().expect("id");

    let response = app
        .request(
            "PATCH",
            &format!("/api/v1/titles/{title_id}"),
            Some(&admin_token),
            Some(json!({"category": null})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["category"], Value::Null);
}
