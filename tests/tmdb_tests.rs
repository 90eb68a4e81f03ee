//! Provider-backed flows against a fake TMDb served on an ephemeral port.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use http_body_util::BodyExt;
use reeltrack::config::Config;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

#[derive(Default)]
struct FakeTmdb {
    flaky_calls: AtomicUsize,
    search_calls: AtomicUsize,
    movie_calls: AtomicUsize,
}

async fn search_movie(
    State(fake): State<Arc<FakeTmdb>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    fake.search_calls.fetch_add(1, Ordering::SeqCst);
    if params.get("api_key").map(String::as_str) != Some("test-key") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "page": 1,
        "results": [{
            "id": 603,
            "title": "The Matrix",
            "original_title": "The Matrix",
            "overview": "A hacker learns the truth.",
            "poster_path": "/matrix.jpg",
            "release_date": "1999-03-30",
            "vote_average": 8.2,
            "popularity": 80.5
        }]
    }))
    .into_response()
}

async fn search_tv(State(fake): State<Arc<FakeTmdb>>) -> Json<Value> {
    fake.search_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "page": 1,
        "results": [{
            "id": 1399,
            "name": "Game of Thrones",
            "original_name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "vote_average": 8.4
        }]
    }))
}

/// Serves a re-cut after the first fetch so refreshes have something to pick up.
async fn movie_details(State(fake): State<Arc<FakeTmdb>>, Path(id): Path<i64>) -> Response {
    if id != 603 {
        return (StatusCode::NOT_FOUND, Json(json!({"status_code": 34}))).into_response();
    }
    let first = fake.movie_calls.fetch_add(1, Ordering::SeqCst) == 0;
    let (title, runtime) = if first {
        ("The Matrix", 136)
    } else {
        ("The Matrix (Remastered)", 138)
    };
    Json(json!({
        "id": 603,
        "title": title,
        "original_title": "The Matrix",
        "overview": "A hacker learns the truth.",
        "release_date": "1999-03-30",
        "runtime": runtime,
        "budget": 63_000_000,
        "revenue": 463_517_383,
        "vote_average": 8.2,
        "vote_count": 24000,
        "original_language": "en"
    }))
    .into_response()
}

async fn movie_credits() -> Json<Value> {
    Json(json!({
        "cast": [
            {"name": "Keanu Reeves", "character": "Neo"},
            {"name": "Carrie-Anne Moss", "character": "Trinity"}
        ],
        "crew": [
            {"name": "Lana Wachowski", "job": "Director"},
            {"name": "Lilly Wachowski", "job": "Director"},
            {"name": "Joel Silver", "job": "Producer"}
        ]
    }))
}

async fn movie_external_ids() -> Json<Value> {
    Json(json!({"imdb_id": "tt0133093"}))
}

/// Fails once with 503, then answers.
async fn flaky_show(State(fake): State<Arc<FakeTmdb>>, Path(id): Path<i64>) -> Response {
    if fake.flaky_calls.fetch_add(1, Ordering::SeqCst) == 0 {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(json!({
        "id": id,
        "name": "Game of Thrones",
        "number_of_seasons": 8,
        "number_of_episodes": 73,
        "episode_run_time": [60, 55],
        "status": "Ended",
        "first_air_date": "2011-04-17",
        "last_air_date": "2019-05-19",
        "vote_average": 8.4,
        "seasons": [
            {"season_number": 0, "episode_count": 12},
            {"season_number": 1, "episode_count": 10},
            {"season_number": 2, "episode_count": 10}
        ]
    }))
    .into_response()
}

async fn spawn_fake_tmdb(fake: Arc<FakeTmdb>) -> String {
    let app = Router::new()
        .route("/3/search/movie", get(search_movie))
        .route("/3/search/tv", get(search_tv))
        .route("/3/movie/{id}", get(movie_details))
        .route("/3/movie/{id}/credits", get(movie_credits))
        .route("/3/movie/{id}/external_ids", get(movie_external_ids))
        .route("/3/tv/{id}", get(flaky_show))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/3")
}

async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/3")
}

struct TestApp {
    router: Router,
    api_key: String,
}

impl TestApp {
    async fn spawn(base_url: String) -> Self {
        let mut config = Config::default();
        config.general.database_path = "sqlite::memory:".to_string();
        config.server.debug = true;
        config.server.allowed_hosts = vec!["*".to_string()];
        config.observability.metrics_enabled = false;
        config.security.argon2_memory_cost_kib = 1024;
        config.security.argon2_time_cost = 1;
        config.tmdb.api_key = "test-key".to_string();
        config.tmdb.base_url = base_url;
        config.tmdb.timeout_seconds = 2;
        config.tmdb.max_retries = 2;
        config.tmdb.retry_delay_ms = 1;

        let state = reeltrack::api::create_app_state_from_config(config, None)
            .await
            .expect("failed to create app state");
        let router = reeltrack::api::router(state).await;

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/register")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        json!({
                            "username": "viewer",
                            "email": "viewer@example.com",
                            "nickname": "viewer",
                            "password": "correct horse battery",
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let api_key = body["data"]["api_key"].as_str().unwrap().to_string();

        Self { router, api_key }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Api-Key", &self.api_key);
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

#[tokio::test]
async fn search_merges_both_kinds_movies_first() {
    let fake = Arc::new(FakeTmdb::default());
    let app = TestApp::spawn(spawn_fake_tmdb(fake.clone()).await).await;

    let (status, body) = app.send("GET", "/api/media/search?q=matrix", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["degraded"], false);

    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["media_type"], "MOVIE");
    assert_eq!(results[0]["title"], "The Matrix");
    assert_eq!(results[1]["media_type"], "TV_SHOW");
    assert_eq!(results[1]["title"], "Game of Thrones");
    assert_eq!(fake.search_calls.load(Ordering::SeqCst), 2);

    // Movie hits pick up credits; the show has none and stays as it was.
    assert_eq!(
        results[0]["directors"],
        json!(["Lana Wachowski", "Lilly Wachowski"])
    );
    assert_eq!(results[0]["cast"], json!(["Keanu Reeves", "Carrie-Anne Moss"]));
    assert_eq!(results[1]["directors"], json!([]));
    assert_eq!(results[1]["cast"], json!([]));

    let (_, body) = app
        .send("GET", "/api/media/search?q=matrix&type=movie", None)
        .await;
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn import_is_idempotent_per_provider_id() {
    let fake = Arc::new(FakeTmdb::default());
    let app = TestApp::spawn(spawn_fake_tmdb(fake).await).await;

    let request = json!({"tmdb_id": 603, "media_type": "movie"});
    let (status, first) = app
        .send("POST", "/api/media/import", Some(request.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["tmdb_id"], 603);
    assert_eq!(first["data"]["runtime"], 136);
    assert_eq!(first["data"]["release_date"], "1999-03-30");

    let (status, second) = app.send("POST", "/api/media/import", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["id"], second["data"]["id"]);

    let (status, _) = app
        .send(
            "POST",
            "/api/media/import",
            Some(json!({"tmdb_id": 999, "media_type": "movie"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _) = app
        .send(
            "POST",
            "/api/media/import",
            Some(json!({"tmdb_id": -1, "media_type": "movie"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_details_include_credits() {
    let fake = Arc::new(FakeTmdb::default());
    let app = TestApp::spawn(spawn_fake_tmdb(fake).await).await;

    let (status, body) = app.send("GET", "/api/media/details/movie/603", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["directors"],
        json!(["Lana Wachowski", "Lilly Wachowski"])
    );
    assert_eq!(body["data"]["cast"][0]["name"], "Keanu Reeves");
    assert_eq!(body["data"]["imdb_id"], "tt0133093");
    assert_eq!(body["data"]["local_id"], Value::Null);
    assert_eq!(body["data"]["seasons"], json!([]));
}

#[tokio::test]
async fn show_details_list_regular_seasons() {
    let fake = Arc::new(FakeTmdb::default());
    let app = TestApp::spawn(spawn_fake_tmdb(fake).await).await;

    let (status, body) = app.send("GET", "/api/media/details/tv/1399", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["media_type"], "TV_SHOW");
    assert_eq!(
        body["data"]["seasons"],
        json!([
            {"season_number": 1, "episode_count": 10},
            {"season_number": 2, "episode_count": 10}
        ])
    );
}

#[tokio::test]
async fn transient_provider_failures_are_retried() {
    let fake = Arc::new(FakeTmdb::default());
    let app = TestApp::spawn(spawn_fake_tmdb(fake.clone()).await).await;

    let (status, body) = app
        .send(
            "POST",
            "/api/media/import",
            Some(json!({"tmdb_id": 1399, "media_type": "tv"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["media_type"], "TV_SHOW");
    assert_eq!(body["data"]["number_of_episodes"], 73);
    assert_eq!(body["data"]["episode_run_time"], 60);
    assert_eq!(fake.flaky_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn refresh_all_counts_outcomes() {
    let fake = Arc::new(FakeTmdb::default());
    let app = TestApp::spawn(spawn_fake_tmdb(fake).await).await;

    app.send(
        "POST",
        "/api/media/import",
        Some(json!({"tmdb_id": 603, "media_type": "movie"})),
    )
    .await;
    app.send(
        "POST",
        "/api/media",
        Some(json!({"media_type": "movie", "title": "Home Video"})),
    )
    .await;

    let (status, body) = app.send("POST", "/api/media/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["refreshed"], 1);
    assert_eq!(body["data"]["failed"], 0);
}

#[tokio::test]
async fn refresh_overwrites_metadata_but_keeps_kind() {
    let fake = Arc::new(FakeTmdb::default());
    let app = TestApp::spawn(spawn_fake_tmdb(fake.clone()).await).await;

    let (_, imported) = app
        .send(
            "POST",
            "/api/media/import",
            Some(json!({"tmdb_id": 603, "media_type": "movie"})),
        )
        .await;
    let id = imported["data"]["id"].as_i64().unwrap();
    assert_eq!(imported["data"]["title"], "The Matrix");

    let (status, body) = app
        .send("POST", &format!("/api/media/{id}/refresh"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["title"], "The Matrix (Remastered)");
    assert_eq!(body["data"]["runtime"], 138);
    assert_eq!(body["data"]["media_type"], "MOVIE");
    assert_eq!(body["data"]["tmdb_id"], 603);

    let (_, stored) = app.send("GET", &format!("/api/media/{id}"), None).await;
    assert_eq!(stored["data"]["title"], "The Matrix (Remastered)");
    assert_eq!(fake.movie_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn refreshing_a_manual_entry_leaves_it_unchanged() {
    let fake = Arc::new(FakeTmdb::default());
    let app = TestApp::spawn(spawn_fake_tmdb(fake.clone()).await).await;

    let (status, created) = app
        .send(
            "POST",
            "/api/media",
            Some(json!({"media_type": "tv", "title": "Home Series", "number_of_episodes": 6})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send("POST", &format!("/api/media/{id}/refresh"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], created["data"]);
    assert_eq!(fake.movie_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fake.flaky_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_provider_degrades_search_and_fails_import() {
    let app = TestApp::spawn(closed_port_url().await).await;

    let (status, body) = app.send("GET", "/api/media/search?q=matrix", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["degraded"], true);
    assert!(body["data"]["results"].as_array().unwrap().is_empty());

    let (status, body) = app
        .send(
            "POST",
            "/api/media/import",
            Some(json!({"tmdb_id": 603, "media_type": "movie"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("manually"));
}
