use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use reeltrack::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.debug = true;
    config.server.allowed_hosts = vec!["*".to_string()];
    config.observability.metrics_enabled = false;
    // Cheap hashing keeps the suite fast.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app_with(config: Config) -> Router {
    let state = reeltrack::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    reeltrack::api::router(state).await
}

async fn spawn_app() -> Router {
    spawn_app_with(test_config()).await
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Registers a user and returns `(api_key, session_cookie)`.
async fn register(app: &Router, username: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            &json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "nickname": format!("{username}-nick"),
                "password": "correct horse battery",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("register should open a session");

    let body = body_json(response).await;
    let api_key = body["data"]["api_key"].as_str().unwrap().to_string();
    (api_key, cookie)
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        mime::APPLICATION_JSON.as_ref()
    );
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
    assert_eq!(body["data"]["tmdb_configured"], false);
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/lists")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/lists")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (api_key, _) = register(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/lists")
                .header("X-Api-Key", &api_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("Authorization", format!("Bearer {api_key}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("api_key").is_none());
}

#[tokio::test]
async fn session_cookie_authenticates_and_logout_drops_it() {
    let app = spawn_app().await;
    register(&app, "bob").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &json!({"username": "bob@example.com", "password": "correct horse battery"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    register(&app, "carol").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &json!({"username": "carol", "password": "nope nope nope"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app().await;
    register(&app, "dave").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            &json!({
                "username": "dave",
                "email": "other@example.com",
                "nickname": "someone-else",
                "password": "correct horse battery",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Username"));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            &json!({
                "username": "erin",
                "email": "not-an-email",
                "nickname": "erin",
                "password": "correct horse battery",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_me_and_toggle_2fa() {
    let app = spawn_app().await;
    let (api_key, _) = register(&app, "frank").await;

    let mut request = json_request(
        "PUT",
        "/api/auth/me",
        &json!({"nickname": "Frankie", "email": "FRANK@Example.org"}),
    );
    request
        .headers_mut()
        .insert("X-Api-Key", api_key.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["nickname"], "Frankie");
    assert_eq!(body["data"]["email"], "frank@example.org");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/2fa/enable")
                .header("X-Api-Key", &api_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_2fa_enabled"], true);
}

#[tokio::test]
async fn disallowed_host_is_rejected() {
    let mut config = test_config();
    config.server.allowed_hosts = vec!["reeltrack.example".to_string()];
    let app = spawn_app_with(config).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(header::HOST, "evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(header::HOST, "reeltrack.example:8000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn security_headers_are_set() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("referrer-policy"));
}

#[tokio::test]
async fn invalid_path_ids_are_bad_requests() {
    let app = spawn_app().await;
    let (api_key, _) = register(&app, "gina").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/media/0")
                .header("X-Api-Key", &api_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
