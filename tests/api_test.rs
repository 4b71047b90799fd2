//! End-to-end API flows over the in-memory backend

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use natjecanja::{
    config::{
        BootstrapAdmin, Config, DatabaseConfig, JwtConfig, PortalConfig, RedisConfig,
        ServerConfig, StorageBackend,
    },
    db::Repositories,
    events::ChangeFeed,
    handlers,
    identity::{LocalIdentityProvider, MemoryCredentialStore},
    seed,
    services::Backend,
    state::AppState,
};

const ADMIN_EMAIL: &str = "admin@skola.hr";
const ADMIN_PASSWORD: &str = "admin-lozinka";

fn config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            rust_log: "warn".to_string(),
            log_json: false,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            backend: StorageBackend::Memory,
            url: None,
            max_connections: 1,
            acquire_timeout_secs: 1,
        },
        redis: RedisConfig { url: None },
        jwt: JwtConfig {
            secret: "api-test-secret".to_string(),
            expiry_hours: 1,
        },
        portal: PortalConfig {
            bootstrap_admin: Some(BootstrapAdmin {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }),
        },
    }
}

async fn app() -> Router {
    let config = config();
    let identity = Arc::new(LocalIdentityProvider::new(
        Arc::new(MemoryCredentialStore::default()),
        config.jwt.clone(),
    ));
    let backend = Backend::new(Repositories::memory(), identity, ChangeFeed::new());
    if let Some(admin) = &config.portal.bootstrap_admin {
        seed::bootstrap_admin(&backend, admin).await.unwrap();
    }
    handlers::app(AppState::new(backend, None, config))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

/// Register a teacher, approve them and sign in
async fn approved_teacher(app: &Router, admin: &str, email: &str) -> String {
    let (status, submitted) = call(
        app,
        Method::POST,
        "/api/v1/registrations",
        None,
        Some(json!({
            "email": email,
            "password": "nastavnik123",
            "first_name": "Ivana",
            "last_name": "Babić",
            "class_grade": "4.c",
            "reason": "Voditeljica informatičke grupe"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{submitted}");
    assert_eq!(submitted["status"], "pending");

    let id = submitted["id"].as_str().unwrap();
    let (status, approved) = call(
        app,
        Method::POST,
        &format!("/api/v1/registrations/{id}/approve"),
        Some(admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{approved}");
    assert_eq!(approved["request"]["status"], "approved");

    login(app, email, "nastavnik123").await
}

fn competition_body(submit_for_review: bool) -> Value {
    json!({
        "name": "Školsko natjecanje iz informatike",
        "date": "2027-03-10",
        "category": "informatika",
        "description": "Prvi krug",
        "registration": { "mode": "portal" },
        "participation": { "kind": "individual" },
        "submit_for_review": submit_for_review
    })
}

fn applicant() -> Value {
    json!({
        "applicant": {
            "kind": "individual",
            "name": "Luka",
            "surname": "Perić",
            "email": "luka@ucenik.hr",
            "class_name": "1.b"
        }
    })
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["rate_limiting"], false);
}

#[tokio::test]
async fn test_admin_routes_require_a_token() {
    let app = app().await;
    let (status, _) = call(&app, Method::GET, "/api/v1/admin/admins", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/v1/registrations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_teachers_cannot_review_registrations() {
    let app = app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let teacher = approved_teacher(&app, &admin, "ivana@skola.hr").await;

    let (status, _) = call(&app, Method::GET, "/api/v1/registrations", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, me) = call(&app, Method::GET, "/api/v1/auth/me", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ivana@skola.hr");
    assert_eq!(me["is_admin"], false);
}

#[tokio::test]
async fn test_duplicate_registration_is_refused() {
    let app = app().await;
    let body = json!({
        "email": "dupli@skola.hr",
        "password": "nastavnik123",
        "first_name": "Petra",
        "last_name": "Jurić",
        "class_grade": "2.a"
    });
    let (status, _) = call(&app, Method::POST, "/api/v1/registrations", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&app, Method::POST, "/api/v1/registrations", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_competition_review_and_application_flow() {
    let app = app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let teacher = approved_teacher(&app, &admin, "ivana@skola.hr").await;

    let (status, competition) = call(
        &app,
        Method::POST,
        "/api/v1/competitions",
        Some(&teacher),
        Some(competition_body(true)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{competition}");
    assert_eq!(competition["status"], "pending");
    let id = competition["id"].as_str().unwrap().to_string();

    // pending competitions are invisible to the public
    let (status, _) = call(&app, Method::GET, &format!("/api/v1/competitions/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // creators cannot approve their own competition
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/competitions/{id}/approve"),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = call(
        &app,
        Method::POST,
        &format!("/api/v1/competitions/{id}/approve"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{approved}");
    assert_eq!(approved["status"], "published");
    assert_eq!(approved["accepts_applications"], true);

    let (status, listed) = call(&app, Method::GET, "/api/v1/competitions", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // anyone may apply while applications are open
    let (status, application) = call(
        &app,
        Method::POST,
        &format!("/api/v1/competitions/{id}/applications"),
        None,
        Some(applicant()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{application}");
    assert_eq!(application["status"], "pending");
    let application_id = application["id"].as_str().unwrap().to_string();

    let (status, reviewed) = call(
        &app,
        Method::POST,
        &format!("/api/v1/applications/{application_id}/approve"),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{reviewed}");
    assert_eq!(reviewed["status"], "approved");

    let (status, listed) = call(
        &app,
        Method::GET,
        &format!("/api/v1/competitions/{id}/applications"),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, started) = call(
        &app,
        Method::POST,
        &format!("/api/v1/competitions/{id}/start"),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{started}");
    assert_eq!(started["phase"], "aktivan");

    // closed for applications once running
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/competitions/{id}/applications"),
        None,
        Some(applicant()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_grants_role_by_email() {
    let app = app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let teacher = approved_teacher(&app, &admin, "marija@skola.hr").await;

    let (status, grant) = call(
        &app,
        Method::POST,
        "/api/v1/admin/admins",
        Some(&admin),
        Some(json!({ "email": "marija@skola.hr" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{grant}");
    assert_eq!(grant["role"], "admin");

    // the role applies to tokens issued before the grant
    let (status, me) = call(&app, Method::GET, "/api/v1/auth/me", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_admin"], true);

    let (status, grants) = call(&app, Method::GET, "/api/v1/admin/admins", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grants.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_logout_invalidates_the_token() {
    let app = app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = call(&app, Method::POST, "/api/v1/auth/logout", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::GET, "/api/v1/auth/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_event_stream_rejects_admin_collections_for_guests() {
    let app = app().await;
    let (status, _) = call(
        &app,
        Method::GET,
        "/api/v1/events?collection=registration_requests",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::GET, "/api/v1/events?collection=nepoznato", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
