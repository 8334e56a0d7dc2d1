// Integration tests for the HouseRater HTTP API

use actix_web::{http::StatusCode, test, web, App};
use house_rater::error::{handle_json_payload_error, handle_query_payload_error};
use house_rater::routes::{configure_routes, AppState};
use house_rater::services::{EmailClient, JwtVerifier, PostgresClient};
use serde_json::{json, Value};
use std::sync::Arc;

const JWT_SECRET: &str = "integration-secret";

/// Nothing listens here; handlers that need the database fail fast
const UNREACHABLE_DB: &str = "postgres://houserater@127.0.0.1:1/houserater";

fn create_state(email_api: Option<(&str, &str)>) -> AppState {
    let (api_base, api_key) = match email_api {
        Some((base, key)) => (base.to_string(), Some(key.to_string())),
        None => ("http://127.0.0.1:1".to_string(), None),
    };

    AppState {
        postgres: Arc::new(PostgresClient::connect_lazy(UNREACHABLE_DB).unwrap()),
        email: Arc::new(
            EmailClient::new(
                api_base,
                api_key,
                "HouseRater <test@example.com>".to_string(),
                "https://houserater.test".to_string(),
            )
            .unwrap(),
        ),
    }
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::Data::new(JwtVerifier::new(JWT_SECRET, None)))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
                .configure(configure_routes),
        )
        .await
    };
}

fn invitation_body() -> Value {
    json!({
        "inviteeName": "Sam",
        "inviteeEmail": "sam@example.com",
        "inviterName": "Alex",
        "householdName": "The Smiths"
    })
}

#[actix_web::test]
async fn test_send_invitation_missing_fields() {
    let app = test_app!(create_state(None));

    let req = test::TestRequest::post()
        .uri("/api/send-invitation")
        .set_json(json!({ "inviteeName": "Sam", "inviteeEmail": "sam@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Missing required fields" }));
}

#[actix_web::test]
async fn test_send_invitation_blank_field_is_missing() {
    let app = test_app!(create_state(None));

    let mut body = invitation_body();
    body["householdName"] = json!("   ");
    let req = test::TestRequest::post()
        .uri("/api/send-invitation")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_send_invitation_development_mode() {
    let app = test_app!(create_state(None));

    let req = test::TestRequest::post()
        .uri("/api/send-invitation")
        .set_json(invitation_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["mode"], "development");
    assert_eq!(body["message"], "Email service not configured. Email logged to console.");
}

#[actix_web::test]
async fn test_send_invitation_through_provider() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/emails")
        .match_header("authorization", "Bearer re_live")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"4ef9a417-02e9-4d39-ad75-9611e0fcc33c"}"#)
        .create_async()
        .await;

    let url = server.url();
    let app = test_app!(create_state(Some((url.as_str(), "re_live"))));

    let req = test::TestRequest::post()
        .uri("/api/send-invitation")
        .set_json(invitation_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    mock.assert_async().await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "success": true, "emailId": "4ef9a417-02e9-4d39-ad75-9611e0fcc33c" })
    );
}

#[actix_web::test]
async fn test_send_invitation_provider_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/emails")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"statusCode":500,"name":"application_error","message":"upstream unavailable"}"#)
        .create_async()
        .await;

    let url = server.url();
    let app = test_app!(create_state(Some((url.as_str(), "re_live"))));

    let req = test::TestRequest::post()
        .uri("/api/send-invitation")
        .set_json(invitation_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Failed to send email");
    assert_eq!(body["details"]["name"], "application_error");
    assert_eq!(body["details"]["message"], "upstream unavailable");
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app!(create_state(None));

    let req = test::TestRequest::post()
        .uri("/api/send-invitation")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_payload");
    assert_eq!(body["status_code"], 400);
}

#[actix_web::test]
async fn test_api_requires_bearer_token() {
    let app = test_app!(create_state(None));

    for uri in ["/api/v1/me", "/api/v1/houses", "/api/v1/dashboard", "/api/v1/onboarding"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unauthorized");
    }
}

#[actix_web::test]
async fn test_api_rejects_forged_token() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = json!({
        "sub": uuid::Uuid::new_v4(),
        "email": "alex@example.com",
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"not-the-secret"),
    )
    .unwrap();

    let app = test_app!(create_state(None));
    let req = test::TestRequest::get()
        .uri("/api/v1/categories")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_health_reports_degraded_without_database() {
    let app = test_app!(create_state(None));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
