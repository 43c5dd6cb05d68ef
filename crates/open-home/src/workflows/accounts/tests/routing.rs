use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::accounts::router::{account_router, bearer_token, me_handler};

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&payload).expect("serialize payload"),
        ))
        .expect("request")
}

fn authorized(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

#[test]
fn bearer_token_requires_scheme_and_value() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok-123"));
    assert_eq!(bearer_token(&headers), Some("tok-123"));
}

#[tokio::test]
async fn register_then_fetch_profile() {
    let (service, _) = build_service();
    let router = account_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "email": "route@harbourrealty.com.au",
                "password": PASSWORD,
                "first_name": "Sam",
                "agency_name": "Harbour Realty",
            }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["user"]["email"], json!("route@harbourrealty.com.au"));
    assert_eq!(payload["user"]["first_name"], json!("Sam"));
    assert!(payload["user"].get("password_hash").is_none());
    assert_eq!(payload["tokens"]["token_type"], json!("Bearer"));
    let access = payload["tokens"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string();

    let response = router
        .clone()
        .oneshot(authorized("GET", "/api/auth/me", &access))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let profile = read_json_body(response).await;
    assert_eq!(profile["agency_name"], json!("Harbour Realty"));

    let response = router
        .clone()
        .oneshot(authorized("GET", "/api/auth/sessions", &access))
        .await
        .expect("router dispatch");
    let sessions = read_json_body(response).await;
    assert_eq!(sessions["sessions"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn register_route_maps_validation_failures() {
    let (service, _) = build_service();
    let router = account_router(Arc::new(service));

    let weak = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "email": "weak@harbourrealty.com.au", "password": "short" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(weak.status(), StatusCode::BAD_REQUEST);

    let payload = json!({ "email": "twice@harbourrealty.com.au", "password": PASSWORD });
    let first = router
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", payload.clone()))
        .await
        .expect("router dispatch");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", payload))
        .await
        .expect("router dispatch");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_failures_return_unauthorized_then_locked() {
    let (service, _) = build_service();
    let email = "lockout@harbourrealty.com.au";
    service.register(registration(email), now()).expect("registered");
    let router = account_router(Arc::new(service));

    for _ in 0..5 {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({ "email": email, "password": "Wrong#Pass1" }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": email, "password": PASSWORD }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::LOCKED);
}

#[tokio::test]
async fn refresh_and_logout_routes() {
    let (service, _) = build_service();
    let (_, tokens) = service
        .register(registration("logout@harbourrealty.com.au"), chrono::Utc::now())
        .expect("registered");
    let router = account_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/refresh",
            json!({ "refresh_token": tokens.refresh_token }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = read_json_body(response).await;
    let access = refreshed["access_token"]
        .as_str()
        .expect("access token")
        .to_string();

    let response = router
        .clone()
        .oneshot(authorized("POST", "/api/auth/logout", &access))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["logged_out"], json!(true));

    let response = router
        .oneshot(authorized("GET", "/api/auth/me", &access))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_handler_rejects_missing_token() {
    let (service, _) = build_service();

    let response = me_handler::<MemoryAccounts>(State(Arc::new(service)), HeaderMap::new()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("authentication required"));
}

fn authorized_json(method: &str, uri: &str, token: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&payload).expect("serialize payload"),
        ))
        .expect("request")
}

#[tokio::test]
async fn change_password_route_rotates_credentials() {
    let (service, _) = build_service();
    let email = "rotate-route@harbourrealty.com.au";
    let (_, tokens) = service
        .register(registration(email), chrono::Utc::now())
        .expect("registered");
    let router = account_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(authorized_json(
            "POST",
            "/api/auth/change-password",
            &tokens.access_token,
            json!({ "current_password": "Wrong#Pass1", "new_password": "Quay#2026ok" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(response).await["error"],
        json!("current password is incorrect")
    );

    let response = router
        .clone()
        .oneshot(authorized_json(
            "POST",
            "/api/auth/change-password",
            &tokens.access_token,
            json!({ "current_password": PASSWORD, "new_password": "Quay#2026ok" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["sessions_closed"], json!(0));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": email, "password": "Quay#2026ok" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn profile_update_route_merges_fields() {
    let (service, _) = build_service();
    let (_, tokens) = service
        .register(registration("profile-route@harbourrealty.com.au"), chrono::Utc::now())
        .expect("registered");
    let router = account_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(authorized_json(
            "PUT",
            "/api/auth/me",
            &tokens.access_token,
            json!({ "license_number": "20123456", "bio": "Inner west specialist" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["user"]["license_number"], json!("20123456"));
    assert_eq!(payload["user"]["bio"], json!("Inner west specialist"));
    assert_eq!(payload["user"]["first_name"], json!("Priya"));

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/auth/me",
            json!({ "bio": "anonymous" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validate_token_route_reports_validity() {
    let (service, _) = build_service();
    let (_, tokens) = service
        .register(registration("validate-route@harbourrealty.com.au"), chrono::Utc::now())
        .expect("registered");
    let router = account_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(authorized("GET", "/api/auth/validate-token", &tokens.access_token))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["valid"], json!(true));
    assert_eq!(
        payload["user"]["email"],
        json!("validate-route@harbourrealty.com.au")
    );

    let response = router
        .oneshot(authorized("GET", "/api/auth/validate-token", "stale-token"))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json_body(response).await["valid"], json!(false));
}
