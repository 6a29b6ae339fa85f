use chrono::{DateTime, Utc};

use reqwest::{Method, StatusCode};

use serde_json::{json, Value};

use crate::helpers::{member_row, TestApp};

#[tokio::test]
async fn unsubscribe_flags_active_member() {
    let app = TestApp::spawn().await;
    app.mount_lookup(member_row("jane@example.com", false), None)
        .await;
    app.mount_update(204, 1).await;

    let before = Utc::now();
    let res = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Body was not JSON");
    assert_eq!(json!(true), body["success"]);
    assert_eq!("You have been successfully unsubscribed", body["message"]);
    assert!(body.get("alreadyUnsubscribed").is_none());

    let requests = app.store_server.received_requests().await.unwrap();
    let update = requests
        .iter()
        .find(|req| req.method.to_string() == "PATCH")
        .expect("No update was sent to the store");
    let update: Value = serde_json::from_slice(&update.body).unwrap();
    assert_eq!(json!(true), update["unsubscribed"]);
    let unsubscribed_at: DateTime<Utc> = update["unsubscribed_at"]
        .as_str()
        .unwrap()
        .parse()
        .expect("Timestamp was not RFC 3339");
    assert!(unsubscribed_at >= before);
}

#[tokio::test]
async fn unsubscribe_looks_up_normalized_email() {
    let app = TestApp::spawn().await;
    app.mount_lookup(member_row("jane@example.com", false), None)
        .await;
    app.mount_update(204, 1).await;

    let res = app
        .unsubscribe(&json!({ "email": "Jane@Example.COM" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let requests = app.store_server.received_requests().await.unwrap();
    for req in requests {
        let email = req
            .url
            .query_pairs()
            .find(|(key, _)| key == "email")
            .map(|(_, value)| value.into_owned());
        assert_eq!(Some("eq.jane@example.com".to_string()), email);
    }
}

#[tokio::test]
async fn unsubscribe_accepts_rows_with_integer_ids() {
    let app = TestApp::spawn().await;
    app.mount_lookup(
        json!([{
            "id": 42,
            "email": "jane@example.com",
            "unsubscribed": false,
            "unsubscribed_at": null,
        }]),
        None,
    )
    .await;
    app.mount_update(204, 1).await;

    let res = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Body was not JSON");
    assert_eq!("You have been successfully unsubscribed", body["message"]);
}

#[tokio::test]
async fn unsubscribe_treats_null_flag_as_subscribed() {
    let app = TestApp::spawn().await;
    app.mount_lookup(
        json!([{
            "email": "jane@example.com",
            "unsubscribed": null,
            "unsubscribed_at": null,
        }]),
        None,
    )
    .await;
    app.mount_update(204, 1).await;

    let res = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Body was not JSON");
    assert!(body.get("alreadyUnsubscribed").is_none());
}

#[tokio::test]
async fn unsubscribe_twice_is_idempotent() {
    let app = TestApp::spawn().await;
    // First lookup sees an active member, every later one sees the flag set
    app.mount_lookup(member_row("jane@example.com", false), Some(1))
        .await;
    app.mount_lookup(member_row("jane@example.com", true), None)
        .await;
    app.mount_update(204, 1).await;

    let first = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, first.status());

    let second = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, second.status());
    let body: Value = second.json().await.expect("Body was not JSON");
    assert_eq!(json!(true), body["success"]);
    assert_eq!(json!(true), body["alreadyUnsubscribed"]);
}

#[tokio::test]
async fn unsubscribe_already_unsubscribed_writes_nothing() {
    let app = TestApp::spawn().await;
    app.mount_lookup(member_row("jane@example.com", true), None)
        .await;
    app.mount_update(204, 0).await;

    let res = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.expect("Body was not JSON");
    assert_eq!(json!(true), body["alreadyUnsubscribed"]);
    assert_eq!("You are already unsubscribed", body["message"]);
}

#[tokio::test]
async fn unsubscribe_unknown_email_is_not_found() {
    let app = TestApp::spawn().await;
    app.mount_lookup(json!([]), None).await;
    app.mount_update(204, 0).await;

    let res = app
        .unsubscribe(&json!({ "email": "ghost@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());
    let body: Value = res.json().await.expect("Body was not JSON");
    assert_eq!(
        json!({ "success": false, "error": "Email not found in our system" }),
        body
    );
}

#[tokio::test]
async fn unsubscribe_rejects_malformed_email_without_store_calls() {
    let app = TestApp::spawn().await;
    app.forbid_store_calls().await;

    let test_cases = vec![
        "not-an-email",
        "jane@example",
        "jane@exam ple.com",
        "@example.com",
        " jane@example.com",
    ];

    for email in test_cases {
        let res = app
            .unsubscribe(&json!({ "email": email }))
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when email was {:?}",
            email
        );
        let body: Value = res.json().await.expect("Body was not JSON");
        assert_eq!(
            json!({ "success": false, "error": "Invalid email format" }),
            body
        );
    }
}

#[tokio::test]
async fn unsubscribe_requires_string_email() {
    let app = TestApp::spawn().await;
    app.forbid_store_calls().await;

    let test_cases: Vec<(&str, Value)> = vec![
        ("missing email", json!({})),
        ("null email", json!({ "email": null })),
        ("numeric email", json!({ "email": 42 })),
        ("empty email", json!({ "email": "" })),
    ];

    for (desc, body) in test_cases {
        let res = app
            .unsubscribe(&body)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when payload had {}",
            desc
        );
        let body: Value = res.json().await.expect("Body was not JSON");
        assert_eq!("Email is required", body["error"]);
    }
}

#[tokio::test]
async fn unsubscribe_without_credentials_is_configuration_error() {
    let app = TestApp::spawn_without_store().await;
    app.forbid_store_calls().await;

    let res = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    let body: Value = res.json().await.expect("Body was not JSON");
    assert_eq!(
        json!({ "success": false, "error": "Server configuration error" }),
        body
    );
}

#[tokio::test]
async fn unsubscribe_reports_failed_update() {
    let app = TestApp::spawn().await;
    app.mount_lookup(member_row("jane@example.com", false), None)
        .await;
    app.mount_update(500, 1).await;

    let res = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    let body: Value = res.json().await.expect("Body was not JSON");
    assert_eq!("Failed to unsubscribe. Please try again.", body["error"]);
}

#[tokio::test]
async fn unsubscribe_reports_failed_lookup() {
    let app = TestApp::spawn().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.store_server)
        .await;
    app.mount_update(204, 0).await;

    let res = app
        .unsubscribe(&json!({ "email": "jane@example.com" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    let body: Value = res.json().await.expect("Body was not JSON");
    assert_eq!("An unexpected error occurred", body["error"]);
}

#[tokio::test]
async fn unsubscribe_answers_preflight_with_cors_headers() {
    let app = TestApp::spawn().await;
    app.forbid_store_calls().await;

    let res = app
        .request(Method::OPTIONS, "api/unsubscribe")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let headers = res.headers();
    assert_eq!("*", headers["access-control-allow-origin"]);
    assert_eq!("POST, OPTIONS", headers["access-control-allow-methods"]);
    assert_eq!("Content-Type", headers["access-control-allow-headers"]);
    assert_eq!(Some(0), res.content_length());
}

#[tokio::test]
async fn unsubscribe_rejects_other_methods() {
    let app = TestApp::spawn().await;
    app.forbid_store_calls().await;

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let res = app
            .request(method.clone(), "api/unsubscribe")
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::METHOD_NOT_ALLOWED,
            res.status(),
            "API accepted {}",
            method
        );
        assert_eq!("*", res.headers()["access-control-allow-origin"]);
        let body: Value = res.json().await.expect("Body was not JSON");
        assert_eq!(json!({ "error": "Method not allowed" }), body);
    }
}

#[tokio::test]
async fn error_responses_carry_cors_headers() {
    let app = TestApp::spawn().await;
    app.forbid_store_calls().await;

    let res = app
        .unsubscribe(&json!({ "email": "not-an-email" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    assert_eq!("*", res.headers()["access-control-allow-origin"]);
}
