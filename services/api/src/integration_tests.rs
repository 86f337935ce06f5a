//! End-to-end flows driven through the full router, middleware included.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::test_support::{test_state, ADMIN_KEY};
use crate::web::router;

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn first_error(body: &Value) -> &str {
    body["errors"][0]["msg"].as_str().unwrap_or_default()
}

/// Signs up through the API and returns `(token, user id)`.
async fn register(app: &Router, name: &str, email: &str, role: &str) -> (String, String) {
    let mut payload = json!({ "name": name, "email": email, "password": "secret1", "role": role });
    if role == "admin" {
        payload["adminKey"] = json!(ADMIN_KEY);
    }
    let (status, body) = call(app, Method::POST, "/auth/signup", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

fn booking(mentor_id: &str, mentee_id: &str, date: &str, time: &str) -> Value {
    json!({ "mentorId": mentor_id, "menteeId": mentee_id, "date": date, "time": time })
}

#[tokio::test]
async fn request_accept_and_book_a_session() {
    let app = router(test_state());
    let (mentor_token, mentor_id) = register(&app, "Grace", "grace@example.com", "mentor").await;
    let (mentee_token, mentee_id) = register(&app, "Sam", "sam@example.com", "mentee").await;

    // Requests
    let (status, request) = call(
        &app,
        Method::POST,
        "/auth/requests",
        Some(&mentee_token),
        Some(json!({ "mentorId": mentor_id, "message": "Teach me compilers" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/requests",
        Some(&mentee_token),
        Some(json!({ "mentorId": mentor_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error(&body), "Request already sent and pending.");

    // No acceptance yet
    let monday = booking(&mentor_id, &mentee_id, "2024-01-01", "09:00");
    let (status, body) = call(&app, Method::POST, "/sessions", None, Some(monday.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(first_error(&body), "Mentor has not accepted this mentee.");

    // Only the addressed mentor can see the request
    let accept_uri = format!("/auth/requests/{}/accept", request_id);
    let (status, body) = call(&app, Method::PUT, &accept_uri, Some(&mentee_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body), "Request not found");

    let (status, accepted) = call(&app, Method::PUT, &accept_uri, Some(&mentor_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");

    let (_, body) = call(&app, Method::POST, "/sessions", None, Some(monday.clone())).await;
    assert_eq!(first_error(&body), "Mentor has not set availability.");

    // Availability
    let availability = json!({ "days": ["Monday"], "startTime": "09:00", "endTime": "17:00" });
    let (status, _) = call(
        &app,
        Method::PUT,
        "/auth/profile",
        Some(&mentor_token),
        Some(json!({ "availability": availability })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/sessions/mentors/{}/availability", mentor_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, availability);

    // Window checks
    for (date, time, message) in [
        ("2024-01-02", "10:00", "Requested day is not in mentor availability."),
        ("2024-01-01", "08:59", "Requested time is outside mentor availability."),
        ("2024-01-01", "17:01", "Requested time is outside mentor availability."),
    ] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/sessions",
            None,
            Some(booking(&mentor_id, &mentee_id, date, time)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", date, time);
        assert_eq!(first_error(&body), message);
    }

    let (status, session) = call(&app, Method::POST, "/sessions", None, Some(monday)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["status"], "pending");
    assert_eq!(session["time"], "09:00");
    assert_eq!(session["mentor"]["name"], "Grace");
    let session_id = session["id"].as_str().unwrap().to_string();

    // The slot stays taken, even once cancelled
    let same_slot = booking(&mentor_id, &mentee_id, "2024-01-01", "9:00");
    let (status, body) = call(&app, Method::POST, "/sessions", None, Some(same_slot.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(first_error(&body), "Mentor already has a session at this time.");

    let session_uri = format!("/sessions/{}", session_id);
    let (status, cancelled) = call(
        &app,
        Method::PUT,
        &session_uri,
        None,
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, _) = call(&app, Method::POST, "/sessions", None, Some(same_slot)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/sessions",
        None,
        Some(booking(&mentor_id, &mentee_id, "2024-01-08", "17:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Reads
    let (_, listed) = call(
        &app,
        Method::GET,
        &format!("/sessions?mentorId={}", mentor_id),
        None,
        None,
    )
    .await;
    let dates: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-01-01", "2024-01-08"]);

    let (_, cancelled_only) =
        call(&app, Method::GET, "/sessions?status=cancelled", None, None).await;
    assert_eq!(cancelled_only.as_array().unwrap().len(), 1);

    let (status, fetched) = call(&app, Method::GET, &session_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["mentor"]["availability"], availability);
    assert_eq!(fetched["mentee"]["email"], "sam@example.com");

    let (_, mentors) = call(
        &app,
        Method::GET,
        &format!("/sessions/mentees/{}/mentors", mentee_id),
        None,
        None,
    )
    .await;
    assert_eq!(mentors[0]["name"], "Grace");

    let (_, mentees) = call(&app, Method::GET, "/auth/mentees", Some(&mentor_token), None).await;
    assert_eq!(mentees[0]["id"], mentee_id.as_str());

    // Delete
    let (status, body) = call(&app, Method::DELETE, &session_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Session deleted successfully");

    let (status, body) = call(&app, Method::GET, &session_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body), "Session not found");
}

#[tokio::test]
async fn protected_routes_check_token_and_role() {
    let app = router(test_state());
    let (mentee_token, _) = register(&app, "Sam", "sam@example.com", "mentee").await;
    let (admin_token, _) = register(&app, "Root", "root@example.com", "admin").await;
    register(&app, "Grace", "grace@example.com", "mentor").await;

    let (status, body) = call(&app, Method::GET, "/auth/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body), "No token, authorization denied");

    let (status, body) = call(&app, Method::GET, "/auth/profile", Some("nonsense"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body), "Token is not valid");

    let (status, profile) =
        call(&app, Method::GET, "/auth/profile", Some(&mentee_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "sam@example.com");
    assert!(profile.get("password").is_none());

    let (status, body) =
        call(&app, Method::GET, "/auth/site-stats", Some(&mentee_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(first_error(&body), "Admin access required");

    let (status, stats) =
        call(&app, Method::GET, "/auth/site-stats", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "mentorCount": 1, "menteeCount": 1, "totalCount": 3 }));

    let (status, body) =
        call(&app, Method::GET, "/auth/requests/mentor", Some(&mentee_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(first_error(&body), "Mentor access required");

    let (status, mentors) = call(&app, Method::GET, "/auth/mentors", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mentors.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn session_input_is_validated_before_lookups() {
    let app = router(test_state());

    let (status, body) = call(
        &app,
        Method::POST,
        "/sessions",
        None,
        Some(json!({ "mentorId": "x", "date": "2024-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error(&body), "All fields are required.");

    let unknown = uuid::Uuid::new_v4().to_string();
    let (status, body) = call(
        &app,
        Method::POST,
        "/sessions",
        None,
        Some(booking(&unknown, &unknown, "2024-01-01", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body), "Mentor not found.");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/sessions/{}", unknown),
        None,
        Some(json!({ "status": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error(&body), "Valid status is required");
}
