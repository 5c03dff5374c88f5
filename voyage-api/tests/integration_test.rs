use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use voyage_api::{app, middleware::Claims, AppState, AuthConfig};
use voyage_store::app_config::BusinessRules;

const SECRET: &str = "integration-secret";

fn test_app() -> Router {
    let state = AppState::in_memory(
        AuthConfig {
            secret: SECRET.to_string(),
        },
        &BusinessRules::default(),
    );
    app(state)
}

fn token(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        role: role.to_string(),
        exp: 4_102_444_800,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn admin() -> String {
    token("ops-1", "ADMIN")
}

async fn send(app: &Router, method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

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

async fn create_tour(app: &Router, capacity: i32) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/admin/tours",
        Some(&admin()),
        Some(json!({
            "name": "Ha Giang Loop 4D3N",
            "capacity": capacity,
            "adult_price": 1_000_000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

fn booking_body(adults: i32, children: i32) -> Value {
    json!({
        "contact": {
            "name": "Le Minh Chau",
            "email": "chau@example.com",
            "phone": "0933111222"
        },
        "adults": adults,
        "children": children,
        "departure_date": "2026-12-20"
    })
}

async fn available(app: &Router, tour_id: &str) -> i64 {
    let (status, body) = send(app, Method::GET, &format!("/v1/tours/{}", tour_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["available"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = test_app();
    let tour = json!({ "name": "Cu Chi Tunnels", "capacity": 10, "adult_price": 400_000 });

    let (status, _) = send(&app, Method::POST, "/v1/admin/tours", None, Some(tour.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = token("c-1", "CUSTOMER");
    let (status, _) = send(&app, Method::POST, "/v1/admin/tours", Some(&customer), Some(tour.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, "/v1/admin/tours", Some("not-a-jwt"), Some(tour)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_public_booking_holds_seats_and_quotes() {
    let app = test_app();
    let tour_id = create_tour(&app, 10).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/tours/{}/bookings", tour_id),
        None,
        Some(booking_body(2, 1)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["state"], "pending");
    assert_eq!(body["total_price"], 2_700_000);
    assert_eq!(available(&app, &tour_id).await, 7);
}

#[tokio::test]
async fn test_booking_rejections() {
    let app = test_app();
    let tour_id = create_tour(&app, 2).await;
    let uri = format!("/v1/tours/{}/bookings", tour_id);

    let (status, _) = send(&app, Method::POST, &uri, None, Some(booking_body(0, 1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, &uri, None, Some(booking_body(2, 1))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Insufficient capacity"));

    let missing = format!("/v1/tours/{}/bookings", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::POST, &missing, None, Some(booking_body(1, 0))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/admin/tours/{}", tour_id),
        Some(&admin()),
        Some(json!({ "status": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::POST, &uri, None, Some(booking_body(1, 0))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(available(&app, &tour_id).await, 2);
}

#[tokio::test]
async fn test_customer_owns_their_bookings() {
    let app = test_app();
    let tour_id = create_tour(&app, 10).await;
    let alice = token("alice", "CUSTOMER");
    let bob = token("bob", "CUSTOMER");

    let (_, booking) = send(
        &app,
        Method::POST,
        &format!("/v1/tours/{}/bookings", tour_id),
        Some(&alice),
        Some(booking_body(1, 0)),
    )
    .await;
    let booking_uri = format!("/v1/bookings/{}", booking["id"].as_str().unwrap());

    let (status, mine) = send(&app, Method::GET, "/v1/bookings/mine", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/v1/bookings/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, &booking_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("{}/note", booking_uri),
        Some(&alice),
        Some(json!({ "note": "allergic to peanuts" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["note"], "allergic to peanuts");
    assert_eq!(updated["state"], "pending");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/admin/bookings/{}", booking["id"].as_str().unwrap()),
        Some(&alice),
        Some(json!({ "state": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owners go through the note route; the admin PATCH stays admin-only.
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/admin/bookings/{}", booking["id"].as_str().unwrap()),
        Some(&alice),
        Some(json!({ "note": "late arrival" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, current) = send(&app, Method::GET, &booking_uri, Some(&alice), None).await;
    assert_eq!(current["note"], "allergic to peanuts");
}

#[tokio::test]
async fn test_admin_lifecycle_and_audit() {
    let app = test_app();
    let tour_id = create_tour(&app, 10).await;

    let (status, confirmed) = send(
        &app,
        Method::POST,
        &format!("/v1/admin/tours/{}/bookings", tour_id),
        Some(&admin()),
        Some(booking_body(3, 0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(confirmed["state"], "confirmed");
    let admin_uri = format!("/v1/admin/bookings/{}", confirmed["id"].as_str().unwrap());

    let (status, cancelled) = send(
        &app,
        Method::PATCH,
        &admin_uri,
        Some(&admin()),
        Some(json!({ "state": "cancelled", "note": "customer called" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["state"], "cancelled");
    assert_eq!(cancelled["note"], "customer called");
    assert_eq!(available(&app, &tour_id).await, 10);

    let (status, _) = send(&app, Method::PATCH, &admin_uri, Some(&admin()), Some(json!({ "state": "cancelled" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(available(&app, &tour_id).await, 10);

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!("/v1/admin/tours/{}/bookings", tour_id),
        Some(&admin()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, audit) = send(
        &app,
        Method::GET,
        &format!("/v1/admin/tours/{}/audit", tour_id),
        Some(&admin()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["drift"], 0);
}

#[tokio::test]
async fn test_delete_returns_held_seats() {
    let app = test_app();
    let tour_id = create_tour(&app, 5).await;

    let (_, booking) = send(
        &app,
        Method::POST,
        &format!("/v1/tours/{}/bookings", tour_id),
        None,
        Some(booking_body(2, 0)),
    )
    .await;
    assert_eq!(available(&app, &tour_id).await, 3);

    let uri = format!("/v1/admin/bookings/{}", booking["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert_eq!(available(&app, &tour_id).await, 5);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tour_edit_keeps_capacity() {
    let app = test_app();
    let tour_id = create_tour(&app, 8).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/v1/admin/tours/{}", tour_id),
        Some(&admin()),
        Some(json!({ "adult_price": 1_500_000, "child_price": 600_000, "capacity": 100 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adult_price"], 1_500_000);
    assert_eq!(body["child_price"], 600_000);
    assert_eq!(body["capacity"], 8);

    let (status, tours) = send(&app, Method::GET, "/v1/tours", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tours.as_array().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_race_over_http() {
    let app = test_app();
    let tour_id = create_tour(&app, 1).await;
    let uri = format!("/v1/tours/{}/bookings", tour_id);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let app = app.clone();
            let uri = uri.clone();
            tokio::spawn(async move {
                let (status, body) = send(&app, Method::POST, &uri, None, Some(booking_body(1, 0))).await;
                (status, body)
            })
        })
        .collect();

    let mut created = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => created.push(body),
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}: {body}"),
        }
    }

    assert_eq!(created.len(), 1);
    assert_eq!(conflicts, 1);
    assert_eq!(created[0]["state"], "pending");
    assert_eq!(available(&app, &tour_id).await, 0);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/admin/bookings/{}", created[0]["id"].as_str().unwrap()),
        Some(&admin()),
        Some(json!({ "state": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available(&app, &tour_id).await, 1);
}
