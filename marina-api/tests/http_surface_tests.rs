//! Content negotiation, method handling and the pagination envelope.

#[path = "harness/app.rs"]
mod app_harness;

use app_harness::{create_boat, create_load, into_test_response, send, test_app, BASE_URL};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use marina_test_utils::fixtures::{legos_load_body, orca_boat_body, OWNER_SUBJECT};
use marina_test_utils::tokens::bearer_for;
use serde_json::{json, Value};
use tower::ServiceExt;

#[tokio::test]
async fn test_collection_roots_reject_put_patch_delete() {
    let app = test_app();
    for collection in ["/boats", "/loads", "/users"] {
        for method in [Method::PUT, Method::PATCH, Method::DELETE] {
            let response = send(&app, method.clone(), collection, Some(OWNER_SUBJECT), None).await;
            assert_eq!(
                response.status,
                StatusCode::METHOD_NOT_ALLOWED,
                "{} {}",
                method,
                collection
            );
            assert_eq!(response.headers[header::ALLOW], "GET, POST");
            assert!(response.body.get("Error").is_some());
        }
    }
}

#[tokio::test]
async fn test_non_json_accept_is_not_acceptable() {
    let app = test_app();
    let request = Request::builder()
        .uri("/loads")
        .header(header::ACCEPT, "text/html")
        .body(Body::empty())
        .unwrap();
    let response = into_test_response(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);
    assert!(response.body.get("Error").is_some());

    for accept in ["application/json", "application/*", "*/*", "text/html, application/json"] {
        let request = Request::builder()
            .uri("/loads")
            .header(header::ACCEPT, accept)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", accept);
    }
}

#[tokio::test]
async fn test_non_json_body_is_unsupported_media_type() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/boats")
        .header(header::ACCEPT, "application/json")
        .header(header::AUTHORIZATION, bearer_for(OWNER_SUBJECT))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(orca_boat_body().to_string()))
        .unwrap();
    let response = into_test_response(app.oneshot(request).await.unwrap()).await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(response.body.get("Error").is_some());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/loads")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"weight\": 5,"))
        .unwrap();
    let response = into_test_response(app.oneshot(request).await.unwrap()).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.get("Error").is_some());
}

#[tokio::test]
async fn test_error_envelope_has_single_error_key() {
    let app = test_app();
    let response = send(&app, Method::GET, "/loads/31337", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let object = response.body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(object["Error"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app();
    let response = send(&app, Method::GET, "/harbours", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_envelope_without_query() {
    let app = test_app();
    create_load(&app, legos_load_body()).await;

    let response = send(&app, Method::GET, "/loads", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 5);
    assert_eq!(response.body["offset"], Value::Null);
    assert_eq!(response.body["limit"], Value::Null);
    assert_eq!(
        response.body["next"],
        format!("{}/loads?limit=NaN&offset=NaN", BASE_URL)
    );
    assert_eq!(response.body["loads"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_listing_envelope_echoes_query() {
    let app = test_app();
    create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;

    let response = send(&app, Method::GET, "/boats?limit=3&offset=4", None, None).await;
    assert_eq!(response.body["limit"], 3);
    assert_eq!(response.body["offset"], 4);
    assert_eq!(response.body["count"], 5);
    assert_eq!(response.body["next"], format!("{}/boats?limit=3&offset=7", BASE_URL));
    assert_eq!(response.body["boats"], json!([]));

    let half = send(&app, Method::GET, "/boats?limit=2", None, None).await;
    assert_eq!(half.body["next"], format!("{}/boats?limit=2&offset=NaN", BASE_URL));

    let junk = send(&app, Method::GET, "/boats?limit=many&offset=0", None, None).await;
    assert_eq!(junk.status, StatusCode::OK);
    assert_eq!(junk.body["next"], format!("{}/boats?limit=NaN&offset=NaN", BASE_URL));
}

#[tokio::test]
async fn test_consecutive_pages_are_disjoint_and_cover_the_range() {
    let app = test_app();
    for n in 0..12 {
        create_load(
            &app,
            json!({"weight": n + 1, "content": format!("Crate {}", n), "delivery_date": "2021-01-10"}),
        )
        .await;
    }

    let ids = |body: &Value| -> Vec<u64> {
        body["loads"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["id"].as_u64().unwrap())
            .collect()
    };

    let first = ids(&send(&app, Method::GET, "/loads?limit=5&offset=0", None, None).await.body);
    let second = ids(&send(&app, Method::GET, "/loads?limit=5&offset=5", None, None).await.body);
    let both = ids(&send(&app, Method::GET, "/loads?limit=10&offset=0", None, None).await.body);

    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    assert!(first.iter().all(|id| !second.contains(id)));
    let joined: Vec<u64> = first.into_iter().chain(second).collect();
    assert_eq!(joined, both);
}

#[tokio::test]
async fn test_health_reports_store() {
    let app = test_app();
    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = test_app();
    let request = Request::builder()
        .uri("/loads")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app();
    let response = send(&app, Method::GET, "/openapi.json", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["paths"].get("/boats/{id}/loads/{load_id}").is_some());
}
