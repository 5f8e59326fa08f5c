//! End-to-end scenarios for boats, loads and the assignment between them.

#[path = "harness/app.rs"]
mod app_harness;

use app_harness::{create_boat, create_load, send, test_app, BASE_URL};
use axum::http::{header, Method, StatusCode};
use marina_test_utils::fixtures::{
    legos_load_body, orca_boat_body, private_boat_body, OTHER_SUBJECT, OWNER_SUBJECT,
};
use serde_json::json;

#[tokio::test]
async fn test_orca_assign_and_read_back() {
    let app = test_app();

    let created = send(&app, Method::POST, "/boats", Some(OWNER_SUBJECT), Some(orca_boat_body())).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["name"], "Orca");
    assert_eq!(created.body["type"], "Catamaran");
    assert_eq!(created.body["length"], 28);
    assert_eq!(created.body["public"], true);
    assert_eq!(created.body["owner"], OWNER_SUBJECT);
    assert_eq!(created.body["loads"], json!([]));
    let boat_id = created.id();
    assert_eq!(created.body["self"], format!("{}/boats/{}", BASE_URL, boat_id));

    let load = send(&app, Method::POST, "/loads", None, Some(legos_load_body())).await;
    assert_eq!(load.status, StatusCode::CREATED);
    assert_eq!(load.body["current_boat"], serde_json::Value::Null);
    assert_eq!(load.body["delivery_date"], "2021-01-10");
    let load_id = load.id();

    let assigned = send(
        &app,
        Method::PUT,
        &format!("/boats/{}/loads/{}", boat_id, load_id),
        Some(OWNER_SUBJECT),
        None,
    )
    .await;
    assert_eq!(assigned.status, StatusCode::NO_CONTENT);
    assert_eq!(assigned.body, serde_json::Value::Null);

    let boat = send(&app, Method::GET, &format!("/boats/{}", boat_id), None, None).await;
    assert_eq!(boat.status, StatusCode::OK);
    assert_eq!(
        boat.body["loads"],
        json!([{"id": load_id, "self": format!("{}/loads/{}", BASE_URL, load_id)}])
    );

    let load = send(&app, Method::GET, &format!("/loads/{}", load_id), None, None).await;
    assert_eq!(load.body["current_boat"], boat_id);

    let on_boat = send(&app, Method::GET, &format!("/boats/{}/loads", boat_id), None, None).await;
    assert_eq!(on_boat.status, StatusCode::OK);
    assert_eq!(on_boat.body["loads"][0]["id"], load_id);
    assert_eq!(on_boat.body["self"], format!("{}/boats/{}/loads", BASE_URL, boat_id));
}

#[tokio::test]
async fn test_boat_delete_releases_its_loads() {
    let app = test_app();
    let boat_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let load_id = create_load(&app, legos_load_body()).await;

    let uri = format!("/boats/{}/loads/{}", boat_id, load_id);
    send(&app, Method::PUT, &uri, Some(OWNER_SUBJECT), None).await;

    let deleted = send(&app, Method::DELETE, &format!("/boats/{}", boat_id), Some(OWNER_SUBJECT), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = send(&app, Method::GET, &format!("/boats/{}", boat_id), None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let load = send(&app, Method::GET, &format!("/loads/{}", load_id), None, None).await;
    assert_eq!(load.status, StatusCode::OK);
    assert_eq!(load.body["current_boat"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_reassign_is_forbidden_for_any_boat() {
    let app = test_app();
    let first = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let second = create_boat(&app, OWNER_SUBJECT, private_boat_body("Narwhal")).await;
    let load_id = create_load(&app, legos_load_body()).await;

    let first_uri = format!("/boats/{}/loads/{}", first, load_id);
    let ok = send(&app, Method::PUT, &first_uri, Some(OWNER_SUBJECT), None).await;
    assert_eq!(ok.status, StatusCode::NO_CONTENT);

    let same = send(&app, Method::PUT, &first_uri, Some(OWNER_SUBJECT), None).await;
    assert_eq!(same.status, StatusCode::FORBIDDEN);
    assert!(!same.error().is_empty());

    let other_uri = format!("/boats/{}/loads/{}", second, load_id);
    let other = send(&app, Method::PUT, &other_uri, Some(OWNER_SUBJECT), None).await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    // The failed attempts changed nothing.
    let load = send(&app, Method::GET, &format!("/loads/{}", load_id), None, None).await;
    assert_eq!(load.body["current_boat"], first);
    let second_boat = send(&app, Method::GET, &format!("/boats/{}", second), Some(OWNER_SUBJECT), None).await;
    assert_eq!(second_boat.body["loads"], json!([]));
}

#[tokio::test]
async fn test_unassign_twice_is_not_found() {
    let app = test_app();
    let boat_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let load_id = create_load(&app, legos_load_body()).await;
    let uri = format!("/boats/{}/loads/{}", boat_id, load_id);

    send(&app, Method::PUT, &uri, Some(OWNER_SUBJECT), None).await;

    let first = send(&app, Method::DELETE, &uri, Some(OWNER_SUBJECT), None).await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);
    let second = send(&app, Method::DELETE, &uri, Some(OWNER_SUBJECT), None).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);

    let boat = send(&app, Method::GET, &format!("/boats/{}", boat_id), None, None).await;
    assert_eq!(boat.body["loads"], json!([]));
    let load = send(&app, Method::GET, &format!("/loads/{}", load_id), None, None).await;
    assert_eq!(load.body["current_boat"], serde_json::Value::Null);

    // Unloaded loads can go back on.
    let again = send(&app, Method::PUT, &uri, Some(OWNER_SUBJECT), None).await;
    assert_eq!(again.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_load_delete_clears_boat_entry() {
    let app = test_app();
    let boat_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let load_id = create_load(&app, legos_load_body()).await;
    send(
        &app,
        Method::PUT,
        &format!("/boats/{}/loads/{}", boat_id, load_id),
        Some(OWNER_SUBJECT),
        None,
    )
    .await;

    let deleted = send(&app, Method::DELETE, &format!("/loads/{}", load_id), None, None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let boat = send(&app, Method::GET, &format!("/boats/{}", boat_id), None, None).await;
    assert_eq!(boat.body["loads"], json!([]));
    let load = send(&app, Method::GET, &format!("/loads/{}", load_id), None, None).await;
    assert_eq!(load.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_boat_visibility() {
    let app = test_app();
    let public_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let private_id = create_boat(&app, OWNER_SUBJECT, private_boat_body("Narwhal")).await;

    let public_uri = format!("/boats/{}", public_id);
    let private_uri = format!("/boats/{}", private_id);

    assert_eq!(send(&app, Method::GET, &public_uri, None, None).await.status, StatusCode::OK);
    assert_eq!(
        send(&app, Method::GET, &public_uri, Some(OTHER_SUBJECT), None).await.status,
        StatusCode::OK
    );

    assert_eq!(
        send(&app, Method::GET, &private_uri, None, None).await.status,
        StatusCode::UNAUTHORIZED
    );
    let other = send(&app, Method::GET, &private_uri, Some(OTHER_SUBJECT), None).await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);
    assert!(!other.error().is_empty());
    assert_eq!(
        send(&app, Method::GET, &private_uri, Some(OWNER_SUBJECT), None).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_boat_listing_depends_on_caller() {
    let app = test_app();
    create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    create_boat(&app, OWNER_SUBJECT, private_boat_body("Narwhal")).await;
    create_boat(&app, OTHER_SUBJECT, private_boat_body("Beluga")).await;

    let anonymous = send(&app, Method::GET, "/boats", None, None).await;
    let names: Vec<_> = anonymous.body["boats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Orca"]);

    let owner = send(&app, Method::GET, "/boats", Some(OWNER_SUBJECT), None).await;
    assert_eq!(owner.body["boats"].as_array().unwrap().len(), 2);

    let other = send(&app, Method::GET, "/boats", Some(OTHER_SUBJECT), None).await;
    assert_eq!(other.body["boats"][0]["name"], "Beluga");
}

#[tokio::test]
async fn test_non_owner_cannot_modify_boat() {
    let app = test_app();
    let boat_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let load_id = create_load(&app, legos_load_body()).await;
    let boat_uri = format!("/boats/{}", boat_id);

    let delete = send(&app, Method::DELETE, &boat_uri, Some(OTHER_SUBJECT), None).await;
    assert_eq!(delete.status, StatusCode::UNAUTHORIZED);

    let anonymous = send(&app, Method::DELETE, &boat_uri, None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let assign = send(
        &app,
        Method::PUT,
        &format!("/boats/{}/loads/{}", boat_id, load_id),
        Some(OTHER_SUBJECT),
        None,
    )
    .await;
    assert_eq!(assign.status, StatusCode::UNAUTHORIZED);

    // Existence is checked before ownership.
    let missing = send(&app, Method::DELETE, "/boats/999999", Some(OTHER_SUBJECT), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_and_unparsable_ids_are_not_found() {
    let app = test_app();
    for uri in ["/boats/424242", "/boats/not-an-id", "/loads/424242", "/loads/abc", "/users/x"] {
        let response = send(&app, Method::GET, uri, Some(OWNER_SUBJECT), None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(response.body.get("Error").is_some(), "{}", uri);
    }

    let boat_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let response = send(
        &app,
        Method::PUT,
        &format!("/boats/{}/loads/777777", boat_id),
        Some(OWNER_SUBJECT),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_boat_put_redirects_and_keeps_loads() {
    let app = test_app();
    let boat_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let load_id = create_load(&app, legos_load_body()).await;
    send(
        &app,
        Method::PUT,
        &format!("/boats/{}/loads/{}", boat_id, load_id),
        Some(OWNER_SUBJECT),
        None,
    )
    .await;

    let uri = format!("/boats/{}", boat_id);
    let replaced = send(
        &app,
        Method::PUT,
        &uri,
        Some(OWNER_SUBJECT),
        Some(json!({"name": "Orca II", "type": "Trimaran", "length": 31, "public": false})),
    )
    .await;
    assert_eq!(replaced.status, StatusCode::SEE_OTHER);
    assert_eq!(
        replaced.headers[header::LOCATION],
        format!("{}/boats/{}", BASE_URL, boat_id).as_str()
    );
    assert_eq!(replaced.body, serde_json::Value::Null);

    let boat = send(&app, Method::GET, &uri, Some(OWNER_SUBJECT), None).await;
    assert_eq!(boat.body["name"], "Orca II");
    assert_eq!(boat.body["public"], false);
    assert_eq!(boat.body["loads"][0]["id"], load_id);
}

#[tokio::test]
async fn test_boat_patch_merges_fields() {
    let app = test_app();
    let boat_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let uri = format!("/boats/{}", boat_id);

    let patched = send(&app, Method::PATCH, &uri, Some(OWNER_SUBJECT), Some(json!({"length": 30}))).await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["length"], 30);
    assert_eq!(patched.body["name"], "Orca");
    assert_eq!(patched.body["type"], "Catamaran");

    let empty = send(&app, Method::PATCH, &uri, Some(OWNER_SUBJECT), Some(json!({}))).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_boat_name_is_forbidden() {
    let app = test_app();
    create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;

    let duplicate = send(&app, Method::POST, "/boats", Some(OTHER_SUBJECT), Some(orca_boat_body())).await;
    assert_eq!(duplicate.status, StatusCode::FORBIDDEN);

    let other_id = create_boat(&app, OWNER_SUBJECT, private_boat_body("Narwhal")).await;
    let rename = send(
        &app,
        Method::PATCH,
        &format!("/boats/{}", other_id),
        Some(OWNER_SUBJECT),
        Some(json!({"name": "Orca"})),
    )
    .await;
    assert_eq!(rename.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_bodies_are_bad_requests() {
    let app = test_app();
    let bodies = [
        json!({"name": "Orca", "type": "Catamaran", "length": 28}),
        json!({"name": "Orca!", "type": "Catamaran", "length": 28, "public": true}),
        json!({"name": "Orca", "type": "Catamaran", "length": -1, "public": true}),
        json!({"name": "Orca", "type": "Catamaran", "length": 28, "public": true, "loads": []}),
    ];
    for body in bodies {
        let response = send(&app, Method::POST, "/boats", Some(OWNER_SUBJECT), Some(body.clone())).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(response.body.get("Error").is_some());
    }

    let load = send(
        &app,
        Method::POST,
        "/loads",
        None,
        Some(json!({"weight": 5, "content": "LEGO Blocks", "delivery_date": "10/01/2021"})),
    )
    .await;
    assert_eq!(load.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_load_put_redirects_and_keeps_assignment() {
    let app = test_app();
    let boat_id = create_boat(&app, OWNER_SUBJECT, orca_boat_body()).await;
    let load_id = create_load(&app, legos_load_body()).await;
    send(
        &app,
        Method::PUT,
        &format!("/boats/{}/loads/{}", boat_id, load_id),
        Some(OWNER_SUBJECT),
        None,
    )
    .await;

    let uri = format!("/loads/{}", load_id);
    let replaced = send(
        &app,
        Method::PUT,
        &uri,
        None,
        Some(json!({"weight": 7, "content": "DUPLO Blocks", "delivery_date": "2021-02-01"})),
    )
    .await;
    assert_eq!(replaced.status, StatusCode::SEE_OTHER);
    assert_eq!(
        replaced.headers[header::LOCATION],
        format!("{}/loads/{}", BASE_URL, load_id).as_str()
    );

    let load = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(load.body["weight"], 7);
    assert_eq!(load.body["current_boat"], boat_id);

    let patched = send(&app, Method::PATCH, &uri, None, Some(json!({"content": "Bricks"}))).await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["content"], "Bricks");
    assert_eq!(patched.body["weight"], 7);
}

#[tokio::test]
async fn test_user_registration_is_idempotent() {
    let app = test_app();

    let anonymous = send(&app, Method::POST, "/users", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let first = send(&app, Method::POST, "/users", Some(OWNER_SUBJECT), None).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["uuid"], OWNER_SUBJECT);

    let second = send(&app, Method::POST, "/users", Some(OWNER_SUBJECT), None).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.id(), first.id());

    let listed = send(&app, Method::GET, "/users", None, None).await;
    assert_eq!(listed.body["users"].as_array().unwrap().len(), 1);

    let fetched = send(&app, Method::GET, &format!("/users/{}", first.id()), None, None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["self"], format!("{}/users/{}", BASE_URL, first.id()));
}

#[tokio::test]
async fn test_expired_token_is_rejected_where_required() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(
            header::AUTHORIZATION,
            marina_test_utils::tokens::expired_bearer_for(OWNER_SUBJECT),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
