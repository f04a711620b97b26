//! Post listings: pagination, filters, categories and favorites.

mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn post_creation_validates_every_field() {
    let app = TestApp::new();
    let (_, alice) = app.seed_user("alice", "user").await;

    let response = app
        .post_json("/api/posts", Some(&alice), json!({"status": "archived"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let paths: Vec<&str> = json["validationErrs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["title", "content", "status"]);
}

#[tokio::test]
async fn created_post_carries_computed_fields() {
    let app = TestApp::new();
    let (alice_id, alice) = app.seed_user("alice", "user").await;

    let response = app
        .post_json("/api/posts", Some(&alice), json!({"title": "Hi", "content": "There"}))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = &body_json(response).await["data"];
    assert_eq!(post["createdById"], alice_id);
    assert_eq!(post["author"]["login"], "alice");
    assert!(post["author"].get("password").is_none());
    assert_eq!(post["categories"], json!([]));
    assert_eq!(post["commentsCount"], 0);
    assert_eq!(post["status"], "active");
}

#[tokio::test]
async fn listings_paginate_and_clamp_pages() {
    let app = TestApp::new();
    let (_, alice) = app.seed_user("alice", "user").await;
    for i in 0..12 {
        app.create_post(&alice, json!({"title": format!("Post {i}"), "content": "x"}))
            .await;
    }

    let first = body_json(app.get("/api/posts", None).await).await;
    assert_eq!(first["data"].as_array().unwrap().len(), 10);
    assert_eq!(first["pagination"]["totalRecordsCount"], 12);
    assert_eq!(first["pagination"]["totalPages"], 2);
    assert_eq!(first["pagination"]["nextPage"], 2);

    let second = body_json(app.get("/api/posts?page=2", None).await).await;
    assert_eq!(second["data"].as_array().unwrap().len(), 2);
    assert_eq!(second["pagination"]["currentPage"], 2);

    let beyond = body_json(app.get("/api/posts?page=99", None).await).await;
    assert_eq!(beyond["pagination"]["currentPage"], 2);
    assert_eq!(beyond["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn id_filter_accepts_comma_lists() {
    let app = TestApp::new();
    let (_, alice) = app.seed_user("alice", "user").await;
    let a = app.create_post(&alice, json!({"title": "A", "content": "x"})).await;
    let b = app.create_post(&alice, json!({"title": "B", "content": "x"})).await;
    app.create_post(&alice, json!({"title": "C", "content": "x"})).await;

    let json = body_json(app.get(&format!("/api/posts?id={a},{b}"), None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let json = body_json(app.get("/api/posts?id=abc", None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
    assert_eq!(json["pagination"]["totalRecordsCount"], 0);
}

#[tokio::test]
async fn posts_filter_by_category() {
    let app = TestApp::new();
    let (_, admin) = app.seed_user("admin", "admin").await;
    let (_, alice) = app.seed_user("alice", "user").await;

    let mut categories = Vec::new();
    for title in ["Rust", "Go"] {
        let response = app
            .post_json("/api/categories", Some(&admin), json!({"title": title}))
            .await;
        categories.push(body_json(response).await["data"]["id"].as_i64().unwrap());
    }
    let (rust, go) = (categories[0], categories[1]);

    let response = app
        .post_json(
            "/api/posts",
            Some(&alice),
            json!({"title": "Ownership", "content": "x", "categories": format!("{rust},999")}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = body_json(response).await["data"].clone();
    let post_id = post["id"].as_i64().unwrap();
    assert_eq!(post["categories"].as_array().unwrap().len(), 1);
    assert_eq!(post["categories"][0]["title"], "Rust");

    app.create_post(&alice, json!({"title": "Other", "content": "x"})).await;

    let json = body_json(app.get(&format!("/api/posts?categories={rust}"), None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], post_id);

    let json = body_json(app.get(&format!("/api/categories/{go}/posts"), None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    let json = body_json(app.get(&format!("/api/posts/{post_id}/categories"), None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    // Re-linking replaces the set.
    let response = app
        .patch_json(
            &format!("/api/posts/{post_id}"),
            Some(&alice),
            json!({"title": "Ownership", "content": "x", "categories": [go]}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["categories"][0]["title"], "Go");
    assert_eq!(json["data"]["categories"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn posts_by_user() {
    let app = TestApp::new();
    let (alice_id, alice) = app.seed_user("alice", "user").await;
    let (_, bob) = app.seed_user("bob", "user").await;
    app.create_post(&alice, json!({"title": "A1", "content": "x"})).await;
    app.create_post(&bob, json!({"title": "B1", "content": "x"})).await;

    let json = body_json(app.get(&format!("/api/users/{alice_id}/posts"), None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["title"], "A1");
}

#[tokio::test]
async fn favorites_add_list_and_remove() {
    let app = TestApp::new();
    let (_, alice) = app.seed_user("alice", "user").await;
    let (bob_id, bob) = app.seed_user("bob", "user").await;
    let post = app.create_post(&alice, json!({"title": "Keeper", "content": "x"})).await;

    let empty = body_json(app.get(&format!("/api/users/{bob_id}/favorites"), None).await).await;
    assert_eq!(empty["data"].as_array().unwrap().len(), 0);

    let path = format!("/api/posts/{post}/favorite");
    let response = app.post_json(&path, Some(&bob), json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.post_json(&path, Some(&bob), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "CONFLICT");

    let listed = body_json(app.get(&format!("/api/users/{bob_id}/favorites"), None).await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["data"][0]["id"], post);

    let response = app.delete(&path, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.delete(&path, Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.delete(&path, Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.post_json("/api/posts/999/favorite", Some(&bob), json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
