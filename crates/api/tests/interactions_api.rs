//! Comments, replies, likes and best-answer selection.

mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn likes_update_post_counter_and_author_rating() {
    let app = TestApp::new();
    let (alice_id, alice) = app.seed_user("alice", "user").await;
    let (_, bob) = app.seed_user("bob", "user").await;
    let post = app.create_post(&alice, json!({"title": "Q", "content": "x"})).await;
    let path = format!("/api/posts/{post}/like");

    let response = app.post_json(&path, Some(&bob), json!({"type": "like"})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let like_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let json = body_json(app.get(&format!("/api/posts/{post}"), None).await).await;
    assert_eq!(json["data"]["likes"], 1);
    let json = body_json(app.get(&format!("/api/users/{alice_id}"), None).await).await;
    assert_eq!(json["data"]["rating"], 1);

    // Voting again with the same type keeps the single row.
    let response = app.post_json(&path, Some(&bob), json!({"type": "like"})).await;
    assert_eq!(body_json(response).await["data"]["id"], like_id);
    let json = body_json(app.get(&path, None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = app.post_json(&path, Some(&bob), json!({"type": "dislike"})).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], like_id);
    assert_eq!(json["data"]["type"], "dislike");

    let json = body_json(app.get(&format!("/api/posts/{post}"), None).await).await;
    assert_eq!(json["data"]["likes"], 0);
    let json = body_json(app.get(&format!("/api/users/{alice_id}"), None).await).await;
    assert_eq!(json["data"]["rating"], -1);

    let response = app.delete(&format!("{path}/{like_id}"), Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.delete(&format!("{path}/{like_id}"), Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(app.get(&format!("/api/users/{alice_id}"), None).await).await;
    assert_eq!(json["data"]["rating"], 0);
}

#[tokio::test]
async fn likes_reject_bad_input() {
    let app = TestApp::new();
    let (_, alice) = app.seed_user("alice", "user").await;
    let post = app.create_post(&alice, json!({"title": "Q", "content": "x"})).await;

    let response = app
        .post_json(&format!("/api/posts/{post}/like"), Some(&alice), json!({"type": "love"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["validationErrs"][0]["path"], "type");

    let response = app
        .post_json("/api/posts/999/like", Some(&alice), json!({"type": "like"}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post_json(&format!("/api/posts/{post}/like"), None, json!({"type": "like"}))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn comments_nest_under_posts() {
    let app = TestApp::new();
    let (alice_id, alice) = app.seed_user("alice", "user").await;
    let (_, bob) = app.seed_user("bob", "user").await;
    let post = app.create_post(&alice, json!({"title": "Q", "content": "x"})).await;

    let response = app
        .post_json(&format!("/api/posts/{post}/comments"), Some(&bob), json!({"content": "Answer"}))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment = body_json(response).await["data"].clone();
    assert_eq!(comment["postId"], post);
    assert_eq!(comment["author"]["login"], "bob");
    let comment_id = comment["id"].as_i64().unwrap();

    let response = app
        .post_json(
            &format!("/api/comments/{comment_id}/comments"),
            Some(&alice),
            json!({"content": "Thanks"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let reply = body_json(response).await["data"].clone();
    assert_eq!(reply["commentId"], comment_id);
    assert_eq!(reply["postId"], post);
    assert_eq!(reply["createdById"], alice_id);

    // Replies are not listed as top-level comments of the post.
    let json = body_json(app.get(&format!("/api/posts/{post}/comments"), None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], comment_id);

    let json = body_json(app.get(&format!("/api/comments/{comment_id}/comments"), None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["content"], "Thanks");

    let json = body_json(app.get(&format!("/api/posts/{post}"), None).await).await;
    assert_eq!(json["data"]["commentsCount"], 2);

    let response = app
        .post_json("/api/posts/999/comments", Some(&bob), json!({"content": "Lost"}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post_json(&format!("/api/posts/{post}/comments"), Some(&bob), json!({"content": ""}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_post_author_selects_best_comment() {
    let app = TestApp::new();
    let (_, alice) = app.seed_user("alice", "user").await;
    let (_, bob) = app.seed_user("bob", "user").await;
    let (_, admin) = app.seed_user("admin", "admin").await;
    let post = app.create_post(&alice, json!({"title": "Q", "content": "x"})).await;

    let first = app
        .post_json(&format!("/api/posts/{post}/comments"), Some(&bob), json!({"content": "One"}))
        .await;
    let first = body_json(first).await["data"]["id"].as_i64().unwrap();
    let second = app
        .post_json(&format!("/api/posts/{post}/comments"), Some(&bob), json!({"content": "Two"}))
        .await;
    let second = body_json(second).await["data"]["id"].as_i64().unwrap();

    let path = format!("/api/comments/{first}/setBest");
    for token in [&bob, &admin] {
        let response = app.patch_json(&path, Some(token), json!({})).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let response = app.patch_json(&path, Some(&alice), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["isBest"], true);

    // The best answer sorts first.
    let json = body_json(app.get(&format!("/api/posts/{post}/comments"), None).await).await;
    assert_eq!(json["data"][0]["id"], first);
    assert_eq!(json["data"][1]["id"], second);

    let response = app.patch_json(&path, Some(&alice), json!({})).await;
    assert_eq!(body_json(response).await["data"]["isBest"], false);

    let response = app.patch_json("/api/comments/999/setBest", Some(&alice), json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_likes_count_toward_author_rating() {
    let app = TestApp::new();
    let (_, alice) = app.seed_user("alice", "user").await;
    let (bob_id, bob) = app.seed_user("bob", "user").await;
    let post = app.create_post(&alice, json!({"title": "Q", "content": "x"})).await;
    let comment = app
        .post_json(&format!("/api/posts/{post}/comments"), Some(&bob), json!({"content": "A"}))
        .await;
    let comment = body_json(comment).await["data"]["id"].as_i64().unwrap();

    let response = app
        .post_json(&format!("/api/comments/{comment}/like"), Some(&alice), json!({"type": "like"}))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(app.get(&format!("/api/comments/{comment}/like"), None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["commentId"], comment);

    let json = body_json(app.get(&format!("/api/users/{bob_id}"), None).await).await;
    assert_eq!(json["data"]["rating"], 1);
}

#[tokio::test]
async fn deleting_a_post_drops_its_thread_and_the_ratings_it_earned() {
    let app = TestApp::new();
    let (alice_id, alice) = app.seed_user("alice", "user").await;
    let (bob_id, bob) = app.seed_user("bob", "user").await;
    let post = app.create_post(&alice, json!({"title": "Q", "content": "x"})).await;
    let comment = app
        .post_json(&format!("/api/posts/{post}/comments"), Some(&bob), json!({"content": "A"}))
        .await;
    let comment = body_json(comment).await["data"]["id"].as_i64().unwrap();
    app.post_json(&format!("/api/posts/{post}/like"), Some(&bob), json!({"type": "like"}))
        .await;
    app.post_json(&format!("/api/comments/{comment}/like"), Some(&alice), json!({"type": "like"}))
        .await;

    for id in [alice_id, bob_id] {
        let json = body_json(app.get(&format!("/api/users/{id}"), None).await).await;
        assert_eq!(json["data"]["rating"], 1);
    }

    let response = app.delete(&format!("/api/posts/{post}"), Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], post);

    for id in [alice_id, bob_id] {
        let json = body_json(app.get(&format!("/api/users/{id}"), None).await).await;
        assert_eq!(json["data"]["rating"], 0);
    }
    let response = app.get(&format!("/api/comments/{comment}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
