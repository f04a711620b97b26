//! Registration and profile updates.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{body_json, TestApp};
use devsync_api::auth::password::verify_password;
use devsync_db::entities::UserRepo;
use serde_json::json;

fn registration(login: &str) -> serde_json::Value {
    json!({
        "login": login,
        "email": format!("{login}@example.com"),
        "fullName": "Carol Jones",
        "password": "Secr3t!",
        "password_confirm": "Secr3t!",
        "role": "admin",
    })
}

#[tokio::test]
async fn guest_registers_with_hashed_password() {
    let app = TestApp::new();

    let response = app.post_json("/api/users", None, registration("carol")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = body_json(response).await["data"].clone();
    assert_eq!(user["login"], "carol");
    assert_eq!(user["role"], "user");
    assert_eq!(user["rating"], 0);
    assert!(user.get("password").is_none());
    assert!(user.get("password_confirm").is_none());

    let stored = UserRepo::get_by_login(&app.store, "carol").await.unwrap().unwrap();
    let hash = stored.get_str("password").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert_matches!(verify_password("Secr3t!", hash), Ok(true));
}

#[tokio::test]
async fn registration_rejects_taken_login_and_email() {
    let app = TestApp::new();
    app.seed_user("carol", "user").await;

    let response = app.post_json("/api/users", None, registration("carol")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    let errs = json["validationErrs"].as_array().unwrap();
    assert_eq!(errs.len(), 2);
    assert_eq!(errs[0]["path"], "login");
    assert_eq!(errs[0]["msg"], "Login already exists");
    assert_eq!(errs[1]["path"], "email");
}

#[tokio::test]
async fn registration_validates_input() {
    let app = TestApp::new();

    let mut body = registration("Dan");
    body["password"] = json!("weak");
    body["password_confirm"] = json!("other");
    body["email"] = json!("not-an-email");
    let response = app.post_json("/api/users", None, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    let paths: Vec<&str> = json["validationErrs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["email", "login", "password", "password_confirm"]);
}

#[tokio::test]
async fn users_edit_only_their_own_profile() {
    let app = TestApp::new();
    let (alice_id, alice) = app.seed_user("alice", "user").await;
    let (bob_id, _) = app.seed_user("bob", "user").await;

    let response = app
        .patch_json(
            &format!("/api/users/{alice_id}"),
            Some(&alice),
            json!({"fullName": "Alice Liddell", "role": "admin", "login": "queen"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["fullName"], "Alice Liddell");
    assert_eq!(json["data"]["role"], "user");
    assert_eq!(json["data"]["login"], "alice");

    let response = app
        .patch_json(&format!("/api/users/{bob_id}"), Some(&alice), json!({"fullName": "Robert"}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.delete(&format!("/api/users/{alice_id}"), Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_change_roles_but_not_logins() {
    let app = TestApp::new();
    let (_, admin) = app.seed_user("admin", "admin").await;
    let (bob_id, _) = app.seed_user("bob", "user").await;

    let response = app
        .patch_json(
            &format!("/api/users/{bob_id}"),
            Some(&admin),
            json!({"role": "admin", "login": "robert"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["role"], "admin");
    assert_eq!(json["data"]["login"], "bob");
}

#[tokio::test]
async fn users_list_filters_by_role() {
    let app = TestApp::new();
    app.seed_user("admin", "admin").await;
    app.seed_user("alice", "user").await;
    app.seed_user("bob", "user").await;

    let json = body_json(app.get("/api/users?role=user", None).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let json = body_json(app.get("/api/users?sortBy=login:asc", None).await).await;
    let logins: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["login"].as_str().unwrap())
        .collect();
    assert_eq!(logins, vec!["admin", "alice", "bob"]);
}
