mod helpers;

use helpers::{bearer, spawn_app};
use serde_json::{json, Value};
use taskhub_core::EntityId;

#[tokio::test]
async fn test_get_me_returns_authenticated_profile() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");

    let response = app
        .server
        .get("/users/me")
        .add_header("Authorization", bearer(&alice))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "Success");
    assert_eq!(body["message"], "Get your profile's information successfully!");
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn test_get_me_with_stale_token_is_bad_request() {
    let app = spawn_app().await;
    let ghost = app.add_user("ghost");
    let other = spawn_app().await;

    // Token is valid but the user only exists in the first app's store.
    let response = other
        .server
        .get("/users/me")
        .add_header("Authorization", bearer(&ghost))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        format!("Cannot find this user with id {}!", ghost.id)
    );
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = spawn_app().await;

    let response = app.server.get("/users/me").await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body, json!({"status": "Failed", "message": "Missing authorization header!"}));
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = spawn_app().await;

    let response = app
        .server
        .get("/users/me")
        .add_header("Authorization", "Bearer not.a.jwt")
        .await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid or expired token!");
}

#[tokio::test]
async fn test_get_user_by_id() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");
    let bob = app.add_user("bob");

    let response = app
        .server
        .get(&format!("/users/{}", bob.id))
        .add_header("Authorization", bearer(&alice))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        format!("Get user's information by id {} successfully!", bob.id)
    );
    assert_eq!(body["data"]["email"], "bob@example.com");
}

#[tokio::test]
async fn test_malformed_user_id_never_reaches_store() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");

    for bad in ["42", "not-an-id", "6502b3c1e4b0a1f2c3d4e5f6"] {
        let response = app
            .server
            .get(&format!("/users/{bad}"))
            .add_header("Authorization", bearer(&alice))
            .await;
        assert_eq!(response.status_code(), 400);
        let body: Value = response.json();
        assert_eq!(body["message"], "Invalid user id value!");

        let response = app
            .server
            .patch(&format!("/users/{bad}"))
            .add_header("Authorization", bearer(&alice))
            .json(&json!({"bio": "hi"}))
            .await;
        assert_eq!(response.status_code(), 400);
    }

    assert_eq!(app.users.read_count(), 0);
    assert_eq!(app.users.write_count(), 0);
}

#[tokio::test]
async fn test_unknown_user_is_bad_request() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");
    let missing = EntityId::new();

    let response = app
        .server
        .get(&format!("/users/{missing}"))
        .add_header("Authorization", bearer(&alice))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        format!("Cannot find this user with id {missing}!")
    );
}

#[tokio::test]
async fn test_empty_update_never_writes() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");

    let empty_body = app
        .server
        .patch(&format!("/users/{}", alice.id))
        .add_header("Authorization", bearer(&alice))
        .await;
    let empty_object = app
        .server
        .patch(&format!("/users/{}", alice.id))
        .add_header("Authorization", bearer(&alice))
        .json(&json!({}))
        .await;

    for response in [empty_body, empty_object] {
        assert_eq!(response.status_code(), 400);
        let body: Value = response.json();
        assert_eq!(body["message"], "No update information provided!");
    }
    assert_eq!(app.users.write_count(), 0);
}

#[tokio::test]
async fn test_taken_username_is_rejected_without_write() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");
    let bob = app.add_user("bob");

    let response = app
        .server
        .patch(&format!("/users/{}", bob.id))
        .add_header("Authorization", bearer(&bob))
        .json(&json!({"username": "alice"}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "This username has already been used!");
    assert_eq!(app.users.write_count(), 0);
    assert_eq!(app.users.get(bob.id).map(|u| u.username), Some("bob".to_string()));
    assert_eq!(app.users.get(alice.id).map(|u| u.username), Some("alice".to_string()));
}

#[tokio::test]
async fn test_keeping_own_username_succeeds() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");

    let response = app
        .server
        .patch(&format!("/users/{}", alice.id))
        .add_header("Authorization", bearer(&alice))
        .json(&json!({"username": "alice", "bio": "Rustacean"}))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        format!("Update user's information by id {} successfully!", alice.id)
    );
    assert_eq!(body["data"]["bio"], "Rustacean");
    assert_eq!(app.users.write_count(), 1);
}

#[tokio::test]
async fn test_update_of_missing_user() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");
    let missing = EntityId::new();

    let response = app
        .server
        .patch(&format!("/users/{missing}"))
        .add_header("Authorization", bearer(&alice))
        .json(&json!({"full_name": "Nobody"}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], format!("Cannot find user with id {missing}!"));
}

#[tokio::test]
async fn test_update_rejects_unknown_profile_fields() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");

    let response = app
        .server
        .patch(&format!("/users/{}", alice.id))
        .add_header("Authorization", bearer(&alice))
        .json(&json!({"avatar": {"url": "https://evil.example.com/x.png"}}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid request body!");
    assert_eq!(app.users.write_count(), 0);
}

#[tokio::test]
async fn test_malformed_id_wins_over_bad_body() {
    let app = spawn_app().await;
    let alice = app.add_user("alice");

    for body in [json!({"nickname": "x"}), json!(["not", "an", "object"])] {
        let response = app
            .server
            .patch("/users/not-an-id")
            .add_header("Authorization", bearer(&alice))
            .json(&body)
            .await;

        assert_eq!(response.status_code(), 400);
        let body: Value = response.json();
        assert_eq!(
            body,
            json!({"status": "Failed", "message": "Invalid user id value!"})
        );
    }
    assert_eq!(app.users.write_count(), 0);
}
