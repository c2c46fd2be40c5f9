//! Integration tests for the web attack form.

mod common;

use axum::http::StatusCode;
use axum::http::header::LOCATION;
use gmconsole_core::command::Origin;
use gmconsole_server::autofight::Pacing;

async fn fight_ready() -> (tempfile::TempDir, gmconsole_server::state::AppState) {
    let dir = common::write_content_dir();
    let state = common::spawn_state(dir.path(), vec![20], Pacing::immediate());
    state.session.execute("drop gob", Origin::Console).await.unwrap();
    state.session.execute("combat", Origin::Console).await.unwrap();
    (dir, state)
}

#[tokio::test]
async fn test_attack_by_current_turn_applies_and_redirects() {
    let (_dir, state) = fight_ready().await;
    let app = common::build_test_app(state.clone());

    let (status, headers, _) = common::get(app, "/attack?char=ari&target=gob1&attack=0").await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[LOCATION], "/");
    assert_eq!(common::hp(&state.session, "gob1").await, -1);
}

#[tokio::test]
async fn test_out_of_turn_attack_is_rejected_without_change() {
    let (_dir, state) = fight_ready().await;
    let app = common::build_test_app(state.clone());

    let (status, headers, _) = common::get(app, "/attack?char=bre&target=gob1&attack=0").await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[LOCATION], "/");
    assert_eq!(common::hp(&state.session, "gob1").await, 7);
}

#[tokio::test]
async fn test_attack_outside_combat_is_rejected() {
    let dir = common::write_content_dir();
    let state = common::spawn_state(dir.path(), vec![20], Pacing::immediate());
    state.session.execute("drop gob", Origin::Console).await.unwrap();

    let result = state
        .session
        .web_attack("ari".to_string(), "gob1".to_string(), 0)
        .await
        .unwrap();

    assert!(result.is_err());
    assert_eq!(common::hp(&state.session, "gob1").await, 7);
}

#[tokio::test]
async fn test_malformed_query_is_a_client_error() {
    let (_dir, state) = fight_ready().await;
    let app = common::build_test_app(state);

    let (status, _, _) = common::get(app, "/attack?char=ari&target=gob1&attack=first").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
