//! Shared test helpers for server integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gmconsole_dice::LocalOracle;
use gmconsole_server::autofight::Pacing;
use gmconsole_server::config::{DiceBackend, ServerConfig};
use gmconsole_server::content::JsonContentDir;
use gmconsole_server::executor::{SessionExecutor, SessionHandle};
use gmconsole_server::hub::Hub;
use gmconsole_server::state::AppState;
use gmconsole_session::application::session::Session;
use gmconsole_test_support::{CyclingRng, fixed_clock};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "s3cret";

fn write(dir: &Path, file: &str, body: &str) {
    std::fs::write(dir.join(file), body).unwrap();
}

/// A content directory with two party members (Aria, Bren), a Goblin
/// template and one place.
pub fn write_content_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "chars.json",
        r#"[
            {"name":"Aria","class":"Fighter","in_party":true,"initiative":1,"ac":15,"hp":20,
             "attacks":[{"name":"Shortsword","to_hit":5,"damage":"1d6+2","verb":"stabs"}]},
            {"name":"Bren","class":"Cleric","in_party":true,"initiative":0,"ac":16,"hp":18,
             "attacks":[{"name":"Mace","to_hit":3,"damage":"1d6+1","verb":"smites"}]},
            {"name":"Goblin","level":1,"initiative":-1,"ac":13,"hp":7,
             "attacks":[{"name":"Scimitar","to_hit":4,"damage":"1d6+2","verb":"slashes"}]}
        ]"#,
    );
    write(
        dir.path(),
        "places.json",
        r#"[{"key":"cave","name":"Whispering Cave","desc":"Water drips in the dark."}]"#,
    );
    dir
}

pub fn test_config(content_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        telnet_port: 0,
        shared_secret: SECRET.to_string(),
        content_dir: content_dir.to_path_buf(),
        players: Vec::new(),
        dice: DiceBackend::Local,
        queue_capacity: 16,
        pacing: Pacing::immediate(),
        console: false,
    }
}

/// Spawns a hub and an executor over the content in `dir`. Every die
/// rolls `rolls` in turn, clamped to its sides.
pub fn spawn_state(dir: &Path, rolls: Vec<u32>, pacing: Pacing) -> AppState {
    let config = test_config(dir);
    let session = Session::new(
        Box::new(JsonContentDir::new(config.content_dir.clone(), Vec::new())),
        Box::new(LocalOracle::new(CyclingRng::new(rolls))),
        Box::new(fixed_clock()),
    )
    .unwrap();
    let (hub, _hub_task) = Hub::spawn();
    let (handle, _executor_task) = SessionExecutor::spawn(session, hub.clone(), pacing);
    AppState::new(handle, hub, Arc::new(config))
}

/// Build the full app router over a fresh session.
pub fn build_test_app(state: AppState) -> Router {
    gmconsole_server::build_router(state)
}

/// Current hit points of `key`.
pub async fn hp(session: &SessionHandle, key: &'static str) -> i32 {
    session
        .inspect(move |s| s.world.roster.get(key).map(|c| c.cur_hp))
        .await
        .unwrap()
        .unwrap()
}

/// Polls until no auto-fight is running.
pub async fn wait_for_auto_fight(session: &SessionHandle) {
    for _ in 0..200 {
        if !session.auto_fight_status().await.unwrap().running {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("auto-fight did not finish");
}

/// Send a GET request and return the response status, headers and body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, headers, body_bytes.to_vec())
}

/// Send a GET request and return the response as JSON.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(app, uri).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}
