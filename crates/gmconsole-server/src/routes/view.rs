//! The spectator page.

use axum::extract::State;
use axum::response::Html;
use axum::{Router, routing::get};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Game-master console</title>
<style>
body { font-family: sans-serif; background: #111; color: #eee; }
.card { display: inline-block; border: 2px solid #444; padding: 4px; margin: 4px; }
.card.down { opacity: 0.5; }
.card img { display: block; max-height: 120px; }
.initiative .current { font-weight: bold; }
.narration, .overlay pre { white-space: pre-wrap; }
a { color: #9cf; }
</style>
</head>
<body>
<div id="view">"#;

const PAGE_TAIL: &str = r#"</div>
<script>
(function () {
  var view = document.getElementById("view");
  var scheme = location.protocol === "https:" ? "wss://" : "ws://";
  function connect() {
    var ws = new WebSocket(scheme + location.host + "/ws");
    ws.onmessage = function (ev) { view.innerHTML = ev.data; };
    ws.onclose = function () { setTimeout(connect, 2000); };
  }
  connect();
})();
</script>
</body>
</html>
"#;

/// Wraps a rendered view in the spectator page.
pub(crate) fn page_html(body: &str) -> Html<String> {
    Html(format!("{PAGE_HEAD}{body}{PAGE_TAIL}"))
}

/// GET /
#[instrument(skip(state))]
pub(crate) async fn page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let payload = state.session.snapshot().await?;
    Ok(page_html(&payload))
}

/// Returns the page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(page))
}
