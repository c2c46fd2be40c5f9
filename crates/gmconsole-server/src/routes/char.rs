//! Read-only character sheets for the web view.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::{Router, routing::get};
use gmconsole_core::error::DomainError;
use gmconsole_session::application::handlers::describe_character;
use gmconsole_session::application::interpreter::Outcome;
use gmconsole_session::application::render::render;
use serde::Deserialize;
use tracing::instrument;

use super::view::{page, page_html};
use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /char.
#[derive(Debug, Deserialize)]
pub struct CharQuery {
    /// Character key or name; the plain page when absent.
    pub name: Option<String>,
}

/// GET /char?name=
///
/// Renders the sheet for this request only. Spectators and the session's
/// last broadcast are left alone.
#[instrument(skip(state))]
async fn sheet(
    State(state): State<AppState>,
    Query(query): Query<CharQuery>,
) -> Result<Html<String>, ApiError> {
    let Some(name) = query.name.filter(|n| !n.trim().is_empty()) else {
        return page(State(state)).await;
    };
    let key = name.clone();
    let rendered = state
        .session
        .inspect(move |s| {
            s.world
                .roster
                .find(&key)
                .map(|c| render(&s.world, &Outcome::Overlay(describe_character(c))))
        })
        .await?;
    match rendered {
        Some(body) => Ok(page_html(&body.unwrap_or_default())),
        None => Err(ApiError(DomainError::EntityNotFound(name))),
    }
}

/// Returns the character sheet router.
pub fn router() -> Router<AppState> {
    Router::new().route("/char", get(sheet))
}
