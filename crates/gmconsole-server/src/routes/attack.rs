//! The web attack form.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Router, routing::get};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /attack.
#[derive(Debug, Deserialize)]
pub struct AttackQuery {
    /// Attacker key.
    #[serde(rename = "char")]
    pub attacker: String,
    /// Target key.
    pub target: String,
    /// Index into the attacker's attacks.
    pub attack: usize,
}

/// GET /attack?char=&target=&attack=
///
/// Always redirects back to the page; a rejected attack is only logged.
#[instrument(skip_all, fields(attacker = %query.attacker, target = %query.target, attack = query.attack))]
async fn attack(
    State(state): State<AppState>,
    Query(query): Query<AttackQuery>,
) -> Result<Redirect, ApiError> {
    let result = state
        .session
        .web_attack(query.attacker, query.target, query.attack)
        .await?;
    if result.is_ok() {
        info!("web attack applied");
    }
    Ok(Redirect::to("/"))
}

/// Returns the attack router.
pub fn router() -> Router<AppState> {
    Router::new().route("/attack", get(attack))
}
