//! Handlers for the current user's settings.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AppState, AuthenticatedUser, Error, lifecycle::update_budget, routes::extract::ApiJson};

/// The body of a budget update and its response.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Budget {
    pub(crate) budget: Decimal,
}

pub(crate) async fn update_budget_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(Budget { budget }): ApiJson<Budget>,
) -> Result<Json<Budget>, Error> {
    let budget = update_budget(&user, budget, &mut state.user_store())?;

    Ok(Json(Budget { budget }))
}
