//! Confirm/cancel redirect entry points. These arrive as browser GETs issued
//! by the payment provider after the user completes or abandons payment; all
//! transaction facts are reconstructed from the echoed query parameters.
//! The response is always a redirect back into the chat app — the user has
//! left the HTTP context and cannot observe a status code, so outcome is
//! conveyed only through the push message (or its absence).

use crate::app_state::AppState;
use axum::extract::{Query, State};
use axum::response::Redirect;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    #[serde(rename = "transactionId")]
    pub transaction_id: i64,
    pub amount: i64,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelParams {
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// `GET /confirm?transactionId&amount&userId`
pub async fn handle_confirm(
    State(state): State<AppState>,
    Query(params): Query<ConfirmParams>,
) -> Redirect {
    state
        .orchestrator
        .handle_confirm(params.transaction_id, params.amount, &params.user_id)
        .await;
    Redirect::to(&state.config.chat_deep_link())
}

/// `GET /cancel?userId`
pub async fn handle_cancel(
    State(state): State<AppState>,
    Query(params): Query<CancelParams>,
) -> Redirect {
    state.orchestrator.handle_cancel(&params.user_id).await;
    Redirect::to(&state.config.chat_deep_link())
}
