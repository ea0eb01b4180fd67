pub mod app_state;
pub mod config;
pub mod error;
pub mod events;
pub mod messaging;
pub mod orchestrator;
pub mod payments;
pub mod redirect_handlers;
pub mod signature;
pub mod webhook_handlers;

// Re-export key types for tests
pub use crate::app_state::AppState;
pub use crate::config::AppConfig;
pub use crate::error::GatewayError;
pub use crate::events::{InboundEvent, InboundKind};
pub use crate::messaging::{LineMessagingClient, MessagingGateway};
pub use crate::orchestrator::{Command, Orchestrator};
pub use crate::payments::{LinePayClient, PaymentGateway, Reservation};

use axum::routing::{get, post};
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/callback", post(webhook_handlers::handle_callback))
        .route("/confirm", get(redirect_handlers::handle_confirm))
        .route("/cancel", get(redirect_handlers::handle_cancel))
        .with_state(state)
}
