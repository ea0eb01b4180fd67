//! Transaction orchestration: ties the three HTTP entry points to the two
//! gateways. Each handler reconstructs the transaction facts from its own
//! inputs; nothing is shared between requests.

use crate::error::GatewayError;
use crate::events::InboundEvent;
use crate::messaging::{build_template_message, build_text_message, MessagingGateway};
use crate::payments::PaymentGateway;
use std::sync::Arc;
use tracing::{debug, info, warn};

const USAGE_TEXT: &str = "Send \"pay <amount>\" to start a payment.";
const RESERVE_FAILED_TEXT: &str =
    "Sorry, the payment could not be started. Please try again later.";

// Canned sticker notifications pushed after the provider redirects back.
const CONFIRMED_STICKER: (&str, &str) = ("2", "35");
const CANCELLED_STICKER: (&str, &str) = ("2", "32");

/// Result of parsing one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pay { amount: i64 },
    /// A `pay` command with a missing or non-positive-integer amount.
    /// Treated as a non-pay message; never reaches the payment gateway.
    Malformed { reason: String },
    Other,
}

/// Split on whitespace; the command token is matched case-insensitively.
pub fn parse_command(text: &str) -> Command {
    let mut tokens = text.split_whitespace();
    let Some(head) = tokens.next() else {
        return Command::Other;
    };
    if !head.eq_ignore_ascii_case("pay") {
        return Command::Other;
    }
    match tokens.next() {
        Some(raw) => match raw.parse::<i64>() {
            Ok(amount) if amount > 0 => Command::Pay { amount },
            _ => Command::Malformed {
                reason: format!("amount {raw:?} is not a positive integer"),
            },
        },
        None => Command::Malformed {
            reason: "missing amount".to_string(),
        },
    }
}

pub struct Orchestrator {
    payments: Arc<dyn PaymentGateway>,
    messaging: Arc<dyn MessagingGateway>,
}

impl Orchestrator {
    pub fn new(payments: Arc<dyn PaymentGateway>, messaging: Arc<dyn MessagingGateway>) -> Self {
        Self {
            payments,
            messaging,
        }
    }

    /// Handle one inbound `message` event. Sends at most one reply: the
    /// payment link when the reservation succeeded, a neutral text
    /// otherwise. A failed reserve never produces a link.
    pub async fn handle_message(&self, event: &InboundEvent) -> Result<(), GatewayError> {
        let text = event.text.as_deref().unwrap_or_default();
        let message = match parse_command(text) {
            Command::Pay { amount } => match self.payments.reserve(amount, &event.user_id).await {
                Ok(reservation) => {
                    info!(
                        transaction_id = reservation.transaction_id,
                        amount,
                        user_id = %event.user_id,
                        "payment reserved"
                    );
                    build_template_message(&event.reply_token, &reservation.payment_url_app)
                }
                Err(err) => {
                    warn!(error = %err, amount, user_id = %event.user_id, "reserve failed");
                    build_text_message(&event.reply_token, RESERVE_FAILED_TEXT)
                }
            },
            Command::Malformed { reason } => {
                debug!(%reason, "malformed pay command");
                build_text_message(&event.reply_token, USAGE_TEXT)
            }
            Command::Other => build_text_message(&event.reply_token, USAGE_TEXT),
        };
        self.messaging.reply(message).await
    }

    /// Finalize a reservation from the provider's confirm redirect. The
    /// confirm call completes before any push; a failed confirm suppresses
    /// the push. Failures are logged, never surfaced — the user has already
    /// left the HTTP context.
    pub async fn handle_confirm(&self, transaction_id: i64, amount: i64, user_id: &str) {
        match self.payments.confirm(transaction_id, amount).await {
            Ok(()) => {
                info!(transaction_id, amount, user_id, "payment confirmed");
                let (package, sticker) = CONFIRMED_STICKER;
                if let Err(err) = self.messaging.push(user_id, package, sticker).await {
                    warn!(error = %err, user_id, "confirmation push failed");
                }
            }
            Err(err) => {
                warn!(error = %err, transaction_id, amount, "confirm failed");
            }
        }
    }

    /// Notify the user of an abandoned reservation. No provider call; the
    /// provider already considers the reservation abandoned.
    pub async fn handle_cancel(&self, user_id: &str) {
        let (package, sticker) = CANCELLED_STICKER;
        if let Err(err) = self.messaging.push(user_id, package, sticker).await {
            warn!(error = %err, user_id, "cancellation push failed");
        }
    }
}
