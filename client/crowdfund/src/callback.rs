//! Payment redirect listener.
//!
//! The payment processor sends the donor's browser back to `/thank-you` or
//! `/unverified-payment` with `?reference=` (or `?trxref=`). Both routes
//! verify the payment through the donation store.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::models::Donation;
use crate::stores::donations::{DonationStore, PaymentReturn};

#[derive(Clone)]
pub struct CallbackState {
    pub donations: DonationStore,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct VerifiedResponse {
    pub status: String,
    pub donation: Donation,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn router(state: Arc<CallbackState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/thank-you", get(thank_you))
        .route("/unverified-payment", get(unverified_payment))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /thank-you?reference=…`
pub async fn thank_you(
    State(state): State<Arc<CallbackState>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    verify(&state, &query, "verified").await
}

/// `GET /unverified-payment?reference=…`
pub async fn unverified_payment(
    State(state): State<Arc<CallbackState>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    verify(&state, &query, "unverified").await
}

/// `status` echoes the backend's donation status, falling back to what the
/// processor's choice of route implies.
async fn verify(
    state: &CallbackState,
    query: &HashMap<String, String>,
    fallback_status: &str,
) -> axum::response::Response {
    let Some(payment) = PaymentReturn::from_query(query) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Payment reference is missing".to_string(),
            }),
        )
            .into_response();
    };

    match state.donations.verify_transaction(&payment.reference).await {
        Ok(donation) => {
            info!("Payment {} verified", payment.reference);
            let status = donation
                .status
                .clone()
                .unwrap_or_else(|| fallback_status.to_string());
            (StatusCode::OK, Json(VerifiedResponse { status, donation })).into_response()
        }
        Err(e) => {
            warn!("Verification of payment {} failed: {e}", payment.reference);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
