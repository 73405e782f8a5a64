use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{DonationKey, KeyStatus};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateKeyRequest {
    pub payment_method: String,
}

/// Issues a transaction key for the payment modal. The donor is asked
/// to put the token in their transfer note.
pub async fn create_key(
    State(state): State<AppState>,
    Json(req): Json<CreateKeyRequest>,
) -> impl IntoResponse {
    let payment_method = req.payment_method.trim().to_string();
    if payment_method.is_empty() {
        return (StatusCode::BAD_REQUEST, "Payment method required").into_response();
    }

    let key = DonationKey {
        id: Uuid::new_v4().to_string(),
        unique_key: Uuid::new_v4().to_string(),
        payment_method,
        created_at: chrono::Utc::now(),
        status: KeyStatus::Pending,
    };

    if let Err(e) = crate::db::add_donation_key(&state.db, &key).await {
        tracing::error!("DB Error: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response();
    }

    (StatusCode::CREATED, AxumJson(key)).into_response()
}

#[derive(Deserialize)]
pub struct VerifyKeyRequest {
    pub transaction_key: String,
}

/// Exact-match lookup of a reported transaction key. Looking a key up
/// does not move it to `verified`; the stored status is returned as-is.
pub async fn verify_key(
    State(state): State<AppState>,
    Json(req): Json<VerifyKeyRequest>,
) -> impl IntoResponse {
    match crate::db::find_donation_key(&state.db, req.transaction_key.trim()).await {
        Ok(Some(key)) => AxumJson(serde_json::json!({
            "valid": true,
            "payment_method": key.payment_method,
            "status": key.status,
        }))
        .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Invalid transaction key").into_response(),
        Err(e) => {
            tracing::error!("Key lookup error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
        }
    }
}
