use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Donation;
use crate::db::page::{self, Cursor, PageStart};
use crate::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    /// Opaque cursor: resume strictly after this row (next page).
    pub after: Option<String>,
    /// Opaque anchor: resume at this row inclusively (previous-page
    /// approximation; forward scan from the anchor).
    pub at: Option<String>,
    pub limit: Option<u32>,
    /// Substring filter over donor name / composite key. Filtered views
    /// scan the whole collection and disable paging.
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct DonationPage {
    pub donations: Vec<Donation>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
}

pub async fn list_donations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
        return match crate::db::search_donations(&state.db, q.trim()).await {
            Ok(donations) => AxumJson(DonationPage {
                donations,
                has_more: false,
                next_cursor: None,
                prev_cursor: None,
            })
            .into_response(),
            Err(e) => {
                tracing::error!("DB Query Error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
            }
        };
    }

    let start = match (&params.after, &params.at) {
        (Some(token), _) => match page::decode_cursor(token) {
            Ok(cursor) => PageStart::After(cursor),
            Err(e) => {
                tracing::warn!("rejected cursor token: {}", e);
                return (StatusCode::BAD_REQUEST, "Invalid cursor").into_response();
            }
        },
        (None, Some(token)) => match page::decode_cursor(token) {
            Ok(anchor) => PageStart::At(anchor),
            Err(e) => {
                tracing::warn!("rejected anchor token: {}", e);
                return (StatusCode::BAD_REQUEST, "Invalid cursor").into_response();
            }
        },
        (None, None) => PageStart::First,
    };

    let limit = page::clamp_page_size(params.limit);
    match crate::db::page_donations(&state.db, &start, limit).await {
        Ok(donations) => {
            // Exactly a full page means "try one more page", not "more
            // definitely exists".
            let has_more = donations.len() as u32 == limit;
            let next_cursor = donations
                .last()
                .map(Cursor::for_donation)
                .and_then(|c| page::encode_cursor(&c).ok());
            let prev_cursor = donations
                .first()
                .map(Cursor::for_donation)
                .and_then(|c| page::encode_cursor(&c).ok());
            AxumJson(DonationPage {
                donations,
                has_more,
                next_cursor,
                prev_cursor,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!("DB Query Error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct CreateDonationRequest {
    pub name: Option<String>,
    pub amount: f64,
    pub donated_at: Option<String>,
}

pub async fn create_donation(
    State(state): State<AppState>,
    Json(req): Json<CreateDonationRequest>,
) -> impl IntoResponse {
    if !req.amount.is_finite() || req.amount < 0.0 {
        return (StatusCode::BAD_REQUEST, "Amount must be non-negative").into_response();
    }

    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Anonymous".to_string());

    let id = Uuid::new_v4().to_string();
    // Admin-form inserts stamp a fresh token; no uniqueness check runs
    // on this path (only the importer deduplicates).
    let composite_key = Some(Uuid::new_v4().to_string());

    if let Err(e) = crate::db::add_donation(
        &state.db,
        &id,
        &name,
        req.amount,
        &composite_key,
        &req.donated_at,
        chrono::Utc::now(),
    )
    .await
    {
        tracing::error!("DB Error: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response();
    }

    (
        StatusCode::CREATED,
        AxumJson(serde_json::json!({ "status": "created", "id": id })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct UpdateDonationRequest {
    pub name: Option<String>,
    pub amount: Option<f64>,
}

pub async fn update_donation(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateDonationRequest>,
) -> impl IntoResponse {
    if let Some(amount) = req.amount {
        if !amount.is_finite() || amount < 0.0 {
            return (StatusCode::BAD_REQUEST, "Amount must be non-negative").into_response();
        }
    }

    match crate::db::update_donation(&state.db, &id, req.name.as_deref(), req.amount).await {
        Ok(true) => (
            StatusCode::OK,
            AxumJson(serde_json::json!({ "status": "updated", "id": id })),
        )
            .into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::error!("Update donation error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
        }
    }
}

pub async fn delete_donation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match crate::db::delete_donation(&state.db, &id).await {
        Ok(true) => (StatusCode::OK, "Deleted").into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::error!("Delete donation error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
        }
    }
}
