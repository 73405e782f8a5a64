use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{DonatedBack, ItemType};
use crate::AppState;

fn normalize_item_type(input: &Option<String>) -> Option<ItemType> {
    input
        .as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(ItemType::parse_lenient)
}

pub async fn list_donated_back(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::list_donated_back(&state.db).await {
        Ok(records) => {
            AxumJson(serde_json::json!({ "donated_back": records })).into_response()
        }
        Err(e) => {
            tracing::error!("DB Query Error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct CreateDonatedBackRequest {
    pub organization_name: String,
    pub count: i64,
    pub items: String,
    pub type_of_items: Option<String>,
    pub total: f64,
    pub location: Option<String>,
}

pub async fn create_donated_back(
    State(state): State<AppState>,
    Json(req): Json<CreateDonatedBackRequest>,
) -> impl IntoResponse {
    if req.organization_name.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Organization name required").into_response();
    }
    if !req.total.is_finite() || req.total < 0.0 || req.count < 0 {
        return (StatusCode::BAD_REQUEST, "Count and total must be non-negative").into_response();
    }

    let record = DonatedBack {
        id: Uuid::new_v4().to_string(),
        organization_name: req.organization_name.trim().to_string(),
        count: req.count,
        items: req.items,
        type_of_items: normalize_item_type(&req.type_of_items).unwrap_or(ItemType::Material),
        total: req.total,
        location: req.location.filter(|l| !l.trim().is_empty()),
        created_at: chrono::Utc::now(),
    };

    if let Err(e) = crate::db::add_donated_back(&state.db, &record).await {
        tracing::error!("DB Error: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response();
    }

    (
        StatusCode::CREATED,
        AxumJson(serde_json::json!({ "status": "created", "id": record.id })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct UpdateDonatedBackRequest {
    pub organization_name: Option<String>,
    pub count: Option<i64>,
    pub items: Option<String>,
    pub type_of_items: Option<String>,
    pub total: Option<f64>,
    pub location: Option<String>,
}

pub async fn update_donated_back(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateDonatedBackRequest>,
) -> impl IntoResponse {
    if let Some(total) = req.total {
        if !total.is_finite() || total < 0.0 {
            return (StatusCode::BAD_REQUEST, "Total must be non-negative").into_response();
        }
    }
    if matches!(req.count, Some(count) if count < 0) {
        return (StatusCode::BAD_REQUEST, "Count must be non-negative").into_response();
    }

    match crate::db::update_donated_back(
        &state.db,
        &id,
        req.organization_name.as_deref(),
        req.count,
        req.items.as_deref(),
        normalize_item_type(&req.type_of_items),
        req.total,
        &req.location,
    )
    .await
    {
        Ok(true) => (
            StatusCode::OK,
            AxumJson(serde_json::json!({ "status": "updated", "id": id })),
        )
            .into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::error!("Update donated-back error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
        }
    }
}

pub async fn delete_donated_back(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match crate::db::delete_donated_back(&state.db, &id).await {
        Ok(true) => (StatusCode::OK, "Deleted").into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::error!("Delete donated-back error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
        }
    }
}
