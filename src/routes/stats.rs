use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::aggregate::{self, TopDonor};
use crate::AppState;

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_amount: f64,
    pub total_donors: usize,
    pub donated_back_total: f64,
    pub top_donors: Vec<TopDonor>,
}

/// Home-page and dashboard aggregates, recomputed from full scans on
/// every call.
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let donations = match crate::db::list_donations(&state.db).await {
        Ok(list) => list,
        Err(e) => {
            tracing::error!("DB Query Error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response();
        }
    };

    let donated_back = match crate::db::list_donated_back(&state.db).await {
        Ok(list) => list,
        Err(e) => {
            tracing::error!("DB Query Error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response();
        }
    };

    axum::Json(StatsResponse {
        total_amount: aggregate::total_amount(&donations),
        total_donors: aggregate::unique_donors(&donations),
        donated_back_total: aggregate::donated_back_total(&donated_back),
        top_donors: aggregate::top_donors(&donations),
    })
    .into_response()
}
