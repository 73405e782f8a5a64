use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

pub async fn get_theme(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "mode": state.theme.current() }))
}

pub async fn toggle_theme(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "mode": state.theme.toggle() }))
}
