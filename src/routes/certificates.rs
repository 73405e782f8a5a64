use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::aggregate;
use crate::certificate;
use crate::AppState;

/// Renders a donor's certificate from the fixed template and offers it
/// as a download. Any failure along the way is reported; no partial
/// file is ever sent.
pub async fn donation_certificate(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let donation = match crate::db::get_donation(&state.db, &id).await {
        Ok(Some(d)) => d,
        Ok(None) => return (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::error!("DB Query Error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response();
        }
    };

    let name = aggregate::display_name(&donation.name);
    let pdf = match certificate::generate_from_file(&state.cert_template_path, name, donation.amount)
    {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Certificate error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate certificate",
            )
                .into_response();
        }
    };

    let file_name = certificate::certificate_file_name(name);
    let disposition = format!("attachment; filename=\"{}\"", file_name);

    let mut resp = Response::new(pdf.into());
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(_) => {
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"certificate.pdf\""),
            );
        }
    }
    resp
}
