use axum::{extract::State, http::StatusCode, response::IntoResponse};
use axum::http::{header, HeaderValue};
use axum::response::Response;

use crate::aggregate;
use crate::AppState;

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        let escaped = s.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}

/// Full donations listing as a CSV attachment.
pub async fn export_csv(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::list_donations(&state.db).await {
        Ok(list) => {
            let mut w = String::new();
            w.push_str("Name,Amount,Date,Composite Key\n");
            for d in list {
                let name = aggregate::display_name(&d.name);
                let amount = format!("{}", d.amount);
                let date = d.donated_at.clone().unwrap_or_else(|| "Not specified".to_string());
                let key = d.composite_key.clone().unwrap_or_else(|| "N/A".to_string());
                w.push_str(&format!(
                    "{},{},{},{}\n",
                    csv_escape(name),
                    csv_escape(&amount),
                    csv_escape(&date),
                    csv_escape(&key),
                ));
            }

            let mut resp = Response::new(w.into());
            let headers = resp.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            );
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=donations.csv"),
            );
            resp
        }
        Err(e) => {
            tracing::error!("DB Query Error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database Error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::csv_escape;

    #[test]
    fn csv_escape_quotes_only_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
