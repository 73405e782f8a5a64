use axum::{
    http::{header, HeaderValue},
    routing::{get, post, put},
    Router,
};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devaid::theme::{ThemeMode, ThemeStore};
use devaid::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if it exists
    dotenvy::dotenv().ok();

    // Initialize Tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "devaid=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DevAid donation tracker...");

    // Database Setup
    tracing::info!("Initializing database connection pool...");
    let db_pool = db::init_pool().await?;
    tracing::info!("Database connection pool initialized successfully");

    let theme = ThemeStore::new(
        env::var("THEME_MODE")
            .map(|v| ThemeMode::parse_lenient(&v))
            .unwrap_or(ThemeMode::Light),
    );

    let cert_template_path = PathBuf::from(
        env::var("CERT_TEMPLATE_PATH").unwrap_or_else(|_| "assets/certificate.pdf".to_string()),
    );
    if !cert_template_path.exists() {
        tracing::warn!(
            "certificate template missing at {}; certificate downloads will fail until it is provided",
            cert_template_path.display()
        );
    }

    let state = AppState {
        db: db_pool,
        theme,
        cert_template_path,
    };

    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(
                env::var("RATE_LIMIT_PER_SECOND")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1200),
            )
            .burst_size(
                env::var("RATE_LIMIT_BURST")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(2400),
            )
            .finish()
            .expect("governor config"),
    );

    // CORS configuration (no permissive mode)
    let cors = {
        let env_mode = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let origins = env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|v| {
                v.split(',')
                    .filter_map(|s| {
                        let trimmed = s.trim();
                        if trimmed.is_empty() {
                            return None;
                        }
                        match trimmed.parse::<HeaderValue>() {
                            Ok(value) => Some(value),
                            Err(_) => {
                                tracing::warn!("Ignoring invalid ALLOWED_ORIGINS entry: {}", trimmed);
                                None
                            }
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let origins = if origins.is_empty() {
            if env_mode == "production" {
                panic!("ALLOWED_ORIGINS must contain at least one valid origin in production")
            }
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        } else {
            origins
        };

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    };

    // Router Setup
    let app = Router::new()
        .route("/health", get(health_check))
        // Public API
        .route("/api/stats", get(routes::stats::get_stats))
        .route(
            "/api/donations",
            get(routes::donations::list_donations).post(routes::donations::create_donation),
        )
        .route("/api/donations/export", get(routes::reports::export_csv))
        .route(
            "/api/donations/{id}",
            put(routes::donations::update_donation).delete(routes::donations::delete_donation),
        )
        .route(
            "/api/donations/{id}/certificate",
            get(routes::certificates::donation_certificate),
        )
        // Donated-back records (admin dashboard)
        .route(
            "/api/donated-back",
            get(routes::donated_back::list_donated_back)
                .post(routes::donated_back::create_donated_back),
        )
        .route(
            "/api/donated-back/{id}",
            put(routes::donated_back::update_donated_back)
                .delete(routes::donated_back::delete_donated_back),
        )
        // Payment-modal transaction keys
        .route("/api/keys", post(routes::keys::create_key))
        .route("/api/keys/verify", post(routes::keys::verify_key))
        // Theme store
        .route("/api/theme", get(routes::theme::get_theme))
        .route("/api/theme/toggle", post(routes::theme::toggle_theme))
        .fallback_service(ServeDir::new("static"))
        .layer(cors)
        .layer(GovernorLayer::new(governor_config))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}

async fn health_check() -> &'static str {
    "OK"
}
