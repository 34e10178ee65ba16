//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers::{health, media_get, media_stream, media_upload};
use crate::middleware::{
    rate_limit::{rate_limit_middleware, HttpRateLimiter},
    security_headers::{
        allow_any_origin_middleware, hls_static_headers_middleware, prevent_download_middleware,
        security_headers_middleware, SecurityHeadersConfig,
    },
};
use crate::state::AppState;
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use mediaharbor_core::{Config, MediaType};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::{SetResponseHeader, SetResponseHeaderLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

const STATIC_CACHE_CONTROL: &str = "public, max-age=86400";
const MAX_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let rate_limiter = setup_rate_limiter(config);
    let security_headers_config = Arc::new(SecurityHeadersConfig::new(config.is_production()));
    let body_limit = state.intake.max_upload_size_bytes;

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(media_routes())
        .merge(RapiDoc::new("/api/openapi.json").path("/docs"));

    for media_type in MediaType::ALL {
        let mount = format!("/{}", state.layout.alias(media_type));
        tracing::debug!(mount = %mount, media_type = %media_type, "Serving static media");
        let files = static_media(state.layout.media_root(media_type));
        app = match media_type {
            MediaType::Video => app.nest_service(
                &mount,
                ServiceBuilder::new()
                    .layer(from_fn(hls_static_headers_middleware))
                    .service(files),
            ),
            MediaType::Image | MediaType::Audio => app.nest_service(&mount, files),
        };
    }

    let app = app
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(
            security_headers_config,
            security_headers_middleware,
        ))
        .layer(from_fn_with_state(rate_limiter, rate_limit_middleware))
        .with_state(state);

    Ok(app)
}

/// Routes under `/api/media`
fn media_routes() -> Router<Arc<AppState>> {
    let upload = Router::new()
        .route("/api/media/upload", post(media_upload::upload_media))
        .route_layer(from_fn(allow_any_origin_middleware));

    let read = Router::new()
        .route("/api/media", get(media_get::list_media))
        .route("/api/media/{id}", get(media_get::get_media))
        .route(
            "/api/media/videos/stream/{correlation_id}",
            get(media_stream::stream_video),
        )
        .route(
            "/api/media/videos/stream/{correlation_id}/{file}",
            get(media_stream::stream_hls_asset).layer(from_fn(allow_any_origin_middleware)),
        )
        .route(
            "/api/media/images/serve/{correlation_id}",
            get(media_stream::serve_image),
        )
        .route(
            "/api/media/audios/stream/{correlation_id}",
            get(media_stream::stream_audio),
        )
        .route_layer(from_fn(prevent_download_middleware));

    upload.merge(read)
}

/// Static files of one media category with a one-day cache lifetime.
fn static_media(root: PathBuf) -> SetResponseHeader<ServeDir, HeaderValue> {
    ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(STATIC_CACHE_CONTROL),
        ))
        .service(ServeDir::new(root))
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let exposed = [
        header::CONTENT_RANGE,
        header::ACCEPT_RANGES,
        header::CONTENT_LENGTH,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .expose_headers(exposed)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .context("CORS_ORIGIN contains an invalid origin")?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::RANGE, header::AUTHORIZATION])
            .expose_headers(exposed)
            .allow_credentials(true)
    };
    Ok(cors)
}

/// Setup rate limiter with periodic cleanup task
fn setup_rate_limiter(config: &Config) -> Arc<HttpRateLimiter> {
    let window = Duration::from_secs(config.rate_limit_window_secs().max(1));
    let rate_limiter = Arc::new(HttpRateLimiter::new(config.rate_limit_max(), window));

    let rate_limiter_for_cleanup = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(window.min(MAX_CLEANUP_INTERVAL));
        loop {
            interval.tick().await;
            rate_limiter_for_cleanup.cleanup_expired_buckets().await;
        }
    });

    tracing::info!(
        limit = config.rate_limit_max(),
        window_secs = window.as_secs(),
        "HTTP rate limiting enabled"
    );
    rate_limiter
}
