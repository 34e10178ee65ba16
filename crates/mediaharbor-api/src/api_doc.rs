//! OpenAPI documentation served at `/api/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use mediaharbor_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediaharbor API",
        version = "0.1.0",
        description = "Media hosting API: upload images, audio and video; audio is transcoded to MP3 and video to HLS. Delivery supports HTTP byte ranges."
    ),
    paths(
        handlers::media_upload::upload_media,
        handlers::media_get::list_media,
        handlers::media_get::get_media,
        handlers::media_stream::stream_video,
        handlers::media_stream::stream_hls_asset,
        handlers::media_stream::serve_image,
        handlers::media_stream::stream_audio,
        handlers::health::health_check,
    ),
    components(schemas(
        models::MediaRecord,
        models::MediaType,
        handlers::media_upload::UploadResponse,
        handlers::media_get::MediaListResponse,
        handlers::media_get::MediaResponse,
        handlers::health::HealthCheckResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "media", description = "Upload and query media records"),
        (name = "delivery", description = "Range-aware media delivery"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/media/upload",
            "/api/media",
            "/api/media/{id}",
            "/api/media/videos/stream/{correlation_id}",
            "/api/media/videos/stream/{correlation_id}/{file}",
            "/api/media/images/serve/{correlation_id}",
            "/api/media/audios/stream/{correlation_id}",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
