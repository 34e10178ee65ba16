mod helpers;

use helpers::fixtures::{png_bytes, upload};
use helpers::{setup_test_app, TestApp, FAKE_MP3_SIZE, FAKE_PLAYLIST};
use serde_json::Value;

async fn upload_video(app: &TestApp) -> String {
    let media = upload(app.client(), vec![0u8; 128], "clip.mp4", "video/mp4").await;
    media["correlationId"].as_str().unwrap().to_string()
}

async fn upload_audio(app: &TestApp) -> String {
    let media = upload(app.client(), vec![0u8; 128], "song.wav", "audio/wav").await;
    media["correlationId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_stream_video_whole_playlist() {
    let app = setup_test_app().await;
    let cid = upload_video(&app).await;

    let response = app
        .client()
        .get(&format!("/api/media/videos/stream/{}", cid))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("content-type"),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(response.header("accept-ranges"), "bytes");
    assert_eq!(response.text(), FAKE_PLAYLIST);
}

#[tokio::test]
async fn test_stream_video_partial_content() {
    let app = setup_test_app().await;
    let cid = upload_video(&app).await;

    let response = app
        .client()
        .get(&format!("/api/media/videos/stream/{}", cid))
        .add_header("range", "bytes=0-6")
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(
        response.header("content-range"),
        format!("bytes 0-6/{}", FAKE_PLAYLIST.len()).as_str()
    );
    assert_eq!(response.header("content-length"), "7");
    assert_eq!(response.text(), "#EXTM3U");
}

#[tokio::test]
async fn test_stream_video_range_not_satisfiable() {
    let app = setup_test_app().await;
    let cid = upload_video(&app).await;

    let response = app
        .client()
        .get(&format!("/api/media/videos/stream/{}", cid))
        .add_header("range", "bytes=100000-")
        .await;

    assert_eq!(response.status_code(), 416);
    assert_eq!(
        response.header("content-range"),
        format!("bytes */{}", FAKE_PLAYLIST.len()).as_str()
    );
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "RANGE_NOT_SATISFIABLE");
}

#[tokio::test]
async fn test_stream_video_malformed_range_sends_whole_file() {
    let app = setup_test_app().await;
    let cid = upload_video(&app).await;

    let response = app
        .client()
        .get(&format!("/api/media/videos/stream/{}", cid))
        .add_header("range", "bytes=oops")
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), FAKE_PLAYLIST);
}

#[tokio::test]
async fn test_stream_video_unknown_correlation_id() {
    let app = setup_test_app().await;

    for cid in ["00000000-0000-4000-8000-000000000000", "not-a-uuid"] {
        let response = app
            .client()
            .get(&format!("/api/media/videos/stream/{}", cid))
            .await;

        assert_eq!(response.status_code(), 404, "{}", cid);
        let body: Value = response.json();
        assert_eq!(body["message"], "Media not found");
    }
}

#[tokio::test]
async fn test_stream_routes_check_media_type() {
    let app = setup_test_app().await;
    let audio_cid = upload_audio(&app).await;

    let response = app
        .client()
        .get(&format!("/api/media/videos/stream/{}", audio_cid))
        .await;
    assert_eq!(response.status_code(), 404);

    let response = app
        .client()
        .get(&format!("/api/media/images/serve/{}", audio_cid))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_stream_hls_segment() {
    let app = setup_test_app().await;
    let cid = upload_video(&app).await;

    let response = app
        .client()
        .get(&format!("/api/media/videos/stream/{}/segment000.ts", cid))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "video/mp2t");
    assert_eq!(response.header("access-control-allow-origin"), "*");
    assert_eq!(response.as_bytes().len(), 188 * 4);
}

#[tokio::test]
async fn test_stream_hls_missing_segment() {
    let app = setup_test_app().await;
    let cid = upload_video(&app).await;

    let response = app
        .client()
        .get(&format!("/api/media/videos/stream/{}/segment999.ts", cid))
        .await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["message"], "File not found");
}

#[tokio::test]
async fn test_serve_image() {
    let app = setup_test_app().await;
    let media = upload(app.client(), png_bytes(), "cover.png", "image/png").await;
    let cid = media["correlationId"].as_str().unwrap();

    let response = app
        .client()
        .get(&format!("/api/media/images/serve/{}", cid))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/png");
    assert_eq!(response.header("content-disposition"), "inline");
    assert_eq!(response.as_bytes().to_vec(), png_bytes());
}

#[tokio::test]
async fn test_stream_audio() {
    let app = setup_test_app().await;
    let cid = upload_audio(&app).await;

    let response = app
        .client()
        .get(&format!("/api/media/audios/stream/{}", cid))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "audio/mpeg");
    assert_eq!(response.as_bytes().len(), FAKE_MP3_SIZE);
}

#[tokio::test]
async fn test_stream_audio_ranges() {
    let app = setup_test_app().await;
    let cid = upload_audio(&app).await;
    let url = format!("/api/media/audios/stream/{}", cid);

    let response = app.client().get(&url).add_header("range", "bytes=0-99").await;
    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 0-99/1000");
    assert_eq!(response.header("content-type"), "audio/mpeg");
    let expected: Vec<u8> = (0..=255u8).cycle().take(100).collect();
    assert_eq!(response.as_bytes().to_vec(), expected);

    let response = app.client().get(&url).add_header("range", "bytes=-100").await;
    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 900-999/1000");

    let response = app.client().get(&url).add_header("range", "bytes=950-5000").await;
    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 950-999/1000");
    assert_eq!(response.as_bytes().len(), 50);
}

#[tokio::test]
async fn test_static_alias_serves_stored_files() {
    let app = setup_test_app().await;
    let media = upload(app.client(), png_bytes(), "cover.png", "image/png").await;

    let response = app.client().get(media["path"].as_str().unwrap()).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("cache-control"), "public, max-age=86400");
    assert_eq!(response.as_bytes().to_vec(), png_bytes());

    let cid = upload_video(&app).await;
    let response = app
        .client()
        .get(&format!("/uploads/videos/{}/segment000.ts", cid))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_static_video_mount_serves_hls_types() {
    let app = setup_test_app().await;
    let media = upload(app.client(), vec![0u8; 128], "clip.mp4", "video/mp4").await;
    let playlist = media["path"].as_str().unwrap();

    let response = app.client().get(playlist).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("content-type"),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(response.header("access-control-allow-origin"), "*");
    assert_eq!(response.text(), FAKE_PLAYLIST);

    let segment = playlist.replace("index.m3u8", "segment000.ts");
    let response = app.client().get(&segment).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "video/mp2t");
    assert_eq!(response.header("access-control-allow-origin"), "*");

    let response = app.client().get(&playlist.replace("index.m3u8", "missing.ts")).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_staging_area_is_not_served() {
    let app = setup_test_app().await;

    let staged = app.layout.root().join(".staging/images/leftover.png");
    std::fs::create_dir_all(staged.parent().unwrap()).unwrap();
    std::fs::write(&staged, png_bytes()).unwrap();

    let response = app.client().get("/uploads/.staging/images/leftover.png").await;
    assert_eq!(response.status_code(), 404);
}
