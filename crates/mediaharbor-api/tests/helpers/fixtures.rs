use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use serde_json::Value;

/// 1x1 PNG
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 dimensions
        0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49,
        0x44, 0x41, 0x54, // IDAT chunk
        0x08, 0xD7, 0x63, 0xF8, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD,
        0x8D, 0x89, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60,
        0x82, // IEND chunk
    ]
}

/// Single-file form under the given field name
pub fn file_form(field: &str, data: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        field,
        Part::bytes(Bytes::from(data))
            .file_name(file_name)
            .mime_type(mime_type),
    )
}

/// Form carrying one file under `mediaFile`
pub fn media_form(data: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    file_form("mediaFile", data, file_name, mime_type)
}

/// Upload a file and return the created media record
pub async fn upload(client: &TestServer, data: Vec<u8>, file_name: &str, mime_type: &str) -> Value {
    let response = client
        .post("/api/media/upload")
        .multipart(media_form(data, file_name, mime_type))
        .await;

    assert_eq!(response.status_code(), 201, "upload failed: {}", response.text());
    let body: Value = response.json();
    body["media"].clone()
}
