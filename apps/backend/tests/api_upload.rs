//! Image upload API tests.

mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use pretty_assertions::assert_eq;
use serde_json::Value;

use common::fixtures;
use common::TestContext;

fn image_form(name: &str, mime: &str, bytes: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes.to_vec()).file_name(name).mime_type(mime),
    )
}

/// Test an uploaded image is stored, recorded and served back.
#[tokio::test]
async fn test_upload_image() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/upload")
        .multipart(image_form("Homework Page.PNG", "image/png", fixtures::PNG_BYTES))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["image"]["filename"], "Homework Page.PNG");
    assert_eq!(body["image"]["mime_type"], "image/png");
    assert_eq!(body["image"]["size"], fixtures::PNG_BYTES.len() as i64);

    let filepath = body["image"]["filepath"].as_str().unwrap();
    assert!(filepath.starts_with("/uploads/"));
    assert!(filepath.ends_with(".png"));

    let stored_name = filepath.trim_start_matches("/uploads/");
    assert!(ctx.upload_path().join(stored_name).exists());

    let served = server.get(filepath).await;
    served.assert_status_ok();
    assert_eq!(served.as_bytes().as_ref(), fixtures::PNG_BYTES);

    let id = body["image"]["id"].as_i64().unwrap();
    assert!(ctx.db.get_image(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/upload")
        .multipart(image_form("notes.txt", "text/plain", b"plain text"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.count_rows("images").await, 0);
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let form = MultipartForm::new().add_text("comment", "no file here");
    let response = server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Bad request: No file uploaded");
}

#[tokio::test]
async fn test_list_images() {
    let ctx = TestContext::new().await;
    let first = ctx.create_image("a.png", "image/png", fixtures::PNG_BYTES).await;
    let second = ctx.create_image("b.jpg", "image/jpeg", fixtures::JPEG_BYTES).await;
    let server = ctx.server();

    let response = server.get("/images").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let ids: Vec<i64> = body["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
