mod common;

use avatar_service::models::PLACEHOLDER_IMAGE_URL;
use common::TestApp;
use reqwest::StatusCode;

#[tokio::test]
async fn empty_gallery_has_zero_count() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/avatars").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Avatars fetched successfully");
    assert_eq!(body["count"], 0);
    assert_eq!(body["avatars"], serde_json::json!([]));
}

#[tokio::test]
async fn missing_images_get_placeholder() {
    let app = TestApp::spawn().await;
    let with_image = app
        .seed_avatar("Ada", Some("https://cdn.example.com/ada.jpg"))
        .await;
    let without_image = app.seed_avatar("Grace", None).await;
    let blank_image = app.seed_avatar("Hedy", Some("")).await;

    let body: serde_json::Value = app.get("/api/avatars").await.json().await.unwrap();

    assert_eq!(body["count"], 3);
    let avatars = body["avatars"].as_array().unwrap();
    let image_of = |id: uuid::Uuid| {
        avatars
            .iter()
            .find(|a| a["id"] == id.to_string())
            .map(|a| a["image_url"].clone())
            .unwrap()
    };

    assert_eq!(image_of(with_image.id), "https://cdn.example.com/ada.jpg");
    assert_eq!(image_of(without_image.id), PLACEHOLDER_IMAGE_URL);
    assert_eq!(image_of(blank_image.id), PLACEHOLDER_IMAGE_URL);
}

#[tokio::test]
async fn listing_exposes_gallery_fields_only() {
    let app = TestApp::spawn().await;
    app.seed_avatar("Ada", None).await;

    let body: serde_json::Value = app.get("/api/avatars").await.json().await.unwrap();
    let avatar = body["avatars"][0].as_object().unwrap();

    let mut keys: Vec<&str> = avatar.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["agent_id", "id", "image_url", "name", "system_prompt"]
    );
}
