mod common;

use common::{TestApp, TEST_GOOGLE_KEY, TEST_MODEL};
use reqwest::StatusCode;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generate_path() -> String {
    format!("/v1beta/models/{}:generateContent", TEST_MODEL)
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
}

fn file_json(state: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "files/abc",
        "uri": "https://generativelanguage.example/v1beta/files/abc",
        "mimeType": "video/mp4",
        "state": state
    })
}

/// Mount the resumable upload pair: the start call and the upload session.
async fn mount_upload(server: &MockServer) {
    let session_url = format!("{}/upload-session/abc", server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(header("x-goog-api-key", TEST_GOOGLE_KEY))
        .and(header("x-goog-upload-command", "start"))
        .and(header("x-goog-upload-header-content-type", "video/mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-goog-upload-url", session_url.as_str()),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/abc"))
        .and(header("x-goog-upload-offset", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "file": file_json("PROCESSING") })),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_delete(server: &MockServer) {
    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn generate_prompt_returns_model_text() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .and(header("x-goog-api-key", TEST_GOOGLE_KEY))
        .respond_with(text_response("You are a friendly chemistry tutor."))
        .expect(1)
        .mount(&app.gemini_server)
        .await;

    let response = app
        .post_json(
            "/api/generate-prompt",
            &serde_json::json!({ "knowledge_base": "A friendly chemistry tutor" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "System prompt generated");
    assert_eq!(body["system_prompt"], "You are a friendly chemistry tutor.");

    let requests = app.gemini_server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("\"A friendly chemistry tutor\""));
}

#[tokio::test]
async fn generate_prompt_rejects_empty_knowledge_base() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/generate-prompt",
            &serde_json::json!({ "knowledge_base": "" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn generate_prompt_upstream_failure_is_500() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .mount(&app.gemini_server)
        .await;

    let response = app
        .post_json(
            "/api/generate-prompt",
            &serde_json::json!({ "knowledge_base": "A tutor" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("API key not valid"));
}

#[tokio::test]
async fn blocked_prompt_is_500() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&app.gemini_server)
        .await;

    let response = app
        .post_json(
            "/api/generate-prompt",
            &serde_json::json!({ "knowledge_base": "A tutor" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn video_prompt_uploads_polls_generates_and_deletes() {
    let app = TestApp::spawn().await;

    mount_upload(&app.gemini_server).await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc"))
        .and(header("x-goog-api-key", TEST_GOOGLE_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("ACTIVE")))
        .expect(1)
        .mount(&app.gemini_server)
        .await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(text_response("You are an upbeat travel vlogger."))
        .expect(1)
        .mount(&app.gemini_server)
        .await;

    mount_delete(&app.gemini_server).await;

    let response = app
        .post_file(
            "/api/generate-prompt-from-video",
            "clip.mp4",
            "video/mp4",
            vec![7u8; 2048],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["system_prompt"], "You are an upbeat travel vlogger.");

    let requests = app.gemini_server.received_requests().await.unwrap();

    let uploaded = requests
        .iter()
        .find(|r| r.url.path() == "/upload-session/abc")
        .unwrap();
    assert_eq!(uploaded.body.len(), 2048);

    let generate = requests
        .iter()
        .find(|r| r.url.path() == generate_path())
        .unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&generate.body).unwrap();
    assert_eq!(
        sent["contents"][0]["parts"][0]["fileData"]["fileUri"],
        "https://generativelanguage.example/v1beta/files/abc"
    );
    assert_eq!(
        sent["contents"][0]["parts"][0]["fileData"]["mimeType"],
        "video/mp4"
    );

    assert!(requests.iter().all(|r| r.url.query().is_none()));
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn video_prompt_deletes_remote_file_when_generation_fails() {
    let app = TestApp::spawn().await;

    mount_upload(&app.gemini_server).await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("ACTIVE")))
        .mount(&app.gemini_server)
        .await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&app.gemini_server)
        .await;

    mount_delete(&app.gemini_server).await;

    let response = app
        .post_file(
            "/api/generate-prompt-from-video",
            "clip.mp4",
            "video/mp4",
            vec![7u8; 512],
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn video_prompt_failed_processing_is_500_and_cleans_up() {
    let app = TestApp::spawn().await;

    mount_upload(&app.gemini_server).await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("FAILED")))
        .mount(&app.gemini_server)
        .await;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(text_response("unused"))
        .expect(0)
        .mount(&app.gemini_server)
        .await;

    mount_delete(&app.gemini_server).await;

    let response = app
        .post_file(
            "/api/generate-prompt-from-video",
            "clip.mp4",
            "video/mp4",
            vec![7u8; 512],
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("failed processing"));
}

#[tokio::test]
async fn video_prompt_times_out_when_file_never_activates() {
    let app = TestApp::spawn_with(|config| {
        config.gemini.file_poll_interval_ms = 50;
        config.gemini.file_poll_timeout_secs = 1;
    })
    .await;

    mount_upload(&app.gemini_server).await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("PROCESSING")))
        .mount(&app.gemini_server)
        .await;

    mount_delete(&app.gemini_server).await;

    let response = app
        .post_file(
            "/api/generate-prompt-from-video",
            "clip.mp4",
            "video/mp4",
            vec![7u8; 512],
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["details"].as_str().unwrap().contains("not ready"));
}

#[tokio::test]
async fn video_upload_rejection_skips_delete() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(413).set_body_string("file too large"))
        .mount(&app.gemini_server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.gemini_server)
        .await;

    let response = app
        .post_file(
            "/api/generate-prompt-from-video",
            "clip.mp4",
            "video/mp4",
            vec![7u8; 512],
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn unreachable_gemini_error_does_not_expose_api_key() {
    let app = TestApp::spawn_with(|config| {
        config.gemini.api_base_url = "http://127.0.0.1:1".to_string();
    })
    .await;

    let response = app
        .post_json(
            "/api/generate-prompt",
            &serde_json::json!({ "knowledge_base": "A tutor" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await.unwrap();
    assert!(!body.contains(TEST_GOOGLE_KEY));
    assert!(!body.contains("key="));
}
