//! REST client behaviour against a mock HTTP server

use crate::common::*;
use artline::client::state::Flag;
use artline::client::{ApiClient, Config, ImageBackend};
use artline::shared::api::ImageFilter;
use artline::shared::error::ApiError;
use artline::shared::profile::ProfileUpdate;
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_love_sends_target_state_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/images/abc/love"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({ "isLoved": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    let result = client.set_flag("abc", Flag::Love, true).await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn test_save_uses_is_saved_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/images/abc/save"))
        .and(body_json(json!({ "isSaved": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    crate::assert_ok!(client.set_flag("abc", Flag::Save, false).await);
}

#[tokio::test]
async fn test_success_false_is_terminal_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/images/abc/love"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "quota exceeded" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    let error = client.set_flag("abc", Flag::Love, true).await.unwrap_err();

    assert_eq!(error, ApiError::terminal(None, Some("quota exceeded".to_string())));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/images/abc/save"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    let error = client.set_flag("abc", Flag::Save, true).await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert_eq!(
        error.user_message("fallback"),
        "HTTP error 500: Internal Server Error"
    );
}

#[tokio::test]
async fn test_error_body_message_is_preferred() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/images/generate"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "success": false, "message": "Prompt is required" })),
        )
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    let error = client.generate_image("x").await.unwrap_err();

    assert_matches!(error, ApiError::Terminal { status: Some(400), message: Some(ref m) } if m == "Prompt is required");
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/images/abc/love"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    let error = client.set_flag("abc", Flag::Love, true).await.unwrap_err();

    assert_matches!(error, ApiError::MalformedResponse { .. });
    assert_eq!(error.user_message("fallback"), "Unexpected response format");
}

#[tokio::test]
async fn test_unreachable_server_exhausts_retry_budget() {
    let client = api_client(&unreachable_url());

    let error = client.set_flag("abc", Flag::Love, true).await.unwrap_err();

    assert_matches!(error, ApiError::Transport { attempts: 3, .. });
    assert_eq!(error.user_message("fallback"), "Network or parsing error");
}

#[tokio::test]
async fn test_list_uses_filter_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/images"))
        .and(query_param("filter", "loved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "images": [
                {
                    "id": "abc",
                    "image_url": "https://cdn.example.com/abc.png",
                    "prompt": "a cat",
                    "created_at": "2025-01-01T00:00:00Z"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    let images = client.list_images(ImageFilter::Loved).await.unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, "abc");
    assert_eq!(images[0].image_url, "https://cdn.example.com/abc.png");
}

#[tokio::test]
async fn test_generate_returns_url_and_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/images/generate"))
        .and(body_json(json!({ "prompt": "a lighthouse" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "imageUrl": "https://cdn.example.com/img1.png",
            "imageId": "img1"
        })))
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    let generated = client.generate_image("a lighthouse").await.unwrap();

    assert_eq!(generated.image_url, "https://cdn.example.com/img1.png");
    assert_eq!(generated.image_id.as_deref(), Some("img1"));
}

#[tokio::test]
async fn test_delete_image() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/images/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    assert_eq!(client.delete_image("abc").await, Ok(()));
}

#[tokio::test]
async fn test_image_id_is_a_single_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/images/a%2Fb%3Fc/love"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/images/a%2Fb%3Fc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    let client = api_client(&server.uri());

    crate::assert_ok!(client.set_flag("a/b?c", Flag::Love, true).await);
    crate::assert_ok!(client.delete_image("a/b?c").await);
}

#[tokio::test]
async fn test_login_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "jwt-123",
            "user": { "name": "Ada", "email": "ada@example.com", "role": "admin" }
        })))
        .mount(&server)
        .await;

    let mut client = ApiClient::new(Config::from_app(
        artline::shared::config::AppConfig::builder()
            .server_url(server.uri())
            .build()
            .unwrap(),
    ));
    let session = client.login("ada@example.com", "secret").await.unwrap();

    assert_eq!(session.token, "jwt-123");
    assert_eq!(client.config().get_token(), Some("jwt-123"));
    let profile = session.profile.unwrap();
    assert_eq!(profile.name, "Ada");
    assert_eq!(profile.avatar_url, "/placeholder.svg");
}

#[tokio::test]
async fn test_update_profile_sends_camel_case() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/user/profile"))
        .and(body_json(json!({ "avatarUrl": "https://cdn.example.com/me.png" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri());
    let update = ProfileUpdate {
        name: None,
        avatar_url: Some("https://cdn.example.com/me.png".to_string()),
    };
    assert_eq!(client.update_profile(&update).await, Ok(()));
}
