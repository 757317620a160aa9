//! Gemini client against a mock Generative Language endpoint

use kodegen_tools_authdetect::config::ApiKey;
use kodegen_tools_authdetect::detector::{GeminiClient, VisionModel};
use kodegen_tools_authdetect::AuthDetectError;
use mockito::{Matcher, Server};

const PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn client(base_url: &str) -> GeminiClient {
    GeminiClient::new(ApiKey::new("test-key"), "gemini-2.0-flash", base_url).unwrap()
}

#[tokio::test]
async fn test_generate_joins_candidate_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::Regex(r#""maxOutputTokens":4096"#.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"components\":"},{"text":"[]}"}]},"finishReason":"STOP"}]}"#,
        )
        .create_async()
        .await;

    let text = client(&server.url()).generate("find the login", None).await.unwrap();

    assert_eq!(text, r#"{"components":[]}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_screenshot_sent_as_inline_jpeg() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .match_body(Matcher::Regex(
            r#""inline_data":\{"mime_type":"image/jpeg","data":"/9j/"#.into(),
        ))
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#)
        .create_async()
        .await;

    let jpeg_magic = [0xFF_u8, 0xD8, 0xFF];
    let text = client(&format!("{}/", server.url()))
        .generate("look", Some(&jpeg_magic))
        .await
        .unwrap();

    assert_eq!(text, "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_error_carries_api_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#)
        .create_async()
        .await;

    let err = client(&server.url()).generate("x", None).await.unwrap_err();

    match err {
        AuthDetectError::AiRequest(message) => {
            assert_eq!(message, "HTTP 403: API key not valid");
        }
        other => panic!("expected AiRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_candidates_is_a_response_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
        .create_async()
        .await;

    let err = client(&server.url()).generate("x", None).await.unwrap_err();
    assert!(matches!(err, AuthDetectError::AiResponse(_)), "{err:?}");
}

#[tokio::test]
async fn test_blank_text_reports_finish_reason() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]},"finishReason":"MAX_TOKENS"}]}"#)
        .create_async()
        .await;

    let err = client(&server.url()).generate("x", None).await.unwrap_err();
    assert!(err.to_string().contains("MAX_TOKENS"), "{err}");
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_request_error() {
    // Nothing listens on port 9 locally
    let err = client("http://127.0.0.1:9").generate("x", None).await.unwrap_err();
    assert!(matches!(err, AuthDetectError::AiRequest(_)), "{err:?}");
    assert!(err.is_transient());
}
