use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tech_helper::{
    ai::{MockChatClient, OpenAiChatClient},
    helper::Helper,
    reply::HelpReply,
    server,
};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "tech-helper-test-boundary";
const MAX_UPLOAD: usize = 1024 * 1024;

const BLACK_SCREEN_FIX: &str = r#"{"type":"guided_fix","title":"Fix black screen","diagnosis":"Laptop may be asleep.","steps":[{"step":1,"text":"Press any key."}],"followup_question":"Did the screen turn on?"}"#;
const FALLBACK_BODY: &str = r#"{"type":"chat","message":"Sorry, something went wrong. Try again?"}"#;

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post_form(uri: &str, parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::ORIGIN, "https://helper.example")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn black_screen_parts() -> Vec<Part<'static>> {
    vec![
        Part::Text("message", "My screen is black"),
        Part::Text("mode", "step_by_step"),
        Part::Text("device", "laptop"),
        Part::Text("topic", "display"),
    ]
}

fn app_with(mock: &MockChatClient) -> Router {
    server::router(Helper::new(Box::new(mock.clone())), MAX_UPLOAD)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_black_screen_example_returns_guided_fix() {
    let mock = MockChatClient::new().with_response(BLACK_SCREEN_FIX);

    let response = app_with(&mock)
        .oneshot(post_form("/api", &black_screen_parts()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
    assert_eq!(body_string(response).await, BLACK_SCREEN_FIX);
    assert_eq!(mock.get_call_count(), 1);

    let payloads = mock.payloads();
    let payload = &payloads[0];
    assert_eq!(
        payload.text,
        "User: My screen is black\nDevice: laptop\nMode: step_by_step\nTopic: display"
    );
    assert!(payload.image.is_none());
}

#[tokio::test]
async fn test_provider_error_returns_500_with_fallback() {
    let mock = MockChatClient::new().with_failure("connection reset");

    let response = app_with(&mock)
        .oneshot(post_form("/", &black_screen_parts()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, FALLBACK_BODY);
}

#[tokio::test]
async fn test_unparseable_reply_returns_fallback() {
    let mock = MockChatClient::new().with_response("I think you should restart.");

    let response = app_with(&mock)
        .oneshot(post_form("/api", &black_screen_parts()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, FALLBACK_BODY);
}

#[tokio::test]
async fn test_get_is_rejected_without_provider_call() {
    let mock = MockChatClient::new();

    let response = app_with(&mock)
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"Method not allowed"}"#
    );
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_options_returns_empty_success() {
    let mock = MockChatClient::new();

    let response = app_with(&mock)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.is_empty());
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_cors_preflight_allows_post_from_any_origin() {
    let mock = MockChatClient::new();

    let response = app_with(&mock)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api")
                .header(header::ORIGIN, "https://helper.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("OPTIONS"));
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_missing_fields_are_defaulted() {
    let mock = MockChatClient::new();

    let response = app_with(&mock)
        .oneshot(post_form("/api", &[Part::Text("message", "Where is my email?")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        mock.payloads()[0].text,
        "User: Where is my email?\nDevice: unknown\nMode: step_by_step\nTopic: "
    );
}

#[tokio::test]
async fn test_repeated_field_keeps_first_and_unknown_fields_are_ignored() {
    let mock = MockChatClient::new();

    let response = app_with(&mock)
        .oneshot(post_form(
            "/api",
            &[
                Part::Text("message", "first"),
                Part::Text("message", "second"),
                Part::Text("junk", "x"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        mock.payloads()[0].text,
        "User: first\nDevice: unknown\nMode: step_by_step\nTopic: "
    );
}

#[tokio::test]
async fn test_well_formed_reply_with_empty_text_is_passed_through() {
    let mock = MockChatClient::new().with_response(r#"{"type":"chat","message":""}"#);

    let response = app_with(&mock)
        .oneshot(post_form("/api", &black_screen_parts()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"type":"chat","message":""}"#);
}

#[tokio::test]
async fn test_screenshot_mime_type_is_forwarded() {
    let mock = MockChatClient::new();
    let mut parts = black_screen_parts();
    parts.push(Part::File {
        name: "screenshot",
        file_name: "screen.webp",
        content_type: "image/webp",
        bytes: &[1, 2, 3],
    });

    let response = app_with(&mock)
        .oneshot(post_form("/api", &parts))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payloads = mock.payloads();
    let payload = &payloads[0];
    let image = payload.image.as_ref().expect("image reference");
    assert_eq!(image.mime_type, "image/webp");
    assert_eq!(image.data_url, "data:image/webp;base64,AQID");
    assert!(payload.text.contains("Analyze the uploaded screenshot"));
}

#[tokio::test]
async fn test_non_multipart_post_returns_fallback() {
    let mock = MockChatClient::new();

    let response = app_with(&mock)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, FALLBACK_BODY);
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_oversized_upload_returns_fallback() {
    let mock = MockChatClient::new();
    let app = server::router(Helper::new(Box::new(mock.clone())), 64);
    let big = vec![0u8; 1024];

    let response = app
        .oneshot(post_form(
            "/api",
            &[Part::File {
                name: "screenshot",
                file_name: "big.png",
                content_type: "image/png",
                bytes: &big,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, FALLBACK_BODY);
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_full_stack_against_fake_openai() {
    let openai = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": format!("```json\n{}\n```", BLACK_SCREEN_FIX)
                },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&openai)
        .await;

    let chat = OpenAiChatClient::new(
        "test-key".to_string(),
        "gpt-4o".to_string(),
        openai.uri(),
        Duration::from_secs(5),
    )
    .unwrap();
    let app = server::router(Helper::new(Box::new(chat)), MAX_UPLOAD);

    let response = app
        .oneshot(post_form("/api", &black_screen_parts()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reply: HelpReply = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(reply, HelpReply::parse(BLACK_SCREEN_FIX).unwrap());
}
