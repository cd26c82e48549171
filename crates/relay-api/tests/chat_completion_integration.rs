//! Integration tests for `ApiClient::create_chat_completion()`.
//!
//! Uses a raw TCP test server that answers each connection with a
//! pre-configured HTTP response and records the request it received.

use std::sync::{Arc, Mutex};

use relay_api::ApiClient;
use relay_types::{ApiError, ChatCompletionRequest, ChatMessage, ToolDefinition};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

/// Read one HTTP request: headers, then `Content-Length` bytes of body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Start a server that replies with `response` to every connection.
/// Returns the base URL and the captured raw requests.
async fn start_test_server(response: String) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&requests);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let request = read_request(&mut socket).await;
            captured.lock().unwrap().push(request);
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.flush().await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}/v1"), requests)
}

fn sample_request() -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: "gpt-4o".to_string(),
        messages: vec![ChatMessage::user("find papers about physics")],
        tools: vec![ToolDefinition::function(
            "search_papers",
            "Search arXiv",
            serde_json::json!({"type": "object", "properties": {"topic": {"type": "string"}}}),
        )],
        max_tokens: 2024,
    }
}

#[tokio::test]
async fn successful_completion_is_decoded() {
    let body = r#"{
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{"id": "call_1", "type": "function",
                                "function": {"name": "search_papers", "arguments": "{\"topic\":\"physics\"}"}}]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 7, "total_tokens": 27}
    }"#;
    let (base_url, requests) = start_test_server(http_response("200 OK", body)).await;

    let client = ApiClient::new("sk-test", &base_url).unwrap();
    let response = client
        .create_chat_completion(&sample_request())
        .await
        .unwrap();

    let message = response.first_message().unwrap();
    assert_eq!(message.tool_calls.len(), 1);
    assert_eq!(message.tool_calls[0].function.name, "search_papers");
    assert_eq!(response.usage.unwrap().total_tokens, 27);

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let raw = &requests[0];
    assert!(raw.starts_with("POST /v1/chat/completions "), "{raw}");
    assert!(
        raw.to_ascii_lowercase()
            .contains("authorization: bearer sk-test"),
        "{raw}"
    );

    let body_start = raw.find("\r\n\r\n").unwrap() + 4;
    let sent: serde_json::Value = serde_json::from_str(&raw[body_start..]).unwrap();
    assert_eq!(sent["model"], "gpt-4o");
    assert_eq!(sent["max_tokens"], 2024);
    assert_eq!(sent["messages"][0]["role"], "user");
    assert_eq!(sent["tools"][0]["type"], "function");
    assert_eq!(sent["tools"][0]["function"]["name"], "search_papers");
}

#[tokio::test]
async fn unauthorized_is_auth_error_and_not_retried() {
    let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
    let (base_url, requests) = start_test_server(http_response("401 Unauthorized", body)).await;

    let client = ApiClient::new("sk-wrong", &base_url).unwrap();
    let err = client
        .create_chat_completion(&sample_request())
        .await
        .unwrap_err();

    match err {
        ApiError::Auth { message } => assert_eq!(message, "Incorrect API key provided"),
        other => panic!("Expected Auth, got {other:?}"),
    }
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let body = r#"{"error":{"message":"internal error"}}"#;
    let (base_url, requests) =
        start_test_server(http_response("500 Internal Server Error", body)).await;

    let client = ApiClient::new("sk-test", &base_url).unwrap();
    let err = client
        .create_chat_completion(&sample_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 500, .. }));
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new("sk-test", format!("http://{addr}/v1")).unwrap();
    let err = client
        .create_chat_completion(&sample_request())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "{err:?}");
}
