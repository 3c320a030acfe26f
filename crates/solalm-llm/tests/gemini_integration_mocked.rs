use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use serde_json::json;
use solalm_llm::{
    FragmentMode, GeminiAdapter, GeminiAdapterConfig, ImageProvider, LlmError, ProviderErrorKind,
    TextFragment, TextFragmentProvider,
};

fn spawn_single_response_server(
    status: u16,
    body: String,
    expected_path: &'static str,
    must_contain: Vec<&'static str>,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let address = listener.local_addr().expect("listener addr");

    thread::spawn(move || {
        let (mut socket, _) = listener.accept().expect("accept");
        let mut buffer = vec![0_u8; 65536];
        let mut request = String::new();
        // Read until the JSON body has fully arrived.
        loop {
            let read = socket.read(&mut buffer).expect("read request");
            request.push_str(&String::from_utf8_lossy(&buffer[..read]));
            if read == 0 || request_complete(&request) {
                break;
            }
        }
        let first_line = request.lines().next().unwrap_or_default().to_string();
        assert!(
            first_line.contains(expected_path),
            "expected path '{}', first line: {}",
            expected_path,
            first_line
        );
        for expected in &must_contain {
            assert!(
                request.contains(expected),
                "expected request to contain '{}', request: {}",
                expected,
                request
            );
        }

        let status_text = match status {
            200 => "OK",
            400 => "Bad Request",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            _ => "OK",
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            status_text,
            body.len(),
            body
        );
        socket
            .write_all(response.as_bytes())
            .expect("write response");
        socket.flush().expect("flush");
    });

    format!("http://{}", address)
}

fn request_complete(request: &str) -> bool {
    let Some((head, body)) = request.split_once("\r\n\r\n") else {
        return false;
    };
    let length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    body.len() >= length
}

fn adapter_for(base_url: String) -> GeminiAdapter {
    let mut config = GeminiAdapterConfig::new("test-key");
    config.base_url = base_url;
    GeminiAdapter::new(config).expect("adapter")
}

#[tokio::test(flavor = "current_thread")]
async fn fetch_parses_structured_fragment() {
    let verse = json!({ "verseText": "Behold, I come quickly", "reference": "Revelation 22:12" });
    let body = json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": verse.to_string() }] },
            "finishReason": "STOP"
        }]
    })
    .to_string();
    let base_url = spawn_single_response_server(
        200,
        body,
        "/models/gemini-2.5-flash:generateContent",
        vec!["x-goog-api-key: test-key", "book of Revelation", "responseSchema"],
    );

    let adapter = adapter_for(base_url);
    let fragment = adapter
        .fetch(FragmentMode::Revelation)
        .await
        .expect("fragment");
    assert_eq!(
        fragment,
        TextFragment::new("Behold, I come quickly", "Revelation 22:12")
    );
}

#[tokio::test(flavor = "current_thread")]
async fn generate_returns_image_handle() {
    let body = json!({
        "predictions": [{ "bytesBase64Encoded": "iVBORw==", "mimeType": "image/png" }]
    })
    .to_string();
    let base_url = spawn_single_response_server(
        200,
        body,
        "/models/imagen-4.0-generate-001:predict",
        vec!["Let there be light", "sampleCount"],
    );

    let adapter = adapter_for(base_url);
    let handle = adapter
        .generate("Let there be light")
        .await
        .expect("image");
    assert_eq!(handle.mime_type, "image/png");
    assert_eq!(handle.decode_bytes().expect("decode"), b"\x89PNG".to_vec());
}

#[tokio::test(flavor = "current_thread")]
async fn generate_with_zero_predictions_fails() {
    let base_url = spawn_single_response_server(
        200,
        json!({ "predictions": [] }).to_string(),
        ":predict",
        vec![],
    );

    let adapter = adapter_for(base_url);
    let err = adapter.generate("anything").await.expect_err("no image");
    assert!(matches!(err, LlmError::NoObjectGenerated(_)));
    assert_eq!(err.to_string(), "No image was generated.");
}

#[tokio::test(flavor = "current_thread")]
async fn generate_rejects_undecodable_payload() {
    let body = json!({
        "predictions": [{ "bytesBase64Encoded": "%%not-base64%%", "mimeType": "image/png" }]
    })
    .to_string();
    let base_url = spawn_single_response_server(200, body, ":predict", vec![]);

    let adapter = adapter_for(base_url);
    let err = adapter.generate("anything").await.expect_err("bad payload");
    match err {
        LlmError::NoObjectGenerated(inner) => {
            assert_eq!(inner.info.message, "image payload is not valid base64");
            assert!(inner.info.cause.is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn http_errors_map_to_provider_errors() {
    let body = json!({
        "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
    })
    .to_string();
    let base_url = spawn_single_response_server(429, body, ":generateContent", vec![]);

    let adapter = adapter_for(base_url);
    match adapter.fetch(FragmentMode::General).await {
        Err(LlmError::Provider(err)) => {
            assert_eq!(err.kind, ProviderErrorKind::RateLimit);
            assert_eq!(err.status_code, Some(429));
            assert!(err.retryable);
            assert_eq!(err.info.message, "Resource has been exhausted");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn unreachable_service_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("addr");
    drop(listener);

    let adapter = adapter_for(format!("http://{}", address));
    let err = adapter
        .fetch(FragmentMode::General)
        .await
        .expect_err("connection refused");
    assert!(matches!(err, LlmError::Network(_)));
    assert!(err.retryable());
}
