//! Runs the completion adapter against a local HTTP stub to pin down how many
//! requests reach the upstream when it refuses.

use notes_api_lib::adapters::OpenAiNotesAdapter;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use study_notes_core::{
    build_prompt, ports::NoteGenerationService, NoteRequest, NoteStyle, StudentLevel,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const RATE_LIMIT_BODY: &str = r#"{"error":{"message":"Rate limit reached for model `llama-3.1-8b-instant`","type":"tokens","code":"rate_limit_exceeded"}}"#;
const GATEWAY_BODY: &str = "<html><body><h1>502 Bad Gateway</h1></body></html>";

/// Answers every request with the same status and body and counts the hits.
async fn refusing_upstream(status: &'static str, body: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(serve_one(stream, status, body, counter));
        }
    });

    (addr, hits)
}

/// Reads one request (headers plus `Content-Length` body), counts it and
/// writes the reply.
async fn serve_one(mut stream: TcpStream, status: &str, body: &str, hits: Arc<AtomicUsize>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    hits.fetch_add(1, Ordering::SeqCst);
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn adapter_for(addr: SocketAddr) -> OpenAiNotesAdapter {
    OpenAiNotesAdapter::connect(
        "gsk_test",
        &format!("http://{addr}/openai/v1"),
        "llama-3.1-8b-instant".to_string(),
    )
}

fn prompt() -> study_notes_core::NotePrompt {
    build_prompt(&NoteRequest::new(
        "Mitochondria produce ATP.",
        NoteStyle::QuickRevision,
        StudentLevel::School,
    ))
}

#[tokio::test]
async fn rate_limited_request_is_sent_once() {
    let (addr, hits) = refusing_upstream("429 Too Many Requests", RATE_LIMIT_BODY).await;
    let adapter = adapter_for(addr);

    let result = tokio::time::timeout(Duration::from_secs(5), adapter.generate_notes(&prompt()))
        .await
        .expect("the adapter returned without waiting on a retry loop");

    let err = result.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_error_is_sent_once_and_reported_as_transient() {
    let (addr, hits) = refusing_upstream("502 Bad Gateway", GATEWAY_BODY).await;
    let adapter = adapter_for(addr);

    let result = tokio::time::timeout(Duration::from_secs(5), adapter.generate_notes(&prompt()))
        .await
        .expect("the adapter returned without waiting on a retry loop");

    let err = result.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
