use super::*;
use crate::types::{EventSink, SummaryEvent};
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::post, Router};
use bytes::Bytes;
use futures::stream;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Collects emitted events for later inspection.
#[derive(Clone, Default)]
struct EventCollector {
    events: Arc<Mutex<Vec<SummaryEvent>>>,
}

impl EventCollector {
    fn new() -> Self {
        Self::default()
    }

    fn sink(&self) -> EventSink {
        let events = self.events.clone();
        Box::new(move |event: &SummaryEvent| {
            events.lock().unwrap().push(event.clone());
            Ok(())
        })
    }

    fn events(&self) -> Vec<SummaryEvent> {
        self.events.lock().unwrap().clone()
    }
}

/// Serves the given body chunks for any streamGenerateContent request,
/// returning the bound address.
async fn spawn_mock_server(status: StatusCode, chunks: Vec<&'static str>) -> SocketAddr {
    let app = Router::new().route(
        "/models/:model",
        post(move || async move {
            let body = Body::from_stream(stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes()))),
            ));
            (status, body).into_response()
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn test_client(addr: SocketAddr) -> GeminiClient {
    GeminiClient::with_model(
        "test-key".to_string(),
        "gemini-test".to_string(),
        format!("http://{addr}"),
    )
}

#[tokio::test]
async fn streams_fragments_in_order_then_completes() {
    let addr = spawn_mock_server(
        StatusCode::OK,
        vec![
            r#"[{"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]},"#,
            r#"{"candidates":[{"content":{"parts":[{"text":" world"}]}}]}]"#,
        ],
    )
    .await;

    let collector = EventCollector::new();
    test_client(addr)
        .stream_generate("summarize this", &collector.sink())
        .await
        .unwrap();

    assert_eq!(
        collector.events(),
        vec![
            SummaryEvent::Fragment("Hello".to_string()),
            SummaryEvent::Fragment(" world".to_string()),
            SummaryEvent::Complete,
        ]
    );
}

#[tokio::test]
async fn object_split_across_chunks_yields_one_fragment() {
    let addr = spawn_mock_server(
        StatusCode::OK,
        vec![
            r#"{"candidates":[{"content""#,
            r#":{"parts":[{"text":"Hi"}]}}]}"#,
        ],
    )
    .await;

    let collector = EventCollector::new();
    test_client(addr)
        .stream_generate("summarize this", &collector.sink())
        .await
        .unwrap();

    assert_eq!(
        collector.events(),
        vec![
            SummaryEvent::Fragment("Hi".to_string()),
            SummaryEvent::Complete,
        ]
    );
}

#[tokio::test]
async fn malformed_object_mid_stream_is_absorbed() {
    let addr = spawn_mock_server(
        StatusCode::OK,
        vec![
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#,
            r#"{"candidates": nonsense}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":" world"}]}}]}"#,
        ],
    )
    .await;

    let collector = EventCollector::new();
    test_client(addr)
        .stream_generate("summarize this", &collector.sink())
        .await
        .unwrap();

    // Both neighbors survive and no consumer-visible error is produced.
    assert_eq!(
        collector.events(),
        vec![
            SummaryEvent::Fragment("Hello".to_string()),
            SummaryEvent::Fragment(" world".to_string()),
            SummaryEvent::Complete,
        ]
    );
}

#[tokio::test]
async fn completion_is_emitted_even_without_fragments() {
    let addr = spawn_mock_server(
        StatusCode::OK,
        vec![r#"[{"usageMetadata":{"promptTokenCount":3}}]"#],
    )
    .await;

    let collector = EventCollector::new();
    test_client(addr)
        .stream_generate("summarize this", &collector.sink())
        .await
        .unwrap();

    assert_eq!(collector.events(), vec![SummaryEvent::Complete]);
}

#[tokio::test]
async fn http_error_carries_extracted_message() {
    let addr = spawn_mock_server(
        StatusCode::FORBIDDEN,
        vec![r#"{"error":{"message":"bad key"}}"#],
    )
    .await;

    let collector = EventCollector::new();
    let result = test_client(addr)
        .stream_generate("summarize this", &collector.sink())
        .await;

    let error = result.unwrap_err();
    assert!(
        matches!(error.downcast_ref(), Some(ApiError::Authentication(m)) if m == "bad key"),
        "unexpected error: {error:?}"
    );
    // No fragment or completion events on a failed request.
    assert!(collector.events().is_empty());
}

#[tokio::test]
async fn http_error_without_json_body_uses_status_text() {
    let addr = spawn_mock_server(StatusCode::INTERNAL_SERVER_ERROR, vec!["boom"]).await;

    let collector = EventCollector::new();
    let error = test_client(addr)
        .stream_generate("summarize this", &collector.sink())
        .await
        .unwrap_err();

    assert!(
        matches!(error.downcast_ref(), Some(ApiError::ServiceError(m)) if m == "Internal Server Error"),
        "unexpected error: {error:?}"
    );
    assert!(collector.events().is_empty());
}

#[tokio::test]
async fn sink_error_cancels_the_stream() {
    let addr = spawn_mock_server(
        StatusCode::OK,
        vec![r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#],
    )
    .await;

    let sink: EventSink = Box::new(|_| anyhow::bail!("cancelled"));
    let error = test_client(addr)
        .stream_generate("summarize this", &sink)
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "cancelled");
}
