use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::{routing::get, Router};
use futures_util::{stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::args::RawArgs;
use crate::error::Result;
use crate::format::{Chunks, Format};
use crate::service::{Operation, Response, Service};
use crate::settings::ServerSettings;

/// Chunks in flight between the formatter thread and the socket.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Clone)]
struct AppState {
    service: Arc<Service>,
    expose_query_format: bool,
}

pub fn router(service: Arc<Service>, settings: &ServerSettings) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);
    let state = AppState { service, expose_query_format: settings.expose_query_format };
    Router::new()
        .route("/*path", get(handle))
        .with_state(state)
        .layer(cors)
}

fn text(status: StatusCode, body: String) -> HttpResponse {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

async fn handle(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> HttpResponse {
    let segments: Vec<String> = path.split('/').filter(|s| !s.is_empty()).map(String::from).collect();
    let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
    let Some(operation) = Operation::parse(&refs) else {
        return text(StatusCode::NOT_FOUND, format!("Unknown operation: `{path}`\n"));
    };
    let args = RawArgs::from_pairs(pairs);
    let service = Arc::clone(&state.service);
    let started = std::time::Instant::now();

    // Compilation and cursor setup touch SQLite, keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || service.handle(operation, &args)).await;
    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(error = %e, "request failed");
            return text(StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n"));
        }
        Err(e) => {
            warn!(error = %e, "join error");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Join error\n".to_string());
        }
    };
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    match response {
        Response::Invalid(message) => {
            info!(ms = elapsed_ms, "invalid arguments");
            text(StatusCode::OK, message)
        }
        Response::Query(query) if state.expose_query_format => {
            let (sql, _) = query.to_sql();
            text(StatusCode::OK, format!("{query}\n{sql}\n"))
        }
        Response::Records { records, .. } if state.expose_query_format => {
            let chunks: Chunks = Box::new(records.map(|record| -> Result<String> {
                let mut line = serde_json::to_string(&record?)?;
                line.push('\n');
                Ok(line)
            }));
            stream_chunks(Format::Raw, chunks).await
        }
        Response::Query(_) | Response::Records { .. } => {
            text(StatusCode::OK, "Formats `query` and `raw` are not available here.\n".to_string())
        }
        Response::Chunks { format, chunks } => stream_chunks(format, chunks).await,
    }
}

/// Pulls chunks on a blocking thread and forwards them to the response body.
async fn stream_chunks(format: Format, chunks: Chunks) -> HttpResponse {
    let (sender, mut receiver) = tokio::sync::mpsc::channel::<Result<String>>(CHANNEL_CAPACITY);
    tokio::task::spawn_blocking(move || {
        for chunk in chunks {
            let failed = chunk.is_err();
            // A closed channel means the client went away, stop pulling.
            if sender.blocking_send(chunk).is_err() || failed {
                break;
            }
        }
    });

    // A failure before the first byte can still become a proper status.
    let first = match receiver.recv().await {
        Some(Err(e)) => {
            warn!(error = %e, "query failed");
            return text(StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n"));
        }
        first => first,
    };
    let body = stream::iter(first)
        .chain(ReceiverStream::new(receiver))
        .map(|chunk| chunk.map(Bytes::from));
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, format.content_type())],
        Body::from_stream(body),
    )
        .into_response()
}
