// SPDX-License-Identifier: MIT

//! HTTP surface: health, workflow listing, and research runs (plain JSON
//! or SSE node-event streaming) on top of [`Runner`].

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::scout::research::runner::Runner;

pub async fn serve(
    runner: Arc<Runner>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(runner);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(runner: Arc<Runner>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/workflows", get(list_workflows))
        .route("/api/research", post(run_research))
        .route("/api/research/stream", post(stream_research))
        .route("/api/research/resume", post(resume_research))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(runner)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_workflows(State(runner): State<Arc<Runner>>) -> Json<Value> {
    Json(json!(runner.list_workflows()))
}

#[derive(Deserialize)]
struct ResearchRequest {
    query: String,
    #[serde(default)]
    workflow: Option<String>,
    #[serde(default)]
    thread_id: Option<String>,
}

#[derive(Deserialize)]
struct ResumeRequest {
    thread_id: String,
    #[serde(default)]
    ceiling: Option<u32>,
}

fn thread_id_or_fresh(requested: Option<String>) -> String {
    requested.unwrap_or_else(|| Uuid::new_v4().to_string())
}

async fn run_research(
    State(runner): State<Arc<Runner>>,
    Json(payload): Json<ResearchRequest>,
) -> Json<Value> {
    let thread_id = thread_id_or_fresh(payload.thread_id);
    match runner
        .run(&payload.query, payload.workflow.as_deref(), &thread_id)
        .await
    {
        Ok(summary) => Json(json!({
            "thread_id": thread_id,
            "summary": summary,
        })),
        Err(e) => Json(json!({ "error": format!("Research failed: {}", e) })),
    }
}

async fn resume_research(
    State(runner): State<Arc<Runner>>,
    Json(payload): Json<ResumeRequest>,
) -> Json<Value> {
    match runner.resume(&payload.thread_id, payload.ceiling).await {
        Ok(summary) => Json(json!({
            "thread_id": payload.thread_id,
            "summary": summary,
        })),
        Err(e) => Json(json!({ "error": format!("Resume failed: {}", e) })),
    }
}

async fn stream_research(
    State(runner): State<Arc<Runner>>,
    Json(payload): Json<ResearchRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(100);
    let thread_id = thread_id_or_fresh(payload.thread_id);

    tokio::spawn(async move {
        log::info!("Starting streaming research for thread: {}", thread_id);

        let (events_tx, mut events_rx) = mpsc::channel(100);
        let forward_tx = tx.clone();
        let forward = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let _ = forward_tx
                    .send(json!({ "type": "node", "event": event }))
                    .await;
            }
        });

        let result = runner
            .run_streaming(&payload.query, payload.workflow.as_deref(), &thread_id, events_tx)
            .await;
        let _ = forward.await;

        let final_event = match result {
            Ok(summary) => json!({
                "type": "done",
                "thread_id": thread_id,
                "summary": summary,
            }),
            Err(e) => json!({ "type": "error", "error": format!("{}", e) }),
        };
        let _ = tx.send(final_event).await;
    });

    let stream =
        ReceiverStream::new(rx).map(|event| Ok(Event::default().json_data(event).unwrap()));

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new().interval(std::time::Duration::from_secs(1)),
    )
}
