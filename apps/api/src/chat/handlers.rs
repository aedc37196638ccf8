//! Axum route handlers for the Chat API.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};

use crate::chat::aggregator::{AggregateOutcome, StreamAggregator, StreamObserver};
use crate::chat::intent::{extract_goal, is_roadmap_request};
use crate::chat::models::{ChatMessage, PendingMessage};
use crate::chat::prompts::{CHAT_SYSTEM, RESUME_CHAT_SYSTEM, ROADMAP_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{ChatTurn, FragmentStream, LlmError};
use crate::roadmap::extractor::extract_roadmap;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    #[default]
    Chat,
    Roadmap,
    Resume,
}

impl RequestType {
    pub fn system_prompt(self) -> String {
        match self {
            RequestType::Chat => CHAT_SYSTEM.to_string(),
            RequestType::Roadmap => format!("{ROADMAP_SYSTEM}\n\n{JSON_ONLY_INSTRUCTION}"),
            RequestType::Resume => format!("{RESUME_CHAT_SYSTEM}\n\n{JSON_ONLY_INSTRUCTION}"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    #[serde(default, rename = "type")]
    pub request_type: RequestType,
    #[serde(default)]
    pub goal: Option<String>,
}

/// Decisions made about a request before any fragment is streamed.
#[derive(Debug, PartialEq, Eq)]
pub struct ChatPlan {
    pub request_type: RequestType,
    /// Present when the reply should be run through the roadmap extractor.
    pub roadmap_goal: Option<String>,
}

/// Events pushed to the browser, one SSE event each.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatEvent {
    Delta { delta: String },
    Done { message: ChatMessage },
    Error { error: String },
}

impl ChatEvent {
    fn name(&self) -> &'static str {
        match self {
            ChatEvent::Delta { .. } => "delta",
            ChatEvent::Done { .. } => "done",
            ChatEvent::Error { .. } => "error",
        }
    }

    pub fn into_sse(self) -> Event {
        let data = serde_json::to_string(&self).unwrap_or_default();
        Event::default().event(self.name()).data(data)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Planning
// ────────────────────────────────────────────────────────────────────────────

pub fn plan_request(request: &ChatRequest) -> Result<ChatPlan, AppError> {
    let last = request
        .messages
        .last()
        .ok_or_else(|| AppError::Validation("messages cannot be empty".to_string()))?;

    if last.content.trim().is_empty() {
        return Err(AppError::Validation(
            "last message content cannot be empty".to_string(),
        ));
    }

    let is_roadmap = match request.request_type {
        RequestType::Roadmap => true,
        RequestType::Chat => is_roadmap_request(&last.content),
        RequestType::Resume => false,
    };

    if !is_roadmap {
        return Ok(ChatPlan {
            request_type: request.request_type,
            roadmap_goal: None,
        });
    }

    let goal = request
        .goal
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| extract_goal(&last.content));

    Ok(ChatPlan {
        request_type: RequestType::Roadmap,
        roadmap_goal: Some(goal),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Forwarding observer
// ────────────────────────────────────────────────────────────────────────────

/// Forwards aggregation events to the SSE response and builds the final message.
pub struct SseForwarder {
    tx: UnboundedSender<ChatEvent>,
    pending: Option<PendingMessage>,
    roadmap_goal: Option<String>,
}

impl SseForwarder {
    pub fn new(tx: UnboundedSender<ChatEvent>, roadmap_goal: Option<String>) -> Self {
        Self {
            tx,
            pending: Some(PendingMessage::assistant()),
            roadmap_goal,
        }
    }

    fn send(&self, event: ChatEvent) {
        if self.tx.send(event).is_err() {
            debug!("Chat client disconnected; dropping event");
        }
    }
}

impl StreamObserver for SseForwarder {
    fn on_delta(&mut self, fragment: &str) {
        if let Some(pending) = self.pending.as_mut() {
            pending.append(fragment);
        }
        self.send(ChatEvent::Delta {
            delta: fragment.to_string(),
        });
    }

    fn on_done(&mut self, final_text: &str) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let roadmap = self
            .roadmap_goal
            .as_deref()
            .and_then(|goal| extract_roadmap(final_text, goal).into_option());

        let message = match roadmap {
            Some(roadmap) => pending.finish_with_roadmap(roadmap),
            None => pending.finish(),
        };

        info!(
            "Assistant message {} complete ({:?}, {} chars)",
            message.id,
            message.kind,
            message.content.len()
        );
        self.send(ChatEvent::Done { message });
    }

    fn on_error(&mut self, error: &LlmError) {
        self.pending = None;
        self.send(ChatEvent::Error {
            error: error.to_string(),
        });
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drives one reply from the gateway to the SSE channel and reports how it ended.
pub async fn forward_stream(
    fragments: FragmentStream,
    mut forwarder: SseForwarder,
) -> AggregateOutcome {
    let outcome = StreamAggregator::new().run(fragments, &mut forwarder).await;
    match &outcome {
        AggregateOutcome::Completed(text) => debug!("Chat reply delivered ({} chars)", text.len()),
        AggregateOutcome::Failed(error) => debug!("Chat reply ended with error: {error}"),
        AggregateOutcome::Abandoned => debug!("Chat client went away before the reply ended"),
    }
    outcome
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chat
///
/// Streams the assistant reply as SSE `delta` events followed by one `done` event carrying
/// the final message (with an embedded roadmap for roadmap requests) or one `error` event.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let plan = plan_request(&request)?;

    info!(
        "Processing {:?} request with {} messages",
        plan.request_type,
        request.messages.len()
    );

    let fragments = state
        .completions
        .stream_chat(&request.messages, &plan.request_type.system_prompt())
        .await?;

    let (tx, rx) = mpsc::unbounded_channel();
    let forwarder = SseForwarder::new(tx, plan.roadmap_goal);
    tokio::spawn(forward_stream(fragments, forwarder));

    let events = UnboundedReceiverStream::new(rx).map(|event| Ok(event.into_sse()));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
