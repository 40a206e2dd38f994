//! Fan-out of one request into independent per-user tasks.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::info;

use alphapack_core::{ChannelMessage, Rarity};

use crate::pipeline::{CountingPipeline, OccurrenceDirection};
use crate::report;
use crate::state::AppState;
use crate::typing::TypingManager;

/// Outbound replies to the requesting channel.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send_message(&self, channel_id: u64, content: &str);
    async fn reply(&self, channel_id: u64, message_id: u64, content: &str);
}

/// What a request wants done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Count,
    Occurrence {
        rarity: Rarity,
        direction: OccurrenceDirection,
    },
}

/// A validated request, mentions already resolved to user ids.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub kind: RequestKind,
    pub channel_id: u64,
    /// Message that carried the command, for occurrence replies.
    pub request_message_id: u64,
    /// Target users; the platform layer falls back to the requester when no
    /// one is mentioned, so this is never empty.
    pub targets: Vec<u64>,
}

/// Launches one background task per target user and keeps the in-flight
/// counter and typing indicator in step with them.
///
/// Requests are independent: a new request never cancels in-flight work.
pub struct RequestCoordinator {
    state: Arc<AppState>,
    pipeline: Arc<CountingPipeline>,
    typing: Arc<TypingManager>,
    responder: Arc<dyn Responder>,
}

impl RequestCoordinator {
    pub fn new(
        state: Arc<AppState>,
        pipeline: Arc<CountingPipeline>,
        typing: Arc<TypingManager>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            state,
            pipeline,
            typing,
            responder,
        }
    }

    /// Start one task per target user over an already-fetched history.
    ///
    /// Returns the task handles; the bot lets them run detached, tests can
    /// await them.
    pub async fn dispatch(
        &self,
        request: ProcessingRequest,
        messages: Arc<Vec<ChannelMessage>>,
    ) -> Vec<JoinHandle<()>> {
        info!(
            channel_id = request.channel_id,
            targets = request.targets.len(),
            kind = ?request.kind,
            "Dispatching request"
        );

        let mut handles = Vec::with_capacity(request.targets.len());
        for target in request.targets.iter().copied() {
            self.state.task_started();
            self.typing.start(request.channel_id).await;

            let state = Arc::clone(&self.state);
            let pipeline = Arc::clone(&self.pipeline);
            let typing = Arc::clone(&self.typing);
            let responder = Arc::clone(&self.responder);
            let messages = Arc::clone(&messages);
            let request = request.clone();

            handles.push(tokio::spawn(async move {
                run_user_task(&pipeline, &responder, &request, &messages, target).await;
                typing.stop(request.channel_id).await;
                state.task_finished();
            }));
        }
        handles
    }
}

async fn run_user_task(
    pipeline: &CountingPipeline,
    responder: &Arc<dyn Responder>,
    request: &ProcessingRequest,
    messages: &[ChannelMessage],
    target: u64,
) {
    match request.kind {
        RequestKind::Count => {
            let outcome = pipeline
                .count_user(messages, target, request.channel_id)
                .await;
            info!(
                author_id = target,
                channel_id = request.channel_id,
                newly_counted = outcome.newly_counted,
                persisted = outcome.persisted,
                "Count task finished"
            );
            responder
                .send_message(request.channel_id, &report::format_count_reply(&outcome.count))
                .await;
        }
        RequestKind::Occurrence { rarity, direction } => {
            let kind = match direction {
                OccurrenceDirection::First => "first",
                OccurrenceDirection::Last => "last",
            };
            let reply = match pipeline
                .find_occurrence(messages, target, rarity, direction)
                .await
            {
                Some(hit) => report::format_occurrence_reply(kind, rarity, &hit),
                None => report::format_never_occurred(kind, rarity),
            };
            responder
                .reply(request.channel_id, request.request_message_id, &reply)
                .await;
        }
    }
}
