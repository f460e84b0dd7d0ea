//! Funnel analytics — batched, fire-and-forget event tracking.
//!
//! Events are buffered and flushed after a debounce window, or eagerly at
//! funnel-critical moments (completion, retake, drop-off). Within a batch
//! enqueue order is preserved; across batches there is no ordering
//! requirement. Ingestion must never error back to the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::store::SessionStore;

const DEFAULT_FLUSH_DELAY: Duration = Duration::from_secs(3);

/// One funnel event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub meta: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    fn base(event: &str, session_id: &str) -> Self {
        Self {
            event: event.to_string(),
            session_id: Some(session_id.to_string()),
            step: None,
            question_id: None,
            value: None,
            meta: serde_json::json!({}),
            timestamp: Utc::now(),
        }
    }

    pub fn survey_start(session_id: &str) -> Self {
        Self::base("survey_start", session_id)
    }

    pub fn step_viewed(session_id: &str, step: usize, question_id: &str) -> Self {
        Self {
            step: Some(step),
            question_id: Some(question_id.to_string()),
            ..Self::base("step_viewed", session_id)
        }
    }

    pub fn step_answered(
        session_id: &str,
        step: usize,
        question_id: &str,
        value: Option<&str>,
    ) -> Self {
        Self {
            step: Some(step),
            question_id: Some(question_id.to_string()),
            value: value.map(str::to_string),
            ..Self::base("step_answered", session_id)
        }
    }

    pub fn step_back(session_id: &str, step: usize, question_id: &str) -> Self {
        Self {
            step: Some(step),
            question_id: Some(question_id.to_string()),
            ..Self::base("step_back", session_id)
        }
    }

    pub fn survey_completed(session_id: &str, archetype: &str) -> Self {
        Self {
            meta: serde_json::json!({ "archetype": archetype }),
            ..Self::base("survey_completed", session_id)
        }
    }

    pub fn survey_retake(session_id: &str, previous_archetype: Option<&str>) -> Self {
        Self {
            meta: serde_json::json!({ "previousArchetype": previous_archetype }),
            ..Self::base("survey_retake", session_id)
        }
    }

    pub fn results_viewed(session_id: &str, archetype: &str) -> Self {
        Self {
            meta: serde_json::json!({ "archetype": archetype }),
            ..Self::base("results_viewed", session_id)
        }
    }

    pub fn drop_off(session_id: &str, step: usize, question_id: &str) -> Self {
        Self {
            step: Some(step),
            question_id: Some(question_id.to_string()),
            ..Self::base("drop_off", session_id)
        }
    }
}

/// Fire-and-forget event ingestion. Implementations swallow their own
/// failures; the caller never sees an error.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn ingest(&self, batch: Vec<AnalyticsEvent>);
}

/// Sink that writes events to the session store's `survey_events` table.
pub struct StoreSink {
    store: Arc<dyn SessionStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnalyticsSink for StoreSink {
    async fn ingest(&self, batch: Vec<AnalyticsEvent>) {
        if batch.is_empty() {
            return;
        }
        if let Err(e) = self.store.insert_events(&batch).await {
            warn!(error = %e, "Failed to persist analytics batch");
        }
    }
}

/// Debounced event buffer in front of a sink.
pub struct AnalyticsBatcher {
    sink: Arc<dyn AnalyticsSink>,
    queue: Mutex<Vec<AnalyticsEvent>>,
    /// Bumped on every enqueue; a scheduled flush only fires if no newer
    /// enqueue superseded it.
    generation: AtomicU64,
    flush_delay: Duration,
}

impl AnalyticsBatcher {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Arc<Self> {
        Self::with_flush_delay(sink, DEFAULT_FLUSH_DELAY)
    }

    pub fn with_flush_delay(sink: Arc<dyn AnalyticsSink>, flush_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            sink,
            queue: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
            flush_delay,
        })
    }

    /// Buffer an event and (re)arm the debounce timer.
    pub async fn enqueue(self: &Arc<Self>, event: AnalyticsEvent) {
        self.queue.lock().await.push(event);

        let scheduled = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let batcher = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(batcher.flush_delay).await;
            if batcher.generation.load(Ordering::SeqCst) == scheduled {
                batcher.flush().await;
            }
        });
    }

    /// Buffer an event and flush immediately (completion, retake, drop-off).
    pub async fn enqueue_eager(self: &Arc<Self>, event: AnalyticsEvent) {
        self.queue.lock().await.push(event);
        self.flush().await;
    }

    /// Drain the buffer into the sink. Empty buffer is a no-op.
    pub async fn flush(&self) {
        let batch = {
            let mut queue = self.queue.lock().await;
            std::mem::take(&mut *queue)
        };
        if !batch.is_empty() {
            self.sink.ingest(batch).await;
        }
    }

    /// Number of buffered (unflushed) events.
    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }
}
