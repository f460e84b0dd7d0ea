//! The `SessionStore` trait — the core's contract with remote persistence.
//!
//! The store is a key-value-by-session-id collection with read, create,
//! and update operations; no cross-session transactions. Concurrent
//! writers to the same session are not detected: last remote write wins
//! (documented limitation, not a bug).

use async_trait::async_trait;

use crate::analytics::AnalyticsEvent;
use crate::answers::SurveyAnswers;
use crate::error::StoreError;
use crate::promo::IssuedPromo;
use crate::session::model::{AiSummary, Session};

/// Backend-agnostic session persistence.
///
/// Every session-scoped method returns `StoreError::NotFound` when the id
/// has no matching record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session and return it with its server-issued token.
    async fn create_session(&self, referrer_id: Option<&str>) -> Result<Session, StoreError>;

    /// Fetch a session by id.
    async fn get_session(&self, id: &str) -> Result<Session, StoreError>;

    /// Replace the session's answers and step.
    async fn update_answers(
        &self,
        id: &str,
        answers: &SurveyAnswers,
        step: usize,
    ) -> Result<Session, StoreError>;

    /// Record the respondent's name and optional email.
    async fn update_user_info(
        &self,
        id: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<Session, StoreError>;

    /// Mark the session completed with its archetype and promo code.
    async fn complete_session(
        &self,
        id: &str,
        archetype_id: &str,
        archetype_data: &serde_json::Value,
        promo_code: &str,
    ) -> Result<Session, StoreError>;

    /// Attach enrichment outputs to the session record.
    async fn update_enrichment(
        &self,
        id: &str,
        summary: Option<&AiSummary>,
        certificate_url: Option<&str>,
    ) -> Result<Session, StoreError>;

    /// Record an issued promo code.
    async fn insert_promo(
        &self,
        promo: &IssuedPromo,
        referrer_id: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Append a batch of funnel events. Returns the number inserted.
    async fn insert_events(&self, events: &[AnalyticsEvent]) -> Result<usize, StoreError>;
}
